//! One mail-merge run: load recipients, generate each letter, send, record.

use std::path::Path;

use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{Organization, Settings};
use crate::data::{
    load_recipients, RecipientRecord, RecipientStatus, Sheet, COL_DOCUMENT_LINK, COL_LAST_SENT,
    COL_STATUS,
};
use crate::letter::DocumentGenerator;
use crate::render::{EmailTemplate, RenderedEmail};
use crate::smtp::Mailer;
use crate::template::{format_date, TemplateContext, TOKEN_DOCUMENT_LINK};
use crate::{LetterMergeError, Result};

pub const FAILURE_SUBJECT: &str = "Auto Email System Failure";

/// What happened to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Delivery {
    Sent { link: String },
    Failed { reason: String },
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipientOutcome {
    pub row: usize,
    pub email: String,
    pub company_name: String,
    pub delivery: Delivery,
    /// Set when the outcome could not be recorded in the sheet.
    pub write_back_error: Option<String>,
}

impl RecipientOutcome {
    fn new(record: &RecipientRecord, delivery: Delivery) -> Self {
        Self {
            row: record.row,
            email: record.email.clone(),
            company_name: record.company_name.clone(),
            delivery,
            write_back_error: None,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self.delivery, Delivery::Sent { .. })
    }
}

/// Aggregate result of a run, in row order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: String,
    /// Rows left out because their `Email` cell was empty.
    pub skipped_rows: Vec<usize>,
    pub outcomes: Vec<RecipientOutcome>,
}

impl RunReport {
    pub fn sent_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_sent()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.delivery == Delivery::Skipped)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecipientOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.delivery, Delivery::Failed { .. }))
    }

    /// Serialize the report as pretty-printed JSON at `path` (creates or overwrites).
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| LetterMergeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::to_writer_pretty(file, self).map_err(|e| LetterMergeError::ReportJson {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Drives a run against one sheet. Recipients are handled one at a time, in
/// row order; a failure for one never stops the next.
pub struct Dispatcher<'a> {
    organization: &'a Organization,
    template: &'a EmailTemplate,
    subject: &'a str,
    operator_email: &'a str,
    skip_sent: bool,
    generator: &'a dyn DocumentGenerator,
    mailer: &'a dyn Mailer,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        settings: &'a Settings,
        template: &'a EmailTemplate,
        generator: &'a dyn DocumentGenerator,
        mailer: &'a dyn Mailer,
    ) -> Self {
        Self {
            organization: &settings.organization,
            template,
            subject: &settings.run.subject,
            operator_email: settings.operator_address(),
            skip_sent: settings.run.skip_sent,
            generator,
            mailer,
        }
    }

    pub fn skip_sent(mut self, skip: bool) -> Self {
        self.skip_sent = skip;
        self
    }

    pub async fn run(&self, sheet: &mut dyn Sheet) -> Result<RunReport> {
        let started = Local::now();
        let loaded = match load_recipients(sheet) {
            Ok(loaded) => loaded,
            Err(e) => {
                error!(error = %e, "run aborted");
                self.notify_operator(&e.to_string()).await;
                return Err(e);
            }
        };
        info!(
            recipients = loaded.records.len(),
            skipped = loaded.skipped_rows.len(),
            "recipients loaded"
        );

        let date = format_date(started);
        let mut report = RunReport {
            started_at: timestamp(started),
            skipped_rows: loaded.skipped_rows,
            outcomes: Vec::with_capacity(loaded.records.len()),
        };

        for record in &loaded.records {
            if self.skip_sent && record.status == RecipientStatus::Sent {
                info!(row = record.row, email = %record.email, "already sent, skipping");
                report
                    .outcomes
                    .push(RecipientOutcome::new(record, Delivery::Skipped));
                continue;
            }

            let delivery = match self.deliver(record, &date).await {
                Ok(link) => {
                    info!(row = record.row, email = %record.email, link = %link, "sent");
                    Delivery::Sent { link }
                }
                Err(e) => {
                    error!(row = record.row, email = %record.email, error = %e, "failed");
                    Delivery::Failed {
                        reason: e.to_string(),
                    }
                }
            };

            let mut outcome = RecipientOutcome::new(record, delivery);
            if let Err(e) = record_outcome(sheet, record.row, &outcome.delivery) {
                error!(row = record.row, error = %e, "could not record outcome");
                outcome.write_back_error = Some(e.to_string());
            }
            report.outcomes.push(outcome);
        }

        info!(
            sent = report.sent_count(),
            failed = report.failure_count(),
            skipped = report.skipped_count(),
            "run finished"
        );
        Ok(report)
    }

    async fn deliver(&self, record: &RecipientRecord, date: &str) -> Result<String> {
        let link = self.generator.generate(record, date)?;
        let context = TemplateContext::from_record(record)
            .with_organization(self.organization, date)
            .with(TOKEN_DOCUMENT_LINK, link.as_str());
        let mut email = self.template.render(&record.email, self.subject, &context)?;
        email.sender_name = Some(self.organization.sender_display_name());
        self.mailer.send(&email).await?;
        Ok(link)
    }

    /// Best effort: a failed notice is logged, never returned.
    pub async fn notify_operator(&self, message: &str) {
        if self.operator_email.trim().is_empty() {
            warn!("no operator address configured, failure notice not sent");
            return;
        }
        let notice = RenderedEmail::plain(
            self.operator_email,
            FAILURE_SUBJECT,
            format!("Bulk email run failed:\n\n{message}"),
        );
        match self.mailer.send(&notice).await {
            Ok(()) => info!(operator = %self.operator_email, "failure notice sent"),
            Err(e) => error!(operator = %self.operator_email, error = %e, "failure notice not sent"),
        }
    }
}

fn timestamp(at: DateTime<Local>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Write the outcome back to the recipient's row. Failures touch only `Status`.
fn record_outcome(sheet: &mut dyn Sheet, row: usize, delivery: &Delivery) -> Result<()> {
    match delivery {
        Delivery::Sent { link } => {
            let sent_at = timestamp(Local::now());
            sheet.update_row(
                row,
                &[
                    (COL_STATUS, RecipientStatus::Sent.to_cell().as_str()),
                    (COL_LAST_SENT, sent_at.as_str()),
                    (COL_DOCUMENT_LINK, link.as_str()),
                ],
            )
        }
        Delivery::Failed { reason } => {
            let status = RecipientStatus::Error(reason.clone()).to_cell();
            sheet.update_row(row, &[(COL_STATUS, status.as_str())])
        }
        Delivery::Skipped => Ok(()),
    }
}
