use tracing::debug;

use super::{compose_letter, sanitize_file_stem, LetterExporter};
use crate::config::Organization;
use crate::data::RecipientRecord;
use crate::storage::ArtifactStore;
use crate::Result;

/// Produces a shareable document for one recipient and returns its link.
pub trait DocumentGenerator {
    fn generate(&self, recipient: &RecipientRecord, date: &str) -> Result<String>;
}

pub fn artifact_file_name(stem: &str) -> String {
    format!("LOI - {stem}.pdf")
}

/// Letter of intent: compose, export to PDF, publish.
pub struct LetterGenerator<E, S> {
    organization: Organization,
    exporter: E,
    store: S,
}

impl<E: LetterExporter, S: ArtifactStore> LetterGenerator<E, S> {
    pub fn new(organization: Organization, exporter: E, store: S) -> Self {
        Self {
            organization,
            exporter,
            store,
        }
    }
}

impl<E: LetterExporter, S: ArtifactStore> DocumentGenerator for LetterGenerator<E, S> {
    fn generate(&self, recipient: &RecipientRecord, date: &str) -> Result<String> {
        let file_name = artifact_file_name(&sanitize_file_stem(&recipient.company_name));
        let letter = compose_letter(recipient, &self.organization, date);
        let pdf = self.exporter.export(letter)?;
        let link = self.store.publish(&file_name, &pdf)?;
        debug!(row = recipient.row, file = %file_name, bytes = pdf.len(), "letter published");
        Ok(link)
    }
}
