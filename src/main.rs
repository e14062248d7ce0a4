use std::io::BufRead as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lettermerge_lib::config::{Settings, DEFAULT_CONFIG_FILE};
use lettermerge_lib::data::{load_recipients, CsvSheet, RecipientStatus};
use lettermerge_lib::dispatch::{Delivery, Dispatcher};
use lettermerge_lib::letter::{GenpdfExporter, LetterGenerator};
use lettermerge_lib::render::EmailTemplate;
use lettermerge_lib::smtp::{self, SmtpMailer};
use lettermerge_lib::storage::LocalFolderStore;
use lettermerge_lib::template::{referenced_tokens, TemplateContext, TOKEN_DOCUMENT_LINK};
use lettermerge_lib::{LetterMergeError, Result};

#[derive(Debug, Parser)]
#[command(name = "lettermerge", version = env!("GIT_VERSION"))]
#[command(about = "Generate a letter of intent per recipient and mail it out")]
struct Cli {
    /// Log filter, e.g. `debug` or `lettermerge_lib=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct ConfigArg {
    #[arg(long, short, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Process every recipient in the sheet.
    Run {
        #[command(flatten)]
        config: ConfigArg,
        /// Recipient sheet; overrides `[run] sheet`.
        #[arg(long, value_name = "FILE")]
        sheet: Option<PathBuf>,
        /// Leave rows already marked `Sent` alone.
        #[arg(long)]
        skip_sent: bool,
        /// Write the run report as JSON.
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
    /// Validate the sheet and list who would be mailed. Sends nothing.
    Check {
        #[command(flatten)]
        config: ConfigArg,
    },
    /// Connect to the configured SMTP server without sending.
    SmtpTest {
        #[command(flatten)]
        config: ConfigArg,
    },
    /// Manage SMTP credentials in the OS keychain.
    Credentials {
        #[command(subcommand)]
        action: CredentialAction,
    },
}

#[derive(Debug, Subcommand)]
enum CredentialAction {
    /// Store a username and a password read from stdin.
    Set {
        #[arg(long)]
        profile: String,
        #[arg(long)]
        username: String,
    },
    Delete {
        #[arg(long)]
        profile: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "aborted");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn execute(command: Command) -> Result<()> {
    match command {
        Command::Run {
            config,
            sheet,
            skip_sent,
            report,
        } => {
            let mut settings = Settings::load_or_default(&config.config)?;
            if let Some(sheet) = sheet {
                settings.run.sheet = sheet;
            }
            if report.is_some() {
                settings.run.report = report;
            }
            settings.run.skip_sent |= skip_sent;
            run(&settings).await
        }
        Command::Check { config } => check(&Settings::load_or_default(&config.config)?),
        Command::SmtpTest { config } => {
            let settings = Settings::load_or_default(&config.config)?;
            let mailer = open_mailer(&settings)?;
            mailer.test_connection().await?;
            println!("SMTP connection to {} OK", settings.smtp.host);
            Ok(())
        }
        Command::Credentials { action } => match action {
            CredentialAction::Set { profile, username } => {
                let password = read_password()?;
                smtp::store_credential(&profile, &username, &password)?;
                println!("credentials stored for profile '{profile}'");
                Ok(())
            }
            CredentialAction::Delete { profile } => {
                smtp::delete_credential(&profile)?;
                println!("credentials removed for profile '{profile}'");
                Ok(())
            }
        },
    }
}

async fn run(settings: &Settings) -> Result<()> {
    let run = &settings.run;
    // Structural failures before the sheet is opened abort without notice.
    let template = EmailTemplate::load(&run.template, run.body_format, run.stylesheet.as_deref())?;
    let mailer = open_mailer(settings)?;
    let store = LocalFolderStore::open(
        &settings.storage.root,
        &settings.storage.folder,
        &settings.storage.public_base_url,
    )?;
    let exporter =
        GenpdfExporter::from_font_dir(&settings.storage.font_dir, &settings.storage.font_family)?;
    let generator = LetterGenerator::new(settings.organization.clone(), exporter, store);
    let dispatcher = Dispatcher::new(settings, &template, &generator, &mailer);

    let mut sheet = match CsvSheet::open(&run.sheet, &run.csv_options()) {
        Ok(sheet) => sheet,
        Err(e) => {
            dispatcher.notify_operator(&e.to_string()).await;
            return Err(e);
        }
    };
    let report = dispatcher.run(&mut sheet).await?;

    println!(
        "{} sent, {} failed, {} skipped, {} rows without email",
        report.sent_count(),
        report.failure_count(),
        report.skipped_count(),
        report.skipped_rows.len()
    );
    for failure in report.failures() {
        if let Delivery::Failed { reason } = &failure.delivery {
            println!("  row {} <{}>: {reason}", failure.row, failure.email);
        }
    }
    if let Some(path) = &run.report {
        report.write_json(path)?;
        info!(path = %path.display(), "run report written");
    }
    Ok(())
}

fn check(settings: &Settings) -> Result<()> {
    let run = &settings.run;
    let template = EmailTemplate::load(&run.template, run.body_format, run.stylesheet.as_deref())?;
    let sheet = CsvSheet::open(&run.sheet, &run.csv_options())?;
    let loaded = load_recipients(&sheet)?;

    if let Some(first) = loaded.records.first() {
        let known = TemplateContext::from_record(first)
            .with_organization(&settings.organization, "")
            .with(TOKEN_DOCUMENT_LINK, "");
        let mut tokens = referenced_tokens(&run.subject);
        tokens.extend(referenced_tokens(&template.body));
        for token in tokens.iter().filter(|t| known.get(t).is_none()) {
            println!("warning: {{{{{token}}}}} has no value and renders empty");
        }
    }
    for record in &loaded.records {
        let marker = if run.skip_sent && record.status == RecipientStatus::Sent {
            "skip"
        } else {
            "send"
        };
        println!(
            "{marker}  row {:>4}  {:<40} {}",
            record.row, record.company_name, record.email
        );
    }
    for row in &loaded.skipped_rows {
        println!("none  row {row:>4}  (no email)");
    }
    println!(
        "{} recipients in {}",
        loaded.records.len(),
        run.sheet.display()
    );
    Ok(())
}

fn open_mailer(settings: &Settings) -> Result<SmtpMailer> {
    let credentials = smtp::retrieve_credential(&settings.smtp.name)?;
    SmtpMailer::new(&settings.smtp, &credentials)
}

fn read_password() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|source| LetterMergeError::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
