#[derive(Debug, thiserror::Error)]
pub enum LetterMergeError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("config parse error in {path}: {source}")]
    ConfigParse {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },

    #[error("CSV parse error in {path}: {source}")]
    CsvParse {
        path: std::path::PathBuf,
        source: csv::Error,
    },

    #[error("CSV write error in {path}: {source}")]
    CsvWrite {
        path: std::path::PathBuf,
        source: csv::Error,
    },

    #[error("CSV separator {separator:?} is not a single ASCII character")]
    InvalidSeparator { separator: char },

    #[error("No data rows found.")]
    NoDataRows,

    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    #[error("row {row} is outside the data source ({row_count} rows)")]
    RowOutOfRange { row: usize, row_count: usize },

    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("CSS inlining error: {reason}")]
    CssInline { reason: String },

    #[error("stylesheet file not found: {path}")]
    StylesheetNotFound { path: std::path::PathBuf },

    #[error("email template not found: {path}")]
    TemplateNotFound { path: std::path::PathBuf },

    #[error("failed to load fonts '{family}' from {dir}: {reason}")]
    FontLoad {
        dir: std::path::PathBuf,
        family: String,
        reason: String,
    },

    #[error("PDF export failed for '{title}': {reason}")]
    PdfExport { title: String, reason: String },

    #[error("failed to store artifact {path}: {source}")]
    Storage {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("SMTP connection error: {reason}")]
    SmtpConnect { reason: String },

    #[error("SMTP send error for {recipient}: {reason}")]
    SmtpSend { recipient: String, reason: String },

    #[error("keyring error: {reason}")]
    Keyring { reason: String },

    #[error("failed to write run report {path}: {source}")]
    ReportJson {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },
}
