use std::collections::BTreeMap;

use serde::Serialize;

pub const COL_COMPANY_NAME: &str = "CompanyName";
pub const COL_EMAIL: &str = "Email";
pub const COL_ADDRESS: &str = "Address";
pub const COL_DOCUMENT_LINK: &str = "DocumentLink";
pub const COL_STATUS: &str = "Status";
pub const COL_LAST_SENT: &str = "LastSent";

/// Columns the recipient sheet must carry, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_COMPANY_NAME,
    COL_EMAIL,
    COL_ADDRESS,
    COL_DOCUMENT_LINK,
    COL_STATUS,
    COL_LAST_SENT,
];

/// Delivery status as recorded in the `Status` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum RecipientStatus {
    Pending,
    Sent,
    Error(String),
}

impl RecipientStatus {
    /// Parse a `Status` cell. Blank and unrecognised values count as pending.
    pub fn parse(cell: &str) -> Self {
        let cell = cell.trim();
        if cell == "Sent" {
            Self::Sent
        } else if let Some(reason) = cell.strip_prefix("Error") {
            let reason = reason.trim_start_matches(':').trim();
            Self::Error(reason.to_string())
        } else {
            Self::Pending
        }
    }

    /// The text written back to the `Status` column.
    pub fn to_cell(&self) -> String {
        match self {
            Self::Pending => "Pending".to_string(),
            Self::Sent => "Sent".to_string(),
            Self::Error(reason) => format!("Error: {reason}"),
        }
    }
}

/// One recipient row from the sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipientRecord {
    /// 1-based sheet row (the header is row 1).
    pub row: usize,
    pub company_name: String,
    pub email: String,
    pub address: String,
    pub document_link: String,
    pub status: RecipientStatus,
    pub last_sent: Option<String>,
    /// Every cell of the row keyed by header, extra columns included.
    pub fields: BTreeMap<String, String>,
}

impl RecipientRecord {
    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}
