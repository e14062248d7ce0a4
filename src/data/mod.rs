pub mod csv;
pub mod loader;
pub mod record;
pub mod sheet;

pub use csv::{CsvOptions, CsvSheet};
pub use loader::{load_recipients, LoadedRecipients};
pub use record::{
    RecipientRecord, RecipientStatus, COL_ADDRESS, COL_COMPANY_NAME, COL_DOCUMENT_LINK, COL_EMAIL,
    COL_LAST_SENT, COL_STATUS, REQUIRED_COLUMNS,
};
pub use sheet::{MemorySheet, Sheet};
