use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::data::record::{
    RecipientRecord, RecipientStatus, COL_ADDRESS, COL_COMPANY_NAME, COL_DOCUMENT_LINK, COL_EMAIL,
    COL_LAST_SENT, COL_STATUS, REQUIRED_COLUMNS,
};
use crate::data::sheet::Sheet;
use crate::{LetterMergeError, Result};

/// Valid recipients read from a sheet, with the header they were read under.
#[derive(Debug, Clone)]
pub struct LoadedRecipients {
    pub headers: Vec<String>,
    pub records: Vec<RecipientRecord>,
    /// 1-based rows dropped because their `Email` cell was empty.
    pub skipped_rows: Vec<usize>,
}

/// Read and validate the recipient list.
///
/// Fails before looking at any record when the sheet has no data rows or a
/// required column is missing. Rows without an email address are skipped with
/// a warning; a blank status reads as [`RecipientStatus::Pending`].
pub fn load_recipients(sheet: &dyn Sheet) -> Result<LoadedRecipients> {
    let rows = sheet.rows()?;
    if rows.len() <= 1 {
        return Err(LetterMergeError::NoDataRows);
    }

    let headers: Vec<String> = rows[0].iter().map(|h| h.trim().to_string()).collect();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LetterMergeError::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    let mut records = Vec::new();
    let mut skipped_rows = Vec::new();
    for (i, cells) in rows.iter().enumerate().skip(1) {
        let row = i + 1;
        let fields: BTreeMap<String, String> = headers
            .iter()
            .enumerate()
            .map(|(j, h)| (h.clone(), cells.get(j).cloned().unwrap_or_default()))
            .collect();

        let get = |column: &str| fields.get(column).map(|v| v.trim().to_string()).unwrap_or_default();

        let email = get(COL_EMAIL);
        if email.is_empty() {
            warn!(row, "skipping row: missing Email");
            skipped_rows.push(row);
            continue;
        }

        let last_sent = Some(get(COL_LAST_SENT)).filter(|v| !v.is_empty());
        let record = RecipientRecord {
            row,
            company_name: get(COL_COMPANY_NAME),
            email,
            address: get(COL_ADDRESS),
            document_link: get(COL_DOCUMENT_LINK),
            status: RecipientStatus::parse(&get(COL_STATUS)),
            last_sent,
            fields,
        };
        records.push(record);
    }

    debug!(
        records = records.len(),
        skipped = skipped_rows.len(),
        "recipients loaded"
    );

    Ok(LoadedRecipients {
        headers,
        records,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemorySheet;

    const HEADER: &[&str] = &[
        "CompanyName",
        "Email",
        "Address",
        "DocumentLink",
        "Status",
        "LastSent",
    ];

    #[test]
    fn test_skips_rows_without_email() {
        let sheet = MemorySheet::from_rows(&[
            HEADER,
            &["Acme", "a@x.com", "1 Main St", "", "", ""],
            &["Beta", "", "2 Side St", "", "", ""],
        ]);
        let loaded = load_recipients(&sheet).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].company_name, "Acme");
        assert_eq!(loaded.skipped_rows, vec![3]);
    }

    #[test]
    fn test_whitespace_email_is_missing() {
        let sheet = MemorySheet::from_rows(&[HEADER, &["Acme", "   ", "", "", "", ""]]);
        let loaded = load_recipients(&sheet).unwrap();
        assert!(loaded.records.is_empty());
    }

    #[test]
    fn test_short_row_reads_missing_cells_as_empty() {
        let sheet = MemorySheet::from_rows(&[HEADER, &["Acme", "a@x.com"]]);
        let loaded = load_recipients(&sheet).unwrap();
        let record = &loaded.records[0];
        assert_eq!(record.address, "");
        assert_eq!(record.status, RecipientStatus::Pending);
        assert!(record.last_sent.is_none());
    }

    #[test]
    fn test_default_status_and_row_index() {
        let sheet = MemorySheet::from_rows(&[
            HEADER,
            &["Acme", "a@x.com", "", "", "", ""],
            &["Beta", "b@x.com", "", "http://old", "Sent", "2024-01-01T00:00:00+00:00"],
        ]);
        let loaded = load_recipients(&sheet).unwrap();
        assert_eq!(loaded.records[0].row, 2);
        assert_eq!(loaded.records[0].status, RecipientStatus::Pending);
        assert_eq!(loaded.records[1].row, 3);
        assert_eq!(loaded.records[1].status, RecipientStatus::Sent);
        assert_eq!(loaded.records[1].document_link, "http://old");
        assert_eq!(
            loaded.records[1].last_sent.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_loading_does_not_write_defaults() {
        let sheet = MemorySheet::from_rows(&[HEADER, &["Acme", "a@x.com", "", "", "", ""]]);
        let before = sheet.clone();
        load_recipients(&sheet).unwrap();
        assert_eq!(sheet, before);
        assert_eq!(sheet.cell(2, "Status"), Some(""));
    }

    #[test]
    fn test_extra_columns_are_kept() {
        let mut header = HEADER.to_vec();
        header.push("Contact Person");
        let sheet = MemorySheet::from_rows(&[
            header.as_slice(),
            &["Acme", "a@x.com", "", "", "", "", "Jo"],
        ]);
        let loaded = load_recipients(&sheet).unwrap();
        assert_eq!(loaded.records[0].field("Contact Person"), Some("Jo"));
        assert_eq!(loaded.headers.len(), 7);
    }

    #[test]
    fn test_missing_column_fails() {
        let sheet = MemorySheet::from_rows(&[
            &["CompanyName", "Email", "Address", "Status", "LastSent"],
            &["Acme", "a@x.com", "", "", ""],
        ]);
        let err = load_recipients(&sheet).unwrap_err();
        assert!(
            matches!(err, LetterMergeError::MissingColumn { ref column } if column == "DocumentLink"),
            "got: {err}"
        );
        assert_eq!(err.to_string(), "Missing required column: DocumentLink");
    }

    #[test]
    fn test_header_only_has_no_data() {
        let sheet = MemorySheet::from_rows(&[HEADER]);
        assert!(matches!(
            load_recipients(&sheet),
            Err(LetterMergeError::NoDataRows)
        ));
    }

    #[test]
    fn test_empty_sheet_has_no_data() {
        let sheet = MemorySheet::default();
        assert!(matches!(
            load_recipients(&sheet),
            Err(LetterMergeError::NoDataRows)
        ));
    }
}
