use crate::{LetterMergeError, Result};

/// A tabular data source: the first row is the header, every later row is a
/// record. Rows are addressed 1-based, matching spreadsheet row numbers, so the
/// header is row 1 and the first data row is row 2.
pub trait Sheet {
    /// All rows, header included, in source order.
    fn rows(&self) -> Result<Vec<Vec<String>>>;

    /// Overwrite the named cells of one row, leaving every other cell untouched.
    fn update_row(&mut self, row: usize, cells: &[(&str, &str)]) -> Result<()>;
}

/// Locate `column` in `headers` and return its zero-based index. Header cells
/// are compared trimmed, the same way the loader reads them.
pub(crate) fn column_index(headers: &[String], column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| LetterMergeError::UnknownColumn {
            column: column.to_string(),
        })
}

/// Apply `cells` to `rows[row - 1]`, growing short rows to the header width.
pub(crate) fn apply_update(
    rows: &mut [Vec<String>],
    row: usize,
    cells: &[(&str, &str)],
) -> Result<()> {
    let row_count = rows.len();
    if row < 2 || row > row_count {
        return Err(LetterMergeError::RowOutOfRange { row, row_count });
    }
    let width = rows[0].len();
    let indices = cells
        .iter()
        .map(|(column, _)| column_index(&rows[0], column))
        .collect::<Result<Vec<_>>>()?;

    let target = &mut rows[row - 1];
    if target.len() < width {
        target.resize(width, String::new());
    }
    for (idx, (_, value)) in indices.into_iter().zip(cells) {
        target[idx] = (*value).to_string();
    }
    Ok(())
}

/// In-memory sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    rows: Vec<Vec<String>>,
}

impl MemorySheet {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Cell value at 1-based `row` for the named column.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let headers = self.rows.first()?;
        let idx = column_index(headers, column).ok()?;
        self.rows
            .get(row.checked_sub(1)?)
            .and_then(|r| r.get(idx))
            .map(String::as_str)
    }
}

impl Sheet for MemorySheet {
    fn rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.rows.clone())
    }

    fn update_row(&mut self, row: usize, cells: &[(&str, &str)]) -> Result<()> {
        apply_update(&mut self.rows, row, cells)
    }
}
