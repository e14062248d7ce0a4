use std::path::{Path, PathBuf};

use crate::data::sheet::{apply_update, Sheet};
use crate::{LetterMergeError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvOptions {
    pub separator: Option<char>,
    pub encoding: Option<String>,
}

impl CsvOptions {
    fn separator_byte(&self) -> Result<Option<u8>> {
        match self.separator {
            None => Ok(None),
            Some(c) if c.is_ascii() => Ok(Some(c as u8)),
            Some(c) => Err(LetterMergeError::InvalidSeparator { separator: c }),
        }
    }
}

pub fn detect_separator(first_line: &str) -> u8 {
    let candidates: &[(u8, char)] = &[(b',', ','), (b';', ';'), (b'|', '|'), (b'\t', '\t')];
    candidates
        .iter()
        .max_by_key(|(_, ch)| first_line.chars().filter(|c| c == ch).count())
        .map(|(byte, _)| *byte)
        .unwrap_or(b',')
}

pub fn decode_bytes(bytes: &[u8], hint: Option<&str>) -> String {
    if let Some(label) = hint {
        let encoding =
            encoding_rs::Encoding::for_label(label.as_bytes()).unwrap_or(encoding_rs::WINDOWS_1252);
        let (decoded, _, _) = encoding.decode(bytes);
        return decoded.into_owned();
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => s,
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// A CSV file acting as the recipient spreadsheet.
///
/// The whole file is held in memory. Every [`Sheet::update_row`] rewrites the
/// file immediately (UTF-8, same separator) so an interrupted run leaves all
/// outcomes recorded so far on disk. The rewrite goes to a sibling temporary
/// file that replaces the sheet only once complete.
#[derive(Debug)]
pub struct CsvSheet {
    path: PathBuf,
    delimiter: u8,
    rows: Vec<Vec<String>>,
}

impl CsvSheet {
    pub fn open(path: &Path, opts: &CsvOptions) -> Result<Self> {
        let separator = opts.separator_byte()?;
        let bytes = std::fs::read(path).map_err(|source| LetterMergeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let content = decode_bytes(&bytes, opts.encoding.as_deref());
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let delimiter = separator.unwrap_or_else(|| {
            let first_line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
            detect_separator(first_line)
        });

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|source| LetterMergeError::CsvParse {
                path: path.to_path_buf(),
                source,
            })?;
            rows.push(record.iter().map(String::from).collect());
        }

        Ok(Self {
            path: path.to_path_buf(),
            delimiter,
            rows,
        })
    }

    fn write_rows(&self, rows: &[Vec<String>]) -> Result<()> {
        let io_err = |source| LetterMergeError::Io {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_writer(staged.as_file_mut());
        for row in rows {
            writer
                .write_record(row)
                .map_err(|source| LetterMergeError::CsvWrite {
                    path: self.path.clone(),
                    source,
                })?;
        }
        writer.flush().map_err(io_err)?;
        drop(writer);

        staged.as_file().sync_all().map_err(io_err)?;
        staged.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl Sheet for CsvSheet {
    fn rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.rows.clone())
    }

    fn update_row(&mut self, row: usize, cells: &[(&str, &str)]) -> Result<()> {
        let mut updated = self.rows.clone();
        apply_update(&mut updated, row, cells)?;
        self.write_rows(&updated)?;
        self.rows = updated;
        Ok(())
    }
}
