//! Tabular filter: load one data file, keep the institution's rows, write them out.
//!
//! Cells are kept as text end to end. The key column is matched after
//! trimming and case-folding its name; a row matches when its key cell is a
//! number equal to the institution code.

mod delimited;
mod spreadsheet;
mod write;

pub use delimited::{decode_latin1, read_delimited_filtered};
pub use spreadsheet::{cell_text, read_spreadsheet_filtered};
pub use write::write_csv_with_bom;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::locate::CandidateDataFile;
use crate::dataset::DataFormat;

/// Rows of one source file restricted to one institution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FilteredTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// What to filter on.
#[derive(Debug, Clone)]
pub struct RowFilter {
    pub key_column: String,
    pub value: i64,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column '{key}' not found; available columns: {available:?}")]
    MissingKeyColumn { key: String, available: Vec<String> },
    #[error("worksheet in {path} has no header row after skipping {skip_rows} row(s)")]
    NoHeaderRow { path: PathBuf, skip_rows: usize },
    #[error("workbook {0} has no worksheet")]
    NoWorksheet(PathBuf),
    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Index of the first column whose trimmed name equals `key` ignoring case.
pub fn resolve_key_column(headers: &[String], key: &str) -> Result<usize, TableError> {
    let wanted = key.trim().to_uppercase();
    headers
        .iter()
        .position(|h| h.trim().to_uppercase() == wanted)
        .ok_or_else(|| TableError::MissingKeyColumn {
            key: key.trim().to_string(),
            available: headers.to_vec(),
        })
}

/// True when `cell`, trimmed, is a number equal to `value` (`586`, `586.0`, `0586`).
pub fn cell_equals(cell: &str, value: i64) -> bool {
    let cell = cell.trim();
    if cell.is_empty() {
        return false;
    }
    if let Ok(n) = cell.parse::<i64>() {
        return n == value;
    }
    match cell.parse::<f64>() {
        Ok(f) => f.is_finite() && f == value as f64,
        Err(_) => false,
    }
}

/// Keeps rows whose `key_index` cell equals `value`, in their original order.
pub fn filter_rows<I>(rows: I, key_index: usize, value: i64) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    rows.into_iter()
        .filter(|row| row.get(key_index).map(|c| cell_equals(c, value)).unwrap_or(false))
        .collect()
}

/// Loads `file` according to its format and returns the matching rows.
pub fn load_filtered(
    file: &CandidateDataFile,
    filter: &RowFilter,
    skip_rows: usize,
) -> Result<FilteredTable, TableError> {
    match file.format {
        DataFormat::Delimited => read_delimited_filtered(&file.path, b';', filter),
        DataFormat::Spreadsheet => read_spreadsheet_filtered(&file.path, skip_rows, filter),
    }
}

/// Writes `table` to `dir/file_name` unless it is empty. Returns the written path.
pub fn write_filtered(
    table: &FilteredTable,
    dir: &Path,
    file_name: &str,
) -> Result<Option<PathBuf>, TableError> {
    if table.is_empty() {
        return Ok(None);
    }
    let path = dir.join(file_name);
    write_csv_with_bom(&path, &table.headers, &table.rows)?;
    Ok(Some(path))
}
