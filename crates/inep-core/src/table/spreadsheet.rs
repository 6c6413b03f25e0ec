//! First worksheet of an `.xlsx` workbook, below a fixed banner.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use super::{filter_rows, resolve_key_column, FilteredTable, RowFilter, TableError};

/// Text rendering of one cell. Whole floats lose their `.0` so integer
/// codes read back as integers.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

/// Reads the first worksheet, skips the first `skip_rows` sheet rows, takes
/// the next row as the header and keeps the rows matching `filter`.
pub fn read_spreadsheet_filtered(
    path: &Path,
    skip_rows: usize,
    filter: &RowFilter,
) -> Result<FilteredTable, TableError> {
    let workbook_err = |source| TableError::Workbook {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TableError::NoWorksheet(path.to_path_buf()))?
        .map_err(workbook_err)?;

    // The range starts at the first used cell, not necessarily A1.
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    let first_col = range.start().map(|(_, c)| c as usize).unwrap_or(0);
    let skip_in_range = skip_rows.saturating_sub(first_row);

    let mut rows = range.rows().skip(skip_in_range).map(|r| {
        let mut cells = vec![String::new(); first_col];
        cells.extend(r.iter().map(cell_text));
        cells
    });

    let headers = rows.next().ok_or_else(|| TableError::NoHeaderRow {
        path: path.to_path_buf(),
        skip_rows,
    })?;
    let key_index = resolve_key_column(&headers, &filter.key_column)?;
    let kept = filter_rows(rows, key_index, filter.value);

    tracing::debug!("{}: {} row(s) matched", path.display(), kept.len());
    Ok(FilteredTable {
        headers,
        rows: kept,
    })
}
