//! Semicolon-separated Latin-1 text, streamed record by record.

use std::path::Path;

use super::{cell_equals, resolve_key_column, FilteredTable, RowFilter, TableError};

/// Decodes ISO-8859-1 bytes: every byte is the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Reads `path` with `delimiter`, resolves the key column from the header row
/// and keeps only matching records. Only matching rows are held in memory.
pub fn read_delimited_filtered(
    path: &Path,
    delimiter: u8,
    filter: &RowFilter,
) -> Result<FilteredTable, TableError> {
    let csv_err = |source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(csv_err)?
        .iter()
        .map(decode_latin1)
        .collect();
    let key_index = resolve_key_column(&headers, &filter.key_column)?;

    let mut rows = Vec::new();
    let mut scanned: u64 = 0;
    let mut record = csv::ByteRecord::new();
    while reader.read_byte_record(&mut record).map_err(csv_err)? {
        scanned += 1;
        let matches = record
            .get(key_index)
            .map(|cell| cell_equals(&decode_latin1(cell), filter.value))
            .unwrap_or(false);
        if matches {
            rows.push(record.iter().map(decode_latin1).collect());
        }
    }

    tracing::debug!(
        "{}: scanned {} row(s), {} matched",
        path.display(),
        scanned,
        rows.len()
    );
    Ok(FilteredTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn filter() -> RowFilter {
        RowFilter {
            key_column: "CO_IES".to_string(),
            value: 586,
        }
    }

    #[test]
    fn latin1_bytes_decode_to_accented_text() {
        assert_eq!(decode_latin1(b"Educa\xe7\xe3o"), "Educação");
        assert_eq!(decode_latin1(b"plain"), "plain");
    }

    #[test]
    fn filters_semicolon_latin1_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CADASTRO_CURSOS.CSV");
        fs::write(
            &path,
            b"NU_ANO_CENSO;co_ies ;NO_CURSO\n2022;586;Engenharia Qu\xedmica\n2022;1;Direito\n2022;586;\"Hist\xf3ria; licenciatura\"\n",
        )
        .unwrap();

        let table = read_delimited_filtered(&path, b';', &filter()).unwrap();
        assert_eq!(table.headers, vec!["NU_ANO_CENSO", "co_ies ", "NO_CURSO"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec!["2022", "586", "Engenharia Química"]);
        assert_eq!(table.rows[1][2], "História; licenciatura");
    }

    #[test]
    fn ragged_rows_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.csv");
        fs::write(&path, b"CO_IES;NOME\n586\n1;B;extra\n586;A\n").unwrap();
        let table = read_delimited_filtered(&path, b';', &filter()).unwrap();
        assert_eq!(table.rows, vec![vec!["586".to_string()], vec!["586".to_string(), "A".to_string()]]);
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.csv");
        fs::write(&path, b"NU_ANO;NOME\n2022;A\n").unwrap();
        let err = read_delimited_filtered(&path, b';', &filter()).unwrap_err();
        assert!(err.to_string().contains("available columns: [\"NU_ANO\", \"NOME\"]"));
    }
}
