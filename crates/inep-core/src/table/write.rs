//! UTF-8 CSV output with a byte-order mark, written atomically.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::TableError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Suffix of the file being written before it is renamed into place.
pub const TEMP_SUFFIX: &str = ".part";

/// Writes `headers` then `rows` as comma-separated UTF-8 with a BOM. The data
/// goes to `<path>.part` first and is renamed onto `path` once complete.
pub fn write_csv_with_bom(
    path: &Path,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<(), TableError> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(TEMP_SUFFIX);
    let temp = std::path::PathBuf::from(temp);

    let io_err = |source| TableError::Io {
        path: path.to_path_buf(),
        source,
    };

    let result = write_to(&temp, headers, rows).and_then(|()| {
        fs::rename(&temp, path).map_err(io_err)
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_to(temp: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<(), TableError> {
    let io_err = |source| TableError::Io {
        path: temp.to_path_buf(),
        source,
    };
    let csv_err = |source| TableError::Csv {
        path: temp.to_path_buf(),
        source,
    };

    let mut out = BufWriter::new(File::create(temp).map_err(io_err)?);
    out.write_all(UTF8_BOM).map_err(io_err)?;

    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(out);
    writer.write_record(headers).map_err(csv_err)?;
    for row in rows {
        writer.write_record(row).map_err(csv_err)?;
    }
    let mut out = writer
        .into_inner()
        .map_err(|e| io_err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
    out.flush().map_err(io_err)?;
    Ok(())
}
