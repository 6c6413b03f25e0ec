//! Zip extraction into a scratch directory.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

/// Extracts every entry of `archive_path` under `dest`, creating directories as
/// needed. Entries whose names would escape `dest` are skipped. Returns the
/// number of files written.
pub fn extract_all(archive_path: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive_path)
        .with_context(|| format!("open {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("{} is not a readable zip archive", archive_path.display()))?;

    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;

    let mut files = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("read entry {} of {}", i, archive_path.display()))?;
        let entry_path = match entry.enclosed_name() {
            Some(p) => p,
            None => {
                tracing::warn!("skipping unsafe archive entry {:?}", entry.name());
                continue;
            }
        };

        let output_path = dest.join(&entry_path);
        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
            continue;
        }
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = BufWriter::new(
            File::create(&output_path)
                .with_context(|| format!("create {}", output_path.display()))?,
        );
        io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("extract {}", entry_path.display()))?;
        files += 1;
    }

    tracing::debug!("extracted {} file(s) into {}", files, dest.display());
    Ok(files)
}
