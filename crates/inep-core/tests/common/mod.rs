#![allow(dead_code)]

pub mod file_server;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;

/// Writes a zip at `path` with the given `(entry name, body)` pairs.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zw = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, body) in entries {
        zw.start_file(*name, SimpleFileOptions::default()).unwrap();
        zw.write_all(body).unwrap();
    }
    zw.finish().unwrap();
}

/// Zip bytes with the given entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.zip");
    write_zip(&path, entries);
    std::fs::read(path).unwrap()
}
