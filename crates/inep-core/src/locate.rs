//! Data file locator: find the tabular file inside an extracted archive.
//!
//! Walks are sorted by file name so the fallback choice does not depend on
//! the filesystem's enumeration order.

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::dataset::DataFormat;

/// A file believed to hold the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDataFile {
    pub path: PathBuf,
    pub format: DataFormat,
}

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no .csv data file found under folders named {folders:?} in {root}")]
    NoDelimitedFile { root: PathBuf, folders: Vec<String> },
    #[error("no .xlsx file found in {0}")]
    NoSpreadsheet(PathBuf),
}

fn sorted_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Files whose immediate parent folder is named exactly one of `folders` and
/// whose extension is exactly `csv` or `CSV`, grouped by folder name, then by
/// extension, each group in walk order.
pub fn delimited_candidates(root: &Path, folders: &[String]) -> Vec<PathBuf> {
    let files: Vec<PathBuf> = sorted_files(root).collect();
    let mut out = Vec::new();
    for folder in folders {
        for ext in ["csv", "CSV"] {
            out.extend(
                files
                    .iter()
                    .filter(|p| {
                        p.extension().map(|e| e == ext).unwrap_or(false)
                            && p.parent()
                                .and_then(|d| d.file_name())
                                .map(|d| d == folder.as_str())
                                .unwrap_or(false)
                    })
                    .cloned(),
            );
        }
    }
    out
}

/// Picks the first candidate whose upper-cased file name contains the first
/// preference, else the second, and so on; else the first candidate.
pub fn choose_preferred<'a>(candidates: &'a [PathBuf], preferences: &[String]) -> Option<&'a PathBuf> {
    preferences
        .iter()
        .find_map(|pref| {
            let pref = pref.to_uppercase();
            candidates
                .iter()
                .find(|p| file_name_of(p).to_uppercase().contains(&pref))
        })
        .or_else(|| candidates.first())
}

/// Census microdata: a CSV under one of the expected data folders.
pub fn locate_delimited(
    root: &Path,
    folders: &[String],
    preferences: &[String],
) -> Result<CandidateDataFile, LocateError> {
    let candidates = delimited_candidates(root, folders);
    tracing::debug!("{} csv candidate(s) under {}", candidates.len(), root.display());
    choose_preferred(&candidates, preferences)
        .map(|path| CandidateDataFile {
            path: path.clone(),
            format: DataFormat::Delimited,
        })
        .ok_or_else(|| LocateError::NoDelimitedFile {
            root: root.to_path_buf(),
            folders: folders.to_vec(),
        })
}

/// Trajectory indicators: the first `.xlsx` anywhere under `root`.
pub fn locate_spreadsheet(root: &Path) -> Result<CandidateDataFile, LocateError> {
    sorted_files(root)
        .find(|p| {
            p.extension()
                .map(|e| e.to_string_lossy().eq_ignore_ascii_case("xlsx"))
                .unwrap_or(false)
        })
        .map(|path| CandidateDataFile {
            path,
            format: DataFormat::Spreadsheet,
        })
        .ok_or_else(|| LocateError::NoSpreadsheet(root.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, b"x").unwrap();
    }

    fn folders() -> Vec<String> {
        ["dados", "DADOS", "microdados", "MICRODADOS"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn prefs() -> Vec<String> {
        vec!["CADASTRO_CURSOS".to_string(), "CURSOS".to_string()]
    }

    #[test]
    fn highest_priority_substring_wins() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/dados/OUTRO.csv");
        touch(dir.path(), "a/dados/CURSOS_GERAL.csv");
        touch(dir.path(), "b/DADOS/CADASTRO_CURSOS.csv");

        let found = locate_delimited(dir.path(), &folders(), &prefs()).unwrap();
        assert_eq!(found.path.file_name().unwrap(), "CADASTRO_CURSOS.csv");
        assert_eq!(found.format, DataFormat::Delimited);
    }

    #[test]
    fn preference_is_independent_of_candidate_order() {
        let names = ["CADASTRO_CURSOS.csv", "CURSOS_GERAL.csv", "OUTRO.csv"];
        let orders = [[0, 1, 2], [2, 1, 0], [1, 2, 0], [2, 0, 1]];
        for order in orders {
            let candidates: Vec<PathBuf> = order
                .iter()
                .map(|&i| PathBuf::from("x/dados").join(names[i]))
                .collect();
            let chosen = choose_preferred(&candidates, &prefs()).unwrap();
            assert_eq!(chosen.file_name().unwrap(), "CADASTRO_CURSOS.csv");
        }
    }

    #[test]
    fn second_preference_then_first_match() {
        let with_cursos = vec![PathBuf::from("dados/IES.csv"), PathBuf::from("dados/cursos.csv")];
        assert_eq!(
            choose_preferred(&with_cursos, &prefs()).unwrap(),
            &PathBuf::from("dados/cursos.csv")
        );
        let neither = vec![PathBuf::from("dados/IES.csv"), PathBuf::from("dados/LOCAL.csv")];
        assert_eq!(
            choose_preferred(&neither, &prefs()).unwrap(),
            &PathBuf::from("dados/IES.csv")
        );
        assert!(choose_preferred(&[], &prefs()).is_none());
    }

    #[test]
    fn only_expected_folders_and_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "leia-me/CADASTRO_CURSOS.csv");
        touch(dir.path(), "dados/CADASTRO_CURSOS.txt");
        touch(dir.path(), "Dados/CADASTRO_CURSOS.csv");
        touch(dir.path(), "dados/CADASTRO_CURSOS.Csv");
        let err = locate_delimited(dir.path(), &folders(), &prefs()).unwrap_err();
        assert!(matches!(err, LocateError::NoDelimitedFile { .. }));

        touch(dir.path(), "x/y/MICRODADOS/IES.CSV");
        let found = locate_delimited(dir.path(), &folders(), &prefs()).unwrap();
        assert!(found.path.ends_with("x/y/MICRODADOS/IES.CSV"));
    }

    #[test]
    fn spreadsheet_first_match() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            locate_spreadsheet(dir.path()).unwrap_err(),
            LocateError::NoSpreadsheet(_)
        ));
        touch(dir.path(), "ind/leia.pdf");
        touch(dir.path(), "ind/b_trajetoria.xlsx");
        touch(dir.path(), "ind/a_trajetoria.XLSX");
        let found = locate_spreadsheet(dir.path()).unwrap();
        assert_eq!(found.path.file_name().unwrap(), "a_trajetoria.XLSX");
        assert_eq!(found.format, DataFormat::Spreadsheet);
    }
}
