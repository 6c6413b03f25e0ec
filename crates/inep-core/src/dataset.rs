//! Dataset profiles and the validated year input.
//!
//! Each [`DatasetKind`] fixes where its scratch data lives, which output
//! subdirectory it writes to, which data format its archives carry and how
//! output files are named.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::config::AppConfig;
use crate::retry::RetryPolicy;
use crate::url_model::sanitize_filename;

/// A four-digit calendar year typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Year(u16);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid year {input:?}: expected exactly 4 digits (e.g. 2022)")]
pub struct YearError {
    pub input: String,
}

impl Year {
    pub fn value(self) -> u16 {
        self.0
    }
}

impl FromStr for Year {
    type Err = YearError;

    /// Accepts exactly four ASCII digits; surrounding whitespace is not trimmed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(YearError {
                input: s.to_string(),
            });
        }
        s.parse::<u16>().map(Year).map_err(|_| YearError {
            input: s.to_string(),
        })
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Layout of the tabular file inside an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// Semicolon-separated Latin-1 text.
    Delimited,
    /// `.xlsx` workbook, first sheet.
    Spreadsheet,
}

/// The two INEP datasets this tool harvests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// Censo da Educação Superior: one archive per year, found by link text.
    Censo,
    /// Indicadores de Trajetória: one archive per matching tab of a tab strip.
    Trajetoria,
}

/// Fetch parameters of one dataset kind.
#[derive(Debug, Clone, Copy)]
pub struct FetchProfile {
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl DatasetKind {
    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Censo => "censo",
            DatasetKind::Trajetoria => "trajetoria",
        }
    }

    pub fn data_format(self) -> DataFormat {
        match self {
            DatasetKind::Censo => DataFormat::Delimited,
            DatasetKind::Trajetoria => DataFormat::Spreadsheet,
        }
    }

    /// A fetch failure aborts the whole run only for the single-archive dataset.
    pub fn fetch_failure_aborts_run(self) -> bool {
        matches!(self, DatasetKind::Censo)
    }

    /// Scratch root directory name, e.g. `censo_superior_2022_temp`.
    pub fn scratch_dir_name(self, year: Year) -> String {
        match self {
            DatasetKind::Censo => format!("censo_superior_{year}_temp"),
            DatasetKind::Trajetoria => format!("dados_inep_{year}_temp"),
        }
    }

    pub fn output_dir(self, cfg: &AppConfig, base_dir: &Path) -> PathBuf {
        let subdir = match self {
            DatasetKind::Censo => &cfg.censo.output_subdir,
            DatasetKind::Trajetoria => &cfg.trajetoria.output_subdir,
        };
        base_dir.join(&cfg.output_root).join(subdir)
    }

    /// Output file name: by year for the census, by source file stem otherwise.
    pub fn output_file_name(self, cfg: &AppConfig, year: Year, source: &Path) -> String {
        let label = &cfg.institution_label;
        match self {
            DatasetKind::Censo => format!("{label}_CENSO_{year}.csv"),
            DatasetKind::Trajetoria => {
                let stem = source
                    .file_stem()
                    .map(|s| sanitize_filename(&s.to_string_lossy()))
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| format!("TRAJETORIA_{year}"));
                format!("{label}_{stem}.csv")
            }
        }
    }

    pub fn fetch_profile(self, cfg: &AppConfig) -> FetchProfile {
        let (timeout_secs, retry) = match self {
            DatasetKind::Censo => (cfg.censo.request_timeout_secs, &cfg.censo.retry),
            DatasetKind::Trajetoria => {
                (cfg.trajetoria.request_timeout_secs, &cfg.trajetoria.retry)
            }
        };
        FetchProfile {
            request_timeout: Duration::from_secs(timeout_secs),
            retry: retry.policy(),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_accepts_four_digits() {
        let y: Year = "2022".parse().unwrap();
        assert_eq!(y.value(), 2022);
        assert_eq!(y.to_string(), "2022");
        assert_eq!("0999".parse::<Year>().unwrap().to_string(), "0999");
    }

    #[test]
    fn year_rejects_other_shapes() {
        for bad in ["", "22", "20222", "20a2", " 2022", "2022 ", "-202", "２０２２"] {
            assert!(bad.parse::<Year>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn scratch_dir_names() {
        let y: Year = "2024".parse().unwrap();
        assert_eq!(
            DatasetKind::Censo.scratch_dir_name(y),
            "censo_superior_2024_temp"
        );
        assert_eq!(
            DatasetKind::Trajetoria.scratch_dir_name(y),
            "dados_inep_2024_temp"
        );
    }

    #[test]
    fn output_names_and_dirs() {
        let cfg = AppConfig::default();
        let y: Year = "2022".parse().unwrap();
        assert_eq!(
            DatasetKind::Censo.output_file_name(&cfg, y, Path::new("x/MICRODADOS_CADASTRO_CURSOS_2022.CSV")),
            "UFRJ_CENSO_2022.csv"
        );
        assert_eq!(
            DatasetKind::Trajetoria.output_file_name(&cfg, y, Path::new("x/indicadores_trajetoria_2013_2022.xlsx")),
            "UFRJ_indicadores_trajetoria_2013_2022.csv"
        );
        assert_eq!(
            DatasetKind::Censo.output_dir(&cfg, Path::new("/work")),
            PathBuf::from("/work/DADOS_ES_UFRJ/censo_es_ufrj")
        );
        assert_eq!(
            DatasetKind::Trajetoria.output_dir(&cfg, Path::new("/work")),
            PathBuf::from("/work/DADOS_ES_UFRJ/indicadores_trajetoria_ufrj")
        );
    }

    #[test]
    fn fetch_profiles_differ_by_dataset() {
        let cfg = AppConfig::default();
        let censo = DatasetKind::Censo.fetch_profile(&cfg);
        let traj = DatasetKind::Trajetoria.fetch_profile(&cfg);
        assert_eq!(censo.request_timeout, Duration::from_secs(120));
        assert_eq!(censo.retry.delay, Duration::from_secs(10));
        assert_eq!(traj.request_timeout, Duration::from_secs(45));
        assert_eq!(traj.retry.delay, Duration::from_secs(5));
        assert_eq!(traj.retry.max_attempts, 3);
    }
}
