use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Prefix for XDG config/state directories and the log file name.
pub const APP_NAME: &str = "inep-ufrj";

/// Retry parameters for one bounded-retry loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Fixed delay in seconds between attempts.
    pub delay_secs: f64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            delay: Duration::from_secs_f64(self.delay_secs.max(0.0)),
        }
    }
}

/// Headless browser settings shared by both discovery variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    /// Explicit Chrome/Chromium binary; autodetected when unset.
    pub chrome_path: Option<PathBuf>,
    /// Bounded wait for the cookie banner and the censo download link.
    pub element_wait_secs: u64,
    /// Bounded wait for the tab strip "next" control.
    pub pagination_wait_secs: u64,
    /// Pause after clicking the cookie banner or a tab.
    pub settle_millis: u64,
    /// Pause after clicking the "next" control.
    pub page_settle_millis: u64,
    /// Upper bound on tab strip pages visited.
    pub max_tab_pages: u32,
    pub cookie_button_selector: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            element_wait_secs: 20,
            pagination_wait_secs: 2,
            settle_millis: 2000,
            page_settle_millis: 1000,
            max_tab_pages: 50,
            cookie_button_selector: "button.br-button.secondary.small.btn-accept".to_string(),
        }
    }
}

/// Censo da Educação Superior (single archive, semicolon CSV).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CensoConfig {
    pub page_url: String,
    /// Text the download anchor must contain alongside the year.
    pub link_phrase: String,
    pub output_subdir: String,
    /// Folder names (exact case) that hold the data CSVs inside the archive.
    pub data_dirs: Vec<String>,
    /// File name substrings, highest priority first.
    pub preferred_names: Vec<String>,
    pub request_timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for CensoConfig {
    fn default() -> Self {
        Self {
            page_url: "https://www.gov.br/inep/pt-br/acesso-a-informacao/dados-abertos/microdados/censo-da-educacao-superior".to_string(),
            link_phrase: "Microdados do Censo da Educação Superior".to_string(),
            output_subdir: "censo_es_ufrj".to_string(),
            data_dirs: ["dados", "DADOS", "microdados", "MICRODADOS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preferred_names: vec!["CADASTRO_CURSOS".to_string(), "CURSOS".to_string()],
            request_timeout_secs: 120,
            retry: RetryConfig {
                max_attempts: 3,
                delay_secs: 10.0,
            },
        }
    }
}

/// Indicadores de Trajetória (tab strip, one archive per cohort, xlsx).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajetoriaConfig {
    pub page_url: String,
    pub tab_selector: String,
    pub next_button_selector: String,
    /// Substring an archive href must contain.
    pub download_host: String,
    pub archive_extension: String,
    pub output_subdir: String,
    /// Banner rows above the header row of the first worksheet.
    pub skip_rows: usize,
    pub request_timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for TrajetoriaConfig {
    fn default() -> Self {
        Self {
            page_url: "https://www.gov.br/inep/pt-br/acesso-a-informacao/dados-abertos/indicadores-educacionais/indicadores-de-trajetoria-da-educacao-superior".to_string(),
            tab_selector: "div.govbr-tabs div.tab a".to_string(),
            next_button_selector: "div.govbr-tabs div.button-next".to_string(),
            download_host: "download.inep.gov.br".to_string(),
            archive_extension: ".zip".to_string(),
            output_subdir: "indicadores_trajetoria_ufrj".to_string(),
            skip_rows: 8,
            request_timeout_secs: 45,
            retry: RetryConfig {
                max_attempts: 3,
                delay_secs: 5.0,
            },
        }
    }
}

/// Scratch removal policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub retry: RetryConfig,
    /// Fall back to `rmdir /s /q` (Windows) or `rm -rf` when retries are exhausted.
    pub os_fallback: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig {
                max_attempts: 5,
                delay_secs: 3.0,
            },
            os_fallback: true,
        }
    }
}

/// Global configuration loaded from `~/.config/inep-ufrj/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Value of the key column identifying the institution.
    pub institution_code: i64,
    /// Short name used in output file names.
    pub institution_label: String,
    pub key_column: String,
    /// Output tree root, relative to the working directory unless absolute.
    pub output_root: PathBuf,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub browser: BrowserConfig,
    pub censo: CensoConfig,
    pub trajetoria: TrajetoriaConfig,
    pub cleanup: CleanupConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            institution_code: 586,
            institution_label: "UFRJ".to_string(),
            key_column: "CO_IES".to_string(),
            output_root: PathBuf::from("DADOS_ES_UFRJ"),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36".to_string(),
            connect_timeout_secs: 30,
            browser: BrowserConfig::default(),
            censo: CensoConfig::default(),
            trajetoria: TrajetoriaConfig::default(),
            cleanup: CleanupConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_NAME)?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AppConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: AppConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.institution_code, 586);
        assert_eq!(cfg.key_column, "CO_IES");
        assert_eq!(cfg.output_root, PathBuf::from("DADOS_ES_UFRJ"));
        assert_eq!(cfg.censo.retry.max_attempts, 3);
        assert_eq!(cfg.trajetoria.skip_rows, 8);
        assert_eq!(cfg.cleanup.retry.max_attempts, 5);
        assert_eq!(cfg.browser.element_wait_secs, 20);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: AppConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.institution_code, cfg.institution_code);
        assert_eq!(parsed.censo.page_url, cfg.censo.page_url);
        assert_eq!(parsed.censo.preferred_names, cfg.censo.preferred_names);
        assert_eq!(parsed.trajetoria.download_host, cfg.trajetoria.download_host);
        assert_eq!(parsed.cleanup.retry, cfg.cleanup.retry);
    }

    #[test]
    fn config_toml_partial_keeps_defaults() {
        let toml = r#"
            institution_code = 123
            institution_label = "UFF"

            [trajetoria.retry]
            max_attempts = 4
            delay_secs = 0.5
        "#;
        let cfg: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.institution_code, 123);
        assert_eq!(cfg.institution_label, "UFF");
        assert_eq!(cfg.key_column, "CO_IES");
        assert_eq!(cfg.trajetoria.retry.max_attempts, 4);
        assert_eq!(cfg.trajetoria.skip_rows, 8);
        assert_eq!(cfg.censo.retry.max_attempts, 3);
        assert!(cfg.browser.headless);
    }

    #[test]
    fn retry_config_policy_clamps() {
        let rc = RetryConfig {
            max_attempts: 0,
            delay_secs: -1.0,
        };
        let p = rc.policy();
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.delay, Duration::ZERO);
    }
}
