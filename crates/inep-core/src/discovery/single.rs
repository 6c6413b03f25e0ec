//! Single-link discovery: one anchor whose text names the dataset and the year.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use super::browser::BrowserSession;
use super::{DownloadTarget, LinkDiscovery};
use crate::config::AppConfig;
use crate::dataset::Year;
use crate::url_model;

/// Finds the census archive link for a year. On timeout, saves a screenshot
/// and page dump into `diagnostics_dir` and returns no link.
pub struct SingleLinkDiscovery {
    cfg: AppConfig,
    diagnostics_dir: PathBuf,
}

impl SingleLinkDiscovery {
    pub fn new(cfg: &AppConfig, diagnostics_dir: PathBuf) -> Self {
        Self {
            cfg: cfg.clone(),
            diagnostics_dir,
        }
    }
}

/// XPath for an anchor whose text contains both `phrase` and `year`.
pub fn link_xpath(phrase: &str, year: Year) -> String {
    format!(
        "//a[contains(text(), {}) and contains(text(), '{}')]",
        xpath_literal(phrase),
        year
    )
}

/// Quotes `s` as an XPath string literal, falling back to `concat()` when it
/// contains both quote kinds.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

impl LinkDiscovery for SingleLinkDiscovery {
    fn discover(&mut self, year: Year) -> Result<Vec<DownloadTarget>> {
        let browser_cfg = &self.cfg.browser;
        let page_url = &self.cfg.censo.page_url;
        let wait = Duration::from_secs(browser_cfg.element_wait_secs);

        let session = BrowserSession::open(browser_cfg, page_url)?;
        session.dismiss_cookie_banner(&browser_cfg.cookie_button_selector, wait);

        tracing::info!("looking for the {} download link", year);
        let xpath = link_xpath(&self.cfg.censo.link_phrase, year);
        let href = session
            .tab()
            .wait_for_xpath_with_custom_timeout(&xpath, wait)
            .and_then(|link| link.get_attribute_value("href"));

        match href {
            Ok(Some(href)) => match url_model::resolve_href(page_url, &href) {
                Some(url) => {
                    tracing::info!("link found: {}", url);
                    Ok(vec![DownloadTarget::new(&url)])
                }
                None => {
                    tracing::error!("download link has an unusable href {:?}", href);
                    Ok(Vec::new())
                }
            },
            Ok(None) => {
                tracing::error!("download link for {} has no href", year);
                Ok(Vec::new())
            }
            Err(e) => {
                tracing::error!("could not find the download link for {}", year);
                tracing::debug!("link wait: {:#}", e);
                if let Err(e) = session.save_diagnostics(&self.diagnostics_dir) {
                    tracing::warn!("could not save diagnostics: {:#}", e);
                }
                Ok(Vec::new())
            }
        }
    }
}
