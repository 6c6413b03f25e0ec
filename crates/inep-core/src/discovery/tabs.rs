//! Tab-strip discovery: page through a tab strip, collect the tabs whose label
//! ends in the requested year, then visit each one and take its archive link.

use anyhow::Result;
use std::collections::BTreeSet;
use std::time::Duration;

use super::browser::{js_click, BrowserSession};
use super::{first_archive_link, tab_label_matches, DownloadTarget, LinkDiscovery};
use crate::config::AppConfig;
use crate::dataset::Year;
use crate::url_model;

pub struct TabStripDiscovery {
    cfg: AppConfig,
}

impl TabStripDiscovery {
    pub fn new(cfg: &AppConfig) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Labels of the tabs currently in the DOM, in page order. Tabs whose text
    /// cannot be read (detached while paging) are skipped.
    fn visible_labels(&self, session: &BrowserSession) -> Vec<String> {
        let selector = &self.cfg.trajetoria.tab_selector;
        match session.tab().find_elements(selector) {
            Ok(tabs) => tabs
                .iter()
                .filter_map(|t| t.get_inner_text().ok())
                .filter(|text| !text.is_empty())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Walks the tab strip pages and returns the matching labels, sorted and deduplicated.
    fn collect_labels(&self, session: &BrowserSession, year: Year) -> BTreeSet<String> {
        let browser_cfg = &self.cfg.browser;
        let next_selector = &self.cfg.trajetoria.next_button_selector;
        let next_wait = Duration::from_secs(browser_cfg.pagination_wait_secs);
        let page_settle = Duration::from_millis(browser_cfg.page_settle_millis);

        let mut matched = BTreeSet::new();
        let mut previous_page: Option<Vec<String>> = None;

        for page in 1..=browser_cfg.max_tab_pages.max(1) {
            let labels = match changed_labels(
                previous_page.as_ref(),
                || self.visible_labels(session),
                || std::thread::sleep(page_settle),
            ) {
                Some(labels) => labels,
                None => {
                    tracing::debug!(page, "tab strip did not change, stopping");
                    break;
                }
            };
            for label in &labels {
                if tab_label_matches(label, year) && matched.insert(label.clone()) {
                    tracing::info!("matching tab found: '{}'", label);
                }
            }
            previous_page = Some(labels);

            let advanced = session
                .tab()
                .wait_for_element_with_custom_timeout(next_selector, next_wait)
                .and_then(|next| js_click(&next));
            if advanced.is_err() {
                tracing::debug!(page, "no further tab pages");
                break;
            }
            std::thread::sleep(page_settle);
        }
        matched
    }

    /// Clicks the tab labelled `label` and returns the first archive href on the rendered page.
    fn archive_link_for_tab(&self, session: &BrowserSession, label: &str) -> Result<Option<String>> {
        let traj = &self.cfg.trajetoria;
        let tabs = session.tab().find_elements(&traj.tab_selector)?;
        let tab = tabs
            .iter()
            .find(|t| t.get_inner_text().map(|text| text == label).unwrap_or(false))
            .ok_or_else(|| anyhow::anyhow!("tab '{}' is no longer on the page", label))?;

        tracing::info!("opening tab '{}'", label);
        js_click(tab)?;
        session.settle();

        let html = session.page_source()?;
        Ok(first_archive_link(&html, &traj.download_host, &traj.archive_extension))
    }
}

/// Reads the strip's labels. If they equal `previous`, waits once and reads
/// again; `None` means the strip still shows the same page.
fn changed_labels<R, W>(
    previous: Option<&Vec<String>>,
    mut read: R,
    mut wait: W,
) -> Option<Vec<String>>
where
    R: FnMut() -> Vec<String>,
    W: FnMut(),
{
    let labels = read();
    if previous != Some(&labels) {
        return Some(labels);
    }
    wait();
    let labels = read();
    (previous != Some(&labels)).then_some(labels)
}

impl LinkDiscovery for TabStripDiscovery {
    fn discover(&mut self, year: Year) -> Result<Vec<DownloadTarget>> {
        let browser_cfg = &self.cfg.browser;
        let page_url = &self.cfg.trajetoria.page_url;

        let session = BrowserSession::open(browser_cfg, page_url)?;
        session.dismiss_cookie_banner(
            &browser_cfg.cookie_button_selector,
            Duration::from_secs(browser_cfg.element_wait_secs),
        );

        tracing::info!("looking for tabs whose final year is {}", year);
        let labels = self.collect_labels(&session, year);
        if labels.is_empty() {
            tracing::warn!("no tab with final year {} was found", year);
            return Ok(Vec::new());
        }

        tracing::info!("collecting links from {} tab(s)", labels.len());
        let mut urls = BTreeSet::new();
        for label in &labels {
            match self.archive_link_for_tab(&session, label) {
                Ok(Some(href)) => match url_model::resolve_href(page_url, &href) {
                    Some(url) => {
                        tracing::info!("link found: {}", url);
                        urls.insert(url);
                    }
                    None => tracing::warn!("tab '{}': unusable href {:?}", label, href),
                },
                Ok(None) => tracing::warn!("tab '{}': no archive link on the page", label),
                Err(e) => tracing::error!("tab '{}': {:#}", label, e),
            }
        }

        Ok(urls.iter().map(|u| DownloadTarget::new(u)).collect())
    }
}
