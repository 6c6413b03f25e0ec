//! Headless Chrome session held for the duration of link discovery.
//!
//! The session owns the browser process; dropping it closes the tab and
//! kills Chrome, so every exit path of discovery tears the browser down.

use anyhow::{anyhow, Context, Result};
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::BrowserConfig;

pub const SCREENSHOT_FILE: &str = "debug_screenshot.png";
pub const PAGE_SOURCE_FILE: &str = "debug_page_source.html";

pub struct BrowserSession {
    // Declared before `browser` so the tab handle is released first.
    tab: Arc<Tab>,
    browser: Browser,
    settle: Duration,
}

impl BrowserSession {
    /// Launches Chrome and opens `url` in a fresh tab.
    pub fn open(cfg: &BrowserConfig, url: &str) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(cfg.headless)
            .window_size(Some((1920, 1080)))
            .path(cfg.chrome_path.clone())
            .idle_browser_timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| anyhow!("invalid browser launch options: {}", e))?;

        let browser = Browser::new(options).context("failed to launch headless Chrome")?;
        let tab = browser.new_tab().context("failed to open browser tab")?;
        tab.set_default_timeout(Duration::from_secs(cfg.element_wait_secs.max(1)));

        tracing::info!("opening {}", url);
        tab.navigate_to(url)
            .with_context(|| format!("failed to navigate to {}", url))?;
        tab.wait_until_navigated().context("page failed to load")?;

        Ok(Self {
            tab,
            browser,
            settle: Duration::from_millis(cfg.settle_millis),
        })
    }

    pub fn tab(&self) -> &Tab {
        &self.tab
    }

    pub fn settle(&self) {
        std::thread::sleep(self.settle);
    }

    /// Clicks the cookie-consent button if it shows up within `wait`.
    /// Returns whether a banner was dismissed; absence is not an error.
    pub fn dismiss_cookie_banner(&self, selector: &str, wait: Duration) -> bool {
        let clicked = self
            .tab
            .wait_for_element_with_custom_timeout(selector, wait)
            .and_then(|button| js_click(&button));
        match clicked {
            Ok(()) => {
                tracing::debug!("cookie banner dismissed");
                self.settle();
                true
            }
            Err(e) => {
                tracing::info!("cookie banner not found, continuing");
                tracing::debug!("cookie banner: {:#}", e);
                false
            }
        }
    }

    /// Rendered DOM of the current page.
    pub fn page_source(&self) -> Result<String> {
        self.tab.get_content().context("failed to read page content")
    }

    /// Writes a screenshot and the rendered page source into `dir`.
    /// These files are left in place for diagnosis.
    pub fn save_diagnostics(&self, dir: &Path) -> Result<()> {
        let png = self
            .tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .context("failed to capture screenshot")?;
        let screenshot = dir.join(SCREENSHOT_FILE);
        fs::write(&screenshot, png)
            .with_context(|| format!("write {}", screenshot.display()))?;

        let html = self.page_source()?;
        let source = dir.join(PAGE_SOURCE_FILE);
        fs::write(&source, html).with_context(|| format!("write {}", source.display()))?;

        tracing::warn!(
            "diagnostics saved to {} and {}",
            screenshot.display(),
            source.display()
        );
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        tracing::info!("link discovery finished, closing the browser");
        let _ = self.tab.close(false);
        tracing::debug!("browser process {:?} terminating", self.browser.get_process_id());
    }
}

/// Clicks through JavaScript so overlays covering the element do not intercept it.
pub(super) fn js_click(element: &Element<'_>) -> Result<()> {
    element
        .call_js_fn("function() { this.click(); }", vec![], false)
        .map(|_| ())
}
