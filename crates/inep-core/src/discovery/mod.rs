//! Link discovery: find the archive URL(s) for a year on a rendered page.
//!
//! Two implementations sit behind [`LinkDiscovery`]: [`SingleLinkDiscovery`]
//! looks for one anchor by its text, [`TabStripDiscovery`] pages through a
//! tab strip and harvests one archive link per matching tab. Page-scanning
//! helpers are plain functions over HTML so they can be tested without a
//! browser.

mod browser;
mod single;
mod tabs;

pub use browser::BrowserSession;
pub use single::SingleLinkDiscovery;
pub use tabs::TabStripDiscovery;

use anyhow::Result;
use scraper::{Html, Selector};

use crate::dataset::Year;
use crate::url_model;

/// One archive to download, as found on the page.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DownloadTarget {
    pub url: String,
    /// Local file name derived from the URL path.
    pub suggested_filename: String,
}

impl DownloadTarget {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            suggested_filename: url_model::derive_filename(url),
        }
    }
}

/// Finds the download targets for a year. An empty result means nothing was
/// found within the bounded waits; `Err` means the browser could not be used.
pub trait LinkDiscovery {
    fn discover(&mut self, year: Year) -> Result<Vec<DownloadTarget>>;
}

/// Returns true when a tab label has the form `"<text>-<year>"` and its
/// second half equals `year`. Labels with more or fewer than two
/// hyphen-separated parts never match.
pub fn tab_label_matches(label: &str, year: Year) -> bool {
    let mut parts = label.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(end), None) => end.trim() == year.to_string(),
        _ => false,
    }
}

/// First anchor in document order whose `href` contains `host` and ends with
/// `extension`.
pub fn first_archive_link(html: &str, host: &str, extension: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").ok()?;
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains(host) && href.ends_with(extension))
        .map(str::to_string)
}
