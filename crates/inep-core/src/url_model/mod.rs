//! URL modeling: archive file names and href resolution.
//!
//! Derives safe local filenames from the URL path and turns anchor hrefs
//! scraped from a rendered page into absolute URLs.

mod path;
mod sanitize;

pub use path::{filename_from_url_path, resolve_href};
pub use sanitize::sanitize_filename;

/// Default filename when the URL path yields nothing usable.
const DEFAULT_FILENAME: &str = "download.zip";

/// Derives a safe filename for saving a downloaded archive.
///
/// Uses the last path segment of `url`, sanitized (no separators, control or
/// reserved characters; no leading/trailing dots or spaces).
///
/// # Examples
///
/// - `derive_filename("https://download.inep.gov.br/microdados/microdados_censo_da_educacao_superior_2022.zip")`
///   → `"microdados_censo_da_educacao_superior_2022.zip"`
/// - `derive_filename("https://example.com/")` → `"download.zip"`
pub fn derive_filename(url: &str) -> String {
    let raw = match filename_from_url_path(url) {
        Some(c) => c,
        None => return DEFAULT_FILENAME.to_string(),
    };

    let sanitized = sanitize_filename(&raw);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized
    }
}
