//! Streamed HTTP GET of one archive to one local path.
//!
//! The body is written to disk chunk by chunk as libcurl delivers it, so
//! memory use does not depend on archive size. Transport failures and
//! non-2xx statuses are retried under the dataset's [`RetryPolicy`].

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::discovery::DownloadTarget;
use crate::retry::{self, ErrorKind, RetryPolicy, Retryable};

/// Chunk size handed to libcurl for the receive buffer.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Error returned by a single GET attempt.
#[derive(Debug)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Destination file could not be created or written. Not retried.
    Storage(io::Error),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Curl(e) => write!(f, "{}", e),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
            FetchError::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Curl(e) => Some(e),
            FetchError::Storage(e) => Some(e),
            FetchError::Http(_) => None,
        }
    }
}

impl Retryable for FetchError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            FetchError::Curl(e) => retry::classify_curl_error(e),
            FetchError::Http(code) => ErrorKind::HttpStatus(*code),
            FetchError::Storage(_) => ErrorKind::Fatal,
        }
    }
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        FetchError::Curl(e)
    }
}

/// Downloads one archive URL to one local path.
pub trait ArchiveFetcher {
    /// Returns the number of bytes written. On error no file is left at `dest`.
    fn fetch(&self, target: &DownloadTarget, dest: &Path) -> Result<u64, FetchError>;
}

/// libcurl-backed fetcher with bounded retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, request_timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            connect_timeout: Duration::from_secs(30),
            request_timeout,
            retry,
        }
    }

    /// One GET attempt. Truncates `dest` and streams the body into it.
    fn get_once(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let file = File::create(dest).map_err(FetchError::Storage)?;
        let mut out = BufWriter::with_capacity(CHUNK_SIZE, file);
        let mut written: u64 = 0;
        let mut write_err: Option<io::Error> = None;

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&self.user_agent)?;
        easy.buffer_size(CHUNK_SIZE)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.request_timeout)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match out.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_err = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            let performed = transfer.perform();
            drop(transfer);
            if let Some(e) = write_err.take() {
                return Err(FetchError::Storage(e));
            }
            performed?;
        }

        let code = easy.response_code()?;
        if let Some(ErrorKind::HttpStatus(code)) = retry::classify_http_status(code) {
            return Err(FetchError::Http(code));
        }

        out.flush().map_err(FetchError::Storage)?;
        Ok(written)
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(&self, target: &DownloadTarget, dest: &Path) -> Result<u64, FetchError> {
        tracing::info!("downloading {}", target.url);
        let result = retry::run_with_retry(&self.retry, |attempt| {
            tracing::debug!(attempt, url = %target.url, "GET");
            self.get_once(&target.url, dest)
        });
        match result {
            Ok(bytes) => {
                tracing::info!("download complete: {} bytes -> {}", bytes, dest.display());
                Ok(bytes)
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(dest) {
                    if rm.kind() != io::ErrorKind::NotFound {
                        tracing::warn!("could not remove partial {}: {}", dest.display(), rm);
                    }
                }
                Err(e)
            }
        }
    }
}
