//! Integration test: HttpFetcher against a local server, including retries.

mod common;

use std::time::Duration;

use common::file_server::{self, FileServerOptions};
use inep_core::discovery::DownloadTarget;
use inep_core::fetch::{ArchiveFetcher, FetchError, HttpFetcher};
use inep_core::retry::RetryPolicy;
use tempfile::tempdir;

fn fetcher(max_attempts: u32) -> HttpFetcher {
    HttpFetcher::new(
        "inep-ufrj-tests",
        Duration::from_secs(10),
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        },
    )
}

#[test]
fn download_writes_body_to_destination() {
    let body: Vec<u8> = (0u8..=255).cycle().take(40 * 1024).collect();
    let server = file_server::start(body.clone());
    let dir = tempdir().unwrap();
    let target = DownloadTarget::new(&server.url("microdados_censo_2022.zip"));
    assert_eq!(target.suggested_filename, "microdados_censo_2022.zip");

    let dest = dir.path().join(&target.suggested_filename);
    let written = fetcher(3).fetch(&target, &dest).unwrap();

    assert_eq!(written, body.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert_eq!(server.hits(), 1);
}

#[test]
fn transient_failures_are_retried() {
    let server = file_server::start_with_options(
        b"PK-data".to_vec(),
        FileServerOptions {
            fail_first: 2,
            failure_status: 503,
        },
    );
    let dir = tempdir().unwrap();
    let target = DownloadTarget::new(&server.url("indicadores.zip"));
    let dest = dir.path().join("indicadores.zip");

    fetcher(3).fetch(&target, &dest).unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"PK-data");
    assert_eq!(server.hits(), 3);
}

#[test]
fn exhausted_retries_leave_no_partial_file() {
    let server = file_server::start_with_options(
        Vec::new(),
        FileServerOptions {
            fail_first: usize::MAX,
            failure_status: 404,
        },
    );
    let dir = tempdir().unwrap();
    let target = DownloadTarget::new(&server.url("missing.zip"));
    let dest = dir.path().join("missing.zip");

    let err = fetcher(2).fetch(&target, &dest).unwrap_err();

    assert!(matches!(err, FetchError::Http(404)), "got {err}");
    assert_eq!(server.hits(), 2);
    assert!(!dest.exists());
}
