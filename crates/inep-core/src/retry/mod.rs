//! Bounded retry with a fixed delay.
//!
//! Shared by the archive fetcher and scratch cleanup: errors classify
//! themselves into an [`ErrorKind`], the [`RetryPolicy`] decides whether and
//! when to try again, and [`run_with_retry`] drives the loop.

mod classify;
mod policy;
mod run;

pub use classify::{classify_curl_error, classify_http_status, Retryable};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
