//! Classify HTTP status, curl errors and IO failures into retry kinds.

use std::io;

use crate::retry::policy::ErrorKind;

/// Errors that can tell the retry loop what kind of failure they are.
pub trait Retryable {
    fn error_kind(&self) -> ErrorKind;
}

/// Filesystem failures during cleanup are usually transient (open handles,
/// antivirus scans), so every IO error is treated as retryable.
impl Retryable for io::Error {
    fn error_kind(&self) -> ErrorKind {
        ErrorKind::FileBusy
    }
}

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> Option<ErrorKind> {
    match code {
        200..=299 => None,
        _ => Some(ErrorKind::HttpStatus(code)),
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Transport
}
