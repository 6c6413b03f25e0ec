//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body to every GET. Can be told to answer the first
//! N requests with a fixed error status, and counts the requests it handled.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct FileServerOptions {
    /// Number of leading requests answered with `failure_status`.
    pub fail_first: usize,
    pub failure_status: u16,
}

impl Default for FileServerOptions {
    fn default() -> Self {
        Self {
            fail_first: 0,
            failure_status: 503,
        }
    }
}

pub struct FileServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl FileServer {
    /// URL for `name` on this server.
    pub fn url(&self, name: &str) -> String {
        format!("{}{}", self.base_url, name)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `body`. The server runs
/// until the process exits.
pub fn start(body: Vec<u8>) -> FileServer {
    start_with_options(body, FileServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: FileServerOptions) -> FileServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let seen = counter.fetch_add(1, Ordering::SeqCst);
            thread::spawn(move || handle(stream, &body, seen < opts.fail_first, opts));
        }
    });
    FileServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        hits,
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Error",
    }
}

fn handle(mut stream: TcpStream, body: &[u8], fail: bool, opts: FileServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let method = std::str::from_utf8(&buf[..n])
        .ok()
        .and_then(|r| r.split_whitespace().next())
        .unwrap_or("");
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    if fail {
        let status = opts.failure_status;
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            status,
            reason(status)
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body);
}
