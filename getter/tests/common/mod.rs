//! In-process HTTP/1.0 server for integration tests.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

/// How the server answers requests for its one resource.
#[derive(Debug, Clone)]
pub struct ServerBehavior {
    /// Advertise `Accept-Ranges: bytes` on HEAD.
    pub accept_ranges: bool,
    /// Report `Content-Length` on HEAD.
    pub content_length: bool,
    /// Answer ranged GETs with just the requested bytes.
    pub honour_range: bool,
    /// Answer GETs whose range starts here with `500`.
    pub fail_range_start: Option<u64>,
}

impl Default for ServerBehavior {
    fn default() -> Self {
        Self {
            accept_ranges: true,
            content_length: true,
            honour_range: true,
            fail_range_start: None,
        }
    }
}

/// A request as seen by the server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub range: Option<(u64, u64)>,
    pub head: String,
}

/// Serves `payload` at `path` until dropped. Any other path gets `404`.
pub struct TestServer {
    port: u16,
    path: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    stop: Arc<AtomicBool>,
    acceptor: Option<JoinHandle<()>>,
}

impl TestServer {
    pub fn start(path: &str, payload: Vec<u8>, behavior: ServerBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let payload = Arc::new(payload);

        let acceptor = {
            let path = path.to_string();
            let requests = Arc::clone(&requests);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                for stream in listener.incoming() {
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                    let Ok(stream) = stream else { continue };
                    let path = path.clone();
                    let payload = Arc::clone(&payload);
                    let requests = Arc::clone(&requests);
                    let behavior = behavior.clone();
                    thread::spawn(move || {
                        handle_connection(stream, &path, &payload, &behavior, &requests)
                    });
                }
            })
        };

        Self {
            port,
            path: path.to_string(),
            requests,
            stop,
            acceptor: Some(acceptor),
        }
    }

    /// URL of the served resource, without scheme.
    pub fn url(&self) -> String {
        format!("127.0.0.1:{}{}", self.port, self.path)
    }

    /// URL of a path this server does not serve.
    pub fn missing_url(&self) -> String {
        format!("127.0.0.1:{}/missing.bin", self.port)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn gets(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "GET")
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // Wake the acceptor so it sees the flag.
        let _ = TcpStream::connect(("127.0.0.1", self.port));
        if let Some(acceptor) = self.acceptor.take() {
            let _ = acceptor.join();
        }
    }
}

fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(0) | Err(_) => return None,
            Ok(_) => head.push(byte[0]),
        }
    }
    String::from_utf8(head).ok()
}

fn parse_range(head: &str) -> Option<(u64, u64)> {
    let value = head
        .lines()
        .find_map(|line| line.strip_prefix("Range: bytes="))?;
    let (start, end) = value.trim().split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

fn handle_connection(
    mut stream: TcpStream,
    served_path: &str,
    payload: &[u8],
    behavior: &ServerBehavior,
    requests: &Mutex<Vec<RecordedRequest>>,
) {
    let Some(head) = read_head(&mut stream) else {
        return;
    };
    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let range = parse_range(&head);

    requests.lock().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        range,
        head: head.clone(),
    });

    let mut response = Vec::new();
    if path != served_path {
        response.extend_from_slice(b"HTTP/1.0 404 Not Found\r\n\r\nnot found");
    } else if method == "HEAD" {
        response.extend_from_slice(b"HTTP/1.0 200 OK\r\n");
        if behavior.content_length {
            response
                .extend_from_slice(format!("Content-Length: {}\r\n", payload.len()).as_bytes());
        }
        if behavior.accept_ranges {
            response.extend_from_slice(b"Accept-Ranges: bytes\r\n");
        }
        response.extend_from_slice(b"\r\n");
    } else if range.is_some() && range.map(|(start, _)| start) == behavior.fail_range_start {
        response.extend_from_slice(b"HTTP/1.0 500 Internal Server Error\r\n\r\n");
    } else {
        match range {
            Some((start, end)) if behavior.honour_range => {
                let end = (end as usize).min(payload.len() - 1);
                let body = &payload[start as usize..=end];
                response.extend_from_slice(b"HTTP/1.0 206 Partial Content\r\n");
                response.extend_from_slice(
                    format!(
                        "Content-Range: bytes {}-{}/{}\r\nContent-Length: {}\r\n\r\n",
                        start,
                        end,
                        payload.len(),
                        body.len()
                    )
                    .as_bytes(),
                );
                response.extend_from_slice(body);
            }
            _ => {
                response.extend_from_slice(b"HTTP/1.0 200 OK\r\n");
                response.extend_from_slice(
                    format!("Content-Length: {}\r\n\r\n", payload.len()).as_bytes(),
                );
                response.extend_from_slice(payload);
            }
        }
    }

    let _ = stream.write_all(&response);
    let _ = stream.shutdown(Shutdown::Write);
}

/// Deterministic payload of `len` bytes.
pub fn patterned_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
