//! Request framing: methods, byte ranges and the HTTP/1.0 request head.

use std::fmt;

use super::url::RemoteUrl;

/// Request methods the downloader issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "range start {} past end {}", start, end);
        Self { start, end }
    }

    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `Range` header value. HTTP ranges are inclusive, so the last byte
    /// requested is `end - 1`.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end.saturating_sub(1))
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Render the request head for `method` on `url`.
///
/// The `Range` header is only sent for a GET that carries a range.
pub fn build_request(
    method: Method,
    url: &RemoteUrl,
    range: Option<ByteRange>,
    user_agent: &str,
) -> String {
    let mut request = format!(
        "{} {} HTTP/1.0\r\nHost: {}\r\n",
        method,
        url.path,
        url.authority()
    );
    if let (Method::Get, Some(range)) = (method, range) {
        request.push_str(&format!("Range: {}\r\n", range.header_value()));
    }
    request.push_str(&format!("User-Agent: {}\r\n\r\n", user_agent));
    request
}
