//! Raw response accumulation and header inspection.
//!
//! Responses are kept as one undivided byte buffer (status line, headers and
//! body). The helpers here locate the header/body boundary and pull the few
//! header values the downloader cares about out of the header block.

use std::io::{ErrorKind, Read};

use super::error::{HttpError, HttpResult};

/// Initial capacity of a response buffer, and the socket read size.
pub const BASE_BUFFER_SIZE: usize = 1024;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

// =============================================================================
// Response Buffer
// =============================================================================

/// A complete raw HTTP response.
///
/// `len()` is always the exact number of bytes read from the peer. Capacity
/// starts at [`BASE_BUFFER_SIZE`] and doubles whenever the next read would
/// not fit, keeping the number of reallocations logarithmic in the size.
#[derive(Debug, Clone, Default)]
pub struct ResponseBuffer {
    data: Vec<u8>,
}

impl ResponseBuffer {
    /// Create an empty buffer with the base capacity.
    pub fn new() -> HttpResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(BASE_BUFFER_SIZE)
            .map_err(|_| HttpError::Allocation {
                requested: BASE_BUFFER_SIZE,
            })?;
        Ok(Self { data })
    }

    /// Read from `reader` until end-of-stream, appending everything.
    ///
    /// `host` is only used for error context.
    pub fn read_to_end_from<R: Read>(reader: &mut R, host: &str) -> HttpResult<Self> {
        let mut buffer = Self::new()?;
        let mut received = [0u8; BASE_BUFFER_SIZE];

        loop {
            let n = match reader.read(&mut received) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(HttpError::Io {
                        host: host.to_string(),
                        source: e,
                    })
                }
            };
            buffer.append(&received[..n])?;
        }

        Ok(buffer)
    }

    /// Append bytes, doubling capacity as many times as needed first.
    pub fn append(&mut self, bytes: &[u8]) -> HttpResult<()> {
        let needed = self.data.len() + bytes.len();
        if needed > self.data.capacity() {
            let mut target = self.data.capacity().max(BASE_BUFFER_SIZE);
            while target < needed {
                target = target.checked_mul(2).ok_or(HttpError::Allocation {
                    requested: usize::MAX,
                })?;
            }
            self.data
                .try_reserve_exact(target - self.data.len())
                .map_err(|_| HttpError::Allocation { requested: target })?;
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Number of bytes received.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing was received.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Currently allocated capacity.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// The whole raw response.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Offset of the first body byte; see [`body_offset`].
    pub fn body_offset(&self) -> usize {
        body_offset(&self.data)
    }

    /// The body: everything after the header terminator.
    pub fn body(&self) -> &[u8] {
        &self.data[self.body_offset()..]
    }

    /// The header block decoded lossily as text; see [`header_block`].
    pub fn header_text(&self) -> String {
        String::from_utf8_lossy(header_block(&self.data)).into_owned()
    }
}

impl From<Vec<u8>> for ResponseBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

// =============================================================================
// Header / Body Separation
// =============================================================================

fn find_terminator(raw: &[u8]) -> Option<usize> {
    raw.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

/// Index of the first content byte, just past the first CRLFCRLF.
///
/// A response without the terminator is treated as all content and yields 0.
pub fn body_offset(raw: &[u8]) -> usize {
    find_terminator(raw)
        .map(|pos| pos + HEADER_TERMINATOR.len())
        .unwrap_or(0)
}

/// The bytes before the first CRLFCRLF, or the whole buffer if there is none.
///
/// Scanning the whole buffer lets a truncated HEAD response still yield its
/// headers.
pub fn header_block(raw: &[u8]) -> &[u8] {
    match find_terminator(raw) {
        Some(pos) => &raw[..pos],
        None => raw,
    }
}

// =============================================================================
// Header Inspection
// =============================================================================

/// Iterate over `(name, value)` pairs of the header lines, skipping the status line.
fn header_fields(headers: &str) -> impl Iterator<Item = (&str, &str)> {
    headers
        .split('\n')
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim(), value.trim()))
}

fn header_value<'a>(headers: &'a str, name: &str) -> Option<&'a str> {
    header_fields(headers)
        .find(|(field, _)| field.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// Whether the server advertises `Accept-Ranges: bytes`.
pub fn accepts_ranges(headers: &str) -> bool {
    header_value(headers, "Accept-Ranges")
        .map(|value| {
            value
                .split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("bytes"))
        })
        .unwrap_or(false)
}

/// The advertised `Content-Length`, or 0 when absent or unparsable.
pub fn content_length(headers: &str) -> u64 {
    header_value(headers, "Content-Length")
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0)
}

/// The numeric status code from an `HTTP/x.y NNN reason` status line.
pub fn status_code(headers: &str) -> Option<u16> {
    let status_line = headers.lines().next()?;
    let mut parts = status_line.split_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEAD_RESPONSE: &str = "HTTP/1.0 200 OK\r\n\
        Server: test\r\n\
        Content-Length: 100000\r\n\
        Accept-Ranges: bytes\r\n\
        \r\n";

    #[test]
    fn test_body_offset_after_terminator() {
        let raw = b"HTTP/1.0 200 OK\r\nContent-Length: 5\r\n\r\nhello";
        let buffer = ResponseBuffer::from(raw.to_vec());
        assert_eq!(buffer.body(), b"hello");
        assert_eq!(buffer.body_offset(), raw.len() - 5);
    }

    #[test]
    fn test_missing_terminator_whole_buffer_is_body() {
        let raw = b"no headers here at all";
        assert_eq!(body_offset(raw), 0);
        let buffer = ResponseBuffer::from(raw.to_vec());
        assert_eq!(buffer.body(), raw);
    }

    #[test]
    fn test_body_may_contain_terminator() {
        let raw = b"HTTP/1.0 200 OK\r\n\r\nbody\r\n\r\nmore";
        assert_eq!(ResponseBuffer::from(raw.to_vec()).body(), b"body\r\n\r\nmore");
    }

    #[test]
    fn test_header_block_excludes_body() {
        let raw = b"HTTP/1.0 200 OK\r\nContent-Length: 3\r\n\r\nabc";
        assert_eq!(header_block(raw), b"HTTP/1.0 200 OK\r\nContent-Length: 3");
        assert_eq!(header_block(b"partial"), b"partial");
    }

    #[test]
    fn test_accepts_ranges() {
        assert!(accepts_ranges(HEAD_RESPONSE));
        assert!(accepts_ranges("HTTP/1.0 200 OK\r\naccept-ranges:BYTES\r\n"));
        assert!(!accepts_ranges("HTTP/1.0 200 OK\r\nAccept-Ranges: none\r\n"));
        assert!(!accepts_ranges("HTTP/1.0 200 OK\r\nContent-Length: 10\r\n"));
    }

    #[test]
    fn test_content_length() {
        assert_eq!(content_length(HEAD_RESPONSE), 100_000);
        assert_eq!(content_length("HTTP/1.0 200 OK\r\ncontent-length:  42 \r\n"), 42);
        assert_eq!(content_length("HTTP/1.0 200 OK\r\n"), 0);
        assert_eq!(content_length("HTTP/1.0 200 OK\r\nContent-Length: lots\r\n"), 0);
    }

    #[test]
    fn test_status_line_is_not_a_header() {
        assert_eq!(content_length("Content-Length: 9\r\n"), 0);
    }

    #[test]
    fn test_status_code() {
        assert_eq!(status_code(HEAD_RESPONSE), Some(200));
        assert_eq!(status_code("HTTP/1.1 206 Partial Content\r\n"), Some(206));
        assert_eq!(status_code("HTTP/1.0 404 Not Found"), Some(404));
        assert_eq!(status_code("garbage"), None);
        assert_eq!(status_code(""), None);
    }

    #[test]
    fn test_buffer_starts_at_base_capacity() {
        let buffer = ResponseBuffer::new().unwrap();
        assert!(buffer.is_empty());
        assert!(buffer.capacity() >= BASE_BUFFER_SIZE);
    }

    #[test]
    fn test_buffer_growth_doubles() {
        let mut buffer = ResponseBuffer::new().unwrap();
        let base = buffer.capacity();

        buffer.append(&vec![1u8; base]).unwrap();
        assert_eq!(buffer.len(), base);

        buffer.append(&[2u8]).unwrap();
        assert_eq!(buffer.len(), base + 1);
        assert!(buffer.capacity() >= base * 2);
        assert!(buffer.capacity() < base * 4);
    }

    #[test]
    fn test_read_to_end_keeps_exact_length() {
        let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let mut reader = Cursor::new(payload.clone());

        let buffer = ResponseBuffer::read_to_end_from(&mut reader, "test").unwrap();
        assert_eq!(buffer.len(), payload.len());
        assert_eq!(buffer.as_bytes(), payload.as_slice());
    }

    #[test]
    fn test_header_text_lossy() {
        let raw = b"HTTP/1.0 200 OK\r\nX-Odd: \xff\r\n\r\n";
        let text = ResponseBuffer::from(raw.to_vec()).header_text();
        assert!(text.starts_with("HTTP/1.0 200 OK"));
    }
}
