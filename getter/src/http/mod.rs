//! Minimal blocking HTTP/1.0 client.
//!
//! This module provides just enough HTTP to plan and fetch byte ranges:
//! - URL splitting into host, port and path (`url`)
//! - Request framing with an optional `Range` header (`request`)
//! - Connection handling and response accumulation (`client`)
//! - Header/body separation and header inspection (`response`)
//!
//! # Example
//!
//! ```ignore
//! use getter::http::{accepts_ranges, content_length, split_url, HttpClient};
//!
//! let url = split_url("example.com/file.bin")?;
//! let response = HttpClient::new().head(&url)?;
//! let headers = response.header_text();
//!
//! println!("{} bytes, ranges: {}", content_length(&headers), accepts_ranges(&headers));
//! ```

mod client;
mod error;
mod request;
mod response;
mod url;

pub use client::{resolve, HttpClient};
pub use error::{HttpError, HttpResult};
pub use request::{build_request, ByteRange, Method};
pub use response::{
    accepts_ranges, body_offset, content_length, header_block, status_code, ResponseBuffer,
    BASE_BUFFER_SIZE,
};
pub use url::{split_url, RemoteUrl};

/// Port used when a URL does not name one.
pub const DEFAULT_PORT: u16 = 80;

/// `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = "getter";
