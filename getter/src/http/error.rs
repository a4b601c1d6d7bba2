//! Error types for the HTTP client.

use std::io;

use thiserror::Error;

/// Result type for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors that can occur while talking to a remote server.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The URL has no `/` separating host and path, or an unusable host.
    #[error("malformed url {url:?}: {reason}")]
    UrlFormat { url: String, reason: String },

    /// The host name did not resolve to an IPv4 address.
    #[error("could not resolve host {host}")]
    Resolution {
        host: String,
        #[source]
        source: Option<io::Error>,
    },

    /// The TCP connection could not be established.
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Reading from or writing to the socket failed.
    #[error("socket I/O failed while talking to {host}: {source}")]
    Io {
        host: String,
        #[source]
        source: io::Error,
    },

    /// The response buffer could not grow to hold the next read.
    #[error("out of memory growing response buffer to {requested} bytes")]
    Allocation { requested: usize },

    /// The server answered with a non-success status code.
    #[error("server responded with status {status}")]
    Status { status: u16 },
}
