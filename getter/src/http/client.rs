//! Blocking HTTP/1.0 client.
//!
//! Every request opens a fresh TCP connection, writes the request head and
//! reads until the server closes the connection. There is no keep-alive,
//! chunked decoding or redirect handling.

use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, trace};

use super::error::{HttpError, HttpResult};
use super::request::{build_request, ByteRange, Method};
use super::response::ResponseBuffer;
use super::url::RemoteUrl;
use super::DEFAULT_USER_AGENT;

/// Resolve `host` to its first IPv4 socket address on `port`.
pub fn resolve(host: &str, port: u16) -> HttpResult<SocketAddr> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| HttpError::Resolution {
            host: host.to_string(),
            source: Some(e),
        })?;

    addrs
        .into_iter()
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| HttpError::Resolution {
            host: host.to_string(),
            source: None,
        })
}

/// Minimal HTTP/1.0 client.
///
/// Cheap to clone; holds only settings. Without a timeout a stalled peer
/// blocks the calling thread indefinitely.
#[derive(Debug, Clone)]
pub struct HttpClient {
    pub(crate) timeout: Option<Duration>,
    pub(crate) user_agent: String,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Create a client with no timeout and the default user agent.
    pub fn new() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Apply a connect/read/write timeout to every socket.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Issue a HEAD request.
    pub fn head(&self, url: &RemoteUrl) -> HttpResult<ResponseBuffer> {
        self.request(url, Method::Head, None)
    }

    /// Issue a GET, ranged when `range` is given.
    pub fn get(&self, url: &RemoteUrl, range: Option<ByteRange>) -> HttpResult<ResponseBuffer> {
        self.request(url, Method::Get, range)
    }

    /// Send one request and return the raw, undivided response.
    pub fn request(
        &self,
        url: &RemoteUrl,
        method: Method,
        range: Option<ByteRange>,
    ) -> HttpResult<ResponseBuffer> {
        let addr = resolve(&url.host, url.port)?;
        let mut stream = self.connect(addr)?;

        let io_error = |source| HttpError::Io {
            host: url.host.clone(),
            source,
        };

        stream
            .set_read_timeout(self.timeout)
            .and_then(|_| stream.set_write_timeout(self.timeout))
            .map_err(io_error)?;

        let request = build_request(method, url, range, &self.user_agent);
        trace!(%addr, request = %request.trim_end(), "Sending request");
        stream.write_all(request.as_bytes()).map_err(io_error)?;
        stream.flush().map_err(io_error)?;

        let response = ResponseBuffer::read_to_end_from(&mut stream, &url.host)?;
        debug!(
            url = %url,
            method = %method,
            bytes = response.len(),
            "Response received"
        );
        Ok(response)
    }

    fn connect(&self, addr: SocketAddr) -> HttpResult<TcpStream> {
        let result = match self.timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        result.map_err(|source| HttpError::Connect { addr, source })
    }
}
