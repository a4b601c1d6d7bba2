//! Splitting `host/path` URLs into their request components.

use std::fmt;

use super::error::{HttpError, HttpResult};
use super::DEFAULT_PORT;

const HTTP_SCHEME: &str = "http://";

/// A URL broken into the pieces needed to issue a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    /// Host name or IPv4 literal, without port.
    pub host: String,
    /// TCP port, 80 unless the URL names one.
    pub port: u16,
    /// Request path, always beginning with `/`.
    pub path: String,
}

impl RemoteUrl {
    /// Value for the `Host` request header.
    pub fn authority(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.authority(), self.path)
    }
}

/// Split a URL of the form `host[:port]/path` on its first `/`.
///
/// A leading `http://` is accepted and ignored. URLs without a path separator
/// are rejected, as are `https://` URLs (there is no TLS support).
pub fn split_url(url: &str) -> HttpResult<RemoteUrl> {
    let malformed = |reason: &str| HttpError::UrlFormat {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = url.trim();
    if trimmed
        .get(..8)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("https://"))
    {
        return Err(malformed("https is not supported"));
    }
    let rest = match trimmed.get(..HTTP_SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(HTTP_SCHEME) => &trimmed[HTTP_SCHEME.len()..],
        _ => trimmed,
    };

    let slash = rest
        .find('/')
        .ok_or_else(|| malformed("no path component"))?;
    let (authority, path) = rest.split_at(slash);

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| malformed("invalid port"))?;
            (host, port)
        }
        None => (authority, DEFAULT_PORT),
    };

    if host.is_empty() {
        return Err(malformed("empty host"));
    }

    Ok(RemoteUrl {
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}
