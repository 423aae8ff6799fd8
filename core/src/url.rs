//! URL decomposition into scheme, host and path.
//!
//! # Design
//! The split is purely textual: segments are separated by `/`, the scheme is
//! everything before the first `:`, the host is the third segment and the
//! path is whatever follows that host. No percent-decoding or query parsing
//! happens here; the path is sent on the wire exactly as given.

use std::fmt;

use crate::error::HttpError;

/// Transport scheme of an [`Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// Port used when the URL does not name one.
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    fn parse(text: &str) -> Result<Self, HttpError> {
        match text {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(HttpError::UnsupportedScheme(other.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The decomposed target of a request. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    path: String,
    port: u16,
}

impl Endpoint {
    /// Decompose `url` into scheme, host and path.
    ///
    /// Fails with [`HttpError::MalformedUrl`] when the URL has fewer than three
    /// `/`-separated segments or an empty host, and with
    /// [`HttpError::UnsupportedScheme`] for anything but `http` and `https`.
    pub fn parse(url: &str) -> Result<Self, HttpError> {
        let segments: Vec<&str> = url.splitn(4, '/').collect();
        if segments.len() < 3 {
            return Err(HttpError::MalformedUrl(format!(
                "expected scheme://host/path, got `{url}`"
            )));
        }
        let host = segments[2];
        if host.is_empty() {
            return Err(HttpError::MalformedUrl(format!("missing host in `{url}`")));
        }

        let scheme_text = url.split_once(':').map_or(url, |(scheme, _)| scheme);
        let scheme = Scheme::parse(scheme_text)?;

        // The host segment starts right after the first two separators.
        let host_start = segments[0].len() + segments[1].len() + 2;
        let path = url[host_start + host.len()..].to_string();

        let port = match split_port(host).1 {
            Some(port) => port.parse::<u16>().map_err(|_| {
                HttpError::MalformedUrl(format!("invalid port `{port}` in `{url}`"))
            })?,
            None => scheme.default_port(),
        };

        Ok(Self {
            scheme,
            host: host.to_string(),
            path,
            port,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The host segment as written in the URL, port included. Sent as the
    /// `Host` header and used as the connection table key.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The host without any port or IPv6 brackets, for DNS and TLS SNI.
    pub fn hostname(&self) -> &str {
        let name = split_port(&self.host).0;
        name.strip_prefix('[')
            .and_then(|n| n.strip_suffix(']'))
            .unwrap_or(name)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Everything after the host, exactly as it appeared in the URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request-target for the request line; an empty path becomes `/`.
    pub fn request_target(&self) -> &str {
        if self.path.is_empty() {
            "/"
        } else {
            &self.path
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)
    }
}

/// Split `host:port`, leaving bare IPv6 literals such as `[::1]` intact.
fn split_port(host: &str) -> (&str, Option<&str>) {
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') || name.ends_with(']') => (name, Some(port)),
        _ => (host, None),
    }
}
