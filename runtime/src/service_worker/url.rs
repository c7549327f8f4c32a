//! Request URL handling
//!
//! Minimal URL parsing for routing fetch events: scheme, host, origin and
//! path resolution against the worker's origin.

use alloc::format;
use alloc::string::{String, ToString};

/// URL parse error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    /// No `scheme:` prefix
    MissingScheme,
    /// Port is not a number
    InvalidPort,
}

impl core::fmt::Display for UrlError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UrlError::MissingScheme => write!(f, "missing scheme"),
            UrlError::InvalidPort => write!(f, "invalid port"),
        }
    }
}

/// Parsed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    /// Lowercased scheme without the trailing `:`.
    pub scheme: String,
    /// Lowercased host name (empty for opaque URLs).
    pub host: String,
    /// Explicit port, if one was given.
    pub port: Option<u16>,
    /// Path, `/` when empty.
    pub path: String,
    /// Query string without `?`.
    pub query: Option<String>,
    /// Fragment without `#`.
    pub fragment: Option<String>,
}

impl Url {
    /// Parse an absolute URL.
    pub fn parse(url: &str) -> Result<Self, UrlError> {
        let url = url.trim();

        let colon = url.find(':').ok_or(UrlError::MissingScheme)?;
        let scheme = &url[..colon];
        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        {
            return Err(UrlError::MissingScheme);
        }
        let scheme = scheme.to_ascii_lowercase();
        let rest = &url[colon + 1..];

        // Opaque URLs (`data:`, `blob:`) carry no authority
        let (host_port, path_query) = match rest.strip_prefix("//") {
            Some(rest) => match rest.find(|c| c == '/' || c == '?' || c == '#') {
                Some(pos) => (&rest[..pos], &rest[pos..]),
                None => (rest, ""),
            },
            None => ("", rest),
        };

        // Userinfo (`user:pass@`) plays no part in routing
        let host_port = match host_port.rfind('@') {
            Some(pos) => &host_port[pos + 1..],
            None => host_port,
        };

        let (host, port) = match host_port.rfind(':') {
            Some(pos) if !host_port.ends_with(']') => {
                let port = host_port[pos + 1..]
                    .parse::<u16>()
                    .map_err(|_| UrlError::InvalidPort)?;
                (&host_port[..pos], Some(port))
            }
            _ => (host_port, None),
        };

        let (path_query, fragment) = match path_query.find('#') {
            Some(pos) => (&path_query[..pos], Some(path_query[pos + 1..].to_string())),
            None => (path_query, None),
        };

        let (path, query) = match path_query.find('?') {
            Some(pos) => (&path_query[..pos], Some(path_query[pos + 1..].to_string())),
            None => (path_query, None),
        };

        Ok(Self {
            scheme,
            host: host.to_ascii_lowercase(),
            port,
            path: if path.is_empty() {
                "/".to_string()
            } else {
                path.to_string()
            },
            query,
            fragment,
        })
    }

    /// Serialized origin (`scheme://host[:port]`), default ports omitted.
    pub fn origin(&self) -> String {
        let default_port = match self.scheme.as_str() {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        };
        match self.port {
            Some(port) if Some(port) != default_port => {
                format!("{}://{}:{}", self.scheme, self.host, port)
            }
            _ => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// Path with query string.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }
}

/// Resolve `target` against `origin`.
///
/// Absolute URLs are returned unchanged; `/path` references are joined to
/// the origin. Relative paths without a leading slash are treated as
/// rooted.
pub fn resolve(origin: &str, target: &str) -> String {
    if !target.starts_with('/') && Url::parse(target).is_ok() {
        return target.to_string();
    }
    let origin = origin.trim_end_matches('/');
    if target.starts_with('/') {
        format!("{}{}", origin, target)
    } else {
        format!("{}/{}", origin, target)
    }
}

/// Strip the fragment from a URL string.
pub fn strip_fragment(url: &str) -> &str {
    match url.find('#') {
        Some(pos) => &url[..pos],
        None => url,
    }
}

/// Canonical form of a URL for cache keys: lowercased scheme and host,
/// default port dropped, empty path as `/`, no fragment.
///
/// URLs without an authority are only stripped of their fragment.
pub fn normalize(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if !parsed.host.is_empty() => {
            format!("{}{}", parsed.origin(), parsed.path_and_query())
        }
        _ => strip_fragment(url).to_string(),
    }
}
