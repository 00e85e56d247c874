use percent_encoding::percent_decode_str;
use url::Url;

use crate::{Error, Result};

/// Scheme identifying SFTP-backed URLs
pub const PROTOCOL: &str = "sftp";

pub(crate) const DEFAULT_PORT: u16 = 22;

/// A parsed `sftp://host:port/path` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    host: String,
    path: String,
}

impl Address {
    /// Parse and validate an `sftp://` URL
    ///
    /// # Errors
    ///
    /// Returns
    ///   - [`Error::Url`] if `uri` is not a URL
    ///   - [`Error::InvalidScheme`] if the scheme is not [`PROTOCOL`]
    ///   - [`Error::Config`] if the URL has no host
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)?;

        if url.scheme() != PROTOCOL {
            return Err(Error::InvalidScheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Config(format!("No host in {uri}")))?;

        Ok(Self {
            host: host_id(host, url.port()),
            path: decode_path(url.path()),
        })
    }

    /// Host identifier in `"address:port"` form
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

pub(crate) fn host_id(host: &str, port: Option<u16>) -> String {
    format!("{host}:{}", port.unwrap_or(DEFAULT_PORT))
}

/// Split a host identifier back into address and port
pub(crate) fn split_host(host: &str) -> (&str, u16) {
    match host.rsplit_once(':') {
        Some((addr, port)) if !addr.is_empty() && !addr.ends_with(':') => port
            .parse()
            .map_or((host, DEFAULT_PORT), |port| {
                (addr.trim_start_matches('[').trim_end_matches(']'), port)
            }),
        _ => (host, DEFAULT_PORT),
    }
}

pub(crate) fn decode_path(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();

    if decoded.is_empty() {
        "/".to_string()
    } else {
        decoded.into_owned()
    }
}

/// Lexically clean `path` as if it were rooted at `/`.
///
/// `.` segments and duplicate separators disappear, and `..` never climbs
/// above the root.
pub(crate) fn clean(path: &str) -> String {
    let mut parts: Vec<&str> = vec![];

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    format!("/{}", parts.join("/"))
}

/// Join a logical name onto a root directory
pub(crate) fn join(root: &str, name: &str) -> String {
    let name = clean(name);
    let root = root.trim_end_matches('/');

    if name == "/" {
        if root.is_empty() {
            return "/".to_string();
        }

        return root.to_string();
    }

    format!("{root}{name}")
}

/// Directory whose entries are siblings of `name`.
///
/// A trailing separator marks `name` itself as the directory.
pub(crate) fn parent_dir(name: &str) -> String {
    if let Some(dir) = name.strip_suffix('/') {
        let dir = dir.trim_end_matches('/');

        return if dir.is_empty() {
            "/".to_string()
        } else {
            dir.to_string()
        };
    }

    match name.rsplit_once('/') {
        Some(("", _)) => "/".to_string(),
        Some((dir, _)) => dir.to_string(),
        None => ".".to_string(),
    }
}
