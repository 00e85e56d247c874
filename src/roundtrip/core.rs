use std::sync::Arc;

use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use tracing::debug;

use crate::{
    Connector, Credentials, Error, PROTOCOL, Result, SessionPair, SessionPool, SftpConnector,
    address::{decode_path, host_id},
    roundtrip::{Body, get::get, response::build},
};

/// Performs HTTP-style requests against `sftp://` URLs.
///
/// Hosts are dialed lazily with the default credentials the first time a
/// request targets them. Use [`RoundTripper::dial`] to pre-connect a host,
/// optionally with its own credentials.
///
/// # Example
///
/// ```rust,no_run
/// use http::Request;
/// use sftp_http::{Credentials, RoundTripper};
///
/// # async fn run() -> sftp_http::Result<()> {
/// let rt = RoundTripper::new(Credentials::new("foo").password("bar"));
///
/// let request = Request::get("sftp://127.0.0.1:22/home/foo/notes.txt").body(())?;
/// let response = rt.round_trip(&request).await?;
///
/// println!("{}", response.status());
/// let body = response.into_body().collect().await?;
///
/// rt.close().await
/// # }
/// ```
pub struct RoundTripper<C: Connector = SftpConnector> {
    pool: SessionPool<C>,
}

impl RoundTripper {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self::with_connector(SftpConnector, credentials)
    }
}

impl<C: Connector> RoundTripper<C> {
    pub fn with_connector(connector: C, credentials: Credentials) -> Self {
        Self {
            pool: SessionPool::new(connector, credentials),
        }
    }

    #[must_use]
    pub const fn pool(&self) -> &SessionPool<C> {
        &self.pool
    }

    /// Connect to `host` ahead of any request
    ///
    /// Uses `credentials` when given, the defaults otherwise. An existing
    /// session to the same host is replaced.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the session cannot be established
    pub async fn dial(&self, host: &str, credentials: Option<&Credentials>) -> Result<()> {
        self.pool.dial(host, credentials).await
    }

    /// Perform one request
    ///
    /// `GET` streams the file at the request path; a missing file is a
    /// `404`. Every other method is a `405`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if
    ///   - The URL scheme is not `sftp` or the URL has no host
    ///   - The host cannot be dialed
    ///   - Opening, stating or probing the file fails for any reason other
    ///     than the file not existing
    pub async fn round_trip<B>(&self, request: &Request<B>) -> Result<Response<Body>> {
        let (host, path) = target(request.uri())?;
        let pair: Arc<SessionPair<C>> = self.pool.resolve(&host).await?;

        debug!(method = %request.method(), host = %host, path = %path, "round trip");

        match *request.method() {
            Method::GET => get(&pair, &path).await,
            _ => Ok(build(
                StatusCode::METHOD_NOT_ALLOWED,
                Body::empty(),
                HeaderMap::new(),
            )),
        }
    }

    /// Close every pooled session
    ///
    /// # Errors
    ///
    /// Returns the first close error; sessions not yet closed stay pooled
    pub async fn close(&self) -> Result<()> {
        self.pool.close_all().await
    }
}

/// Host identifier and decoded path of a request URI
fn target(uri: &Uri) -> Result<(String, String)> {
    if let Some(scheme) = uri.scheme_str() {
        if scheme != PROTOCOL {
            return Err(Error::InvalidScheme(scheme.to_string()));
        }
    }

    let host = uri
        .host()
        .ok_or_else(|| Error::Config(format!("No host in {uri}")))?;

    Ok((host_id(host, uri.port_u16()), decode_path(uri.path())))
}
