use std::{fmt, sync::Arc};

use tracing::debug;

use crate::{
    Address, Connector, Credentials, FileSession, RemoteFile, Result, SessionPair, SftpConnector,
    address::join, fs::File,
};

/// Browse a remote directory tree over a dedicated session.
///
/// Logical names passed to [`FileSystem::open`] are resolved under the path
/// of the URL the filesystem was connected with.
///
/// # Example
///
/// ```rust,no_run
/// use sftp_http::{Credentials, FileSystem};
///
/// # async fn run() -> sftp_http::Result<()> {
/// let credentials = Credentials::new("foo").password("bar");
/// let fs = FileSystem::connect("sftp://127.0.0.1:22/home/foo", &credentials).await?;
///
/// let mut dir = fs.open("/").await?;
/// for entry in dir.read_dir(0).await? {
///     println!("{}", entry.name);
/// }
///
/// fs.close().await
/// # }
/// ```
pub struct FileSystem<C: Connector = SftpConnector> {
    pair: Arc<SessionPair<C>>,
    root: String,
}

impl<C: Connector> fmt::Debug for FileSystem<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("host", &self.pair.host())
            .field("root", &self.root)
            .finish()
    }
}

impl FileSystem {
    /// Dial the host named by an `sftp://host:port/path` URL
    ///
    /// # Errors
    ///
    /// Returns `Err` if the URL is invalid or the session cannot be
    /// established
    pub async fn connect(uri: &str, credentials: &Credentials) -> Result<Self> {
        Self::with_connector(&SftpConnector, uri, credentials).await
    }
}

impl<C: Connector> FileSystem<C> {
    /// Dial the host named by `uri` through a specific connector
    ///
    /// # Errors
    ///
    /// Returns
    ///   - [`Error::InvalidScheme`](crate::Error::InvalidScheme) if the URL
    ///     scheme is not `sftp`
    ///   - `Err` if the session cannot be established
    pub async fn with_connector(connector: &C, uri: &str, credentials: &Credentials) -> Result<Self> {
        let address = Address::parse(uri)?;
        let pair = SessionPair::establish(connector, address.host(), credentials).await?;

        Ok(Self {
            pair: Arc::new(pair),
            root: address.path().to_string(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn host(&self) -> &str {
        self.pair.host()
    }

    /// Open `name` under the root
    ///
    /// # Errors
    ///
    /// Returns
    ///   - [`Error::NotFound`](crate::Error::NotFound) if the path does not exist
    ///   - [`Error::PermissionDenied`](crate::Error::PermissionDenied) if access
    ///     is refused
    ///   - `Err` for any other remote failure
    pub async fn open(&self, name: &str) -> Result<File<C>> {
        let path = join(&self.root, name);

        debug!(host = %self.pair.host(), path = %path, "opening");

        let mut inner = self.pair.session().open(&path).await?;

        let stat = match inner.stat().await {
            Ok(stat) => stat,
            Err(e) => {
                if let Err(close_err) = inner.close().await {
                    debug!(path = %path, error = %close_err, "closing unstattable file failed");
                }

                return Err(e);
            }
        };

        let name = if stat.is_dir() && !path.ends_with('/') {
            format!("{path}/")
        } else {
            path
        };

        Ok(File::new(inner, Arc::clone(&self.pair), name))
    }

    /// Close the sub-session, then the connection
    ///
    /// # Errors
    ///
    /// Returns the first error raised by either step
    pub async fn close(&self) -> Result<()> {
        self.pair.close().await
    }
}
