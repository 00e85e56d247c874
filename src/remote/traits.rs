use tokio::io::{AsyncRead, AsyncSeek};

use crate::{Credentials, DirEntry, FileAttr, Result};

/// Establishes both halves of a [`SessionPair`](crate::SessionPair).
///
/// `dial` opens the authenticated connection; `start_session` layers the
/// file protocol on top of it.
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;
    type Session: FileSession;

    /// Open an authenticated connection to `host` (`"address:port"`)
    ///
    /// # Errors
    ///
    /// Returns `Err` if the connection or authentication fails
    fn dial(
        &self,
        host: &str,
        credentials: &Credentials,
    ) -> impl Future<Output = crate::Result<Self::Transport>> + Send;

    /// Start the file-protocol sub-session over an open connection
    ///
    /// # Errors
    ///
    /// Returns `Err` if the subsystem cannot be started
    fn start_session(
        &self,
        transport: &Self::Transport,
    ) -> impl Future<Output = crate::Result<Self::Session>> + Send;
}

/// The authenticated connection underneath a file session.
pub trait Transport: Send + Sync + 'static {
    /// Close the connection
    ///
    /// # Errors
    ///
    /// Returns `Err` if the disconnect fails
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Trait for remote file-protocol operations
pub trait FileSession: Send + Sync + 'static {
    type File: RemoteFile;

    /// Open a file for reading
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the path does
    /// not exist, or another error for other remote failures
    fn open(&self, path: &str) -> impl Future<Output = Result<Self::File>> + Send;

    /// List every entry of a directory, in no particular order
    ///
    /// # Errors
    ///
    /// Returns `Err` if the directory cannot be read
    fn read_dir(&self, path: &str) -> impl Future<Output = Result<Vec<DirEntry>>> + Send;

    /// Close the sub-session
    ///
    /// # Errors
    ///
    /// Returns `Err` if the sub-session fails to shut down
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// An open remote file with its own read cursor.
pub trait RemoteFile: AsyncRead + AsyncSeek + Unpin + Send + 'static {
    /// Return the attributes of the open file
    ///
    /// # Errors
    ///
    /// Returns `Err` if the remote stat fails
    fn stat(&self) -> impl Future<Output = Result<FileAttr>> + Send;

    /// Release the remote handle
    ///
    /// # Errors
    ///
    /// Returns `Err` if the remote close fails
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
