//! HTTP-style access to files on SSH servers.
//!
//! [`RoundTripper`] answers `GET` requests for `sftp://` URLs by streaming
//! the remote file, pooling one SSH connection per host. [`FileSystem`]
//! exposes a remote directory tree as openable files with paged listings.
//!
//! Both are generic over a [`Connector`], so the same code runs against
//! [`SftpConnector`] in production and [`local::LocalConnector`] against a
//! directory on disk.

mod address;
pub mod auth;
mod error;
pub mod fs;
pub mod local;
mod pool;
pub mod remote;
pub mod roundtrip;
pub mod sftp;

#[cfg(test)]
mod testing;

pub use address::{Address, PROTOCOL};
pub use auth::{AuthMethod, Credentials, HostKeyPolicy};
pub use error::{Error, Result, StickyError};
pub use fs::{DirectoryPager, File, FileSystem};
pub use pool::SessionPool;
pub use remote::{Connector, DirEntry, FileAttr, FileSession, RemoteFile, SessionPair, Transport};
pub use roundtrip::{Body, RoundTripper, SERVER_NAME};
pub use sftp::{SftpConnector, SftpFile, SftpFiles, SshTransport};
