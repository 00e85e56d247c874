use std::{
    fmt, io,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use crate::{
    Connector, DirEntry, FileAttr, FileSession, RemoteFile, Result, SessionPair,
    address::parent_dir, fs::DirectoryPager,
};

pub(crate) type RemoteFileOf<C> = <<C as Connector>::Session as FileSession>::File;

/// A file opened through a [`FileSystem`](crate::FileSystem).
///
/// Reads and seeks go straight to the remote file. [`File::read_dir`] pages
/// through the directory named by [`File::name`]: the directory itself when
/// the name ends in `/`, the file's parent otherwise.
pub struct File<C: Connector> {
    inner: RemoteFileOf<C>,
    pair: Arc<SessionPair<C>>,
    name: String,
    pager: DirectoryPager,
}

impl<C: Connector> File<C> {
    pub(crate) fn new(inner: RemoteFileOf<C>, pair: Arc<SessionPair<C>>, name: String) -> Self {
        let pager = DirectoryPager::new(parent_dir(&name));

        Self {
            inner,
            pair,
            name,
            pager,
        }
    }

    /// Remote path, with a trailing `/` for directories
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Stat the open file
    ///
    /// # Errors
    ///
    /// Returns `Err` if the remote stat fails
    pub async fn stat(&self) -> Result<FileAttr> {
        self.inner.stat().await
    }

    /// Read the next `count` directory entries, or all remaining ones when
    /// `count` is zero
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndOfSequence`](crate::Error::EndOfSequence) once the
    /// listing has been exhausted, or `Err` if the listing fails
    pub async fn read_dir(&mut self, count: usize) -> Result<Vec<DirEntry>> {
        self.pager.next(self.pair.session(), count).await
    }

    /// Close the remote file
    ///
    /// # Errors
    ///
    /// Returns `Err` if the remote close fails
    pub async fn close(mut self) -> Result<()> {
        self.inner.close().await
    }
}

impl<C: Connector> fmt::Debug for File<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("name", &self.name)
            .field("pager", &self.pager)
            .finish_non_exhaustive()
    }
}

impl<C: Connector> AsyncRead for File<C> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<C: Connector> AsyncSeek for File<C> {
    fn start_seek(self: Pin<&mut Self>, position: io::SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.get_mut().inner).start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.get_mut().inner).poll_complete(cx)
    }
}
