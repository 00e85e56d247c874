use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use russh_sftp::client::{SftpSession, fs::File};
use tokio::io::{AsyncRead, AsyncSeek, AsyncWriteExt, ReadBuf};

use crate::{DirEntry, Error, FileAttr, FileSession, RemoteFile, Result};

/// The `sftp` sub-session of a connection.
pub struct SftpFiles {
    sftp: SftpSession,
}

impl SftpFiles {
    pub(crate) const fn new(sftp: SftpSession) -> Self {
        Self { sftp }
    }
}

impl FileSession for SftpFiles {
    type File = SftpFile;

    async fn open(&self, path: &str) -> Result<SftpFile> {
        let file = self
            .sftp
            .open(path)
            .await
            .map_err(|e| Error::from_sftp(e, path))?;

        Ok(SftpFile {
            file,
            path: path.to_string(),
        })
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let entries = self
            .sftp
            .read_dir(path)
            .await
            .map_err(|e| Error::from_sftp(e, path))?;

        Ok(entries
            .filter(|entry| {
                let name = entry.file_name();
                name != "." && name != ".."
            })
            .map(|entry| DirEntry {
                name: entry.file_name(),
                attrs: entry.metadata().into(),
            })
            .collect())
    }

    async fn close(&self) -> Result<()> {
        self.sftp.close().await.map_err(Error::Sftp)
    }
}

/// A file opened over SFTP
pub struct SftpFile {
    file: File,
    path: String,
}

impl AsyncRead for SftpFile {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_read(cx, buf)
    }
}

impl AsyncSeek for SftpFile {
    fn start_seek(self: Pin<&mut Self>, position: io::SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.get_mut().file).start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.get_mut().file).poll_complete(cx)
    }
}

impl RemoteFile for SftpFile {
    async fn stat(&self) -> Result<FileAttr> {
        let attrs = self
            .file
            .metadata()
            .await
            .map_err(|e| Error::from_sftp(e, &self.path))?;

        Ok(attrs.into())
    }

    async fn close(&mut self) -> Result<()> {
        self.file
            .shutdown()
            .await
            .map_err(|e| Error::from_io(e, &self.path))
    }
}
