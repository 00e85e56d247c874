//! A [`Connector`] that serves a local directory as if it were a remote host.

use std::{
    io,
    path::PathBuf,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::{
    fs,
    io::{AsyncRead, AsyncSeek, ReadBuf},
};

use crate::{Connector, Credentials, DirEntry, Error, FileAttr, FileSession, RemoteFile, Result, Transport};

#[derive(Clone, Debug)]
pub struct LocalConnector {
    root: PathBuf,
}

impl LocalConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Connector for LocalConnector {
    type Transport = LocalTransport;
    type Session = LocalSession;

    async fn dial(&self, host: &str, _credentials: &Credentials) -> Result<LocalTransport> {
        Ok(LocalTransport {
            host: host.to_string(),
        })
    }

    async fn start_session(&self, _transport: &LocalTransport) -> Result<LocalSession> {
        Ok(LocalSession::new(self.root.clone()))
    }
}

#[derive(Debug)]
pub struct LocalTransport {
    host: String,
}

impl LocalTransport {
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl Transport for LocalTransport {
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LocalSession {
    root: PathBuf,
}

impl LocalSession {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = path.trim_start_matches('/');

        self.root.join(path)
    }
}

impl FileSession for LocalSession {
    type File = LocalFile;

    async fn open(&self, path: &str) -> Result<LocalFile> {
        let file = fs::File::open(self.resolve(path))
            .await
            .map_err(|e| Error::from_io(e, path))?;

        Ok(LocalFile::new(file))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let mut dir = fs::read_dir(self.resolve(path))
            .await
            .map_err(|e| Error::from_io(e, path))?;

        let mut entries = vec![];

        while let Some(entry) = dir.next_entry().await? {
            let meta = entry.metadata().await?;

            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                attrs: meta.try_into()?,
            });
        }

        Ok(entries)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct LocalFile {
    file: fs::File,
}

impl LocalFile {
    const fn new(file: fs::File) -> Self {
        Self { file }
    }
}

impl AsyncRead for LocalFile {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_read(cx, buf)
    }
}

impl AsyncSeek for LocalFile {
    fn start_seek(self: Pin<&mut Self>, position: io::SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.get_mut().file).start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.get_mut().file).poll_complete(cx)
    }
}

impl RemoteFile for LocalFile {
    async fn stat(&self) -> Result<FileAttr> {
        let meta = self.file.metadata().await?;

        Ok(meta.try_into()?)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn opens_files_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), b"hi\n").unwrap();

        let session = LocalSession::new(dir.path());
        let mut file = session.open("/hello.txt").await.unwrap();

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.unwrap();

        assert_eq!(contents, "hi\n");
        assert_eq!(file.stat().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn dial_remembers_host() {
        let dir = tempfile::tempdir().unwrap();
        let connector = LocalConnector::new(dir.path());

        let transport = connector.dial("files:22", &Credentials::new("u")).await.unwrap();

        assert_eq!(transport.host(), "files:22");
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let session = LocalSession::new(dir.path());

        let err = session.open("/nope").await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn lists_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"").unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();

        let session = LocalSession::new(dir.path());
        let mut entries = session.read_dir("/").await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 2);
        assert!(!entries[0].attrs.is_dir());
        assert!(entries[1].attrs.is_dir());
    }
}
