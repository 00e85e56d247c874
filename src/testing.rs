use std::{
    io::{self, Cursor},
    path::{Path, PathBuf},
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    task::{Context, Poll},
    time::Duration,
};

use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use crate::{
    Connector, Credentials, DirEntry, Error, FileAttr, FileSession, RemoteFile, Result, Transport,
    local::{LocalFile, LocalSession},
};

#[derive(Default)]
struct State {
    dials: usize,
    users: Vec<String>,
    closed_transports: Vec<String>,
}

/// Serves a local directory and records or sabotages connection lifecycle
#[derive(Clone)]
pub(crate) struct StubConnector {
    root: PathBuf,
    fail_dial: bool,
    fail_start: bool,
    failing_close: Option<String>,
    slow_host: Option<(String, Duration)>,
    state: Arc<Mutex<State>>,
}

impl StubConnector {
    pub(crate) fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            fail_dial: false,
            fail_start: false,
            failing_close: None,
            slow_host: None,
            state: Arc::default(),
        }
    }

    pub(crate) const fn fail_dial(mut self) -> Self {
        self.fail_dial = true;
        self
    }

    pub(crate) const fn fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub(crate) fn fail_session_close(mut self, host: &str) -> Self {
        self.failing_close = Some(host.to_string());
        self
    }

    /// Delay every dial of `host` by `delay`
    pub(crate) fn slow_dial(mut self, host: &str, delay: Duration) -> Self {
        self.slow_host = Some((host.to_string(), delay));
        self
    }

    pub(crate) fn dials(&self) -> usize {
        self.state.lock().unwrap().dials
    }

    pub(crate) fn users(&self) -> Vec<String> {
        self.state.lock().unwrap().users.clone()
    }

    pub(crate) fn closed_transports(&self) -> Vec<String> {
        self.state.lock().unwrap().closed_transports.clone()
    }
}

impl Connector for StubConnector {
    type Transport = StubTransport;
    type Session = StubSession;

    async fn dial(&self, host: &str, credentials: &Credentials) -> Result<StubTransport> {
        {
            let mut state = self.state.lock().unwrap();
            state.dials += 1;
            state.users.push(credentials.user().to_string());
        }

        if let Some((slow, delay)) = &self.slow_host {
            if slow == host {
                tokio::time::sleep(*delay).await;
            }
        }

        if self.fail_dial {
            return Err(Error::Io(io::Error::from(io::ErrorKind::ConnectionRefused)));
        }

        Ok(StubTransport {
            host: host.to_string(),
            state: Arc::clone(&self.state),
        })
    }

    async fn start_session(&self, transport: &StubTransport) -> Result<StubSession> {
        if self.fail_start {
            return Err(Error::Remote {
                path: transport.host.clone(),
                message: "subsystem request failed".into(),
            });
        }

        Ok(StubSession {
            host: transport.host.clone(),
            inner: LocalSession::new(self.root.clone()),
            fail_close: self.failing_close.as_deref() == Some(transport.host.as_str()),
        })
    }
}

pub(crate) struct StubTransport {
    host: String,
    state: Arc<Mutex<State>>,
}

impl Transport for StubTransport {
    async fn close(&self) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .closed_transports
            .push(self.host.clone());

        Ok(())
    }
}

pub(crate) struct StubSession {
    host: String,
    inner: LocalSession,
    fail_close: bool,
}

impl FileSession for StubSession {
    type File = LocalFile;

    async fn open(&self, path: &str) -> Result<LocalFile> {
        self.inner.open(path).await
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        self.inner.read_dir(path).await
    }

    async fn close(&self) -> Result<()> {
        if self.fail_close {
            return Err(Error::Remote {
                path: self.host.clone(),
                message: "close failed".into(),
            });
        }

        Ok(())
    }
}

/// A remote file held in memory, reporting whatever size it is told to
pub(crate) struct MemoryFile {
    cursor: Cursor<Vec<u8>>,
    attrs: FileAttr,
    reads: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    fail_close: bool,
}

impl MemoryFile {
    pub(crate) fn new(data: &[u8]) -> Self {
        let attrs = FileAttr {
            size: Some(data.len() as u64),
            permissions: Some(0o100_644),
            mtime: Some(0),
            ..Default::default()
        };

        Self {
            cursor: Cursor::new(data.to_vec()),
            attrs,
            reads: Arc::default(),
            closed: Arc::default(),
            fail_close: false,
        }
    }

    pub(crate) const fn with_size(mut self, size: u64) -> Self {
        self.attrs.size = Some(size);
        self
    }

    pub(crate) const fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub(crate) fn reads(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }

    pub(crate) fn closed(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    pub(crate) const fn position(&self) -> u64 {
        self.cursor.position()
    }
}

impl AsyncRead for MemoryFile {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.reads.fetch_add(1, Ordering::SeqCst);

        Pin::new(&mut this.cursor).poll_read(cx, buf)
    }
}

impl AsyncSeek for MemoryFile {
    fn start_seek(self: Pin<&mut Self>, position: io::SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.get_mut().cursor).start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.get_mut().cursor).poll_complete(cx)
    }
}

impl RemoteFile for MemoryFile {
    async fn stat(&self) -> Result<FileAttr> {
        Ok(self.attrs.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);

        if self.fail_close {
            return Err(Error::Remote {
                path: "memory".into(),
                message: "close failed".into(),
            });
        }

        Ok(())
    }
}
