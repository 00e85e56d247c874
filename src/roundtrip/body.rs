use std::{
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};

use bytes::Bytes;
use tokio::{
    io::{AsyncRead, AsyncReadExt, ReadBuf},
    sync::mpsc,
};
use tracing::debug;

/// Bytes copied from the remote file per chunk
pub(crate) const CHUNK_SIZE: usize = 32 * 1024;

/// Chunks buffered between the producer and the reader
pub(crate) const PIPE_CAPACITY: usize = 2;

/// Create a bounded in-memory pipe whose read side is a response [`Body`].
pub(crate) fn pipe(capacity: usize) -> (PipeWriter, Body) {
    let (tx, rx) = mpsc::channel(capacity);

    (
        PipeWriter { tx },
        Body {
            rx: Some(rx),
            chunk: Bytes::new(),
        },
    )
}

/// Write side of a body pipe.
pub(crate) struct PipeWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl PipeWriter {
    /// Send a chunk, waiting while the pipe is full
    ///
    /// Fails with `BrokenPipe` once the reader is gone.
    pub(crate) async fn write(&self, chunk: Bytes) -> io::Result<()> {
        self.tx
            .send(Ok(chunk))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response body closed"))
    }

    /// Close the pipe; the reader sees `err` after the buffered chunks, or
    /// EOF when there is none
    pub(crate) async fn close(self, err: Option<io::Error>) {
        if let Some(err) = err {
            if let Err(mpsc::error::SendError(Err(e))) = self.tx.send(Err(err)).await {
                debug!(error = %e, "response body dropped before its terminal error");
            }
        }
    }
}

/// A streamed response body.
///
/// Bytes arrive as a background task copies them from the remote file. A
/// failure in that task surfaces once as a read error, after which the body
/// reports EOF. Dropping the body stops the producer.
#[derive(Debug, Default)]
pub struct Body {
    rx: Option<mpsc::Receiver<io::Result<Bytes>>>,
    chunk: Bytes,
}

impl Body {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read the whole body into memory
    ///
    /// # Errors
    ///
    /// Returns `Err` if the producer failed mid-stream
    pub async fn collect(mut self) -> io::Result<Vec<u8>> {
        let mut out = vec![];
        self.read_to_end(&mut out).await?;

        Ok(out)
    }

    /// Stop receiving; the producer's next write fails
    pub fn close(&mut self) {
        self.rx = None;
        self.chunk = Bytes::new();
    }
}

impl AsyncRead for Body {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        loop {
            if !this.chunk.is_empty() {
                let n = this.chunk.len().min(buf.remaining());
                buf.put_slice(&this.chunk.split_to(n));

                return Poll::Ready(Ok(()));
            }

            let Some(rx) = this.rx.as_mut() else {
                return Poll::Ready(Ok(()));
            };

            match ready!(rx.poll_recv(cx)) {
                Some(Ok(chunk)) => this.chunk = chunk,
                Some(Err(e)) => {
                    this.rx = None;

                    return Poll::Ready(Err(e));
                }
                None => {
                    this.rx = None;

                    return Poll::Ready(Ok(()));
                }
            }
        }
    }
}
