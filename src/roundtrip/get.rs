use std::{io::SeekFrom, path::Path};

use bytes::Bytes;
use http::{
    HeaderMap, HeaderValue, Response, StatusCode,
    header::{CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED},
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tracing::{debug, warn};

use crate::{
    Connector, Error, FileSession, RemoteFile, Result, SessionPair, StickyError,
    roundtrip::{
        Body,
        body::{CHUNK_SIZE, PIPE_CAPACITY, PipeWriter, pipe},
        response::{build, http_date},
        sniff::{SNIFF_LEN, detect_content_type},
    },
};

/// Fetch `path` over the pair's file session.
///
/// A missing file is a 404 response; every other failure before streaming
/// starts is an error. The body is filled by a background task, so this
/// returns as soon as the headers are known.
pub(crate) async fn get<C: Connector>(pair: &SessionPair<C>, path: &str) -> Result<Response<Body>> {
    let mut file = match pair.session().open(path).await {
        Ok(file) => file,
        Err(e) if e.is_not_found() => {
            debug!(host = %pair.host(), path = %path, "not found");

            return Ok(build(StatusCode::NOT_FOUND, Body::empty(), HeaderMap::new()));
        }
        Err(e) => return Err(e),
    };

    let (size, headers) = match describe(&mut file, path).await {
        Ok(described) => described,
        Err(e) => {
            if let Err(close_err) = file.close().await {
                debug!(path = %path, error = %close_err, "closing file after failed probe");
            }

            return Err(e);
        }
    };

    let (writer, body) = pipe(PIPE_CAPACITY);

    tokio::spawn(stream_file(file, size, writer, path.to_string()));

    Ok(build(StatusCode::OK, body, headers))
}

/// Stat the file and work out the headers describing it
async fn describe<F: RemoteFile>(file: &mut F, path: &str) -> Result<(u64, HeaderMap)> {
    let stat = file.stat().await?;
    let size = stat.len();

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_LENGTH, HeaderValue::from(size));

    if let Some(modified) = stat.modified().and_then(http_date) {
        headers.insert(LAST_MODIFIED, modified);
    }

    let content_type = content_type(file, path).await?;
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

    Ok((size, headers))
}

/// Content type from the extension table, or from sniffing the first bytes.
///
/// Sniffing rewinds the file so the body starts at byte 0.
pub(crate) async fn content_type<F>(file: &mut F, path: &str) -> Result<&'static str>
where
    F: AsyncRead + AsyncSeek + Unpin,
{
    if let Some(known) = mime_guess::from_path(Path::new(path)).first_raw() {
        return Ok(known);
    }

    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    (&mut *file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut prefix)
        .await?;

    file.seek(SeekFrom::Start(0)).await?;

    Ok(detect_content_type(&prefix))
}

/// Copy exactly `size` bytes into the pipe, close the file, then close the
/// pipe with the first error from either step.
pub(crate) async fn stream_file<F: RemoteFile>(mut file: F, size: u64, writer: PipeWriter, path: String) {
    let mut sticky = StickyError::new();
    sticky.set(copy_exact(&mut file, size, &writer).await.map_err(Error::Io));
    sticky.set(file.close().await);

    let err = match sticky.into_result() {
        Ok(()) => {
            debug!(path = %path, bytes = size, "body streamed");
            None
        }
        Err(e) => {
            warn!(path = %path, error = %e, "streaming body failed");
            Some(e.into_io())
        }
    };

    writer.close(err).await;
}

async fn copy_exact<F>(file: &mut F, size: u64, writer: &PipeWriter) -> std::io::Result<()>
where
    F: AsyncRead + Unpin,
{
    let mut remaining = size;
    let mut buf = vec![0u8; CHUNK_SIZE];

    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(CHUNK_SIZE, |r| r.min(CHUNK_SIZE));
        let n = file.read(&mut buf[..want]).await?;

        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }

        writer.write(Bytes::copy_from_slice(&buf[..n])).await?;
        remaining -= n as u64;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, Cursor},
        sync::atomic::Ordering,
    };

    use super::*;
    use crate::testing::MemoryFile;

    #[tokio::test]
    async fn known_extension_does_not_touch_file() {
        let mut file = MemoryFile::new(b"\x89PNG\x0D\x0A\x1A\x0A");
        let reads = file.reads();

        let content_type = content_type(&mut file, "/notes/readme.txt").await.unwrap();

        assert_eq!(content_type, "text/plain");
        assert_eq!(reads.load(Ordering::SeqCst), 0);
        assert_eq!(file.position(), 0);
    }

    #[tokio::test]
    async fn unknown_extension_is_sniffed_and_rewound() {
        let mut data = b"<html><body>".to_vec();
        data.resize(2048, b' ');
        let mut file = MemoryFile::new(&data);

        let content_type = content_type(&mut file, "/site/index.zzq").await.unwrap();

        assert_eq!(content_type, "text/html; charset=utf-8");
        assert_eq!(file.position(), 0);

        let mut all = vec![];
        file.read_to_end(&mut all).await.unwrap();
        assert_eq!(all, data);
    }

    #[tokio::test]
    async fn short_files_are_sniffed() {
        let mut file = Cursor::new(b"%PDF-1.4".to_vec());

        let content_type = content_type(&mut file, "/no_extension").await.unwrap();

        assert_eq!(content_type, "application/pdf");
        assert_eq!(file.position(), 0);
    }

    #[tokio::test]
    async fn streams_whole_file_then_closes_it() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let file = MemoryFile::new(&data);
        let closed = file.closed();
        let (writer, body) = pipe(PIPE_CAPACITY);

        let producer = tokio::spawn(stream_file(file, data.len() as u64, writer, "/big".into()));

        assert_eq!(body.collect().await.unwrap(), data);
        producer.await.unwrap();
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn truncated_file_surfaces_error_in_body() {
        let file = MemoryFile::new(b"short").with_size(10);
        let (writer, body) = pipe(PIPE_CAPACITY);

        tokio::spawn(stream_file(file, 10, writer, "/short".into()));

        let err = body.collect().await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn close_failure_surfaces_error_in_body() {
        let file = MemoryFile::new(b"abc").fail_close();
        let (writer, body) = pipe(PIPE_CAPACITY);

        tokio::spawn(stream_file(file, 3, writer, "/abc".into()));

        let err = body.collect().await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert!(err.to_string().contains("close failed"));
    }

    #[tokio::test]
    async fn copy_error_wins_over_close_error() {
        let file = MemoryFile::new(b"ab").with_size(3).fail_close();
        let (writer, body) = pipe(PIPE_CAPACITY);

        tokio::spawn(stream_file(file, 3, writer, "/ab".into()));

        let err = body.collect().await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn dropped_body_stops_producer_and_closes_file() {
        let data = vec![7u8; CHUNK_SIZE * 16];
        let file = MemoryFile::new(&data);
        let closed = file.closed();
        let (writer, body) = pipe(1);

        let producer = tokio::spawn(stream_file(file, data.len() as u64, writer, "/big".into()));
        drop(body);

        producer.await.unwrap();
        assert!(closed.load(Ordering::SeqCst));
    }
}
