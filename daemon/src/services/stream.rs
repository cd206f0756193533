//! Range-aware file responses.
//!
//! A file handle is opened per request and lives inside the response body stream, so it is closed
//! once the body finishes, fails, or the client goes away.

use std::{io::SeekFrom, path::Path};

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::{Stream, stream};
use kpop_core::{library::AUDIO_CONTENT_TYPE, range::ByteRange};
use log::debug;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt},
};
use tracing::instrument;

use crate::errors::ApiError;

/// How the file is handed to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Inline playback, honoring `Range` requests.
    Stream,
    /// A full-content attachment; any `Range` header is ignored.
    Download,
}

/// Build the response for an already resolved and verified file.
///
/// - No (or a blank) `range` header: `200` with the whole file.
/// - A valid `bytes=<start>-<end?>` header: `206` with exactly that slice.
/// - An invalid one: `416`, see [`ByteRange::parse`].
///
/// # Errors
///
/// Fails if the file cannot be opened, stat'ed, or seeked, or if the range is not satisfiable.
#[instrument(skip(range))]
#[inline]
pub async fn serve_file(
    path: &Path,
    range: Option<&str>,
    delivery: Delivery,
    chunk_size: usize,
) -> Result<Response, ApiError> {
    let mut file = File::open(path).await?;
    let file_size = file.metadata().await?.len();

    let range = match delivery {
        Delivery::Stream => ByteRange::parse(range.unwrap_or_default(), file_size)
            .map_err(|error| ApiError::Range { error, file_size })?,
        Delivery::Download => None,
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(AUDIO_CONTENT_TYPE),
    );
    if delivery == Delivery::Download {
        headers.insert(header::CONTENT_DISPOSITION, content_disposition(path));
    }

    let Some(range) = range else {
        debug!("Sending all {file_size} bytes of {}", path.display());
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file_size));
        let body = Body::from_stream(chunks(file, file_size, chunk_size));
        return Ok((StatusCode::OK, headers, body).into_response());
    };

    debug!(
        "Sending bytes {}-{} of {} ({file_size} bytes)",
        range.start,
        range.end,
        path.display()
    );
    file.seek(SeekFrom::Start(range.start)).await?;
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(range.len()));
    if let Ok(value) = HeaderValue::from_str(&range.content_range(file_size)) {
        headers.insert(header::CONTENT_RANGE, value);
    }
    let body = Body::from_stream(chunks(file, range.len(), chunk_size));

    Ok((StatusCode::PARTIAL_CONTENT, headers, body).into_response())
}

/// Read up to `length` bytes from the current position of `file`, `chunk_size` bytes at a time.
///
/// A read of zero bytes ends the stream early (the file shrank), it is not an error.
fn chunks(
    file: File,
    length: u64,
    chunk_size: usize,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    let buffer = vec![0u8; chunk_size.max(1)];

    stream::try_unfold(
        (file, length, buffer),
        |(mut file, remaining, mut buffer)| async move {
            if remaining == 0 {
                return Ok(None);
            }
            let want = usize::try_from(remaining).map_or(buffer.len(), |r| r.min(buffer.len()));
            let read = file.read(&mut buffer[..want]).await?;
            if read == 0 {
                return Ok(None);
            }
            let chunk = Bytes::copy_from_slice(&buffer[..read]);
            Ok(Some((chunk, (file, remaining - read as u64, buffer))))
        },
    )
}

/// `attachment; filename="<basename>"`, with characters that would break the header dropped.
fn content_disposition(path: &Path) -> HeaderValue {
    let name: String = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();

    HeaderValue::from_str(&format!("attachment; filename=\"{name}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
