//! Chunk streaming into files.

use std::path::Path;

use futures_util::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::error::TransferError;

/// Writes every chunk of `stream` to `writer`, calling `on_progress` with the
/// cumulative byte count after each chunk.
///
/// Stops with [`TransferError::Cancelled`] as soon as `cancel` flips to
/// `true`. The writer is flushed before returning `Ok`.
pub(crate) async fn pump_chunks<S, B, E, W, F>(
    mut stream: S,
    writer: &mut W,
    url: &str,
    path: &Path,
    cancel: &mut watch::Receiver<bool>,
    mut on_progress: F,
) -> Result<u64, TransferError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    W: AsyncWrite + Unpin,
    F: FnMut(u64),
{
    let mut transferred: u64 = 0;
    loop {
        if *cancel.borrow() {
            return Err(TransferError::Cancelled);
        }
        let next = tokio::select! {
            next = stream.next() => next,
            Ok(()) = cancel.changed() => continue,
        };
        let Some(chunk) = next else { break };
        let chunk = chunk.map_err(|e| TransferError::network(url, e))?;
        let bytes = chunk.as_ref();
        writer
            .write_all(bytes)
            .await
            .map_err(|e| TransferError::io(path, e))?;
        transferred += bytes.len() as u64;
        on_progress(transferred);
    }

    writer
        .flush()
        .await
        .map_err(|e| TransferError::io(path, e))?;
    Ok(transferred)
}

/// Streams an HTTP response body into a new file at `path`.
///
/// Removes the partial file if the transfer fails.
pub(crate) async fn stream_to_file(
    response: reqwest::Response,
    path: &Path,
    cancel: &mut watch::Receiver<bool>,
    on_progress: impl FnMut(u64),
) -> Result<u64, TransferError> {
    let url = response.url().to_string();
    let file = File::create(path)
        .await
        .map_err(|e| TransferError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let result = pump_chunks(
        Box::pin(response.bytes_stream()),
        &mut writer,
        &url,
        path,
        cancel,
        on_progress,
    )
    .await;

    if let Err(error) = &result {
        debug!(path = %path.display(), error = %error, "cleaning up partial file after error");
        drop(writer);
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove partial file");
        }
    }
    result
}
