//! Streaming book transfers into the local library.
//!
//! # Features
//!
//! - One spawned task per download, reporting through a [`DownloadHandle`]
//! - Mirror page resolution before the transfer (see [`crate::mirror`])
//! - Streaming writes with cumulative progress events
//! - Filename from `Content-Disposition`, falling back to the URL, then the title
//! - `data.json` sidecar written before the book, best-effort `cover.jpg` beside it
//! - Idle read timeouts on bodies, so slow but steady transfers are not cut off
//! - Cancellation that still ends in a single terminal event
//!
//! Errors never escape as `Err` from [`DownloadEngine::start_download`]; they
//! arrive as a failed [`CompletionEvent`].

mod engine;
mod error;
mod event;
pub(crate) mod filename;
mod stream;

pub use engine::{DEFAULT_COVER_GRACE, DownloadEngine, DownloadHandle};
pub use error::TransferError;
pub use event::{
    CompletionEvent, DownloadEvent, DownloadJob, DownloadStatus, ProgressEvent, TransferOutcome,
};

// Use `Result<T, TransferError>` explicitly; no module-local Result alias.
