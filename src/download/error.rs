//! Error types for the transfer engine.
//!
//! These never cross the caller boundary as `Err`: the engine turns them into
//! a terminal [`TransferOutcome::Failed`](super::TransferOutcome::Failed)
//! event and logs the details.

use std::path::PathBuf;

use thiserror::Error;

use crate::mirror::{MirrorError, MirrorSlot};

/// Errors that can occur during a book transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The HTTP client could not be constructed.
    #[error("failed to build transfer HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The chosen candidate has no link in the configured mirror slot.
    #[error("candidate {candidate_id} has no {slot} mirror link")]
    MissingMirror {
        /// Scraped candidate id.
        candidate_id: String,
        /// The slot that was empty.
        slot: MirrorSlot,
    },

    /// Mirror page resolution failed (unreachable page or layout mismatch).
    #[error(transparent)]
    Mirror(#[from] MirrorError),

    /// The resolved link could not be turned into an absolute URL.
    #[error("invalid direct link '{link}' on mirror page {mirror_ref}")]
    InvalidUrl {
        /// The href extracted from the mirror page.
        link: String,
        /// The mirror page it came from.
        mirror_ref: String,
    },

    /// Network-level error requesting or reading the file.
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The direct file URL.
        url: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The file server answered with a non-success status.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The direct file URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error creating directories or writing files.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The path being written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The metadata sidecar could not be serialized.
    #[error("failed to serialize metadata sidecar {path}: {source}")]
    Sidecar {
        /// The sidecar path.
        path: PathBuf,
        /// The serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The caller cancelled the transfer.
    #[error("download cancelled")]
    Cancelled,
}

impl TransferError {
    /// Creates a network error.
    pub fn network(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Network {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_missing_mirror_display() {
        let error = TransferError::MissingMirror {
            candidate_id: "42".to_string(),
            slot: MirrorSlot::Secondary,
        };
        let msg = error.to_string();
        assert!(msg.contains("42"), "Expected candidate id in: {msg}");
        assert!(msg.contains("secondary"), "Expected slot in: {msg}");
    }

    #[test]
    fn test_transfer_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = TransferError::io(PathBuf::from("/tmp/book.epub"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/book.epub"), "Expected path in: {msg}");
    }

    #[test]
    fn test_transfer_error_mirror_is_transparent() {
        let error: TransferError = MirrorError::http_status("http://mirror/x", 404).into();
        assert_eq!(error.to_string(), "HTTP 404 fetching mirror page http://mirror/x");
    }
}
