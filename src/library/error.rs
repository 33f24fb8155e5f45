//! Error types for the library index.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading or opening entries in the storage root.
///
/// Scans never fail as a whole: a directory that produces one of these is
/// logged and left out of the listing.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Filesystem error reading a directory or file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `data.json` exists but does not parse as a catalog record.
    #[error("malformed metadata sidecar {path}: {source}")]
    MalformedSidecar {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The OS refused to open a path with its default application.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LibraryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed_sidecar(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::MalformedSidecar {
            path: path.into(),
            source,
        }
    }

    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }
}
