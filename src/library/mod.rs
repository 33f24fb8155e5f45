//! Local library index.
//!
//! Every book downloaded by the transfer engine lives in its own directory
//! under the storage root together with a `data.json` sidecar holding the
//! catalog record it was downloaded for. [`LocalLibrary::list_books`] reads
//! that tree back as a point-in-time snapshot, most recently accessed first.

mod error;
pub mod layout;

pub use error::LibraryError;
pub use layout::{BOOK_EXTENSIONS, COVER_FILE, SIDECAR_FILE, book_dir, book_dir_name};

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::catalog::CatalogRecord;

/// Name of the default storage directory under the user's home.
pub const DEFAULT_LIBRARY_DIR: &str = "Alexandria";

/// One shelved book.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalBookEntry {
    /// The record read back from `data.json`.
    pub metadata: CatalogRecord,
    /// The book file itself.
    pub file_path: PathBuf,
    /// Last access time of the book file.
    pub last_access: SystemTime,
}

/// Read-only view of the storage root.
#[derive(Debug, Clone)]
pub struct LocalLibrary {
    root: PathBuf,
}

impl LocalLibrary {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$HOME/Alexandria`, or `./Alexandria` when no home directory is known.
    #[must_use]
    pub fn default_root() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_LIBRARY_DIR)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists every complete book directory, most recently accessed first.
    ///
    /// A missing storage root yields an empty list. Directories without a
    /// book file or sidecar are skipped; unreadable ones are logged and
    /// skipped.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn list_books(&self) -> Vec<LocalBookEntry> {
        let mut dirs = match tokio::fs::read_dir(&self.root).await {
            Ok(dirs) => dirs,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("storage root does not exist; library is empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "cannot read storage root");
                return Vec::new();
            }
        };

        let mut entries = Vec::new();
        loop {
            let dir_entry = match dirs.next_entry().await {
                Ok(Some(dir_entry)) => dir_entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "error while listing storage root; returning partial listing");
                    break;
                }
            };
            let is_dir = dir_entry
                .file_type()
                .await
                .is_ok_and(|file_type| file_type.is_dir());
            if !is_dir {
                continue;
            }

            let path = dir_entry.path();
            match load_entry(&path).await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => debug!(dir = %path.display(), "skipping incomplete book directory"),
                Err(e) => warn!(error = %e, "skipping unreadable book directory"),
            }
        }

        entries.sort_by(|a, b| b.last_access.cmp(&a.last_access));
        debug!(count = entries.len(), "library scan complete");
        entries
    }

    /// Opens a book with the system's default application.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Open`] when the OS launcher fails.
    pub fn open_local_book(&self, entry: &LocalBookEntry) -> Result<(), LibraryError> {
        open_local_book(entry)
    }

    /// Opens the storage root in the system file manager, creating it first
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the root cannot be created and
    /// [`LibraryError::Open`] when the OS launcher fails.
    pub fn open_storage_directory(&self) -> Result<(), LibraryError> {
        std::fs::create_dir_all(&self.root).map_err(|e| LibraryError::io(&self.root, e))?;
        info!(path = %self.root.display(), "opening storage directory");
        open::that_detached(&self.root).map_err(|e| LibraryError::open(&self.root, e))
    }
}

/// Opens `entry`'s book file with the system's default application.
///
/// # Errors
///
/// Returns [`LibraryError::Open`] when the OS launcher fails.
pub fn open_local_book(entry: &LocalBookEntry) -> Result<(), LibraryError> {
    info!(path = %entry.file_path.display(), "opening book");
    open::that_detached(&entry.file_path).map_err(|e| LibraryError::open(&entry.file_path, e))
}

/// Reads one book directory. `Ok(None)` when the book file or sidecar is missing.
async fn load_entry(dir: &Path) -> Result<Option<LocalBookEntry>, LibraryError> {
    let mut listing = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| LibraryError::io(dir, e))?;

    let mut book_file = None;
    let mut has_sidecar = false;
    while let Some(file) = listing
        .next_entry()
        .await
        .map_err(|e| LibraryError::io(dir, e))?
    {
        let path = file.path();
        if file.file_name() == SIDECAR_FILE {
            has_sidecar = true;
        } else if book_file.is_none() && layout::is_book_file(&path) {
            book_file = Some(path);
        }
    }

    let Some(file_path) = book_file else {
        return Ok(None);
    };
    if !has_sidecar {
        return Ok(None);
    }

    let sidecar_path = dir.join(SIDECAR_FILE);
    let raw = tokio::fs::read(&sidecar_path)
        .await
        .map_err(|e| LibraryError::io(&sidecar_path, e))?;
    let metadata: CatalogRecord = serde_json::from_slice(&raw)
        .map_err(|e| LibraryError::malformed_sidecar(&sidecar_path, e))?;

    let file_meta = tokio::fs::metadata(&file_path)
        .await
        .map_err(|e| LibraryError::io(&file_path, e))?;
    let last_access = file_meta
        .accessed()
        .or_else(|_| file_meta.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH);

    Ok(Some(LocalBookEntry {
        metadata,
        file_path,
        last_access,
    }))
}
