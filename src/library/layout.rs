//! On-disk layout of the storage root.
//!
//! ```text
//! {storage_root}/
//!   {title} - {first author}/
//!     data.json     serialized CatalogRecord
//!     cover.jpg     optional
//!     {filename}    the book file
//! ```

use std::path::{Path, PathBuf};

use crate::catalog::CatalogRecord;
use crate::download::filename::sanitize_filename;

/// Metadata sidecar written next to every book.
pub const SIDECAR_FILE: &str = "data.json";

/// Optional cover image written next to the book.
pub const COVER_FILE: &str = "cover.jpg";

/// Extensions recognized as book files when indexing.
pub const BOOK_EXTENSIONS: [&str; 2] = ["epub", "pdf"];

/// Directory name for a record: `"{title}"` or `"{title} - {first author}"`.
#[must_use]
pub fn book_dir_name(record: &CatalogRecord) -> String {
    let title = record.title().trim();
    let name = match record.first_author() {
        Some(author) => format!("{title} - {}", author.trim()),
        None => title.to_string(),
    };
    sanitize_filename(&name)
}

/// Full path of the directory for `record` under `root`.
#[must_use]
pub fn book_dir(root: &Path, record: &CatalogRecord) -> PathBuf {
    root.join(book_dir_name(record))
}

/// True if `path` ends in one of [`BOOK_EXTENSIONS`] (case-insensitive).
#[must_use]
pub fn is_book_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            BOOK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
