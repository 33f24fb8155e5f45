//! CLI command handlers.

mod download;
mod library;
mod matching;
mod search;

pub use download::run_download_command;
pub use library::{run_library_command, run_open_command, run_open_dir_command};
pub use matching::run_match_command;
pub use search::run_search_command;

use std::path::Path;

use anyhow::{Context, Result};

use alexandria_core::{CatalogRecord, ScrapedCandidate};

/// Reads a catalog record from a JSON file.
pub(crate) fn load_record(path: &Path) -> Result<CatalogRecord> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse catalog record '{}'", path.display()))
}

/// One numbered line per candidate.
pub(crate) fn print_candidates(candidates: &[ScrapedCandidate]) {
    for (index, candidate) in candidates.iter().enumerate() {
        println!(
            "{:>3}. [{}] {} by {} ({}, {}, {})",
            index + 1,
            candidate.extension.trim(),
            candidate.title.trim(),
            candidate.author.trim(),
            candidate.year.trim(),
            candidate.size.trim(),
            candidate.language.trim(),
        );
    }
}
