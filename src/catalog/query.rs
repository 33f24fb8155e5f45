//! Search query construction for catalog lookups.

use super::CatalogRecord;

/// Builds the first-attempt query: title, subtitle (when present) and every author.
#[must_use]
pub fn primary_query(record: &CatalogRecord) -> String {
    let info = &record.volume_info;
    let mut parts: Vec<&str> = vec![info.title.trim()];
    if let Some(subtitle) = info.subtitle.as_deref() {
        parts.push(subtitle.trim());
    }
    parts.extend(info.authors.iter().map(|author| author.trim()));
    join_non_empty(&parts)
}

/// Builds the broadened retry query: title plus the first author only.
#[must_use]
pub fn broadened_query(record: &CatalogRecord) -> String {
    let mut parts = vec![record.title().trim()];
    if let Some(author) = record.first_author() {
        parts.push(author.trim());
    }
    join_non_empty(&parts)
}

fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
