//! Human-readable size strings from the results table (`"12 Mb"`, `"850 Kb"`).

use std::sync::LazyLock;

use regex::Regex;

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+(?:[.,]\d+)?)\s*(bytes?|b|kb|mb|gb)\s*$")
        .unwrap_or_else(|e| panic!("invalid static regex for size parsing: {e}"))
});

/// Converts a size string to bytes using 1024-based units.
///
/// Returns `None` when the string does not look like `<number> <unit>`.
#[must_use]
pub fn parse_size(value: &str) -> Option<u64> {
    let caps = SIZE_RE.captures(value)?;
    let number: f64 = caps.get(1)?.as_str().replace(',', ".").parse().ok()?;
    let multiplier: f64 = match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
        "kb" => 1024.0,
        "mb" => 1024.0 * 1024.0,
        "gb" => 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some((number * multiplier).round() as u64)
}
