//! Shared User-Agent string for catalog, mirror and transfer HTTP clients.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/alexandria";

/// Default User-Agent for every request the tool makes.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("alexandria/{version} (book-library-tool; +{PROJECT_UA_URL})")
}
