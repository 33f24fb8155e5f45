//! Error types for mirror resolution.

use thiserror::Error;

use super::MirrorLayout;

/// Errors that can occur while resolving a mirror page.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The HTTP client could not be constructed.
    #[error("failed to build mirror HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Network-level failure fetching the mirror page.
    #[error("network error fetching mirror page {url}: {source}")]
    Network {
        /// The mirror page URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The mirror page answered with a non-success status.
    #[error("HTTP {status} fetching mirror page {url}")]
    HttpStatus {
        /// The mirror page URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The page does not contain the download link where the layout expects it.
    #[error("layout mismatch on mirror page {url}: expected {layout}")]
    LayoutMismatch {
        /// The mirror page URL.
        url: String,
        /// Human-readable description of the expected layout.
        layout: String,
    },
}

impl MirrorError {
    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a layout mismatch error.
    pub fn layout_mismatch(url: impl Into<String>, layout: MirrorLayout) -> Self {
        Self::LayoutMismatch {
            url: url.into(),
            layout: layout.to_string(),
        }
    }

    /// Returns true if the upstream was unreachable or refused the request.
    #[must_use]
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::HttpStatus { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_mismatch_display_names_layout() {
        let error = MirrorError::layout_mismatch("http://mirror/x", MirrorLayout::Parent);
        let msg = error.to_string();
        assert!(msg.contains("layout mismatch"), "Expected kind in: {msg}");
        assert!(msg.contains("http://mirror/x"), "Expected URL in: {msg}");
        assert!(msg.contains("wrapping first h2"), "Expected layout in: {msg}");
        assert!(!error.is_upstream_unavailable());
    }

    #[test]
    fn test_http_status_is_upstream_unavailable() {
        let error = MirrorError::http_status("http://mirror/x", 503);
        assert!(error.to_string().contains("503"));
        assert!(error.is_upstream_unavailable());
    }
}
