//! Mirror page resolution into direct file URLs.
//!
//! A scraped candidate only links to an intermediate mirror page. The real
//! download link on that page sits next to its first `<h2>` heading; the two
//! known mirror layouts differ in where exactly:
//!
//! - the secondary mirror wraps the heading in the link (`<a><h2>GET</h2></a>`)
//! - the primary mirror nests the link inside the heading (`<h2><a>GET</a></h2>`)
//!
//! A third shape, the link immediately following the heading, is available as
//! [`MirrorLayout::Sibling`] to callers that pass a layout to
//! [`MirrorResolver::resolve`] themselves. No [`MirrorSlot`] maps to it.
//!
//! Resolution is a single attempt with no retry. The extracted `href` is
//! returned verbatim and may be relative to the mirror page.

mod error;

pub use error::MirrorError;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::http::{HttpTimeouts, build_http_client};
use crate::scrape::compile_static_selector;

static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("h2"));

/// Which of the two mirror columns a candidate link came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorSlot {
    Primary,
    #[default]
    Secondary,
}

impl MirrorSlot {
    /// Page layout served by mirrors in this slot.
    #[must_use]
    pub fn layout(self) -> MirrorLayout {
        match self {
            Self::Primary => MirrorLayout::Child,
            Self::Secondary => MirrorLayout::Parent,
        }
    }
}

impl fmt::Display for MirrorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        })
    }
}

impl FromStr for MirrorSlot {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary" | "1" => Ok(Self::Primary),
            "secondary" | "2" => Ok(Self::Secondary),
            other => Err(format!(
                "unknown mirror slot '{other}' (expected primary or secondary)"
            )),
        }
    }
}

/// Position of the download anchor relative to the page's first `<h2>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorLayout {
    /// `<a href><h2>…</h2></a>`
    Parent,
    /// `<h2><a href>…</a></h2>`
    Child,
    /// `<h2>…</h2><a href>…</a>`
    Sibling,
}

impl fmt::Display for MirrorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parent => "link wrapping first h2",
            Self::Child => "link inside first h2",
            Self::Sibling => "link following first h2",
        })
    }
}

/// Extracts the direct link from a mirror page body.
///
/// Returns `None` when the page has no `<h2>` or the expected anchor is absent.
#[must_use]
pub fn extract_direct_link(html: &str, layout: MirrorLayout) -> Option<String> {
    let document = Html::parse_document(html);
    let heading = document.select(&HEADING_SELECTOR).next()?;

    let anchor = match layout {
        MirrorLayout::Parent => heading.parent().and_then(ElementRef::wrap),
        MirrorLayout::Child => heading.children().find_map(ElementRef::wrap),
        MirrorLayout::Sibling => heading.next_siblings().find_map(ElementRef::wrap),
    }?;

    if anchor.value().name() != "a" {
        return None;
    }
    anchor
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

/// Fetches mirror pages and extracts the direct download link.
#[derive(Debug, Clone)]
pub struct MirrorResolver {
    client: Client,
}

impl MirrorResolver {
    /// Creates a resolver with the shared HTTP policy.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Client`] when the HTTP client cannot be built.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, MirrorError> {
        let client = build_http_client(timeouts).map_err(MirrorError::Client)?;
        Ok(Self { client })
    }

    /// Creates a resolver that reuses an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Resolves `mirror_ref` to the direct file URL, verbatim.
    ///
    /// # Errors
    ///
    /// - [`MirrorError::Network`] / [`MirrorError::HttpStatus`] when the page
    ///   cannot be fetched
    /// - [`MirrorError::LayoutMismatch`] when the page lacks the expected link
    #[instrument(skip(self), fields(mirror_ref = %mirror_ref, layout = %layout))]
    pub async fn resolve(&self, mirror_ref: &str, layout: MirrorLayout) -> Result<String, MirrorError> {
        let response = self
            .client
            .get(mirror_ref)
            .send()
            .await
            .map_err(|e| MirrorError::network(mirror_ref, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::http_status(mirror_ref, status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| MirrorError::network(mirror_ref, e))?;

        let link = extract_direct_link(&html, layout)
            .ok_or_else(|| MirrorError::layout_mismatch(mirror_ref, layout))?;
        debug!(link = %link, "resolved direct link");
        Ok(link)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_parent_layout() {
        let html = r#"<html><body><a href="https://dl.example/get.php?md5=abc"><h2>GET</h2></a></body></html>"#;
        assert_eq!(
            extract_direct_link(html, MirrorLayout::Parent).as_deref(),
            Some("https://dl.example/get.php?md5=abc")
        );
    }

    #[test]
    fn test_extract_child_layout() {
        let html = r#"<html><body><h2><a href="/main/abc/book.epub">GET</a></h2></body></html>"#;
        assert_eq!(
            extract_direct_link(html, MirrorLayout::Child).as_deref(),
            Some("/main/abc/book.epub")
        );
    }

    #[test]
    fn test_extract_sibling_layout_skips_text_nodes() {
        let html = r#"<html><body><h2>Download</h2> <a href="get/1">here</a></body></html>"#;
        assert_eq!(
            extract_direct_link(html, MirrorLayout::Sibling).as_deref(),
            Some("get/1")
        );
    }

    #[test]
    fn test_extract_uses_first_heading_only() {
        let html = r#"<html><body><div><h2>Title</h2></div><a href="x"><h2>GET</h2></a></body></html>"#;
        assert_eq!(extract_direct_link(html, MirrorLayout::Parent), None);
    }

    #[test]
    fn test_extract_wrong_layout_is_none() {
        let html = r#"<html><body><h2><a href="/x">GET</a></h2></body></html>"#;
        assert_eq!(extract_direct_link(html, MirrorLayout::Parent), None);
    }

    #[test]
    fn test_extract_no_heading_is_none() {
        assert_eq!(
            extract_direct_link("<html><body><a href='x'>x</a></body></html>", MirrorLayout::Child),
            None
        );
    }

    #[test]
    fn test_mirror_slot_layouts() {
        assert_eq!(MirrorSlot::Primary.layout(), MirrorLayout::Child);
        assert_eq!(MirrorSlot::Secondary.layout(), MirrorLayout::Parent);
        assert!(
            [MirrorSlot::Primary, MirrorSlot::Secondary]
                .iter()
                .all(|slot| slot.layout() != MirrorLayout::Sibling)
        );
        assert_eq!(MirrorSlot::default(), MirrorSlot::Secondary);
    }

    #[test]
    fn test_mirror_slot_from_str() {
        assert_eq!("primary".parse::<MirrorSlot>().unwrap(), MirrorSlot::Primary);
        assert_eq!(" Secondary ".parse::<MirrorSlot>().unwrap(), MirrorSlot::Secondary);
        assert_eq!("2".parse::<MirrorSlot>().unwrap(), MirrorSlot::Secondary);
        assert!("third".parse::<MirrorSlot>().is_err());
    }
}
