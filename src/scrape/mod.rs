//! Results-table scraping for catalog search pages.
//!
//! The catalog's search page is a layout of nested tables; the results live in
//! the third `<table>` of the document, one row per available file, with a
//! header row first. Cells are positional:
//!
//! | idx | content |
//! |-----|---------|
//! | 0 | catalog id |
//! | 1 | author(s) |
//! | 2 | title (anchor with a `title` attribute, plus decorative markup) |
//! | 3 | publisher |
//! | 4 | year |
//! | 5 | pages |
//! | 6 | language |
//! | 7 | size (`"12 Mb"`) |
//! | 8 | extension |
//! | 9, 10 | mirror links |
//!
//! A missing cell yields an empty field rather than an error; the layout is
//! owned by a third party and the scraper stays lenient about it.

mod size;

pub use size::parse_size;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mirror::MirrorSlot;

/// Zero-based position of the results table among all `<table>` elements.
pub const RESULTS_TABLE_INDEX: usize = 2;

static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("table"));

/// Compiles a selector at static init; panics on invalid pattern.
pub(crate) fn compile_static_selector(pattern: &str) -> Selector {
    Selector::parse(pattern).unwrap_or_else(|e| panic!("invalid static selector '{pattern}': {e}"))
}

/// One row of the results table: a single downloadable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedCandidate {
    pub id: String,
    pub author: String,
    pub title: String,
    pub publisher: String,
    pub year: String,
    pub pages: String,
    pub language: String,
    pub size: String,
    pub extension: String,
    /// First mirror link (column 9).
    pub primary_mirror: Option<String>,
    /// Second mirror link (column 10).
    pub secondary_mirror: Option<String>,
}

impl ScrapedCandidate {
    /// Mirror reference for the given slot.
    #[must_use]
    pub fn mirror_ref(&self, slot: MirrorSlot) -> Option<&str> {
        match slot {
            MirrorSlot::Primary => self.primary_mirror.as_deref(),
            MirrorSlot::Secondary => self.secondary_mirror.as_deref(),
        }
        .filter(|href| !href.trim().is_empty())
    }

    /// Byte count derived from the human-readable size column.
    #[must_use]
    pub fn size_bytes(&self) -> Option<u64> {
        parse_size(&self.size)
    }

    /// Lowercased, trimmed extension (`"EPUB "` → `"epub"`).
    #[must_use]
    pub fn normalized_extension(&self) -> String {
        self.extension.trim().to_lowercase()
    }
}

/// Parses a search-results document into candidates, in table order.
///
/// Returns an empty vector when the document has fewer than three tables.
#[must_use]
pub fn scrape_results(html: &str) -> Vec<ScrapedCandidate> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&TABLE_SELECTOR).nth(RESULTS_TABLE_INDEX) else {
        debug!("results table not found in document");
        return Vec::new();
    };

    let candidates: Vec<ScrapedCandidate> = table_rows(table).skip(1).map(scrape_row).collect();
    debug!(count = candidates.len(), "scraped results table");
    candidates
}

/// Rows directly under the table (through the implicit `<tbody>`), ignoring nested tables.
fn table_rows(table: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    child_elements(table)
        .flat_map(|section| match section.value().name() {
            "tbody" | "thead" | "tfoot" => child_elements(section).collect::<Vec<_>>(),
            "tr" => vec![section],
            _ => Vec::new(),
        })
        .filter(|row| row.value().name() == "tr")
}

fn child_elements(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

fn scrape_row(row: ElementRef<'_>) -> ScrapedCandidate {
    let cells: Vec<ElementRef<'_>> = child_elements(row).collect();
    let text = |index: usize| {
        cells
            .get(index)
            .map(|cell| cell.text().collect::<String>())
            .unwrap_or_default()
    };
    let first_href = |index: usize| {
        cells
            .get(index)
            .and_then(|cell| child_elements(*cell).next())
            .and_then(|link| link.value().attr("href"))
            .map(str::to_string)
    };

    ScrapedCandidate {
        id: text(0),
        author: text(1),
        title: cells.get(2).map(|cell| title_text(*cell)).unwrap_or_default(),
        publisher: text(3),
        year: text(4),
        pages: text(5),
        language: text(6),
        size: text(7),
        extension: text(8),
        primary_mirror: first_href(9),
        secondary_mirror: first_href(10),
    }
}

/// Title text from the cell's titled anchor, without nested decorative markup.
///
/// The anchor carries series names and ISBNs in nested `<font>`/`<i>` elements;
/// only its own text nodes form the title.
fn title_text(cell: ElementRef<'_>) -> String {
    let Some(anchor) = child_elements(cell)
        .find(|child| child.value().name() == "a" && child.value().attr("title").is_some())
    else {
        return String::new();
    };

    anchor
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect::<String>()
        .trim()
        .to_string()
}
