//! Bibliographic records as delivered by the external volume provider.
//!
//! A [`CatalogRecord`] mirrors the provider's volume JSON: an `id` plus a
//! `volumeInfo` object. Only the fields the core reads are typed; everything
//! else is carried through untouched so that the `data.json` sidecar written
//! next to a book deserializes back into an identical record.

mod query;

pub use query::{broadened_query, primary_query};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One volume from the bibliographic provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Provider-assigned identifier; also keys downloads and match state.
    pub id: String,
    /// Descriptive metadata.
    #[serde(rename = "volumeInfo")]
    pub volume_info: VolumeInfo,
    /// Provider fields the core does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `volumeInfo` block of a [`CatalogRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_links: Option<ImageLinks>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub industry_identifiers: Vec<IndustryIdentifier>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cover image links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// ISBN-style identifier (`{"type": "ISBN_13", "identifier": "978..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

impl CatalogRecord {
    /// Creates a record with just an id and a title.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            volume_info: VolumeInfo {
                title: title.into(),
                ..VolumeInfo::default()
            },
            extra: Map::new(),
        }
    }

    /// Adds an author (builder style, mostly for tests and fixtures).
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.volume_info.authors.push(author.into());
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.volume_info.title
    }

    #[must_use]
    pub fn first_author(&self) -> Option<&str> {
        self.volume_info
            .authors
            .first()
            .map(String::as_str)
            .filter(|author| !author.trim().is_empty())
    }

    /// Cover thumbnail URL, if the provider supplied one.
    #[must_use]
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.volume_info
            .image_links
            .as_ref()
            .and_then(|links| links.thumbnail.as_deref())
            .filter(|url| !url.trim().is_empty())
    }

    /// Publication year parsed from `publishedDate` (`"2019"`, `"2019-05"`, `"2019-05-14"`).
    #[must_use]
    pub fn published_year(&self) -> Option<i32> {
        let date = self.volume_info.published_date.as_deref()?.trim();
        let year: String = date.chars().take_while(char::is_ascii_digit).collect();
        if year.len() != 4 {
            return None;
        }
        year.parse().ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const VOLUME_JSON: &str = r#"{
        "kind": "books#volume",
        "id": "zyTCAlFPjgYC",
        "etag": "f0zKg75Mx/I",
        "volumeInfo": {
            "title": "The Google Story",
            "subtitle": "Inside the Hottest Business",
            "authors": ["David A. Vise", "Mark Malseed"],
            "publishedDate": "2005-11-15",
            "industryIdentifiers": [
                {"type": "ISBN_10", "identifier": "055380457X"}
            ],
            "imageLinks": {
                "smallThumbnail": "http://books.example/s.jpg",
                "thumbnail": "http://books.example/t.jpg"
            },
            "pageCount": 207
        }
    }"#;

    #[test]
    fn test_catalog_record_parses_provider_volume() {
        let record: CatalogRecord = serde_json::from_str(VOLUME_JSON).unwrap();
        assert_eq!(record.id, "zyTCAlFPjgYC");
        assert_eq!(record.title(), "The Google Story");
        assert_eq!(record.first_author(), Some("David A. Vise"));
        assert_eq!(record.thumbnail_url(), Some("http://books.example/t.jpg"));
        assert_eq!(record.volume_info.industry_identifiers[0].kind, "ISBN_10");
    }

    #[test]
    fn test_catalog_record_keeps_unknown_fields_through_round_trip() {
        let record: CatalogRecord = serde_json::from_str(VOLUME_JSON).unwrap();
        let encoded = serde_json::to_string(&record).unwrap();
        let original: Value = serde_json::from_str(VOLUME_JSON).unwrap();
        let reencoded: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(original, reencoded);
    }

    #[test]
    fn test_catalog_record_minimal_volume() {
        let record: CatalogRecord =
            serde_json::from_str(r#"{"id": "x1", "volumeInfo": {"title": "Dune"}}"#).unwrap();
        assert_eq!(record.first_author(), None);
        assert_eq!(record.thumbnail_url(), None);
        assert_eq!(record.published_year(), None);
    }

    #[test]
    fn test_published_year_accepts_partial_dates() {
        let mut record = CatalogRecord::new("a", "A");
        for (date, expected) in [
            ("2019", Some(2019)),
            ("2019-05", Some(2019)),
            ("2019-05-14", Some(2019)),
            ("19", None),
            ("unknown", None),
        ] {
            record.volume_info.published_date = Some(date.to_string());
            assert_eq!(record.published_year(), expected, "date {date}");
        }
    }

    #[test]
    fn test_first_author_ignores_blank_entry() {
        let record = CatalogRecord::new("a", "A").with_author("  ");
        assert_eq!(record.first_author(), None);
    }
}
