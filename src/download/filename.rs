//! Filename extraction and sanitization for downloaded books.
//!
//! The server's `Content-Disposition` name wins. Without one, the last path
//! segment of the direct URL is used if it looks like a file name, and the
//! final fallback is `{title}.{extension}` from the scraped candidate.

use std::path::{Component, Path};

use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use tracing::debug;
use url::Url;

use crate::scrape::ScrapedCandidate;

/// Picks the on-disk name for the main book file.
pub(crate) fn resolve_book_filename(
    headers: &HeaderMap,
    url: &Url,
    candidate: &ScrapedCandidate,
) -> String {
    if let Some(name) = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_disposition)
        .map(|name| sanitize_filename(name.trim()))
        .filter(|name| is_usable(name))
    {
        return name;
    }

    if let Some(name) = filename_from_url(url) {
        debug!(filename = %name, "no content-disposition filename; using URL path");
        return name;
    }

    let name = filename_from_candidate(candidate);
    debug!(filename = %name, "no usable server filename; using candidate title");
    name
}

/// Parses a `Content-Disposition` header value to extract the filename.
///
/// Handles:
/// - `attachment; filename="example.pdf"`
/// - `attachment; filename=example.pdf`
/// - `attachment; filename*=UTF-8''example.pdf` (RFC 5987)
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        // charset'language'encoded_value
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            if let Ok(decoded) = urlencoding::decode(encoded[..end].trim()) {
                return Some(decoded.into_owned());
            }
        }
    }

    let pos = header.find("filename=")?;
    let value = header[pos + 9..].trim();
    if let Some(stripped) = value.strip_prefix('"') {
        return stripped.find('"').map(|end| stripped[..end].to_string());
    }
    let end = value.find(';').unwrap_or(value.len());
    let filename = value[..end].trim();
    (!filename.is_empty()).then(|| filename.to_string())
}

/// Last URL path segment, percent-decoded, if it has an extension.
pub(crate) fn filename_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
    let name = sanitize_filename(&decoded);
    let has_extension = name
        .rfind('.')
        .is_some_and(|dot| dot > 0 && dot + 1 < name.len());
    (has_extension && is_usable(&name)).then_some(name)
}

/// `{title}.{extension}` built from scraped fields.
pub(crate) fn filename_from_candidate(candidate: &ScrapedCandidate) -> String {
    let title = candidate.title.trim();
    let title = if title.is_empty() { "book" } else { title };
    let extension = candidate.normalized_extension();
    if extension.is_empty() {
        sanitize_filename(title)
    } else {
        sanitize_filename(&format!("{title}.{extension}"))
    }
}

/// Sanitizes a name for use as a single path segment.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |`) and control characters; dot-only names are
/// rewritten so they cannot escape the parent directory.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_usable(name: &str) -> bool {
    !name.trim_matches('_').trim().is_empty()
}

fn is_safe_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn candidate(title: &str, extension: &str) -> ScrapedCandidate {
        ScrapedCandidate {
            id: "1".into(),
            author: String::new(),
            title: title.into(),
            publisher: String::new(),
            year: String::new(),
            pages: String::new(),
            language: String::new(),
            size: String::new(),
            extension: extension.into(),
            primary_mirror: None,
            secondary_mirror: None,
        }
    }

    #[test]
    fn test_sanitize_filename_removes_invalid_chars() {
        assert_eq!(sanitize_filename("file/name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("file\\name.pdf"), "file_name.pdf");
        assert_eq!(sanitize_filename("Dune: Messiah.epub"), "Dune_ Messiah.epub");
        assert_eq!(sanitize_filename("file<name>.pdf"), "file_name_.pdf");
    }

    #[test]
    fn test_sanitize_filename_rewrites_dot_segments() {
        assert_eq!(sanitize_filename("."), "_");
        assert_eq!(sanitize_filename(".."), "__");
    }

    #[test]
    fn test_sanitize_filename_preserves_valid_chars() {
        assert_eq!(sanitize_filename("Dune - Frank Herbert"), "Dune - Frank Herbert");
        assert_eq!(sanitize_filename("Les Misérables.epub"), "Les Misérables.epub");
    }

    #[test]
    fn test_parse_content_disposition_variants() {
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="Dune.epub""#),
            Some("Dune.epub".to_string())
        );
        assert_eq!(
            parse_content_disposition("attachment; filename=Dune.epub"),
            Some("Dune.epub".to_string())
        );
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="Dune.epub"; size=10"#),
            Some("Dune.epub".to_string())
        );
        assert_eq!(
            parse_content_disposition("attachment; filename*=UTF-8''Les%20Mis%C3%A9rables.epub"),
            Some("Les Misérables.epub".to_string())
        );
        assert_eq!(parse_content_disposition("attachment"), None);
    }

    #[test]
    fn test_resolve_prefers_content_disposition() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_static(r#"attachment; filename="Dune (1965).epub""#),
        );
        let url = Url::parse("http://files.example/get/abc.bin").unwrap();
        assert_eq!(
            resolve_book_filename(&headers, &url, &candidate("Dune", "epub")),
            "Dune (1965).epub"
        );
    }

    #[test]
    fn test_resolve_falls_back_to_url_segment() {
        let url = Url::parse("http://files.example/get/Dune%20Messiah.pdf").unwrap();
        assert_eq!(
            resolve_book_filename(&HeaderMap::new(), &url, &candidate("x", "pdf")),
            "Dune Messiah.pdf"
        );
    }

    #[test]
    fn test_resolve_falls_back_to_candidate_title() {
        let url = Url::parse("http://files.example/get.php?md5=abc").unwrap();
        assert_eq!(
            resolve_book_filename(&HeaderMap::new(), &url, &candidate("Dune/Two", "EPUB")),
            "Dune_Two.epub"
        );

        let url = Url::parse("http://files.example/").unwrap();
        assert_eq!(
            resolve_book_filename(&HeaderMap::new(), &url, &candidate("  ", "pdf")),
            "book.pdf"
        );
    }

    #[test]
    fn test_resolve_ignores_traversal_names() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_static(r#"attachment; filename="../../etc/passwd""#),
        );
        let url = Url::parse("http://files.example/main/").unwrap();
        let name = resolve_book_filename(&headers, &url, &candidate("Dune", "pdf"));
        assert!(!name.contains('/'), "got {name}");
        assert_eq!(Path::new(&name).components().count(), 1);
    }
}
