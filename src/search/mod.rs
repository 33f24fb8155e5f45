//! Catalog search: query the results page and scrape it into candidates.
//!
//! Failures never escape as errors. An unreachable catalog, a non-200 answer
//! or an unreadable body all collapse into `None`, which callers show as
//! "not found".

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::http::{HttpTimeouts, build_http_client};
use crate::scrape::{ScrapedCandidate, scrape_results};

/// Default catalog host.
pub const DEFAULT_CATALOG_HOST: &str = "http://libgen.is";

/// Fixed result cap requested from the catalog (no pagination).
pub const RESULTS_PER_PAGE: u32 = 50;

/// Source of scraped candidates for a free-text query.
///
/// Implemented by [`SearchClient`]; the matcher depends on this trait so the
/// retry policy can be exercised without a network.
#[async_trait]
pub trait CandidateSearch: Send + Sync {
    /// Runs one catalog query.
    ///
    /// Returns `None` when the catalog is unavailable, `Some(vec![])` when it
    /// answered with no rows.
    async fn search_candidates(&self, query: &str) -> Option<Vec<ScrapedCandidate>>;
}

/// HTTP client for the catalog's search page.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    search_url: Url,
}

impl SearchClient {
    /// Creates a client for `catalog_host` (e.g. `http://libgen.is`).
    ///
    /// # Errors
    ///
    /// Returns an error when the host is not a valid base URL or the HTTP
    /// client cannot be built.
    pub fn new(catalog_host: &str, timeouts: HttpTimeouts) -> Result<Self, SearchSetupError> {
        let client = build_http_client(timeouts).map_err(SearchSetupError::Client)?;
        Self::with_client(client, catalog_host)
    }

    /// Creates a search client that reuses an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SearchSetupError::InvalidHost`] when the host cannot be parsed.
    pub fn with_client(client: Client, catalog_host: &str) -> Result<Self, SearchSetupError> {
        let search_url = search_endpoint(catalog_host)
            .ok_or_else(|| SearchSetupError::InvalidHost(catalog_host.to_string()))?;
        Ok(Self { client, search_url })
    }

    /// Full request URL for `query`.
    #[must_use]
    pub fn request_url(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("req", query)
            .append_pair("res", &RESULTS_PER_PAGE.to_string());
        url
    }
}

#[async_trait]
impl CandidateSearch for SearchClient {
    #[instrument(skip(self), fields(query = %query))]
    async fn search_candidates(&self, query: &str) -> Option<Vec<ScrapedCandidate>> {
        let url = self.request_url(query);
        let response = match self.client.get(url.as_str()).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, "catalog search request failed");
                return None;
            }
        };

        let status = response.status();
        if status.as_u16() != 200 {
            warn!(status = status.as_u16(), "catalog search returned non-200 status");
            return None;
        }

        let html = match response.text().await {
            Ok(body) => body,
            Err(error) => {
                warn!(error = %error, "catalog search body could not be read");
                return None;
            }
        };

        let candidates = scrape_results(&html);
        debug!(count = candidates.len(), "catalog search complete");
        Some(candidates)
    }
}

/// Errors constructing a [`SearchClient`].
#[derive(Debug, thiserror::Error)]
pub enum SearchSetupError {
    /// The HTTP client could not be constructed.
    #[error("failed to build catalog HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The catalog host is not a usable http(s) base URL.
    #[error("invalid catalog host '{0}': expected an http(s) URL")]
    InvalidHost(String),
}

fn search_endpoint(catalog_host: &str) -> Option<Url> {
    let mut base = Url::parse(catalog_host.trim()).ok()?;
    if !matches!(base.scheme(), "http" | "https") {
        return None;
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("search.php").ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(host: &str) -> SearchClient {
        SearchClient::with_client(Client::new(), host).unwrap()
    }

    #[test]
    fn test_request_url_encodes_query_and_result_cap() {
        let url = client("http://libgen.example").request_url("Dune & Co Frank Herbert");
        assert_eq!(url.path(), "/search.php");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("req".to_string(), "Dune & Co Frank Herbert".to_string()),
                ("res".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_url_keeps_host_path_prefix() {
        let url = client("https://mirror.example/catalog").request_url("x");
        assert_eq!(url.path(), "/catalog/search.php");
    }

    #[test]
    fn test_invalid_host_rejected() {
        let result = SearchClient::with_client(Client::new(), "ftp://libgen.example");
        assert!(matches!(result, Err(SearchSetupError::InvalidHost(_))));
        let result = SearchClient::with_client(Client::new(), "not a url");
        assert!(matches!(result, Err(SearchSetupError::InvalidHost(_))));
    }
}
