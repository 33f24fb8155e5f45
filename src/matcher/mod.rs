//! Candidate matching: associate a catalog record with scraped files.
//!
//! The default behavior is deliberately permissive: every candidate in a
//! supported format passes through in scrape order. Normalized-title and
//! publication-year signals are computed and logged but do not exclude
//! anything. [`MatchPolicy::RankByTitle`] is the opt-in alternative that
//! reorders (never drops) candidates by title similarity.
//!
//! Searching is guarded per record by [`MatchRegistry`]: a record that is
//! already being searched, or already has a match list, is not queried again
//! until its state is reset.

mod normalize;
mod registry;

pub use normalize::{normalize_title, strip_diacritics};
pub use registry::{MatchOutcome, MatchRegistry, MatchState};

use std::sync::Arc;

use tracing::{debug, info, instrument, trace};

use crate::catalog::{CatalogRecord, broadened_query, primary_query};
use crate::scrape::ScrapedCandidate;
use crate::search::CandidateSearch;

/// Extensions a candidate must have (case-insensitive) to be offered.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["epub", "pdf"];

/// How format-eligible candidates are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Scrape order, unchanged.
    #[default]
    Permissive,
    /// Stable sort by normalized-title similarity to the record, best first.
    RankByTitle,
}

/// Advisory comparison between a record and one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSignals {
    /// Normalized titles are equal.
    pub title_matches: bool,
    /// Normalized-title similarity in `0.0..=1.0`.
    pub title_similarity: f64,
    /// Publication years agree; `None` when either side has no year.
    pub year_matches: Option<bool>,
}

impl MatchSignals {
    /// Computes the signals for `candidate` against `record`.
    #[must_use]
    pub fn compute(record: &CatalogRecord, candidate: &ScrapedCandidate) -> Self {
        let record_title = normalize_title(record.title());
        let candidate_title = normalize_title(&candidate.title);
        let record_year = record.published_year();
        let candidate_year = candidate.year.trim().parse::<i32>().ok();

        Self {
            title_matches: record_title == candidate_title,
            title_similarity: strsim::normalized_levenshtein(&record_title, &candidate_title),
            year_matches: record_year.zip(candidate_year).map(|(a, b)| a == b),
        }
    }
}

/// Returns true if the candidate's extension is in [`SUPPORTED_EXTENSIONS`].
#[must_use]
pub fn is_supported_format(candidate: &ScrapedCandidate) -> bool {
    let extension = candidate.normalized_extension();
    SUPPORTED_EXTENSIONS.contains(&extension.as_str())
}

/// Filters (and, per `policy`, orders) candidates for `record`.
///
/// Never returns a candidate outside [`SUPPORTED_EXTENSIONS`].
#[must_use]
pub fn match_candidates(
    candidates: Vec<ScrapedCandidate>,
    record: &CatalogRecord,
    policy: MatchPolicy,
) -> Vec<ScrapedCandidate> {
    let mut scored: Vec<(ScrapedCandidate, MatchSignals)> = candidates
        .into_iter()
        .filter(is_supported_format)
        .map(|candidate| {
            let signals = MatchSignals::compute(record, &candidate);
            trace!(
                candidate_id = %candidate.id,
                title_matches = signals.title_matches,
                year_matches = ?signals.year_matches,
                "candidate signals"
            );
            (candidate, signals)
        })
        .collect();

    if policy == MatchPolicy::RankByTitle {
        scored.sort_by(|(_, a), (_, b)| b.title_similarity.total_cmp(&a.title_similarity));
    }

    scored.into_iter().map(|(candidate, _)| candidate).collect()
}

/// Runs catalog queries for a record and applies the match filter.
#[derive(Clone)]
pub struct CandidateMatcher {
    search: Arc<dyn CandidateSearch>,
    policy: MatchPolicy,
}

impl std::fmt::Debug for CandidateMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateMatcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CandidateMatcher {
    /// Creates a matcher over `search` with the permissive policy.
    #[must_use]
    pub fn new(search: Arc<dyn CandidateSearch>) -> Self {
        Self {
            search,
            policy: MatchPolicy::default(),
        }
    }

    /// Sets the ordering policy.
    #[must_use]
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Queries the catalog for `record` and returns the filtered matches.
    ///
    /// Retries once with the broadened query when the first query returns no
    /// rows; the retry's answer is final. An unavailable catalog yields an
    /// empty list.
    pub async fn resolve_and_match(&self, record: &CatalogRecord) -> Vec<ScrapedCandidate> {
        self.try_match(record).await.unwrap_or_default()
    }

    /// Like [`resolve_and_match`](Self::resolve_and_match), but distinguishes
    /// an unavailable catalog (`None`) from an empty match list.
    #[instrument(skip(self, record), fields(record_id = %record.id))]
    pub async fn try_match(&self, record: &CatalogRecord) -> Option<Vec<ScrapedCandidate>> {
        let query = primary_query(record);
        let first = self.search.search_candidates(&query).await?;

        let candidates = if first.is_empty() {
            let broadened = broadened_query(record);
            info!(query = %broadened, "no results; retrying with broadened query");
            self.search
                .search_candidates(&broadened)
                .await
                .unwrap_or_default()
        } else {
            first
        };

        let scraped = candidates.len();
        let matches = match_candidates(candidates, record, self.policy);
        debug!(scraped, matched = matches.len(), "matching complete");
        Some(matches)
    }
}
