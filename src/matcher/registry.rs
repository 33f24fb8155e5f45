//! Per-record search guard.
//!
//! The registry is caller-owned session state: the matcher itself is
//! stateless, and independent sessions simply use independent registries.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::CandidateMatcher;
use crate::catalog::CatalogRecord;
use crate::scrape::ScrapedCandidate;

/// Search state of one catalog record. Records with no entry are idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchState {
    /// A query for this record is in flight.
    Searching,
    /// Matching finished; the list may be empty ("not found").
    Matched(Vec<ScrapedCandidate>),
}

/// Result of [`MatchRegistry::search_once`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The record was already searching or matched; no query was issued.
    Skipped,
    /// Matching finished and the list was stored.
    Matched(Vec<ScrapedCandidate>),
    /// The catalog was unavailable; the record is idle again.
    Unavailable,
}

/// Tracks which records have been searched in this session.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    states: DashMap<String, MatchState>,
}

impl MatchRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches for `record` unless it is already searching or matched.
    pub async fn search_once(
        &self,
        matcher: &CandidateMatcher,
        record: &CatalogRecord,
    ) -> MatchOutcome {
        if !self.try_begin(&record.id) {
            debug!(record_id = %record.id, "search skipped; record already searching or matched");
            return MatchOutcome::Skipped;
        }

        match matcher.try_match(record).await {
            Some(matches) => {
                self.states
                    .insert(record.id.clone(), MatchState::Matched(matches.clone()));
                MatchOutcome::Matched(matches)
            }
            None => {
                self.states.remove(&record.id);
                MatchOutcome::Unavailable
            }
        }
    }

    /// Marks `id` as searching. Returns false if it was not idle.
    pub fn try_begin(&self, id: &str) -> bool {
        match self.states.entry(id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(MatchState::Searching);
                true
            }
        }
    }

    /// Current state of `id`, `None` when idle.
    #[must_use]
    pub fn state(&self, id: &str) -> Option<MatchState> {
        self.states.get(id).map(|state| state.value().clone())
    }

    /// Stored matches for `id`, if matching finished.
    #[must_use]
    pub fn matches(&self, id: &str) -> Option<Vec<ScrapedCandidate>> {
        match self.state(id)? {
            MatchState::Matched(matches) => Some(matches),
            MatchState::Searching => None,
        }
    }

    /// Returns `id` to idle so the next [`search_once`](Self::search_once) queries again.
    pub fn reset(&self, id: &str) {
        self.states.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_begin_only_once_until_reset() {
        let registry = MatchRegistry::new();
        assert!(registry.try_begin("a"));
        assert!(!registry.try_begin("a"));
        assert_eq!(registry.state("a"), Some(MatchState::Searching));
        assert_eq!(registry.matches("a"), None);
        registry.reset("a");
        assert_eq!(registry.state("a"), None);
        assert!(registry.try_begin("a"));
    }

    #[test]
    fn test_records_are_independent() {
        let registry = MatchRegistry::new();
        assert!(registry.try_begin("a"));
        assert!(registry.try_begin("b"));
    }
}
