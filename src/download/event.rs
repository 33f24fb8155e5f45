//! Download events and the caller-side job projection.

use std::path::PathBuf;

use serde::Serialize;

use crate::catalog::CatalogRecord;
use crate::scrape::ScrapedCandidate;

/// Lifecycle of a single download.
///
/// `Pending → Resolving → Transferring → {Completed, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Pending,
    Resolving,
    Transferring,
    Completed,
    Failed,
}

impl DownloadStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Bytes received so far for one download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// Source record id.
    pub id: String,
    /// Total size from `content-length`; `None` when the server did not say.
    pub bytes_total: Option<u64>,
    pub bytes_transferred: u64,
}

impl ProgressEvent {
    /// Completion percentage, only when the total is known.
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)]
        self.bytes_total
            .filter(|total| *total > 0)
            .map(|total| self.bytes_transferred as f64 * 100.0 / total as f64)
    }
}

/// How a download ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TransferOutcome {
    /// The book file is on disk at `path`.
    Completed { path: PathBuf },
    /// The download failed; `reason` is diagnostic detail for logs.
    Failed { reason: String },
}

/// Terminal event, emitted exactly once per download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionEvent {
    /// Source record id.
    pub id: String,
    pub outcome: TransferOutcome,
}

impl CompletionEvent {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TransferOutcome::Completed { .. })
    }
}

/// Everything a download reports, keyed by source record id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// Non-terminal state transition.
    Status { id: String, status: DownloadStatus },
    Progress(ProgressEvent),
    Finished(CompletionEvent),
}

impl DownloadEvent {
    /// Source record id the event belongs to.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Status { id, .. } => id,
            Self::Progress(progress) => &progress.id,
            Self::Finished(completion) => &completion.id,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

/// Caller-owned view of one download, kept current from its events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadJob {
    /// Equal to `source_record.id`.
    pub id: String,
    pub source_record: CatalogRecord,
    pub chosen_candidate: ScrapedCandidate,
    pub status: DownloadStatus,
    pub bytes_total: Option<u64>,
    pub bytes_transferred: u64,
}

impl DownloadJob {
    /// Creates a pending job for `record` and `candidate`.
    #[must_use]
    pub fn new(source_record: CatalogRecord, chosen_candidate: ScrapedCandidate) -> Self {
        Self {
            id: source_record.id.clone(),
            source_record,
            chosen_candidate,
            status: DownloadStatus::Pending,
            bytes_total: None,
            bytes_transferred: 0,
        }
    }

    /// Applies `event` if it belongs to this job. Returns whether it did.
    pub fn apply(&mut self, event: &DownloadEvent) -> bool {
        if event.id() != self.id {
            return false;
        }
        match event {
            DownloadEvent::Status { status, .. } => self.status = *status,
            DownloadEvent::Progress(progress) => {
                self.status = DownloadStatus::Transferring;
                self.bytes_total = progress.bytes_total;
                self.bytes_transferred = progress.bytes_transferred;
            }
            DownloadEvent::Finished(completion) => {
                self.status = if completion.is_success() {
                    DownloadStatus::Completed
                } else {
                    DownloadStatus::Failed
                };
            }
        }
        true
    }

    /// True once the job should be removed from the active set.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Total size for display: the server's figure, else the scraped size estimate.
    #[must_use]
    pub fn estimated_total(&self) -> Option<u64> {
        self.bytes_total.or_else(|| self.chosen_candidate.size_bytes())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn candidate() -> ScrapedCandidate {
        ScrapedCandidate {
            id: "1".into(),
            author: String::new(),
            title: "T".into(),
            publisher: String::new(),
            year: String::new(),
            pages: String::new(),
            language: String::new(),
            size: "1 Kb".into(),
            extension: "pdf".into(),
            primary_mirror: None,
            secondary_mirror: None,
        }
    }

    #[test]
    fn test_percent_requires_known_total() {
        let known = ProgressEvent {
            id: "a".into(),
            bytes_total: Some(200),
            bytes_transferred: 50,
        };
        assert_eq!(known.percent(), Some(25.0));
        let unknown = ProgressEvent {
            id: "a".into(),
            bytes_total: None,
            bytes_transferred: 50,
        };
        assert_eq!(unknown.percent(), None);
    }

    #[test]
    fn test_job_applies_own_events_only() {
        let mut job = DownloadJob::new(CatalogRecord::new("a", "T"), candidate());
        assert_eq!(job.status, DownloadStatus::Pending);
        assert_eq!(job.estimated_total(), Some(1024));

        let foreign = DownloadEvent::Progress(ProgressEvent {
            id: "b".into(),
            bytes_total: Some(10),
            bytes_transferred: 5,
        });
        assert!(!job.apply(&foreign));
        assert_eq!(job.bytes_transferred, 0);

        assert!(job.apply(&DownloadEvent::Status {
            id: "a".into(),
            status: DownloadStatus::Resolving,
        }));
        assert_eq!(job.status, DownloadStatus::Resolving);

        assert!(job.apply(&DownloadEvent::Progress(ProgressEvent {
            id: "a".into(),
            bytes_total: Some(10),
            bytes_transferred: 5,
        })));
        assert_eq!(job.status, DownloadStatus::Transferring);
        assert_eq!(job.bytes_transferred, 5);
        assert_eq!(job.estimated_total(), Some(10));
        assert!(!job.is_terminal());

        assert!(job.apply(&DownloadEvent::Finished(CompletionEvent {
            id: "a".into(),
            outcome: TransferOutcome::Failed {
                reason: "boom".into()
            },
        })));
        assert_eq!(job.status, DownloadStatus::Failed);
        assert!(job.is_terminal());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = DownloadEvent::Finished(CompletionEvent {
            id: "a".into(),
            outcome: TransferOutcome::Completed {
                path: PathBuf::from("/lib/a/book.pdf"),
            },
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "finished");
        assert_eq!(json["id"], "a");
        assert_eq!(json["outcome"]["result"], "completed");
    }
}
