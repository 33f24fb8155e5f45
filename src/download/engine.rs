//! Download engine: one spawned task per book, reporting through events.
//!
//! [`DownloadEngine::start_download`] returns immediately with a
//! [`DownloadHandle`]. The spawned task resolves the candidate's mirror page,
//! streams the book into its directory under the storage root and reports
//! every step as a [`DownloadEvent`] keyed by the source record id. Exactly
//! one [`DownloadEvent::Finished`] is sent per download, always last.
//!
//! # Example
//!
//! ```no_run
//! use alexandria_core::{AppConfig, CatalogRecord, DownloadEngine, DownloadEvent, ScrapedCandidate};
//!
//! # async fn example(record: CatalogRecord, candidate: ScrapedCandidate) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::from_config(&AppConfig::default())?;
//! let mut handle = engine.start_download(record, candidate);
//! while let Some(event) = handle.next_event().await {
//!     if let DownloadEvent::Finished(done) = event {
//!         println!("finished: {:?}", done.outcome);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, HeaderMap};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;

use super::error::TransferError;
use super::event::{CompletionEvent, DownloadEvent, DownloadStatus, ProgressEvent, TransferOutcome};
use super::filename::resolve_book_filename;
use super::stream::stream_to_file;
use crate::catalog::CatalogRecord;
use crate::config::AppConfig;
use crate::http::{HttpTimeouts, build_transfer_client};
use crate::library::{COVER_FILE, SIDECAR_FILE, book_dir};
use crate::mirror::{MirrorResolver, MirrorSlot};
use crate::scrape::ScrapedCandidate;

/// How long a finished book waits for its cover before reporting completion.
pub const DEFAULT_COVER_GRACE: Duration = Duration::from_secs(30);

/// Starts book transfers into a storage root.
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    client: Client,
    resolver: MirrorResolver,
    storage_root: PathBuf,
    mirror_slot: MirrorSlot,
    cover_grace: Duration,
}

impl DownloadEngine {
    /// Creates an engine writing under `storage_root`.
    ///
    /// Mirror pages are fetched with `page_timeouts`. Book and cover bodies
    /// use `transfer_timeouts`, whose read limit is the longest allowed gap
    /// between received chunks rather than a cap on the whole body.
    ///
    /// # Errors
    ///
    /// Returns an error when either HTTP client cannot be built.
    pub fn new(
        storage_root: impl Into<PathBuf>,
        page_timeouts: HttpTimeouts,
        transfer_timeouts: HttpTimeouts,
    ) -> Result<Self, TransferError> {
        let resolver = MirrorResolver::new(page_timeouts)?;
        let client = build_transfer_client(transfer_timeouts).map_err(TransferError::Client)?;
        Ok(Self {
            client,
            resolver,
            storage_root: storage_root.into(),
            mirror_slot: MirrorSlot::default(),
            cover_grace: DEFAULT_COVER_GRACE,
        })
    }

    /// Creates an engine from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when either HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, TransferError> {
        Ok(Self::new(
            config.storage_root.clone(),
            config.page_timeouts(),
            config.transfer_timeouts(),
        )?
        .with_mirror_slot(config.mirror_slot))
    }

    /// Selects which scraped mirror column to download from.
    #[must_use]
    pub fn with_mirror_slot(mut self, slot: MirrorSlot) -> Self {
        self.mirror_slot = slot;
        self
    }

    /// Sets how long a finished book waits for its cover. A cover still
    /// downloading after that keeps going in the background.
    #[must_use]
    pub fn with_cover_grace(mut self, grace: Duration) -> Self {
        self.cover_grace = grace;
        self
    }

    #[must_use]
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    #[must_use]
    pub fn mirror_slot(&self) -> MirrorSlot {
        self.mirror_slot
    }

    /// Spawns the transfer of `candidate` for `record` and returns its handle.
    ///
    /// Must be called from within a Tokio runtime. Downloads are independent:
    /// there is no global concurrency limit and no de-duplication by id.
    pub fn start_download(
        &self,
        record: CatalogRecord,
        candidate: ScrapedCandidate,
    ) -> DownloadHandle {
        let id = record.id.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let span = info_span!("download", record_id = %id, candidate_id = %candidate.id);
        let task = TransferTask {
            client: self.client.clone(),
            resolver: self.resolver.clone(),
            storage_root: self.storage_root.clone(),
            mirror_slot: self.mirror_slot,
            cover_grace: self.cover_grace,
            record,
            candidate,
            events: EventSender { id: id.clone(), tx },
            cancel: cancel_rx,
        };
        let task = tokio::spawn(task.run().instrument(span));

        DownloadHandle {
            id,
            events: rx,
            cancel: cancel_tx,
            task,
        }
    }
}

/// Caller side of one download.
///
/// Dropping the handle does not stop the transfer; use
/// [`cancel`](Self::cancel) for that.
#[derive(Debug)]
pub struct DownloadHandle {
    id: String,
    events: mpsc::UnboundedReceiver<DownloadEvent>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DownloadHandle {
    /// Source record id of this download.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Next event, or `None` once the terminal event has been consumed.
    pub async fn next_event(&mut self) -> Option<DownloadEvent> {
        self.events.recv().await
    }

    /// Asks the transfer to stop. It still ends with one `Finished` event
    /// carrying a failed outcome, unless it had already finished.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// True once the transfer task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Drains every remaining event, through the terminal one.
    pub async fn collect_events(mut self) -> Vec<DownloadEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        events
    }
}

struct EventSender {
    id: String,
    tx: mpsc::UnboundedSender<DownloadEvent>,
}

impl EventSender {
    // A closed receiver only means nobody is listening anymore.
    fn send(&self, event: DownloadEvent) {
        let _ = self.tx.send(event);
    }

    fn status(&self, status: DownloadStatus) {
        self.send(DownloadEvent::Status {
            id: self.id.clone(),
            status,
        });
    }

    fn progress(&self, bytes_total: Option<u64>, bytes_transferred: u64) {
        self.send(DownloadEvent::Progress(ProgressEvent {
            id: self.id.clone(),
            bytes_total,
            bytes_transferred,
        }));
    }

    fn finish(&self, outcome: TransferOutcome) {
        self.send(DownloadEvent::Finished(CompletionEvent {
            id: self.id.clone(),
            outcome,
        }));
    }
}

struct TransferTask {
    client: Client,
    resolver: MirrorResolver,
    storage_root: PathBuf,
    mirror_slot: MirrorSlot,
    cover_grace: Duration,
    record: CatalogRecord,
    candidate: ScrapedCandidate,
    events: EventSender,
    cancel: watch::Receiver<bool>,
}

impl TransferTask {
    async fn run(mut self) {
        let outcome = match self.transfer().await {
            Ok(path) => {
                info!(path = %path.display(), "download complete");
                TransferOutcome::Completed { path }
            }
            Err(error) => {
                warn!(error = %error, "download failed");
                TransferOutcome::Failed {
                    reason: error.to_string(),
                }
            }
        };
        self.events.finish(outcome);
    }

    async fn transfer(&mut self) -> Result<PathBuf, TransferError> {
        self.events.status(DownloadStatus::Resolving);

        let mirror_ref = self
            .candidate
            .mirror_ref(self.mirror_slot)
            .ok_or_else(|| TransferError::MissingMirror {
                candidate_id: self.candidate.id.clone(),
                slot: self.mirror_slot,
            })?
            .to_string();

        let link = tokio::select! {
            link = self.resolver.resolve(&mirror_ref, self.mirror_slot.layout()) => link?,
            () = cancelled(&mut self.cancel) => return Err(TransferError::Cancelled),
        };
        let url = absolutize(&mirror_ref, &link)?;
        debug!(url = %url, "requesting book file");

        let response = tokio::select! {
            response = self.client.get(url.clone()).send() => {
                response.map_err(|e| TransferError::network(url.as_str(), e))?
            }
            () = cancelled(&mut self.cancel) => return Err(TransferError::Cancelled),
        };
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::http_status(url.as_str(), status.as_u16()));
        }
        self.events.status(DownloadStatus::Transferring);

        let filename = resolve_book_filename(response.headers(), response.url(), &self.candidate);
        let bytes_total = content_length(response.headers());

        let dir = prepare_book_dir(&self.storage_root, &self.record).await?;
        persist_sidecar(&dir, &self.record).await?;
        let cover = self.spawn_cover_fetch(&dir);

        let path = dir.join(&filename);
        debug!(path = %path.display(), bytes_total = ?bytes_total, "streaming book file");
        let events = &self.events;
        let written = stream_to_file(response, &path, &mut self.cancel, |transferred| {
            events.progress(bytes_total, transferred);
        })
        .await?;
        debug!(bytes = written, "book file written");

        if let Some(mut cover) = cover
            && tokio::time::timeout(self.cover_grace, &mut cover).await.is_err()
        {
            warn!(
                grace = ?self.cover_grace,
                "cover still downloading; finishing without it"
            );
        }
        Ok(path)
    }

    /// Best-effort cover download running beside the main transfer.
    fn spawn_cover_fetch(&self, dir: &Path) -> Option<JoinHandle<()>> {
        let cover_url = self.record.thumbnail_url()?.to_string();
        let client = self.client.clone();
        let path = dir.join(COVER_FILE);
        let mut cancel = self.cancel.clone();
        let task = async move {
            match fetch_cover(&client, &cover_url, &path, &mut cancel).await {
                Ok(bytes) => debug!(bytes, "cover saved"),
                Err(error) => warn!(url = %cover_url, error = %error, "cover download failed"),
            }
        };
        Some(tokio::spawn(task.in_current_span()))
    }
}

async fn fetch_cover(
    client: &Client,
    url: &str,
    path: &Path,
    cancel: &mut watch::Receiver<bool>,
) -> Result<u64, TransferError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| TransferError::network(url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(TransferError::http_status(url, status.as_u16()));
    }
    stream_to_file(response, path, cancel, |_| {}).await
}

/// Creates the storage root and the record's book directory if needed.
async fn prepare_book_dir(root: &Path, record: &CatalogRecord) -> Result<PathBuf, TransferError> {
    tokio::fs::create_dir_all(root)
        .await
        .map_err(|e| TransferError::io(root, e))?;
    let dir = book_dir(root, record);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| TransferError::io(&dir, e))?;
    Ok(dir)
}

async fn persist_sidecar(dir: &Path, record: &CatalogRecord) -> Result<(), TransferError> {
    let path = dir.join(SIDECAR_FILE);
    let json = serde_json::to_vec_pretty(record).map_err(|source| TransferError::Sidecar {
        path: path.clone(),
        source,
    })?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| TransferError::io(&path, e))
}

/// Joins a possibly relative direct link against its mirror page URL.
fn absolutize(mirror_ref: &str, link: &str) -> Result<Url, TransferError> {
    let invalid = || TransferError::InvalidUrl {
        link: link.to_string(),
        mirror_ref: mirror_ref.to_string(),
    };
    let url = Url::parse(mirror_ref)
        .and_then(|base| base.join(link))
        .map_err(|_| invalid())?;
    if matches!(url.scheme(), "http" | "https") {
        Ok(url)
    } else {
        Err(invalid())
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

/// Resolves once cancellation is requested; never if the sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
