//! Download command handler: match a record, then fetch one candidate.

use std::io::IsTerminal;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use alexandria_core::{
    AppConfig, DownloadEngine, DownloadEvent, DownloadJob, DownloadStatus, TransferOutcome,
};

use super::load_record;
use super::matching::build_matcher;
use crate::cli::DownloadArgs;
use crate::progress::TransferProgress;

pub async fn run_download_command(
    config: &AppConfig,
    args: &DownloadArgs,
    show_progress: bool,
) -> Result<()> {
    let record = load_record(&args.record)?;
    let matcher = build_matcher(config, args.rank)?;

    let Some(matches) = matcher.try_match(&record).await else {
        bail!("Catalog unavailable; try again later");
    };
    let pick = usize::from(args.pick);
    let Some(candidate) = matches.get(pick - 1).cloned() else {
        if matches.is_empty() {
            bail!("Not found: {}", record.title());
        }
        bail!(
            "Only {} match(es) for {}; --pick {} is out of range",
            matches.len(),
            record.title(),
            pick
        );
    };

    let mut engine = DownloadEngine::from_config(config).context("Failed to create download engine")?;
    if let Some(slot) = args.mirror {
        engine = engine.with_mirror_slot(slot);
    }
    info!(
        title = %candidate.title.trim(),
        extension = %candidate.extension.trim(),
        mirror = %engine.mirror_slot(),
        "starting download"
    );

    let mut job = DownloadJob::new(record.clone(), candidate.clone());
    let progress = TransferProgress::new(
        show_progress && std::io::stderr().is_terminal(),
        record.title(),
    );
    let mut handle = engine.start_download(record, candidate);

    let mut outcome = None;
    while let Some(event) = handle.next_event().await {
        job.apply(&event);
        match &event {
            DownloadEvent::Status { status, .. } => match status {
                DownloadStatus::Resolving => progress.set_message("Resolving mirror"),
                DownloadStatus::Transferring => progress.set_message(job.source_record.title()),
                _ => {}
            },
            DownloadEvent::Progress(update) => progress.update(update),
            DownloadEvent::Finished(done) => outcome = Some(done.outcome.clone()),
        }
    }
    progress.finish();

    match outcome {
        Some(TransferOutcome::Completed { path }) => {
            println!("Saved {}", path.display());
            Ok(())
        }
        Some(TransferOutcome::Failed { reason }) => {
            debug!(reason = %reason, bytes = job.bytes_transferred, "download failed");
            bail!("Download failed: {}", job.source_record.title())
        }
        None => bail!("Download ended without a result"),
    }
}
