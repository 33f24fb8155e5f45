//! Terminal progress display for a single download.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use alexandria_core::ProgressEvent;

const SPINNER_TEMPLATE: &str = "{spinner} {msg} {bytes} ({bytes_per_sec})";
const BAR_TEMPLATE: &str = "{msg} [{bar:30}] {bytes}/{total_bytes} ({eta})";

/// Spinner while the size is unknown, bar once `content-length` arrives.
pub(crate) struct TransferProgress {
    bar: ProgressBar,
}

impl TransferProgress {
    /// Creates the display; hidden when `enabled` is false.
    pub(crate) fn new(enabled: bool, label: &str) -> Self {
        let bar = if enabled {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template(SPINNER_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        } else {
            ProgressBar::hidden()
        };
        bar.set_message(label.to_string());
        Self { bar }
    }

    pub(crate) fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub(crate) fn update(&self, progress: &ProgressEvent) {
        if let Some(total) = progress.bytes_total
            && self.bar.length() != Some(total)
        {
            self.bar.set_length(total);
            self.bar.set_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
        }
        self.bar.set_position(progress.bytes_transferred);
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
