//! Terminal progress display for transfers
//!
//! Renders the counters from [`TransferProgress`] as a single line that is
//! redrawn in place. A bar is shown when the total size is known, a spinner
//! with a byte count otherwise.

use std::sync::atomic::{AtomicBool, Ordering};

use cfr2_core::{ProgressObserver, TransferProgress};
use indicatif::ProgressStyle;

use super::{Formatter, OutputConfig};

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {msg} ({eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

/// Progress bar wrapper
///
/// In quiet, JSON or `--no-progress` mode nothing is drawn, but warnings are
/// still routed through the formatter.
#[derive(Debug)]
pub struct ProgressBar {
    formatter: Formatter,
    bar: Option<indicatif::ProgressBar>,
    sized: AtomicBool,
}

impl ProgressBar {
    /// Create a progress display for a transfer whose size is not known yet
    pub fn new(formatter: Formatter) -> Self {
        let bar = if hidden(formatter.config()) {
            None
        } else {
            let bar = indicatif::ProgressBar::no_length();
            bar.set_style(style(SPINNER_TEMPLATE));
            Some(bar)
        };

        Self {
            formatter,
            bar,
            sized: AtomicBool::new(false),
        }
    }

    /// Check if progress bar is visible
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}

impl ProgressObserver for ProgressBar {
    fn on_progress(&self, progress: &TransferProgress) {
        let Some(bar) = &self.bar else {
            return;
        };

        if let Some(total) = progress.total() {
            if !self.sized.swap(true, Ordering::Relaxed) {
                bar.set_length(total);
                bar.set_style(style(BAR_TEMPLATE).progress_chars("#>-"));
            }
        }

        bar.set_position(progress.transferred());
        bar.set_message(progress.describe());
    }

    fn warn(&self, message: &str) {
        match &self.bar {
            Some(bar) => bar.suspend(|| self.formatter.warning(message)),
            None => self.formatter.warning(message),
        }
    }

    fn finish(&self, progress: &TransferProgress) {
        if let Some(bar) = &self.bar {
            bar.set_message(progress.describe());
            bar.finish();
        }
    }
}

fn hidden(config: &OutputConfig) -> bool {
    config.quiet || config.json || config.no_progress
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}
