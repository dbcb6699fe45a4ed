//! Terminal progress for scans, built on indicatif.
//!
//! The scanner reports through the [`ProgressCallback`] trait so that
//! library users and tests can observe progress without a terminal.
//! [`Progress`] is the CLI's implementation: one bar per phase, drawn to
//! stderr, hidden entirely in quiet mode.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;

/// Receives progress updates from a scan.
pub trait ProgressCallback: Send + Sync {
    /// A phase with `total` items begins.
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Item number `current` (1-based, completion order) finished; `path`
    /// is the item just processed.
    fn on_progress(&self, current: usize, path: &str);

    /// The phase finished.
    fn on_phase_end(&self, phase: &str);

    /// Free-form status text.
    fn on_message(&self, _message: &str) {}
}

/// indicatif-backed progress reporter.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a reporter. A quiet reporter draws nothing.
    ///
    /// ```
    /// use jomics::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// assert!(progress.is_quiet());
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    /// Whether output is suppressed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        bar.set_style(Self::style());
        bar.set_message(phase.to_string());
        bar.enable_steady_tick(Duration::from_millis(200));
        if let Some(old) = self.bar.lock().replace(bar) {
            old.finish_and_clear();
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if let Some(ref bar) = *self.bar.lock() {
            bar.set_position(current as u64);
            bar.set_message(truncate_path(path, 30));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if let Some(bar) = self.bar.lock().take() {
            bar.finish_with_message(format!("{phase} done"));
        }
    }

    fn on_message(&self, message: &str) {
        if let Some(ref bar) = *self.bar.lock() {
            bar.set_message(message.to_string());
        }
    }
}

/// Shorten a path to at most `max_len` characters, keeping the file name.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let len = file_name.chars().count();
    if len + 4 > max_len {
        let tail: String = file_name.chars().skip(len + 3 - max_len).collect();
        return format!("...{tail}");
    }
    format!(".../{file_name}")
}
