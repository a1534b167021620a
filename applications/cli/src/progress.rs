//! Batch progress output
//!
//! One line on stderr, `<done> / <total> (<percent>%)`, redrawn after every
//! job. Failures are printed to stdout above it.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use normalize_engine::JobReport;
use std::fmt::Display;
use std::path::Path;

const TEMPLATE: &str = "{pos} / {len} ({percent}%)";

/// Line printed to stdout for a failed file
pub fn error_line(path: &Path, error: &impl Display) -> String {
    format!("ERROR {} {}", path.display(), error)
}

pub struct ProgressLine {
    bar: ProgressBar,
}

impl ProgressLine {
    pub fn new(total: usize) -> Self {
        Self::with_bar(ProgressBar::with_draw_target(
            Some(total as u64),
            ProgressDrawTarget::stderr(),
        ))
    }

    /// Track progress without drawing anything
    pub fn hidden(total: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total as u64);
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }

    /// Record one finished job, printing its error if it failed
    pub fn report(&self, report: &JobReport) {
        if let Err(e) = &report.result {
            let line = error_line(&report.path, e);
            self.bar.suspend(|| println!("{}", line));
        }
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Leave the final count on screen
    pub fn finish(&self) {
        self.bar.finish();
    }
}
