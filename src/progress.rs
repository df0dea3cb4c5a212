//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a blocking warehouse or catalog call is in flight.
///
/// Cleared silently when dropped.
#[derive(Debug)]
pub struct ProgressReporter {
    spinner: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(message: &str) -> Self {
        Self {
            spinner: Some(create_spinner(message)),
        }
    }

    /// Remove the spinner without leaving a line
    pub fn clear(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Run `f` behind a spinner, clearing it afterwards
pub fn with_spinner<T>(message: &str, f: impl FnOnce() -> T) -> T {
    let mut reporter = ProgressReporter::new(message);
    let result = f();
    reporter.clear();
    result
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
