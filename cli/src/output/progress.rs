//! Progress indicators using indicatif

#![allow(clippy::expect_used)] // Templates are compile-time constants

use indicatif::{ProgressBar, ProgressStyle};

/// Create the determinate install progress bar, driven by the remote
/// script's percent milestones.
///
/// # Panics
///
/// Panics if the progress bar template string is invalid (it is a
/// compile-time constant and will not panic).
#[must_use]
pub fn install_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/dim} {percent}%  {msg}")
            .expect("valid template")
            .progress_chars("━━─"),
    );
    pb
}

/// Finish a progress bar with a success message.
pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_with_message(format!("✓ {msg}"));
}

/// Finish a progress bar with an error message.
pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_with_message(format!("✗ {msg}"));
}
