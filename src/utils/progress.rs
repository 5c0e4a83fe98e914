//! Spinners for the long-running pipeline steps

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(100);

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("    {spinner:.cyan} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

/// Ticking spinner for a step of unknown length (load, apply, fit)
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner().with_style(spinner_style());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(TICK);
    pb
}

pub fn finish_with_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✅ {}", message));
}

pub fn finish_with_warning(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("⚠️  {}", message));
}

/// Stop the spinner and leave the failure on screen; the caller reports the error
pub fn finish_with_failure(pb: &ProgressBar, message: &str) {
    pb.abandon_with_message(format!("❌ {}", message));
}
