use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Centralized progress bar creation utilities
pub struct ProgressUtils;

impl ProgressUtils {
    /// Create a progress bar for download operations
    pub fn create_download_progress(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(ProgressMessages::DOWNLOADING);
        pb
    }

    /// Create a spinner shown while waiting on a search request
    pub fn create_activity_spinner(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

/// Common progress bar messages
pub struct ProgressMessages;

impl ProgressMessages {
    pub const DOWNLOADING: &'static str = "Downloading";
    pub const SEARCHING: &'static str = "Searching...";
}
