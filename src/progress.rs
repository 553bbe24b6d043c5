//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce la progress bar e le statistiche di conversione.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` per feedback real-time
//! - Tracking statistiche (file convertiti, errori, byte scritti)
//! - Report finale con statistiche aggregate
//!
//! ## Componenti principali:
//! - `ProgressManager`: Gestisce la progress bar, pilotata dalla callback `(completed, total)`
//! - `ConversionStats`: Traccia statistiche cumulative del batch
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 150/150 (100%) song.mp3
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::batch::BatchPhase;
use crate::file_manager::FileManager;

/// Manages progress reporting for a batch run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a progress bar; the length is set by the first update
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Move the bar to `completed` out of `total`
    pub fn update(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
    }

    /// Set a custom message without moving the bar
    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Show the status of `phase` next to the bar
    pub fn show_phase(&self, phase: BatchPhase) {
        if let Some(message) = phase_message(phase) {
            self.set_message(message);
        }
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Status text for a batch phase; `None` leaves the current message alone
pub fn phase_message(phase: BatchPhase) -> Option<&'static str> {
    match phase {
        BatchPhase::Discovering => Some("scanning for FLAC files"),
        BatchPhase::Dispatching | BatchPhase::Running => Some("converting"),
        BatchPhase::Draining => Some("waiting for the last conversions"),
        BatchPhase::Cancelling => Some("cancelling"),
        // The summary passed to `finish` replaces the message once done
        BatchPhase::Idle | BatchPhase::Completed => None,
    }
}

/// Statistics for one batch run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConversionStats {
    pub files_processed: usize,
    pub files_converted: usize,
    pub errors: usize,
    pub bytes_written: u64,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_converted(&mut self, output_size: u64) {
        self.files_processed += 1;
        self.files_converted += 1;
        self.bytes_written += output_size;
    }

    pub fn add_error(&mut self) {
        self.files_processed += 1;
        self.errors += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.files_processed > 0 {
            (self.files_converted as f64 / self.files_processed as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Converted: {} | Errors: {} | Written: {} ({:.1}% succeeded)",
            self.files_processed,
            self.files_converted,
            self.errors,
            FileManager::format_size(self.bytes_written),
            self.success_rate()
        )
    }
}
