//! # Conversion Events
//!
//! Logging capability injected into the discovery step and the worker pool.
//! Every per-file and per-batch outcome goes through a [`ConversionEvents`]
//! sink instead of a process-wide logger, so callers decide where lines go:
//! - [`TracingEvents`]: human readable lines via `tracing`
//! - [`JsonEvents`]: one JSON object per line on stdout (`--json`)
//! - tests plug in a recording sink

use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::json_output::{JsonConfig, JsonMessage};
use crate::progress::ConversionStats;

/// Receives the outcome of every step of a batch run
pub trait ConversionEvents: Send + Sync {
    /// Discovery finished with `total` matching files
    fn batch_started(&self, input_root: &Path, total: usize);

    /// A file was converted successfully
    fn file_converted(&self, destination: &Path);

    /// A file failed and was skipped
    fn file_failed(&self, source: &Path, message: &str);

    /// An entry below the input root could not be read during discovery
    fn entry_skipped(&self, path: Option<&Path>, message: &str);

    /// The input root itself could not be read
    fn directory_error(&self, path: &Path, message: &str);

    /// Every job produced a result
    fn batch_finished(&self, stats: &ConversionStats);
}

/// Sink writing through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl ConversionEvents for TracingEvents {
    fn batch_started(&self, input_root: &Path, total: usize) {
        info!("Found {} FLAC files to convert in {}", total, input_root.display());
    }

    fn file_converted(&self, destination: &Path) {
        info!("Converted {}", destination.display());
    }

    fn file_failed(&self, source: &Path, message: &str) {
        warn!("Skipping {} due to conversion error: {}", source.display(), message);
    }

    fn entry_skipped(&self, path: Option<&Path>, message: &str) {
        match path {
            Some(path) => warn!("Skipping unreadable entry {}: {}", path.display(), message),
            None => warn!("Skipping unreadable entry: {}", message),
        }
    }

    fn directory_error(&self, path: &Path, message: &str) {
        error!("Error accessing directory {}: {}", path.display(), message);
    }

    fn batch_finished(&self, stats: &ConversionStats) {
        info!("{}", stats.format_summary());
    }
}

/// Sink emitting JSON messages on stdout for programmatic consumers
pub struct JsonEvents {
    config: JsonConfig,
    started_at: Instant,
}

impl JsonEvents {
    pub fn new(config: JsonConfig) -> Self {
        Self {
            config,
            started_at: Instant::now(),
        }
    }
}

impl ConversionEvents for JsonEvents {
    fn batch_started(&self, input_root: &Path, total: usize) {
        JsonMessage::start(input_root.to_path_buf(), total, self.config.clone()).emit();
    }

    fn file_converted(&self, destination: &Path) {
        debug!("Converted {}", destination.display());
        JsonMessage::file_converted(destination.to_path_buf()).emit();
    }

    fn file_failed(&self, source: &Path, message: &str) {
        warn!("Skipping {} due to conversion error: {}", source.display(), message);
        JsonMessage::file_failed(source.to_path_buf(), message.to_string()).emit();
    }

    fn entry_skipped(&self, path: Option<&Path>, message: &str) {
        warn!("Skipping unreadable entry {:?}: {}", path, message);
    }

    fn directory_error(&self, path: &Path, message: &str) {
        JsonMessage::error(
            format!("Error accessing directory {}", path.display()),
            Some(message.to_string()),
        )
        .emit();
    }

    fn batch_finished(&self, stats: &ConversionStats) {
        JsonMessage::complete(
            stats.files_processed,
            stats.files_converted,
            stats.errors,
            stats.bytes_written,
            self.started_at.elapsed().as_secs_f64(),
        )
        .emit();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording sink shared by the unit tests of other modules.

    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Recorded {
        Started(usize),
        Converted(PathBuf),
        Failed(PathBuf, String),
        Skipped(Option<PathBuf>),
        DirectoryError(PathBuf),
        Finished { converted: usize, errors: usize },
    }

    #[derive(Default)]
    pub struct RecordingEvents {
        pub events: Mutex<Vec<Recorded>>,
    }

    impl RecordingEvents {
        pub fn snapshot(&self) -> Vec<Recorded> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: Recorded) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl ConversionEvents for RecordingEvents {
        fn batch_started(&self, _input_root: &Path, total: usize) {
            self.push(Recorded::Started(total));
        }

        fn file_converted(&self, destination: &Path) {
            self.push(Recorded::Converted(destination.to_path_buf()));
        }

        fn file_failed(&self, source: &Path, message: &str) {
            self.push(Recorded::Failed(source.to_path_buf(), message.to_string()));
        }

        fn entry_skipped(&self, path: Option<&Path>, _message: &str) {
            self.push(Recorded::Skipped(path.map(Path::to_path_buf)));
        }

        fn directory_error(&self, path: &Path, _message: &str) {
            self.push(Recorded::DirectoryError(path.to_path_buf()));
        }

        fn batch_finished(&self, stats: &ConversionStats) {
            self.push(Recorded::Finished {
                converted: stats.files_converted,
                errors: stats.errors,
            });
        }
    }
}
