//! # Conversion Task Module
//!
//! Unità di lavoro del pool: un `ConversionJob` per ogni file scoperto e il
//! `ConversionResult` prodotto dal worker che lo esegue.
//!
//! Il worker esegue il converter sul thread pool bloccante di tokio; un
//! errore o un panic del converter diventano un `Failure` per quel solo file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::converter::FileConverter;
use crate::error::ConvertError;
use crate::format::AudioFormat;

/// One source file to convert into one destination file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub target_format: AudioFormat,
    pub include_cover_art: bool,
}

impl ConversionJob {
    pub fn new(source_path: PathBuf, destination_path: PathBuf, config: &Config) -> Self {
        Self {
            source_path,
            destination_path,
            target_format: config.target_format,
            include_cover_art: config.include_cover_art,
        }
    }
}

/// Outcome of one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Success { destination_path: PathBuf },
    Failure { source_path: PathBuf, error_message: String },
}

impl ConversionResult {
    pub fn failure(source_path: impl Into<PathBuf>, error: &ConvertError) -> Self {
        Self::Failure {
            source_path: source_path.into(),
            error_message: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn destination_path(&self) -> Option<&Path> {
        match self {
            Self::Success { destination_path } => Some(destination_path),
            Self::Failure { .. } => None,
        }
    }

    pub fn source_path(&self) -> Option<&Path> {
        match self {
            Self::Failure { source_path, .. } => Some(source_path),
            Self::Success { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failure { error_message, .. } => Some(error_message),
            Self::Success { .. } => None,
        }
    }
}

/// A result as sent to the aggregator, with the size of the written file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub result: ConversionResult,
    pub bytes_written: u64,
}

impl From<ConversionResult> for JobOutcome {
    fn from(result: ConversionResult) -> Self {
        Self {
            result,
            bytes_written: 0,
        }
    }
}

/// Run `job` on the blocking pool and turn every outcome into a result.
///
/// The output size is read on the blocking pool too, so the aggregator never
/// touches the filesystem.
pub async fn run_job(converter: Arc<dyn FileConverter>, job: ConversionJob) -> JobOutcome {
    let source_path = job.source_path.clone();
    debug!("Starting conversion of {}", source_path.display());

    let converted = tokio::task::spawn_blocking(move || {
        converter.convert(&job).map(|destination_path| {
            let size = std::fs::metadata(&destination_path).map(|m| m.len()).unwrap_or(0);
            (destination_path, size)
        })
    })
    .await;

    match converted {
        Ok(Ok((destination_path, bytes_written))) => JobOutcome {
            result: ConversionResult::Success { destination_path },
            bytes_written,
        },
        Ok(Err(e)) => ConversionResult::failure(source_path, &e).into(),
        Err(join_error) => {
            let cause = if join_error.is_panic() {
                format!("conversion task panicked: {}", panic_message(join_error.into_panic()))
            } else {
                format!("conversion task aborted: {}", join_error)
            };
            ConversionResult::failure(source_path.clone(), &ConvertError::conversion(source_path, cause)).into()
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
