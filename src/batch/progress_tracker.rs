//! # Progress Tracking Module
//!
//! Aggregatore unico dei risultati: è l'unico a scrivere la lista dei
//! risultati e il contatore `completed`, quindi la callback di progresso
//! riceve sempre 1, 2, ..., total in ordine, senza lock.

use std::sync::Arc;

use crate::batch::task::{ConversionResult, JobOutcome};
use crate::events::ConversionEvents;
use crate::progress::ConversionStats;

/// Progress callback invoked with `(completed, total)` after every job
pub type ProgressCallback = Box<dyn FnMut(usize, usize) + Send>;

/// Completed/total counter of one batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub completed: usize,
    pub total: usize,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self { completed: 0, total }
    }

    /// Count one more finished job
    pub fn advance(&mut self) {
        debug_assert!(self.completed < self.total, "more results than jobs");
        self.completed = (self.completed + 1).min(self.total);
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

/// Serialized aggregator fed by the result channel
pub struct ProgressTracker {
    state: ProgressState,
    results: Vec<ConversionResult>,
    stats: ConversionStats,
    on_progress: Option<ProgressCallback>,
    events: Arc<dyn ConversionEvents>,
}

impl ProgressTracker {
    pub fn new(total: usize, on_progress: Option<ProgressCallback>, events: Arc<dyn ConversionEvents>) -> Self {
        Self {
            state: ProgressState::new(total),
            results: Vec::with_capacity(total),
            stats: ConversionStats::new(),
            on_progress,
            events,
        }
    }

    /// Record one result: event, stats, list, counter and callback in one step
    pub fn record(&mut self, outcome: JobOutcome) {
        let JobOutcome { result, bytes_written } = outcome;
        match &result {
            ConversionResult::Success { destination_path } => {
                self.events.file_converted(destination_path);
                self.stats.add_converted(bytes_written);
            }
            ConversionResult::Failure { source_path, error_message } => {
                self.events.file_failed(source_path, error_message);
                self.stats.add_error();
            }
        }

        self.results.push(result);
        self.state.advance();

        if let Some(callback) = self.on_progress.as_mut() {
            callback(self.state.completed, self.state.total);
        }
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    /// Close the batch and hand back the results
    pub fn finish(self) -> (Vec<ConversionResult>, ConversionStats) {
        self.events.batch_finished(&self.stats);
        (self.results, self.stats)
    }
}
