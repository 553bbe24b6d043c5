//! # Batch Module
//!
//! Conversione di un'intera directory, separata in sottomoduli:
//! - `conversion_pool`: Orchestratore (discovery, dispatch, aggregazione)
//! - `task`: Job e risultato di un singolo file, esecuzione del worker
//! - `progress_tracker`: Aggregatore serializzato dei risultati e del progresso
//! - `path_resolver`: Calcolo del path di destinazione

pub mod conversion_pool;
pub mod path_resolver;
pub mod progress_tracker;
pub mod task;

pub use conversion_pool::{BatchConverter, BatchPhase};
pub use path_resolver::PathResolver;
pub use progress_tracker::{ProgressCallback, ProgressState, ProgressTracker};
pub use task::{ConversionJob, ConversionResult, JobOutcome};
