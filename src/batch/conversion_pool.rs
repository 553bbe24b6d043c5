//! # Batch Converter Main Orchestrator
//!
//! Orchestratore del batch: discovery, costruzione dei job, dispatch su un
//! pool di worker a dimensione fissa e aggregazione dei risultati.
//!
//! ## Flusso:
//! 1. `Discovering`: `FileManager` elenca i FLAC sotto la directory di input
//! 2. `Dispatching`: ogni file diventa un `ConversionJob` (o un `Failure` se il
//!    path di destinazione non è derivabile o è duplicato)
//! 3. `Running`: un task dispatcher acquisisce un permesso del semaforo per job
//!    e lancia un worker; il worker esegue il converter con `spawn_blocking`
//! 4. `Draining`: tutti i job sono partiti, si attende la fine dei worker
//! 5. `Completed`: il canale dei risultati è chiuso, la lista è completa
//!
//! I risultati viaggiano su un canale mpsc verso un unico aggregatore
//! (`ProgressTracker`), quindi la callback di progresso vede 1, 2, ..., N.
//!
//! ## Cancellazione:
//! `cancel()` (o il `CancellationToken` condiviso) porta il batch in
//! `Cancelling`: i job in corso finiscono, nessun nuovo job parte e ogni job
//! mai partito diventa un `Failure` con `ConvertError::Cancelled`.
//! La cancellazione resta attiva per tutta la vita del `BatchConverter`.

use futures::future::join_all;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::batch::path_resolver::PathResolver;
use crate::batch::progress_tracker::{ProgressCallback, ProgressTracker};
use crate::batch::task::{run_job, ConversionJob, ConversionResult, JobOutcome};
use crate::config::Config;
use crate::converter::{FfmpegConverter, FileConverter};
use crate::error::ConvertError;
use crate::events::ConversionEvents;
use crate::file_manager::FileManager;
use crate::progress::ConversionStats;

/// Lifecycle of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Idle,
    Discovering,
    Dispatching,
    Running,
    Draining,
    Cancelling,
    Completed,
}

/// Converts every FLAC file below a directory with a bounded worker pool
pub struct BatchConverter {
    config: Config,
    converter: Arc<dyn FileConverter>,
    events: Arc<dyn ConversionEvents>,
    cancel: CancellationToken,
    phase: Arc<watch::Sender<BatchPhase>>,
}

impl BatchConverter {
    /// Crea il converter batch; la configurazione viene validata qui
    pub fn new(
        config: Config,
        converter: Arc<dyn FileConverter>,
        events: Arc<dyn ConversionEvents>,
    ) -> Result<Self, ConvertError> {
        config
            .validate()
            .map_err(|e| ConvertError::Validation(e.to_string()))?;

        let (phase, _) = watch::channel(BatchPhase::Idle);
        Ok(Self {
            config,
            converter,
            events,
            cancel: CancellationToken::new(),
            phase: Arc::new(phase),
        })
    }

    /// Batch converter using ffmpeg at `config.ffmpeg_path`
    pub fn with_ffmpeg(config: Config, events: Arc<dyn ConversionEvents>) -> Result<Self, ConvertError> {
        let converter = Arc::new(FfmpegConverter::new(&config));
        Self::new(config, converter, events)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stop dispatching new jobs; running ones finish
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token shared with signal handlers or progress callbacks
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> BatchPhase {
        *self.phase.borrow()
    }

    /// Watch phase transitions
    pub fn subscribe(&self) -> watch::Receiver<BatchPhase> {
        self.phase.subscribe()
    }

    /// Convert every FLAC file below `input_root`.
    ///
    /// Returns one result per discovered file. Only an unreadable input root
    /// or a broken worker pool is returned as `Err`.
    pub async fn convert_directory(
        &self,
        input_root: &Path,
        output_root: Option<&Path>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Vec<ConversionResult>, ConvertError> {
        let (results, _stats) = self
            .convert_directory_with_stats(input_root, output_root, on_progress)
            .await?;
        Ok(results)
    }

    /// Same as [`convert_directory`](Self::convert_directory), plus the
    /// statistics collected while the results came in
    pub async fn convert_directory_with_stats(
        &self,
        input_root: &Path,
        output_root: Option<&Path>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(Vec<ConversionResult>, ConversionStats), ConvertError> {
        self.set_phase(BatchPhase::Discovering);
        let sources = match self.discover(input_root).await {
            Ok(sources) => sources,
            Err(e) => {
                self.set_phase(BatchPhase::Completed);
                return Err(e);
            }
        };

        let total = sources.len();
        if total == 0 {
            info!("No FLAC files found in {}", input_root.display());
            self.set_phase(BatchPhase::Completed);
            return Ok((Vec::new(), ConversionStats::new()));
        }

        self.events.batch_started(input_root, total);
        self.log_configuration(output_root);

        self.set_phase(BatchPhase::Dispatching);
        let (results_tx, mut results_rx) = mpsc::unbounded_channel();
        let jobs = {
            let config = self.config.clone();
            let input_root = input_root.to_path_buf();
            let output_root = output_root.map(Path::to_path_buf);
            let failures = results_tx.clone();
            tokio::task::spawn_blocking(move || {
                build_jobs(sources, &input_root, output_root.as_deref(), &config, &failures)
            })
            .await
        };
        let jobs = match jobs {
            Ok(jobs) => jobs,
            Err(e) => {
                self.set_phase(BatchPhase::Completed);
                return Err(ConvertError::Pool(format!("job construction failed: {}", e)));
            }
        };

        let dispatcher = tokio::spawn(dispatch(
            jobs,
            self.config.workers,
            Arc::clone(&self.converter),
            self.cancel.clone(),
            Arc::clone(&self.phase),
            results_tx,
        ));

        let mut tracker = ProgressTracker::new(total, on_progress, Arc::clone(&self.events));
        while let Some(outcome) = results_rx.recv().await {
            tracker.record(outcome);
        }

        let dispatched = dispatcher
            .await
            .map_err(|e| ConvertError::Pool(format!("dispatcher task failed: {}", e)));
        if let Err(e) = dispatched.and_then(|inner| inner) {
            self.set_phase(BatchPhase::Completed);
            return Err(e);
        }

        debug_assert!(tracker.state().is_complete());
        let finished = tracker.finish();
        self.set_phase(BatchPhase::Completed);

        Ok(finished)
    }

    /// Walk `input_root` on the blocking pool
    async fn discover(&self, input_root: &Path) -> Result<Vec<PathBuf>, ConvertError> {
        let events = Arc::clone(&self.events);
        let root = input_root.to_path_buf();
        tokio::task::spawn_blocking(move || FileManager::find_source_files(&root, events.as_ref()))
            .await
            .map_err(|e| ConvertError::Pool(format!("discovery task failed: {}", e)))?
    }

    /// Logga configurazione (solo se non JSON mode)
    fn log_configuration(&self, output_root: Option<&Path>) {
        if self.config.json_output {
            return;
        }

        if self.config.target_format.is_lossless() {
            info!("Target format: {}", self.config.target_format);
        } else {
            info!(
                "Target format: {} ({})",
                self.config.target_format, self.config.audio_bitrate
            );
        }

        match output_root {
            Some(output_root) => info!("Output directory: {}", output_root.display()),
            None => info!("Mode: Write next to the source files"),
        }

        if !self.config.include_cover_art {
            info!("Cover art: not copied");
        }

        info!("Workers: {}", self.config.workers);
    }

    fn set_phase(&self, phase: BatchPhase) {
        debug!("Batch phase: {:?}", phase);
        self.phase.send_replace(phase);
    }
}

/// Turn sources into jobs; unmappable and duplicate destinations become failures
fn build_jobs(
    sources: Vec<PathBuf>,
    input_root: &Path,
    output_root: Option<&Path>,
    config: &Config,
    failures: &mpsc::UnboundedSender<JobOutcome>,
) -> Vec<ConversionJob> {
    let mut destinations = HashSet::with_capacity(sources.len());
    let mut jobs = Vec::with_capacity(sources.len());

    for source in sources {
        let mapped = PathResolver::map(&source, input_root, output_root, config.target_format).and_then(
            |destination| {
                if destinations.insert(destination.clone()) {
                    Ok(destination)
                } else {
                    Err(ConvertError::DuplicateDestination {
                        source_path: source.clone(),
                        destination,
                    })
                }
            },
        );

        match mapped {
            Ok(destination) => jobs.push(ConversionJob::new(source, destination, config)),
            Err(e) => {
                let _ = failures.send(ConversionResult::failure(source, &e).into());
            }
        }
    }

    jobs
}

/// Dispatcher: one semaphore permit per running job.
///
/// Owns the last result sender; the channel closes once every worker spawned
/// here has sent its result and the unstarted jobs were marked cancelled.
async fn dispatch(
    jobs: Vec<ConversionJob>,
    workers: usize,
    converter: Arc<dyn FileConverter>,
    cancel: CancellationToken,
    phase: Arc<watch::Sender<BatchPhase>>,
    results: mpsc::UnboundedSender<JobOutcome>,
) -> Result<(), ConvertError> {
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut handles = Vec::with_capacity(jobs.len());
    let mut pending = jobs.into_iter();

    phase.send_replace(BatchPhase::Running);

    for job in pending.by_ref() {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = Arc::clone(&semaphore).acquire_owned() => {
                Some(permit.map_err(|e| ConvertError::Pool(e.to_string()))?)
            }
        };

        let Some(permit) = permit else {
            send_cancelled(&results, job);
            break;
        };

        let converter = Arc::clone(&converter);
        let results = results.clone();
        handles.push(tokio::spawn(async move {
            let outcome = run_job(converter, job).await;
            let _ = results.send(outcome);
            drop(permit);
        }));
    }

    if cancel.is_cancelled() {
        phase.send_replace(BatchPhase::Cancelling);
        info!("Cancellation requested, waiting for running conversions");
        for job in pending {
            send_cancelled(&results, job);
        }
    } else {
        phase.send_replace(BatchPhase::Draining);
    }
    drop(results);

    for outcome in join_all(handles).await {
        outcome.map_err(|e| ConvertError::Pool(format!("worker task failed: {}", e)))?;
    }

    Ok(())
}

fn send_cancelled(results: &mpsc::UnboundedSender<JobOutcome>, job: ConversionJob) {
    let error = ConvertError::Cancelled {
        source_path: job.source_path.clone(),
    };
    let _ = results.send(ConversionResult::failure(job.source_path, &error).into());
}
