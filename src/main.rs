//! # FLAC Batch Converter - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (stderr e file opzionale)
//! - Caricamento della configurazione da file e override dai flag CLI, salvataggio opzionale
//! - Risoluzione di ffmpeg, avvio del batch e report finale
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (directory, formato, workers, bitrate, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose, `RUST_LOG` se presente)
//! 3. Carica `Config` dal file indicato o da quello di default, applica i flag
//!    (e con `--save-config` la riscrive su quel file)
//! 4. Risolve il binario ffmpeg una sola volta e valida la configurazione
//! 5. Avvia `BatchConverter` con progress bar (o eventi JSON) e Ctrl-C per cancellare
//! 6. Stampa il riepilogo; exit status 1 se almeno un file è fallito,
//!    2 se il batch è stato interrotto da un errore fatale
//!
//! ## Esempio di utilizzo:
//! ```bash
//! flac-converter ~/Music/flac -o ~/Music/mp3 -f mp3 -b 256k --workers 8 --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use flac_batch_converter::{
    events::{ConversionEvents, JsonEvents, TracingEvents},
    json_output::{JsonConfig, JsonMessage},
    logging, AudioFormat, BatchConverter, Config, ConversionResult, ConversionStats, ConvertError, FileManager,
    ProgressCallback, ProgressManager, ToolPathResolver,
};

/// Exit status when the batch could not run to the end
const EXIT_ABORTED: u8 = 2;

#[derive(Parser)]
#[command(name = "flac-converter")]
#[command(about = "Convert a directory tree of FLAC files to mp3, aac, alac, ogg or opus")]
struct Args {
    /// Directory containing the FLAC files to convert
    input_directory: PathBuf,

    /// Output directory (mirrors the input tree); converted files go next to the sources if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target format
    #[arg(short, long, value_enum)]
    format: Option<AudioFormat>,

    /// Do not copy the embedded cover art
    #[arg(long)]
    no_cover: bool,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Audio bitrate for lossy formats (e.g. 320k)
    #[arg(short, long)]
    bitrate: Option<String>,

    /// Path to the ffmpeg binary
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective configuration (file plus flags) back to the configuration file
    #[arg(long)]
    save_config: bool,

    /// Output progress and results as JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Also write DEBUG logs to this file (appended)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if let Err(e) = logging::init(args.verbose, args.log_file.as_deref()) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    let json = args.json;
    match run(args).await {
        Ok(stats) if stats.errors > 0 => {
            error!("{} of {} files failed to convert", stats.errors, stats.files_processed);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                JsonMessage::error(e.to_string(), e.chain().nth(1).map(|s| s.to_string())).emit();
            }
            if is_batch_abort(&e) {
                error!("Batch aborted: {:#}", e);
                ExitCode::from(EXIT_ABORTED)
            } else {
                error!("{:#}", e);
                ExitCode::FAILURE
            }
        }
    }
}

/// Whether `e` stopped the whole batch (unreadable input, missing ffmpeg, broken pool)
fn is_batch_abort(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ConvertError>().is_some_and(ConvertError::is_fatal)
}

async fn run(args: Args) -> Result<ConversionStats> {
    let mut config = load_config(&args).await?;

    // Validate arguments
    if !args.input_directory.is_dir() {
        return Err(anyhow::anyhow!(
            "Input directory does not exist: {}",
            args.input_directory.display()
        ));
    }

    if let Some(ref output_dir) = args.output {
        if !output_dir.exists() {
            FileManager::create_output_directory(output_dir)?;
            info!("Created output directory: {}", output_dir.display());
        }
        if !output_dir.is_dir() {
            return Err(anyhow::anyhow!("Output path is not a directory: {}", output_dir.display()));
        }
    }

    // ffmpeg is resolved once; every worker uses the same binary
    let explicit_ffmpeg = config.ffmpeg_path.clone();
    config.ffmpeg_path = ToolPathResolver::new().resolve("ffmpeg", Some(&explicit_ffmpeg))?;
    config.validate()?;

    let events: Arc<dyn ConversionEvents> = if config.json_output {
        Arc::new(JsonEvents::new(JsonConfig::from(&config)))
    } else {
        Arc::new(TracingEvents)
    };

    let progress = (!config.json_output).then(ProgressManager::new);
    let on_progress: ProgressCallback = match progress.clone() {
        Some(bar) => Box::new(move |completed, total| bar.update(completed, total)),
        None => Box::new(|completed, total| JsonMessage::progress(completed, total).emit()),
    };

    let converter = BatchConverter::with_ffmpeg(config.clone(), events)?;

    if let Some(bar) = progress.clone() {
        let mut phases = converter.subscribe();
        tokio::spawn(async move {
            loop {
                bar.show_phase(*phases.borrow_and_update());
                if phases.changed().await.is_err() {
                    break;
                }
            }
        });
    }

    let token = converter.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted: waiting for running conversions, no new file will be started");
            token.cancel();
        }
    });

    let start_time = std::time::Instant::now();
    let (results, stats) = converter
        .convert_directory_with_stats(&args.input_directory, args.output.as_deref(), Some(on_progress))
        .await?;

    if config.json_output {
        if results.is_empty() {
            JsonMessage::complete(0, 0, 0, 0, start_time.elapsed().as_secs_f64()).emit();
        }
        return Ok(stats);
    }

    if let Some(bar) = progress {
        bar.finish(&stats.format_summary());
    }
    print_final_stats(&results, &stats, start_time.elapsed().as_secs_f64());

    Ok(stats)
}

/// Config file first, then CLI flags on top
async fn load_config(args: &Args) -> Result<Config> {
    let config_path = args.config.clone().or_else(Config::default_path);
    let mut config = match config_path {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };

    if let Some(format) = args.format {
        config.target_format = format;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(ref bitrate) = args.bitrate {
        config.audio_bitrate = bitrate.clone();
    }
    if args.no_cover {
        config.include_cover_art = false;
    }
    if args.json {
        config.json_output = true;
    }
    if let Some(ref ffmpeg) = args.ffmpeg {
        config.ffmpeg_path = ffmpeg.clone();
    }

    if args.save_config {
        match config_path {
            Some(ref path) => {
                config.validate()?;
                config.save_to_file(path).await?;
                info!("Saved configuration to {}", path.display());
            }
            None => warn!("No configuration directory available, --save-config ignored"),
        }
    }

    Ok(config)
}

fn print_final_stats(results: &[ConversionResult], stats: &ConversionStats, duration: f64) {
    if results.is_empty() {
        info!("No FLAC files found to convert");
        return;
    }

    info!("=== Conversion Complete ===");
    info!("Files converted: {}", stats.files_converted);
    info!("Files failed: {}", stats.errors);
    info!("Bytes written: {}", FileManager::format_size(stats.bytes_written));
    info!("Duration: {:.1}s", duration);

    for result in results {
        if let ConversionResult::Failure { source_path, error_message } = result {
            warn!("  {}: {}", source_path.display(), error_message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn args(config: &Path, extra: &[&str]) -> Args {
        let mut argv = vec!["flac-converter", "/music/flac", "--config", config.to_str().unwrap()];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[tokio::test]
    async fn test_flags_override_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        Config {
            target_format: AudioFormat::Ogg,
            workers: 2,
            ..Default::default()
        }
        .save_to_file(&path)
        .await
        .unwrap();

        let config = load_config(&args(&path, &["-w", "6", "--no-cover", "--ffmpeg", "ffmpeg7"]))
            .await
            .unwrap();

        assert_eq!(config.target_format, AudioFormat::Ogg);
        assert_eq!(config.workers, 6);
        assert!(!config.include_cover_art);
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg7"));
        // Without --save-config the file is left alone
        assert_eq!(Config::from_file(&path).await.unwrap().workers, 2);
    }

    #[tokio::test]
    async fn test_save_config_writes_effective_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        load_config(&args(&path, &["-f", "opus", "-b", "160k", "--save-config"]))
            .await
            .unwrap();

        let saved = Config::from_file(&path).await.unwrap();
        assert_eq!(saved.target_format, AudioFormat::Opus);
        assert_eq!(saved.audio_bitrate, "160k");
    }

    #[tokio::test]
    async fn test_invalid_flags_are_not_saved() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        assert!(load_config(&args(&path, &["-w", "0", "--save-config"])).await.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_batch_abort_classification() {
        let missing = anyhow::Error::from(ConvertError::MissingDependency("ffmpeg".to_string()));
        assert!(is_batch_abort(&missing));

        let per_file = anyhow::Error::from(ConvertError::conversion("/music/a.flac", "bad header"));
        assert!(!is_batch_abort(&per_file));
        assert!(!is_batch_abort(&anyhow::anyhow!("Input directory does not exist")));
    }
}
