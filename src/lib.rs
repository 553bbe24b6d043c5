//! # FLAC Batch Converter Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `batch`: Orchestratore del batch, worker pool e aggregazione risultati
//! - `converter`: Conversione di un singolo file con FFmpeg
//! - `metadata`: Copia di tag e copertina con `lofty`
//! - `format`: Formati di destinazione e campi tag supportati
//! - `file_manager`: Discovery dei file FLAC e operazioni su directory
//! - `events`: Sink di logging iniettato (tracing o JSON)
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `progress`: Progress bar e statistiche
//! - `json_output`: Messaggi JSON per consumatori programmatici
//! - `logging`: Subscriber `tracing` su stderr e file di log opzionale
//! - `tool_resolver`: Ricerca del binario ffmpeg
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use flac_batch_converter::{events::TracingEvents, BatchConverter, Config};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), flac_batch_converter::ConvertError> {
//! let converter = BatchConverter::with_ffmpeg(Config::default(), Arc::new(TracingEvents))?;
//! let results = converter
//!     .convert_directory(Path::new("/music/flac"), Some(Path::new("/music/mp3")), None)
//!     .await?;
//! println!("{} files processed", results.len());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod converter;
pub mod error;
pub mod events;
pub mod file_manager;
pub mod format;
pub mod json_output;
pub mod logging;
pub mod metadata;
pub mod progress;
pub mod tool_resolver;
pub mod utils;

pub use batch::{BatchConverter, BatchPhase, ConversionJob, ConversionResult, PathResolver, ProgressCallback};
pub use config::Config;
pub use converter::{FfmpegConverter, FileConverter};
pub use error::ConvertError;
pub use file_manager::FileManager;
pub use format::{AudioFormat, TagField};
pub use progress::{ConversionStats, ProgressManager};
pub use tool_resolver::ToolPathResolver;
