//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della libreria.
//!
//! ## Responsabilità:
//! - Definisce `ConvertError` enum per categorizzare tutti gli errori possibili
//! - Distingue errori fatali per il batch da errori isolati sul singolo file
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Errori fatali (abortiscono il batch):
//! - `Discovery`: Directory di input non leggibile
//! - `Pool`: Errore nel setup o nel join del worker pool
//! - `Validation`: Configurazione non valida
//!
//! ## Errori per-file (diventano un `Failure` nella lista risultati):
//! - `Path`: Il file sorgente non si trova sotto la directory di input
//! - `DuplicateDestination`: Due sorgenti mappano sulla stessa destinazione
//! - `DirectoryCreation`: Impossibile creare la directory di destinazione
//! - `Conversion`: Errore di decode/encode/metadata con FFmpeg o lofty
//! - `Cancelled`: Il job non è mai partito perché il batch è stato cancellato
//!
//! ## Esempio:
//! ```rust,ignore
//! if !ffmpeg_found {
//!     return Err(ConvertError::MissingDependency("ffmpeg".to_string()));
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for batch conversion
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read input directory {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not under input root {}", source_path.display(), input_root.display())]
    Path {
        source_path: PathBuf,
        input_root: PathBuf,
    },

    #[error("{} maps to {} which is already the destination of another file", source_path.display(), destination.display())]
    DuplicateDestination {
        source_path: PathBuf,
        destination: PathBuf,
    },

    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to convert {}: {cause}", source_path.display())]
    Conversion { source_path: PathBuf, cause: String },

    #[error("Batch cancelled before {} was started", source_path.display())]
    Cancelled { source_path: PathBuf },

    #[error("Tag error: {0}")]
    Metadata(#[from] lofty::error::LoftyError),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Worker pool error: {0}")]
    Pool(String),
}

impl ConvertError {
    /// Wrap any failure inside a single-file conversion into `Conversion`
    pub fn conversion(source_path: impl Into<PathBuf>, cause: impl std::fmt::Display) -> Self {
        Self::Conversion {
            source_path: source_path.into(),
            cause: cause.to_string(),
        }
    }

    /// True for errors that abort the whole batch instead of a single file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Discovery { .. } | Self::Pool(_) | Self::Validation(_) | Self::MissingDependency(_)
        )
    }
}
