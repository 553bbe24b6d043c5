//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per comunicazione con
//! un'interfaccia esterna (GUI, script).
//!
//! ## Responsabilità:
//! - Emette un oggetto JSON per riga su stdout
//! - Fornisce interfaccia standardizzata per comunicazione inter-processo
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch, dopo la discovery
//! - `progress`: Progresso corrente (completati / totale)
//! - `file_complete`: Fine elaborazione di un file (successo o errore)
//! - `complete`: Fine batch con statistiche finali
//! - `error`: Errore fatale

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Config;
use crate::format::AudioFormat;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    /// Inizio del batch
    #[serde(rename = "start")]
    Start {
        input_dir: PathBuf,
        total_files: usize,
        config: JsonConfig,
    },

    /// Progresso corrente
    #[serde(rename = "progress")]
    Progress {
        current: usize,
        total: usize,
        percentage: f64,
    },

    /// Fine elaborazione di un file specifico
    #[serde(rename = "file_complete")]
    FileComplete {
        source: Option<PathBuf>,
        destination: Option<PathBuf>,
        error: Option<String>,
    },

    /// Batch completato
    #[serde(rename = "complete")]
    Complete {
        files_processed: usize,
        files_converted: usize,
        errors: usize,
        bytes_written: u64,
        duration_seconds: f64,
    },

    /// Errore generale
    #[serde(rename = "error")]
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Configurazione riportata nell'output JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonConfig {
    pub target_format: AudioFormat,
    pub include_cover_art: bool,
    pub workers: usize,
    pub audio_bitrate: String,
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            target_format: config.target_format,
            include_cover_art: config.include_cover_art,
            workers: config.workers,
            audio_bitrate: config.audio_bitrate.clone(),
        }
    }
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(input_dir: PathBuf, total_files: usize, config: JsonConfig) -> Self {
        Self::Start {
            input_dir,
            total_files,
            config,
        }
    }

    pub fn progress(current: usize, total: usize) -> Self {
        let percentage = if total > 0 {
            (current as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        Self::Progress {
            current,
            total,
            percentage,
        }
    }

    pub fn file_converted(destination: PathBuf) -> Self {
        Self::FileComplete {
            source: None,
            destination: Some(destination),
            error: None,
        }
    }

    pub fn file_failed(source: PathBuf, error: String) -> Self {
        Self::FileComplete {
            source: Some(source),
            destination: None,
            error: Some(error),
        }
    }

    pub fn complete(
        files_processed: usize,
        files_converted: usize,
        errors: usize,
        bytes_written: u64,
        duration_seconds: f64,
    ) -> Self {
        Self::Complete {
            files_processed,
            files_converted,
            errors,
            bytes_written,
            duration_seconds,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}
