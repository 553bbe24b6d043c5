//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione di un batch di conversione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di conversione
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `target_format`: Formato di destinazione (default: mp3)
//! - `include_cover_art`: Copia la copertina embedded (default: true)
//! - `workers`: Numero di worker paralleli (default: 4, minimo 1)
//! - `audio_bitrate`: Bitrate per i formati lossy (default: "320k")
//! - `ffmpeg_path`: Binario ffmpeg, risolto una volta all'avvio (default: "ffmpeg")
//! - `json_output`: Eventi JSON su stdout invece della progress bar
//!
//! La configurazione è immutabile per tutta la durata di un batch.
//!
//! ## Esempio:
//! ```rust
//! use flac_batch_converter::{AudioFormat, Config};
//!
//! let config = Config {
//!     target_format: AudioFormat::Alac,
//!     workers: 8,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::format::AudioFormat;

/// Upper bound for the worker pool size
pub const MAX_WORKERS: usize = 256;

/// Configuration for one batch conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output format
    pub target_format: AudioFormat,
    /// Copy the first embedded picture as front cover
    pub include_cover_art: bool,
    /// Number of parallel workers
    pub workers: usize,
    /// Bitrate for lossy encoders (e.g. "320k")
    pub audio_bitrate: String,
    /// ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_format: AudioFormat::Mp3,
            include_cover_art: true,
            workers: 4,
            audio_bitrate: "320k".to_string(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.workers > MAX_WORKERS {
            return Err(anyhow::anyhow!("Number of workers must be at most {}", MAX_WORKERS));
        }

        if !self.target_format.is_lossless() {
            let kbps = self
                .audio_bitrate
                .strip_suffix('k')
                .and_then(|n| n.parse::<u32>().ok())
                .ok_or_else(|| {
                    anyhow::anyhow!("Audio bitrate must look like \"320k\", got \"{}\"", self.audio_bitrate)
                })?;
            if !(8..=512).contains(&kbps) {
                return Err(anyhow::anyhow!("Audio bitrate must be between 8k and 512k"));
            }
        }

        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("ffmpeg path must not be empty"));
        }

        Ok(())
    }

    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flac-converter").join("config.json"))
    }

    /// Load configuration from file, falling back to defaults when it does not exist
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 4;
        config.audio_bitrate = "loud".to_string();
        assert!(config.validate().is_err());

        config.audio_bitrate = "2000k".to_string();
        assert!(config.validate().is_err());

        // ALAC ignores the bitrate entirely
        config.target_format = AudioFormat::Alac;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.target_format, AudioFormat::Mp3);
        assert!(config.include_cover_art);
        assert_eq!(config.workers, 4);
        assert_eq!(config.audio_bitrate, "320k");
        assert!(!config.json_output);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let original_config = Config {
            target_format: AudioFormat::Ogg,
            include_cover_art: false,
            workers: 8,
            audio_bitrate: "192k".to_string(),
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.target_format, AudioFormat::Ogg);
        assert!(!loaded_config.include_cover_art);
        assert_eq!(loaded_config.workers, 8);
        assert_eq!(loaded_config.audio_bitrate, "192k");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");
        let config = tokio_test::block_on(Config::from_file(&path)).unwrap();
        assert_eq!(config.workers, 4);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "target_format": "aac", "workers": 2 }"#).unwrap();

        let config = tokio_test::block_on(Config::from_file(&path)).unwrap();
        assert_eq!(config.target_format, AudioFormat::Aac);
        assert_eq!(config.workers, 2);
        assert!(config.include_cover_art);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "workers": 0 }"#).unwrap();

        assert!(tokio_test::block_on(Config::from_file(&path)).is_err());
    }
}
