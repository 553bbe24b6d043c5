//! # Single File Converter
//!
//! Questo modulo converte un singolo file FLAC nel formato di destinazione.
//!
//! ## Pipeline di conversione:
//! 1. Crea un file temporaneo accanto alla destinazione (stessa directory, stessa estensione)
//! 2. Decodifica e ricodifica con FFmpeg, solo stream audio e senza metadata
//! 3. Copia i tag riconosciuti e, se richiesto, la copertina (modulo `metadata`)
//! 4. Rinomina atomicamente il temporaneo sulla destinazione (sovrascrive se esiste)
//!
//! Qualsiasi errore in uno di questi passi diventa `ConvertError::Conversion`
//! per quel file; il temporaneo viene rimosso e la destinazione non viene mai
//! lasciata scritta a metà.
//!
//! ## Esempio:
//! ```rust,no_run
//! use flac_batch_converter::{Config, ConversionJob, FfmpegConverter, FileConverter};
//! use std::path::PathBuf;
//!
//! let config = Config::default();
//! let converter = FfmpegConverter::new(&config);
//! let job = ConversionJob::new(PathBuf::from("in.flac"), PathBuf::from("in.mp3"), &config);
//! let written = converter.convert(&job)?;
//! # Ok::<(), flac_batch_converter::ConvertError>(())
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::debug;

use crate::batch::ConversionJob;
use crate::config::Config;
use crate::error::ConvertError;
use crate::format::AudioFormat;
use crate::metadata;

/// Converts one file; the unit of failure isolation of the worker pool
pub trait FileConverter: Send + Sync {
    /// Write `job.destination_path`, overwriting it, and return it
    fn convert(&self, job: &ConversionJob) -> Result<PathBuf, ConvertError>;
}

/// Converter backed by the external ffmpeg binary and `lofty` for tags
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    ffmpeg_path: PathBuf,
    audio_bitrate: String,
}

impl FfmpegConverter {
    pub fn new(config: &Config) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            audio_bitrate: config.audio_bitrate.clone(),
        }
    }

    fn encode(&self, source: &Path, output: &Path, format: AudioFormat) -> Result<(), ConvertError> {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"])
            .arg(source)
            // Attached pictures come back through the tag copy, never as a video stream
            .args(["-map", "0:a", "-map_metadata", "-1"])
            .args(format.encoder_args(&self.audio_bitrate))
            .args(["-f", format.muxer()])
            .arg(output);

        let start_time = Instant::now();
        let result = cmd.output().map_err(|e| {
            ConvertError::conversion(
                source,
                format!("failed to execute {}: {}", self.ffmpeg_path.display(), e),
            )
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ConvertError::conversion(
                source,
                format!("ffmpeg exited with {}: {}", result.status, stderr.trim()),
            ));
        }

        debug!(
            "Encoded {} as {} in {:.1}s",
            source.display(),
            format,
            start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }
}

impl FileConverter for FfmpegConverter {
    fn convert(&self, job: &ConversionJob) -> Result<PathBuf, ConvertError> {
        let source = &job.source_path;
        let destination = &job.destination_path;
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let suffix = format!(".{}", job.target_format.extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix(".flac-converter-").suffix(&suffix);
        // Temp files default to 0600; converted tracks get the usual umask-based mode
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }

        let temp_file = builder
            .tempfile_in(parent)
            .map_err(|e| ConvertError::conversion(source, format!("cannot create temporary file: {}", e)))?;

        self.encode(source, temp_file.path(), job.target_format)?;

        metadata::copy_tags(source, temp_file.path(), job.target_format, job.include_cover_art)
            .map_err(|e| ConvertError::conversion(source, e))?;

        temp_file
            .persist(destination)
            .map_err(|e| ConvertError::conversion(source, format!("cannot write {}: {}", destination.display(), e.error)))?;

        Ok(destination.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{ffmpeg_with_encoder, write_flac};
    use super::*;
    use crate::format::TagField;
    use tempfile::TempDir;

    fn job(source: PathBuf, destination: PathBuf, include_cover_art: bool) -> ConversionJob {
        let config = Config {
            include_cover_art,
            ..Default::default()
        };
        ConversionJob::new(source, destination, &config)
    }

    #[test]
    fn test_missing_binary_is_conversion_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            ffmpeg_path: temp_dir.path().join("no-ffmpeg-here"),
            ..Default::default()
        };
        let converter = FfmpegConverter::new(&config);
        let source = temp_dir.path().join("a.flac");
        std::fs::write(&source, b"fLaC").unwrap();

        let err = converter
            .convert(&job(source.clone(), temp_dir.path().join("a.mp3"), false))
            .unwrap_err();

        assert!(matches!(err, ConvertError::Conversion { ref source_path, .. } if *source_path == source));
        assert!(!temp_dir.path().join("a.mp3").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_output_mode_follows_umask() {
        use super::fixtures::{write_fake_ffmpeg, write_minimal_flac};
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.flac");
        let output = temp_dir.path().join("a.mp3");
        write_minimal_flac(&source);
        let converter = FfmpegConverter::new(&Config {
            ffmpeg_path: write_fake_ffmpeg(temp_dir.path()),
            ..Default::default()
        });

        converter.convert(&job(source, output.clone(), true)).unwrap();

        // A plainly written file gets 0666 minus the umask, same as the conversion
        let reference = temp_dir.path().join("reference");
        std::fs::write(&reference, b"x").unwrap();
        let mode = |path: &Path| std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&output), mode(&reference));
        assert_eq!(std::fs::read(&output).unwrap(), b"encoded");
    }

    #[test]
    fn test_invalid_input_file() {
        let Some(ffmpeg) = ffmpeg_with_encoder("libmp3lame") else {
            eprintln!("ffmpeg with libmp3lame not available, skipping");
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let converter = FfmpegConverter::new(&Config {
            ffmpeg_path: ffmpeg,
            ..Default::default()
        });

        let missing = temp_dir.path().join("non_existent.flac");
        let output = temp_dir.path().join("output.mp3");
        assert!(converter.convert(&job(missing, output.clone(), true)).is_err());
        assert!(!output.exists());

        // No temporary leftovers next to the destination
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_convert_overwrites_existing_destination() {
        let Some(ffmpeg) = ffmpeg_with_encoder("libmp3lame") else {
            eprintln!("ffmpeg with libmp3lame not available, skipping");
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("test.flac");
        let output = temp_dir.path().join("test.mp3");
        write_flac(&ffmpeg, &source, &[(TagField::Title, "Test Title")], false);
        std::fs::write(&output, b"stale").unwrap();

        let converter = FfmpegConverter::new(&Config {
            ffmpeg_path: ffmpeg,
            ..Default::default()
        });
        let written = converter.convert(&job(source, output.clone(), false)).unwrap();

        assert_eq!(written, output);
        assert_ne!(std::fs::read(&output).unwrap(), b"stale");
        let tags = metadata::read_tags(&output).unwrap();
        assert_eq!(tags.get(&TagField::Title).map(String::as_str), Some("Test Title"));
    }
}
