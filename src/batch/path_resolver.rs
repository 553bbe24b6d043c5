//! # Path Resolution Module
//!
//! Centralizza il calcolo del path di destinazione di ogni file.
//!
//! - Con directory di output: `output_root / relativo(source, input_root)`,
//!   estensione sostituita con quella del formato di destinazione
//! - Senza directory di output: stesso path del sorgente, estensione sostituita
//!
//! `resolve` è puro; `map` crea anche la directory padre della destinazione.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConvertError;
use crate::file_manager::FileManager;
use crate::format::AudioFormat;

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Derive the destination of `source_path` without touching the filesystem
    /// (apart from a canonicalize fallback when `source_path` is not literally
    /// under `input_root`)
    pub fn resolve(
        source_path: &Path,
        input_root: &Path,
        output_root: Option<&Path>,
        format: AudioFormat,
    ) -> Result<PathBuf, ConvertError> {
        let destination = match output_root {
            Some(output_root) => {
                let relative = Self::relative_to(source_path, input_root)?;
                output_root.join(relative).with_extension(format.extension())
            }
            None => source_path.with_extension(format.extension()),
        };

        debug!("Resolved output path: {} -> {}", source_path.display(), destination.display());
        Ok(destination)
    }

    /// Derive the destination and make sure its parent directory exists
    pub fn map(
        source_path: &Path,
        input_root: &Path,
        output_root: Option<&Path>,
        format: AudioFormat,
    ) -> Result<PathBuf, ConvertError> {
        let destination = Self::resolve(source_path, input_root, output_root, format)?;
        Self::ensure_parent_dirs(&destination)?;
        Ok(destination)
    }

    /// Crea le directory parent se necessario
    pub fn ensure_parent_dirs(path: &Path) -> Result<(), ConvertError> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => FileManager::create_output_directory(parent),
            _ => Ok(()),
        }
    }

    fn relative_to(source_path: &Path, input_root: &Path) -> Result<PathBuf, ConvertError> {
        if let Ok(relative) = source_path.strip_prefix(input_root) {
            return Ok(relative.to_path_buf());
        }

        // Symlinked or relative roots: compare the canonical forms before giving up
        let canonical = source_path
            .canonicalize()
            .ok()
            .zip(input_root.canonicalize().ok());
        if let Some((source, root)) = canonical {
            if let Ok(relative) = source.strip_prefix(&root) {
                return Ok(relative.to_path_buf());
            }
        }

        Err(ConvertError::Path {
            source_path: source_path.to_path_buf(),
            input_root: input_root.to_path_buf(),
        })
    }
}
