//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei file sorgente e le operazioni sulle directory.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva e lazy dei file FLAC in una directory
//! - Creazione race-safe delle directory di output
//! - Formattazione human-readable delle dimensioni
//!
//! ## Politica errori nella discovery:
//! - Root mancante, non-directory o non leggibile: `ConvertError::Discovery`, il batch non parte
//! - Singola entry non leggibile (permessi, symlink rotto, loop): saltata e segnalata
//!   come warning tramite `ConversionEvents::entry_skipped`, la discovery continua
//!
//! L'ordine è stabile: le entry vengono ordinate per nome durante la visita.
//!
//! ## Esempio:
//! ```rust,no_run
//! use flac_batch_converter::{events::TracingEvents, file_manager::FileManager};
//! use std::path::Path;
//!
//! let events = TracingEvents;
//! for file in FileManager::discover_sources(Path::new("/music"), &events)? {
//!     println!("{}", file.display());
//! }
//! # Ok::<(), flac_batch_converter::ConvertError>(())
//! ```

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ConvertError;
use crate::events::ConversionEvents;
use crate::format::SOURCE_EXTENSION;

/// Manages file discovery and directory operations
pub struct FileManager;

impl FileManager {
    /// Lazily enumerate every source file below `root`.
    ///
    /// The root is checked eagerly so an unreadable root fails before any
    /// job is built; everything below it is read while iterating.
    pub fn discover_sources<'a>(
        root: &Path,
        events: &'a dyn ConversionEvents,
    ) -> Result<impl Iterator<Item = PathBuf> + 'a, ConvertError> {
        Self::check_root(root).map_err(|source| {
            events.directory_error(root, &source.to_string());
            ConvertError::Discovery {
                path: root.to_path_buf(),
                source,
            }
        })?;

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        Ok(walker
            .filter_map(move |entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    events.entry_skipped(err.path(), &err.to_string());
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| Self::is_source_file(path)))
    }

    /// Collect every source file below `root`
    pub fn find_source_files(root: &Path, events: &dyn ConversionEvents) -> Result<Vec<PathBuf>, ConvertError> {
        Ok(Self::discover_sources(root, events)?.collect())
    }

    fn check_root(root: &Path) -> io::Result<()> {
        let metadata = std::fs::metadata(root)?;
        if !metadata.is_dir() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a directory"));
        }
        // Listing fails here when the root exists but is not readable
        std::fs::read_dir(root)?;
        Ok(())
    }

    /// Check if a file has the source extension (case-insensitive)
    pub fn is_source_file(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(SOURCE_EXTENSION))
            .unwrap_or(false)
    }

    /// Create a directory and all its parents; an existing directory is not an error
    pub fn create_output_directory(dir: &Path) -> Result<(), ConvertError> {
        std::fs::create_dir_all(dir).map_err(|source| ConvertError::DirectoryCreation {
            path: dir.to_path_buf(),
            source,
        })
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
