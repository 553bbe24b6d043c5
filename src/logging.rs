//! # Logging Setup
//!
//! Questo modulo installa il subscriber `tracing` globale.
//!
//! ## Destinazioni:
//! - stderr: livello INFO (DEBUG con `--verbose`), `RUST_LOG` ha la precedenza
//! - file opzionale (`--log-file`): sempre DEBUG, senza colori, in append
//!
//! stdout resta libero per il flusso JSON di `--json`.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the global subscriber: stderr always, `log_file` when given
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)));

    let file = match log_file {
        Some(path) => Some(file_layer(
            open_log_file(path).with_context(|| format!("cannot open log file {}", path.display()))?,
        )),
        None => None,
    };

    tracing_subscriber::registry().with(console).with(file).try_init()?;
    Ok(())
}

/// Open `path` for appending, creating it and its parent directories
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Plain-text DEBUG layer writing to `file`
fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(LevelFilter::DEBUG)
}
