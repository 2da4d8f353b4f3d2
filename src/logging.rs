use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Initialize tracing to a log file under the finchat home.
///
/// The TUI owns the terminal, so logs never go to stdout/stderr.
/// Filtering honors RUST_LOG and defaults to info.
pub fn init(finchat_home: &Path) -> Result<()> {
    let log_dir = finchat_home.join("logs");
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("finchat.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}
