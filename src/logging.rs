//! Tracing setup.
//!
//! The terminal belongs to the TUI, so logs go to
//! `<data_local_dir>/cloudeck/logs/cloudeck.log`. `RUST_LOG` directives are
//! honored on top of the configured level.

use std::fs;
use std::path::PathBuf;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::Level;

/// Directory the log file is written to.
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cloudeck")
        .join("logs")
}

/// Parse a level name; unknown names fall back to INFO.
pub fn parse_level(name: &str) -> Level {
    match name.trim().to_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "INFO" => Level::INFO,
        "WARN" | "WARNING" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global subscriber. Returns the log file path.
pub fn setup_logging(level: &str) -> Result<PathBuf> {
    let dir = log_dir();
    fs::create_dir_all(&dir).wrap_err("failed to create log directory")?;

    let path = dir.join("cloudeck.log");
    let file = fs::File::create(&path).wrap_err("failed to create log file")?;
    let level = parse_level(level);

    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    tracing::info!(?level, path = %path.display(), "logging initialized");
    Ok(path)
}
