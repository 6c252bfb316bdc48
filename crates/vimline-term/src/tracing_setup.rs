//! Tracing configuration for the vimline binary.
//!
//! The terminal belongs to the editor, so logs only ever go to a file. With
//! no log file configured no subscriber is installed at all.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use vimline_core::config::LoggingConfig;

/// Install the subscriber. `RUST_LOG` overrides the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let Some(path) = &config.file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level `{}`", config.level))?,
    };
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;
    Ok(())
}
