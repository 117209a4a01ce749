//! Tracing subscriber setup.
//!
//! The terminal belongs to the UI, so log output goes to a file.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::Result;

/// Install the global subscriber writing to `log_file`.
///
/// `RUST_LOG` wins over `default_level` when it is set.
pub fn init(log_file: &Path, default_level: &str) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(log_file)?;
    build_subscriber(file, default_level).init();
    tracing::info!("Logging to {}", log_file.display());
    Ok(())
}

pub fn build_subscriber(
    log_file: File,
    default_level: &str,
) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
