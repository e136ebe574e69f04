//! CLI command implementations

pub mod chat;
pub mod logs;
pub mod records;
pub mod report;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use caixinha_core::services::{EntryPoint, LoggingService};
use caixinha_core::CaixinhaContext;
use tokio::runtime::Runtime;

/// Logging service for CLI operations
///
/// Returns None if logging fails to initialize (it never blocks a command)
pub fn get_logger() -> Option<LoggingService> {
    let dir = get_caixinha_dir().ok()?;
    std::fs::create_dir_all(&dir).ok()?;
    LoggingService::new(&dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Data directory from `CAIXINHA_DIR`, else `~/.caixinha`
pub fn get_caixinha_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CAIXINHA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".caixinha"))
        .ok_or_else(|| anyhow!("Could not find home directory; set CAIXINHA_DIR"))
}

/// Create the data directory if needed and load the context
pub fn get_context() -> Result<CaixinhaContext> {
    let dir = get_caixinha_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory: {:?}", dir))?;

    tracing::debug!(dir = %dir.display(), "loading context");
    CaixinhaContext::new(&dir).context("Failed to initialize caixinha context")
}

/// Runtime for driving the async core from synchronous commands
pub fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}
