//! Subcommands and the helpers they share.

pub mod config;
pub mod export;
pub mod import;
pub mod parse;
pub mod replay;
pub mod reset;
pub mod stats;
pub mod watch;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use shiftrep_core::models::config::ShiftrepConfig;
use shiftrep_core::service::ReportService;
use shiftrep_core::storage::CsvReportStore;

use crate::notifier::TerminalNotifier;

/// Service wired to period files and the terminal.
pub type CliService = ReportService<CsvReportStore, TerminalNotifier>;

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shiftrep")
        .join("config.json")
}

/// Path given with `--config`, or the default location.
pub fn resolve_config_path(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load configuration. An explicit path must exist; the default one may not.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ShiftrepConfig> {
    if let Some(path) = config_path {
        let path = Path::new(path);
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(ShiftrepConfig::from_file(path)?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config file: {}", path.display());
        Ok(ShiftrepConfig::from_file(&path)?)
    } else {
        Ok(ShiftrepConfig::default())
    }
}

/// Build the service over the configured data directory and reload the
/// current period's aggregates.
pub fn open_service(config: &ShiftrepConfig, now: DateTime<Utc>) -> anyhow::Result<CliService> {
    let store = CsvReportStore::new(&config.storage.data_dir);
    let mut service = ReportService::new(config, store, TerminalNotifier::new(), now)?;
    service.restore(now)?;
    Ok(service)
}
