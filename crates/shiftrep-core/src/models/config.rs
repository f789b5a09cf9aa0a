//! Configuration structures for the report pipeline.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, ShiftrepError};

/// Longest accepted commit delay, 31 days.
pub const MAX_COMMIT_DELAY_SECS: u64 = 31 * 24 * 60 * 60;

/// Main configuration for shiftrep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftrepConfig {
    /// Report parsing configuration.
    pub parser: ParserConfig,

    /// Debounce buffer configuration.
    pub buffer: BufferConfig,

    /// Period file configuration.
    pub storage: StorageConfig,

    /// Outbound notification configuration.
    pub notify: NotifyConfig,
}

/// Report parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Minimum number of non-zero fields for a message to count as a report.
    pub min_fields: usize,

    /// Non-blank lines examined after the extrusion trigger.
    pub extrusion_lookahead: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_fields: 3,
            extrusion_lookahead: 8,
        }
    }
}

/// Debounce buffer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Delay between the last edit of a report and its commit.
    pub commit_delay_secs: u64,

    /// How often the scheduler looks for due reports.
    pub tick_interval_secs: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            commit_delay_secs: 20 * 60,
            tick_interval_secs: 60,
        }
    }
}

impl BufferConfig {
    /// Commit delay as a duration, rejecting values above [`MAX_COMMIT_DELAY_SECS`].
    pub fn commit_delay(&self) -> Result<TimeDelta> {
        let secs = self.commit_delay_secs;
        if secs > MAX_COMMIT_DELAY_SECS {
            return Err(ShiftrepError::Config(format!(
                "buffer.commit_delay_secs must be at most {MAX_COMMIT_DELAY_SECS}, got {secs}"
            )));
        }
        i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| ShiftrepError::Config(format!("invalid commit delay: {secs}s")))
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_interval_secs.max(1))
    }
}

/// Period file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one CSV file per month.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Outbound notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Chat that receives confirmations and errors.
    pub target: String,

    /// Acknowledge a report as soon as it is buffered.
    pub notify_on_receipt: bool,

    /// Reply to messages that were not recognized as reports.
    pub notify_unrecognized: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            target: "shift-chat".to_string(),
            notify_on_receipt: false,
            notify_unrecognized: false,
        }
    }
}

impl ShiftrepConfig {
    /// Load and validate configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        self.buffer.commit_delay()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ShiftrepConfig =
            serde_json::from_str(r#"{"buffer": {"commit_delay_secs": 120}}"#).unwrap();

        assert_eq!(config.buffer.commit_delay().unwrap(), TimeDelta::minutes(2));
        assert_eq!(config.buffer.tick_interval_secs, 60);
        assert_eq!(config.parser.min_fields, 3);
        assert_eq!(config.parser.extrusion_lookahead, 8);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ShiftrepConfig::default();
        config.storage.data_dir = PathBuf::from("/var/lib/shiftrep");
        config.save(&path).unwrap();

        let loaded = ShiftrepConfig::from_file(&path).unwrap();
        assert_eq!(loaded.storage.data_dir, PathBuf::from("/var/lib/shiftrep"));
    }

    #[test]
    fn test_commit_delay_out_of_range() {
        let mut config = ShiftrepConfig::default();
        config.buffer.commit_delay_secs = 10_000_000_000_000_000;

        assert!(matches!(
            config.buffer.commit_delay(),
            Err(ShiftrepError::Config(_))
        ));
        assert!(config.validate().is_err());

        config.buffer.commit_delay_secs = MAX_COMMIT_DELAY_SECS;
        assert_eq!(
            config.buffer.commit_delay().unwrap(),
            TimeDelta::days(31)
        );
    }

    #[test]
    fn test_from_file_rejects_bad_delay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"buffer": {"commit_delay_secs": 10000000000000000}}"#).unwrap();

        let err = ShiftrepConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ShiftrepError::Config(_)));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ShiftrepConfig::from_file(&path),
            Err(ShiftrepError::Json(_))
        ));
    }
}
