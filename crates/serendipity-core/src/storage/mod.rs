mod config;

pub use config::{
    AggregationConfig, EngineConfig, MemoryConfig, OutcomeConfig, RankingConfig, SchedulerConfig,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/serendipity[-dev]/` based on SERENDIPITY_ENV.
///
/// Set SERENDIPITY_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SERENDIPITY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("serendipity-dev")
    } else {
        base_dir.join("serendipity")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
