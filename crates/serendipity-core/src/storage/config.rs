//! TOML-based engine configuration.
//!
//! Stores tuning for:
//! - Event aggregation (per-source timeout, base confidence, default selectors)
//! - Ranking (output cap, goal boost, clamping)
//! - Suggestion memory capacity
//! - Outcome recording after each run
//! - Digest scheduling cadence
//!
//! Configuration is stored at `~/.config/serendipity/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;
use crate::profile::{clamp_unit, SourceSelectors};

/// Event aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,
    /// Confidence every scraped candidate starts from.
    #[serde(default = "default_base_confidence")]
    pub base_confidence: f64,
    /// Used for sources that carry no selectors of their own.
    #[serde(default = "default_selectors")]
    pub default_selectors: SourceSelectors,
}

/// Ranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Maximum number of suggestions returned by one run.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    /// How many of the top suggestions are flagged as actionable.
    #[serde(default = "default_action_count")]
    pub action_count: usize,
    #[serde(default = "default_goal_boost")]
    pub goal_boost: f64,
    /// Clamp priorities at 0 as well as at 1.
    #[serde(default = "default_true")]
    pub clamp_lower: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub capacity: usize,
}

/// Outcome recording settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeConfig {
    #[serde(default = "default_true")]
    pub record: bool,
    /// Suggestions ranked strictly above this count as successes.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_check_secs")]
    pub check_secs: u64,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/serendipity/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub outcomes: OutcomeConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

// Default functions
fn default_source_timeout_secs() -> u64 {
    10
}
fn default_base_confidence() -> f64 {
    0.7
}
fn default_selectors() -> SourceSelectors {
    SourceSelectors {
        title: Some("h2.event-title".into()),
        description: Some("div.event-description".into()),
        datetime: Some("span.event-date".into()),
        location: Some("p.event-location".into()),
    }
}
fn default_max_suggestions() -> usize {
    20
}
fn default_action_count() -> usize {
    3
}
fn default_goal_boost() -> f64 {
    0.2
}
fn default_true() -> bool {
    true
}
fn default_memory_capacity() -> usize {
    10
}
fn default_success_threshold() -> f64 {
    0.7
}
fn default_interval_secs() -> u64 {
    8 * 60 * 60
}
fn default_check_secs() -> u64 {
    60
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            source_timeout_secs: default_source_timeout_secs(),
            base_confidence: default_base_confidence(),
            default_selectors: default_selectors(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
            action_count: default_action_count(),
            goal_boost: default_goal_boost(),
            clamp_lower: true,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_memory_capacity(),
        }
    }
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            record: true,
            success_threshold: default_success_threshold(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            check_secs: default_check_secs(),
        }
    }
}

impl AggregationConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}

impl EngineConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    ///
    /// Any other read failure is returned and leaves the file untouched.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
                cfg.validated()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(load_failed(e.to_string())),
        }
    }

    /// Normalize values that have a valid range.
    ///
    /// `aggregation.base_confidence` is clamped to `[0, 1]` and a zero
    /// `aggregation.source_timeout_secs` is rejected.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.aggregation.source_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "aggregation.source_timeout_secs".into(),
                message: "must be at least 1".into(),
            });
        }
        self.aggregation.base_confidence = clamp_unit(self.aggregation.base_confidence);
        Ok(self)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, keeping the existing value's type.
    /// Does not persist; call [`EngineConfig::save`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated.validated()?;
        Ok(())
    }
}
