//! Configuration file loading with precedence handling.

use crate::state::jump::DEFAULT_SETTLE_DELAY_MS;
use crate::state::replay::{
    ReplayConfig, DEFAULT_FALLBACK_DELAY_MS, DEFAULT_MAX_DELAY_MS, DEFAULT_MIN_DELAY_MS,
    DEFAULT_SPEED,
};
use crate::state::search::{SearchConfig, DEFAULT_HIT_LIMIT, DEFAULT_SNIPPET_CONTEXT};
use crate::state::ViewSettings;
use crate::timeline::DEFAULT_GROUP_GAP_MS;
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV_VAR: &str = "CHATLINE_CONFIG";

/// Environment variable overriding the timezone offset, in minutes east of UTC.
pub const TZ_OFFSET_ENV_VAR: &str = "CHATLINE_TZ_OFFSET";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A setting parsed but is out of range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Setting name as written in the config file.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/chatline/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Minutes east of UTC used for calendar days and labels.
    #[serde(default)]
    pub timezone_offset_minutes: Option<i32>,

    /// Silence, in seconds, that starts a new separator and avatar run.
    #[serde(default)]
    pub group_gap_secs: Option<u64>,

    /// Maximum number of keyword search hits.
    #[serde(default)]
    pub search_hit_limit: Option<usize>,

    /// Characters of context on each side of a search match.
    #[serde(default)]
    pub snippet_context_chars: Option<usize>,

    /// Shortest replay reveal delay.
    #[serde(default)]
    pub replay_min_delay_ms: Option<u64>,

    /// Longest replay reveal delay.
    #[serde(default)]
    pub replay_max_delay_ms: Option<u64>,

    /// Reveal delay used when a message's time is unknown.
    #[serde(default)]
    pub replay_fallback_delay_ms: Option<u64>,

    /// Initial replay speed multiplier.
    #[serde(default)]
    pub replay_default_speed: Option<f64>,

    /// Wait before the initial scroll on display.
    #[serde(default)]
    pub settle_delay_ms: Option<u64>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub timezone_offset_minutes: i32,
    pub group_gap_secs: u64,
    pub search_hit_limit: usize,
    pub snippet_context_chars: usize,
    pub replay_min_delay_ms: u64,
    pub replay_max_delay_ms: u64,
    pub replay_fallback_delay_ms: u64,
    pub replay_default_speed: f64,
    pub settle_delay_ms: u64,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            timezone_offset_minutes: 0,
            group_gap_secs: DEFAULT_GROUP_GAP_MS / 1000,
            search_hit_limit: DEFAULT_HIT_LIMIT,
            snippet_context_chars: DEFAULT_SNIPPET_CONTEXT,
            replay_min_delay_ms: DEFAULT_MIN_DELAY_MS,
            replay_max_delay_ms: DEFAULT_MAX_DELAY_MS,
            replay_fallback_delay_ms: DEFAULT_FALLBACK_DELAY_MS,
            replay_default_speed: DEFAULT_SPEED,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// The configured offset as a chrono value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for offsets of a day or more.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.timezone_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "timezone_offset_minutes",
                reason: format!(
                    "{} is not within one day of UTC",
                    self.timezone_offset_minutes
                ),
            })
    }

    /// Settings for a conversation view.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a setting is out of range.
    pub fn view_settings(&self) -> Result<ViewSettings, ConfigError> {
        if !(self.replay_default_speed.is_finite() && self.replay_default_speed > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "replay_default_speed",
                reason: format!("{} is not a positive number", self.replay_default_speed),
            });
        }
        if self.replay_min_delay_ms > self.replay_max_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "replay_min_delay_ms",
                reason: format!(
                    "{} exceeds replay_max_delay_ms ({})",
                    self.replay_min_delay_ms, self.replay_max_delay_ms
                ),
            });
        }

        Ok(ViewSettings {
            offset: self.offset()?,
            group_gap_ms: self.group_gap_secs.saturating_mul(1000),
            search: SearchConfig {
                hit_limit: self.search_hit_limit,
                snippet_context: self.snippet_context_chars,
                ..SearchConfig::default()
            },
            replay: ReplayConfig {
                min_delay_ms: self.replay_min_delay_ms,
                max_delay_ms: self.replay_max_delay_ms,
                fallback_delay_ms: self.replay_fallback_delay_ms,
                default_speed: self.replay_default_speed,
            },
            settle_delay_ms: self.settle_delay_ms,
        })
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/chatline/chatline.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("chatline").join("chatline.log")
    } else {
        PathBuf::from("chatline.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/chatline/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chatline").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `CHATLINE_CONFIG` environment variable
/// 3. Default path `~/.config/chatline/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `CHATLINE_TZ_OFFSET`: minutes east of UTC
///
/// Unparseable values are logged and ignored.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(raw) = std::env::var(TZ_OFFSET_ENV_VAR) {
        match raw.trim().parse::<i32>() {
            Ok(minutes) => config.timezone_offset_minutes = minutes,
            Err(e) => warn!(value = %raw, error = %e, "Ignoring invalid CHATLINE_TZ_OFFSET"),
        }
    }

    config
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        timezone_offset_minutes: config
            .timezone_offset_minutes
            .unwrap_or(defaults.timezone_offset_minutes),
        group_gap_secs: config.group_gap_secs.unwrap_or(defaults.group_gap_secs),
        search_hit_limit: config.search_hit_limit.unwrap_or(defaults.search_hit_limit),
        snippet_context_chars: config
            .snippet_context_chars
            .unwrap_or(defaults.snippet_context_chars),
        replay_min_delay_ms: config
            .replay_min_delay_ms
            .unwrap_or(defaults.replay_min_delay_ms),
        replay_max_delay_ms: config
            .replay_max_delay_ms
            .unwrap_or(defaults.replay_max_delay_ms),
        replay_fallback_delay_ms: config
            .replay_fallback_delay_ms
            .unwrap_or(defaults.replay_fallback_delay_ms),
        replay_default_speed: config
            .replay_default_speed
            .unwrap_or(defaults.replay_default_speed),
        settle_delay_ms: config.settle_delay_ms.unwrap_or(defaults.settle_delay_ms),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: ResolvedConfig, speed_override: Option<f64>) -> ResolvedConfig {
    if let Some(speed) = speed_override {
        config.replay_default_speed = speed;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
