//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - seed durations for the synthesized default plan
//! - sound output settings
//!
//! Configuration is stored at `~/.config/repset/config.toml`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Timer seed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Work seconds for the synthesized default plan.
    #[serde(default = "default_work")]
    pub default_work: u32,
    /// Interval seconds for the synthesized default plan.
    #[serde(default = "default_interval")]
    pub default_interval: u32,
}

/// Sound output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 0..=100.
    #[serde(default = "default_volume")]
    pub volume: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/repset/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub sound: SoundConfig,
}

fn default_work() -> u32 {
    60
}
fn default_interval() -> u32 {
    30
}
fn default_volume() -> u32 {
    50
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_work: default_work(),
            default_interval: default_interval(),
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_volume(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            sound: SoundConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk; a missing file writes and returns the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) | Value::Array(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.into(),
            message: e.to_string(),
        })?;

        let mut slot = &mut json;
        for part in key.split('.') {
            slot = slot
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.into()))?;
        }
        let coerced = coerce(slot, key, value)?;
        *slot = coerced;

        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.into(),
            message: e.to_string(),
        })?;
        self.save()
    }
}

/// Parse `value` with the type of the existing leaf.
fn coerce(existing: &Value, key: &str, value: &str) -> Result<Value, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.into(),
        message,
    };
    match existing {
        Value::Bool(_) => value
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| invalid(format!("cannot parse '{value}' as bool"))),
        Value::Number(_) => value
            .parse::<u64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|_| invalid(format!("cannot parse '{value}' as number"))),
        Value::String(_) => Ok(Value::String(value.into())),
        _ => Err(ConfigError::UnknownKey(key.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.default_work, 60);
        assert_eq!(parsed.timer.default_interval, 30);
        assert!(parsed.sound.enabled);
        assert_eq!(parsed.sound.volume, 50);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("sound.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("timer.default_work").as_deref(), Some("60"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("timer").is_none());
    }

    #[test]
    fn empty_sections_fill_with_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.timer.default_interval, 30);
        assert_eq!(parsed.sound.volume, 50);
    }

    #[test]
    fn coerce_matches_existing_type() {
        assert_eq!(
            coerce(&Value::Bool(true), "k", "false").unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            coerce(&Value::Number(1.into()), "k", "75").unwrap(),
            Value::Number(75.into())
        );
        assert!(coerce(&Value::Bool(true), "k", "not_a_bool").is_err());
        assert!(coerce(&Value::Number(1.into()), "k", "NaN").is_err());
    }
}
