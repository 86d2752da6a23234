//! TOML-based application configuration.
//!
//! Stores:
//! - Reminder timing mode (production or debug)
//! - Stale-fire grace for delayed pre-event alarms
//! - Whether scheduling confirmations are shown
//! - Wake-lock tag used while alarms are re-armed
//!
//! Configuration is stored at `~/.config/talkbell/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::timing::{NotificationMode, TimingPolicy, DEFAULT_STALE_FIRE_GRACE_MS};

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub mode: NotificationMode,
    /// Seconds past a talk's end during which a late pre-event alarm is still shown.
    #[serde(default = "default_stale_fire_grace_secs")]
    pub stale_fire_grace_secs: u64,
    #[serde(default = "default_true")]
    pub toasts: bool,
}

/// Alarm adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmsConfig {
    #[serde(default = "default_wake_lock_tag")]
    pub wake_lock_tag: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/talkbell/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub alarms: AlarmsConfig,
}

fn default_stale_fire_grace_secs() -> u64 {
    (DEFAULT_STALE_FIRE_GRACE_MS / 1000) as u64
}
fn default_true() -> bool {
    true
}
fn default_wake_lock_tag() -> String {
    "talkbell-reset".into()
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            mode: NotificationMode::default(),
            stale_fire_grace_secs: default_stale_fire_grace_secs(),
            toasts: true,
        }
    }
}

impl Default for AlarmsConfig {
    fn default() -> Self {
        Self {
            wake_lock_tag: default_wake_lock_tag(),
        }
    }
}

impl Config {
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
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|e| invalid(e.to_string()))?
                            .into(),
                    ),
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

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/talkbell"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
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
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

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

    /// Set a config value by key without persisting.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit its type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Timing policy described by this configuration.
    pub fn timing_policy(&self) -> TimingPolicy {
        let grace_ms = i64::try_from(self.notifications.stale_fire_grace_secs)
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000);
        TimingPolicy::new(self.notifications.mode).with_stale_fire_grace_ms(grace_ms)
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
        assert_eq!(parsed.notifications.mode, NotificationMode::Production);
        assert_eq!(parsed.notifications.stale_fire_grace_secs, 600);
        assert_eq!(parsed.alarms.wake_lock_tag, "talkbell-reset");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[notifications]\nmode = \"debug\"\n").unwrap();
        assert_eq!(parsed.notifications.mode, NotificationMode::Debug);
        assert!(parsed.notifications.toasts);
        assert_eq!(parsed.notifications.stale_fire_grace_secs, 600);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("notifications.mode").as_deref(), Some("production"));
        assert_eq!(cfg.get("notifications.toasts").as_deref(), Some("true"));
        assert_eq!(
            cfg.get("notifications.stale_fire_grace_secs").as_deref(),
            Some("600")
        );
        assert!(cfg.get("notifications.missing").is_none());
    }

    #[test]
    fn apply_switches_mode() {
        let mut cfg = Config::default();
        cfg.apply("notifications.mode", "debug").unwrap();
        assert_eq!(cfg.notifications.mode, NotificationMode::Debug);
        assert_eq!(cfg.timing_policy().mode(), NotificationMode::Debug);
    }

    #[test]
    fn apply_rejects_unknown_mode() {
        let mut cfg = Config::default();
        let err = cfg.apply("notifications.mode", "turbo").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(cfg.notifications.mode, NotificationMode::Production);
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("notifications.volume", "3"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.apply("notifications.toasts", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn timing_policy_uses_grace_seconds() {
        let mut cfg = Config::default();
        cfg.apply("notifications.stale_fire_grace_secs", "120").unwrap();
        assert_eq!(cfg.timing_policy().stale_fire_grace_ms(), 120_000);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.notifications.mode, NotificationMode::Production);

        let mut changed = cfg.clone();
        changed.apply("notifications.toasts", "false").unwrap();
        changed.save_to(&path).unwrap();
        assert!(!Config::load_from(&path).unwrap().notifications.toasts);
    }
}
