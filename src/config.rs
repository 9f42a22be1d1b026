//! Application-level configuration loading: season defaults, age-group suggestions and
//! persistence timings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::state::commands::{DEFAULT_WITHDRAWN_REASON, RosterPolicy};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LEAGUE_ROSTER_BACK_CONFIG_PATH";
/// Environment variable selecting the storage backend.
const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";
const DEFAULT_SAVE_STATUS_RESET_MS: u64 = 2_000;
const DEFAULT_WRITE_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    default_season: String,
    age_groups: Vec<String>,
    save_status_reset: Duration,
    write_timeout: Duration,
    withdrawn_reason_fallback: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        season = %config.default_season,
                        age_groups = config.age_groups.len(),
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse the JSON representation of the configuration file.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Season used when a request does not name one.
    pub fn default_season(&self) -> &str {
        &self.default_season
    }

    /// Age groups offered as input suggestions.
    pub fn age_groups(&self) -> &[String] {
        &self.age_groups
    }

    /// Delay before a `saved`/`error` status falls back to `idle`.
    pub fn save_status_reset(&self) -> Duration {
        self.save_status_reset
    }

    /// Upper bound for a single repository write.
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn roster_policy(&self) -> RosterPolicy {
        RosterPolicy {
            withdrawn_reason_fallback: self.withdrawn_reason_fallback.clone(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    default_season: Option<String>,
    age_groups: Option<Vec<String>>,
    save_status_reset_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
    withdrawn_reason_fallback: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        Self {
            default_season: non_blank(value.default_season).unwrap_or_else(current_season),
            age_groups: value.age_groups.unwrap_or_else(default_age_groups),
            save_status_reset: Duration::from_millis(
                value
                    .save_status_reset_ms
                    .unwrap_or(DEFAULT_SAVE_STATUS_RESET_MS),
            ),
            write_timeout: Duration::from_millis(
                value.write_timeout_ms.unwrap_or(DEFAULT_WRITE_TIMEOUT_MS),
            ),
            withdrawn_reason_fallback: non_blank(value.withdrawn_reason_fallback)
                .unwrap_or_else(|| DEFAULT_WITHDRAWN_REASON.into()),
        }
    }
}

/// Storage implementation selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Couch,
    Memory,
}

impl StorageBackend {
    /// Read [`STORAGE_BACKEND_ENV`], defaulting to MongoDB for unknown or missing values.
    pub fn from_env() -> Self {
        match env::var(STORAGE_BACKEND_ENV) {
            Ok(value) => Self::parse(&value).unwrap_or_else(|| {
                warn!(value = %value, "unknown storage backend; using mongo");
                StorageBackend::Mongo
            }),
            Err(_) => StorageBackend::Mongo,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Some(StorageBackend::Mongo),
            "couch" | "couchdb" => Some(StorageBackend::Couch),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn current_season() -> String {
    OffsetDateTime::now_utc().year().to_string()
}

/// Built-in age-group suggestions.
fn default_age_groups() -> Vec<String> {
    ["U11", "U13", "U15", "U17", "U19", "Open"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_overrides() {
        let config = AppConfig::from_json(
            r#"{
                "defaultSeason": "2025",
                "ageGroups": ["U12", "U14"],
                "saveStatusResetMs": 500,
                "writeTimeoutMs": 3000,
                "withdrawnReasonFallback": "Unavailable"
            }"#,
        )
        .unwrap();

        assert_eq!(config.default_season(), "2025");
        assert_eq!(config.age_groups(), ["U12", "U14"]);
        assert_eq!(config.save_status_reset(), Duration::from_millis(500));
        assert_eq!(config.write_timeout(), Duration::from_secs(3));
        assert_eq!(
            config.roster_policy().withdrawn_reason_fallback,
            "Unavailable"
        );
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = AppConfig::from_json(r#"{ "defaultSeason": "  " }"#).unwrap();

        assert_eq!(config.default_season(), current_season());
        assert_eq!(config.age_groups().len(), 6);
        assert_eq!(
            config.save_status_reset(),
            Duration::from_millis(DEFAULT_SAVE_STATUS_RESET_MS)
        );
        assert_eq!(
            config.roster_policy().withdrawn_reason_fallback,
            DEFAULT_WITHDRAWN_REASON
        );
    }

    #[test]
    fn storage_backend_names() {
        assert_eq!(StorageBackend::parse("Mongo"), Some(StorageBackend::Mongo));
        assert_eq!(StorageBackend::parse("couchdb"), Some(StorageBackend::Couch));
        assert_eq!(StorageBackend::parse(" memory "), Some(StorageBackend::Memory));
        assert_eq!(StorageBackend::parse("sqlite"), None);
    }
}
