//! Server configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! YAML file named by `CHORE_TRACKER_CONFIG`, and environment variables.
//!
//! | Env Var                           | Default                       |
//! |-----------------------------------|-------------------------------|
//! | `CHORE_TRACKER_DATA_DIR`          | `~/Documents/Chore Tracker`   |
//! | `CHORE_TRACKER_BIND`              | `127.0.0.1:3000`              |
//! | `CHORE_TRACKER_CORS_ORIGIN`       | `http://localhost:8080`       |
//! | `CHORE_TRACKER_SESSION_TTL_HOURS` | `24`                          |
//! | `CHORE_TRACKER_MAX_PICTURE_BYTES` | `5242880`                     |

use anyhow::{anyhow, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILE_ENV: &str = "CHORE_TRACKER_CONFIG";
const DATA_DIR_ENV: &str = "CHORE_TRACKER_DATA_DIR";
const BIND_ENV: &str = "CHORE_TRACKER_BIND";
const CORS_ORIGIN_ENV: &str = "CHORE_TRACKER_CORS_ORIGIN";
const SESSION_TTL_ENV: &str = "CHORE_TRACKER_SESSION_TTL_HOURS";
const MAX_PICTURE_BYTES_ENV: &str = "CHORE_TRACKER_MAX_PICTURE_BYTES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of all stored documents
    pub data_directory: PathBuf,
    /// Socket address the HTTP server listens on
    pub bind_address: String,
    /// Origin allowed to call the API from a browser
    pub cors_origin: String,
    pub session_ttl_hours: i64,
    pub max_picture_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            bind_address: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:8080".to_string(),
            session_ttl_hours: 24,
            max_picture_bytes: 5 * 1024 * 1024,
        }
    }
}

/// `~/Documents/Chore Tracker`, or `./data` when no home directory is known
fn default_data_directory() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .map(|documents| documents.join("Chore Tracker"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow!("{} has an invalid value '{}': {}", name, value, e))
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        let config_file = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
        Self::from_sources(config_file.as_deref(), |name| std::env::var(name).ok())
    }

    /// Build configuration from an optional YAML file and an environment lookup
    pub fn from_sources<F>(config_file: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_file {
            Some(path) => {
                let yaml = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                info!("Loaded configuration from {}", path.display());
                serde_yaml::from_str(&yaml)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            None => AppConfig::default(),
        };

        if let Some(dir) = env(DATA_DIR_ENV) {
            config.data_directory = PathBuf::from(dir);
        }
        if let Some(bind) = env(BIND_ENV) {
            config.bind_address = bind;
        }
        if let Some(origin) = env(CORS_ORIGIN_ENV) {
            config.cors_origin = origin;
        }
        if let Some(hours) = env(SESSION_TTL_ENV) {
            config.session_ttl_hours = parse_env(SESSION_TTL_ENV, &hours)?;
        }
        if let Some(bytes) = env(MAX_PICTURE_BYTES_ENV) {
            config.max_picture_bytes = parse_env(MAX_PICTURE_BYTES_ENV, &bytes)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.session_ttl_hours <= 0 {
            return Err(anyhow!("Session TTL must be at least one hour"));
        }
        if self.max_picture_bytes == 0 {
            return Err(anyhow!("Maximum picture size must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_sources(None, env_from(&[])).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.session_ttl_hours, 24);
        assert!(config.data_directory.ends_with("Chore Tracker") || config.data_directory.ends_with("data"));
    }

    #[test]
    fn test_file_then_env_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "data_directory: /srv/chores\nsession_ttl_hours: 8\n").unwrap();

        let config = AppConfig::from_sources(
            Some(&path),
            env_from(&[(BIND_ENV, "0.0.0.0:8000"), (SESSION_TTL_ENV, "12")]),
        )
        .unwrap();

        assert_eq!(config.data_directory, PathBuf::from("/srv/chores"));
        assert_eq!(config.bind_address, "0.0.0.0:8000");
        assert_eq!(config.session_ttl_hours, 12);
        assert_eq!(config.max_picture_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(AppConfig::from_sources(None, env_from(&[(SESSION_TTL_ENV, "soon")])).is_err());
        assert!(AppConfig::from_sources(None, env_from(&[(SESSION_TTL_ENV, "0")])).is_err());
        assert!(AppConfig::from_sources(None, env_from(&[(MAX_PICTURE_BYTES_ENV, "-1")])).is_err());
        assert!(AppConfig::from_sources(Some(Path::new("/nonexistent/config.yaml")), env_from(&[])).is_err());
    }
}
