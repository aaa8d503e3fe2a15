//! Configuration loading
//!
//! Sources are applied in order, later wins:
//! 1. Compiled defaults
//! 2. `~/.parkify/config.toml`
//! 3. An explicit path (the CLI `--config` flag)
//! 4. Environment variables (`PARKIFY_DB`, `PARKIFY_AUDIT_LOG`, `PARKIFY_EXPORT`)
//!
//! ```toml
//! [paths]
//! database = "~/.parkify/parking.db"
//! audit_log = "~/.parkify/parking_log.txt"
//! export = "parking_data.csv"
//!
//! [tariff]
//! hourly_rate = 20
//! minimum_fee = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::tariff::Tariff;

pub const ENV_DATABASE: &str = "PARKIFY_DB";
pub const ENV_AUDIT_LOG: &str = "PARKIFY_AUDIT_LOG";
pub const ENV_EXPORT: &str = "PARKIFY_EXPORT";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// File locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// SQLite database holding active sessions
    pub database: PathBuf,
    /// Append-only operation log
    pub audit_log: PathBuf,
    /// Default CSV export destination
    pub export: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home = parkify_home();
        Self {
            database: home.join("parking.db"),
            audit_log: home.join("parking_log.txt"),
            export: PathBuf::from("parking_data.csv"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkifyConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tariff: Tariff,
}

impl ParkifyConfig {
    /// Load from the user config file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load, letting `config_path` override the user config file.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut files = Vec::new();
        let user = parkify_home().join("config.toml");
        if user.exists() {
            files.push(user);
        }
        if let Some(path) = config_path {
            // An explicitly requested file must exist.
            files.push(path.to_path_buf());
        }

        let mut config = Self::from_files(&files)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Merge the given TOML files over the defaults.
    pub fn from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut merged = toml::Table::new();

        for path in files {
            let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
                path: path.clone(),
                source: e,
            })?;
            let table: toml::Table =
                contents
                    .parse()
                    .map_err(|e: toml::de::Error| ConfigError::Parse {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
            tracing::debug!("Loaded config file {}", path.display());
            merge_tables(&mut merged, table);
        }

        let mut config: ParkifyConfig =
            toml::Value::Table(merged)
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::Parse {
                    path: files.last().cloned().unwrap_or_default(),
                    message: e.to_string(),
                })?;

        config.paths.database = expand_home(&config.paths.database);
        config.paths.audit_log = expand_home(&config.paths.audit_log);
        config.paths.export = expand_home(&config.paths.export);
        Ok(config)
    }

    /// Apply `PARKIFY_*` overrides from `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets = [
            (ENV_DATABASE, &mut self.paths.database),
            (ENV_AUDIT_LOG, &mut self.paths.audit_log),
            (ENV_EXPORT, &mut self.paths.export),
        ];

        for (key, target) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                tracing::debug!("{} overrides config", key);
                *target = expand_home(Path::new(&value));
            }
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let body = toml::to_string_pretty(self)?;
        Ok(format!("# Parkify Configuration\n\n{}", body))
    }
}

/// `~/.parkify`, or `.parkify` when no home directory is known.
pub fn parkify_home() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".parkify"))
        .unwrap_or_else(|| PathBuf::from(".parkify"))
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}
