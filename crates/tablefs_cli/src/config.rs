//! Application configuration

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tablefs_db::{AdapterOptions, DEFAULT_TABLE};
use tablefs_log::LogOptions;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file; defaults to `tablefs.db` in the data directory
    pub path: Option<PathBuf>,
    pub table: String,
    /// Root prefix applied to every path
    pub prefix: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            table: DEFAULT_TABLE.to_string(),
            prefix: String::new(),
            pool_size: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Also write JSON logs to the log directory
    pub to_file: bool,
    /// Days to keep rolled log files
    pub retain_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            to_file: false,
            retain_days: 7,
        }
    }
}

impl AppConfig {
    /// Configuration file that `load` would read: `path` or the default
    /// location, if it exists
    pub fn source(path: Option<&Path>) -> Option<PathBuf> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        config_path.exists().then_some(config_path)
    }

    /// Load configuration from `path`, or from the default location
    ///
    /// A missing file means defaults. Runs before logging is set up, so
    /// callers report the source themselves.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match Self::source(path) {
            Some(config_path) => {
                let content = std::fs::read_to_string(&config_path)?;
                Ok(toml::from_str(&content)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, self.to_toml()?)?;

        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the default configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("dev", "tablefs", "tablefs")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| tablefs_db::db_dir().join("tablefs.db"))
    }

    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions::default()
            .with_table(self.database.table.clone())
            .with_prefix(self.database.prefix.clone())
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            level: self.logging.level.clone(),
            file_dir: self.logging.to_file.then(tablefs_log::log_dir),
        }
    }
}
