//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.sql-review.toml` in current directory
//! 4. `~/.config/sql-review/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [review]
//! charset = "utf8mb4"
//! collation = "utf8mb4_general_ci"
//! query_timeout_ms = 5000      # bound for each EXPLAIN issued by dynamic checks
//!
//! [database]
//! url = "mysql://reviewer@localhost:3306/app"   # or SQL_REVIEW_DATABASE_URL
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SQL_REVIEW_DATABASE_URL` | Live database for dynamic checks |
//! | `SQL_REVIEW_CHARSET` | Script charset |
//! | `SQL_REVIEW_COLLATION` | Script collation |
//! | `SQL_REVIEW_QUERY_TIMEOUT_MS` | Diagnostic query timeout |

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration
};

use serde::Deserialize;

use crate::error::{AppResult, config_error};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub review:   ReviewConfig,
    #[serde(default)]
    pub database: DatabaseConfig
}

/// Review defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub charset:          String,
    pub collation:        String,
    pub query_timeout_ms: Option<u64>
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            charset:          String::from("utf8mb4"),
            collation:        String::from("utf8mb4_general_ci"),
            query_timeout_ms: None
        }
    }
}

impl ReviewConfig {
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }
}

/// Live database used by dynamic checks
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file in current directory (.sql-review.toml)
    /// 3. Config file in home directory (~/.config/sql-review/config.toml)
    /// 4. Default values
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(home) = env::var_os("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sql-review")
                .join("config.toml");
            if home_config.exists() {
                config = Self::from_file(&home_config)?;
            }
        }

        // local file replaces the home file entirely
        let local_config = PathBuf::from(".sql-review.toml");
        if local_config.exists() {
            config = Self::from_file(&local_config)?;
        }

        config.apply_env(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| config_error(format!("Failed to read config file: {}", e)))?;
        toml::from_str(&content).map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    /// Override values from environment variables
    pub fn apply_env<F>(&mut self, var: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>
    {
        if let Some(url) = var("SQL_REVIEW_DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(charset) = var("SQL_REVIEW_CHARSET") {
            self.review.charset = charset;
        }
        if let Some(collation) = var("SQL_REVIEW_COLLATION") {
            self.review.collation = collation;
        }
        if let Some(timeout) = var("SQL_REVIEW_QUERY_TIMEOUT_MS") {
            let millis = timeout.trim().parse().map_err(|_| {
                config_error(format!(
                    "SQL_REVIEW_QUERY_TIMEOUT_MS must be a number of milliseconds, got '{}'",
                    timeout
                ))
            })?;
            self.review.query_timeout_ms = Some(millis);
        }
        Ok(())
    }
}
