//! CLI configuration file.
//!
//! ```toml
//! [import]
//! dir = "/opt/realms"
//! strategy = "OVERWRITE_EXISTING"
//! withUsers = true
//!
//! [database]
//! url = "postgres://localhost/keycloak"
//! max_connections = 4
//! ```

use std::path::Path;
use std::time::Duration;

use kc_import::MapScope;
use kc_storage_sql::PoolConfig;
use serde::Deserialize;

use crate::{CliError, CliResult};

/// CLI configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    /// Import settings, keyed like the importer's configuration keys.
    #[serde(default)]
    pub import: toml::Table,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL.
    pub url: Option<String>,
    /// Maximum pool size.
    pub max_connections: Option<u32>,
    /// Minimum pool size.
    pub min_connections: Option<u32>,
    /// Seconds to wait for a connection.
    pub acquire_timeout_secs: Option<u64>,
    /// Apply schema migrations before importing.
    #[serde(default)]
    pub migrate: bool,
}

impl CliConfig {
    /// Loads configuration from `path`, or defaults when no path is given.
    ///
    /// ## Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML.
    ///
    /// ## Errors
    ///
    /// Returns `CliError::Config` for invalid TOML.
    pub fn parse(content: &str) -> CliResult<Self> {
        toml::from_str(content)
            .map_err(|e| CliError::Config(format!("failed to parse config: {e}")))
    }

    /// Import settings as a configuration scope.
    ///
    /// ## Errors
    ///
    /// Returns `CliError::Config` for values that are not strings, booleans
    /// or integers.
    pub fn import_scope(&self) -> CliResult<MapScope> {
        let mut scope = MapScope::new();
        for (key, value) in &self.import {
            let value = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Integer(i) => i.to_string(),
                other => {
                    return Err(CliError::Config(format!(
                        "import.{key} must be a scalar value, got {}",
                        other.type_str()
                    )));
                }
            };
            scope.set(key.as_str(), value);
        }
        Ok(scope)
    }

    /// Pool settings for `url`.
    #[must_use]
    pub fn pool_config(&self, url: &str) -> PoolConfig {
        let mut pool = PoolConfig::new(url);
        if let Some(max) = self.database.max_connections {
            pool = pool.max_connections(max);
        }
        if let Some(min) = self.database.min_connections {
            pool = pool.min_connections(min);
        }
        if let Some(secs) = self.database.acquire_timeout_secs {
            pool = pool.acquire_timeout(Duration::from_secs(secs));
        }
        pool
    }
}

/// Summary format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON.
    Json,
}
