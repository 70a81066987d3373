//! Import configuration.
//!
//! Settings are looked up by key across an ordered list of
//! [`ConfigScope`]s; the first scope holding a key wins. Callers put
//! process-level overrides (command line flags, environment) ahead of the
//! scoped configuration file.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use kc_model::realm::DEFAULT_ADMIN_REALM;

use crate::error::{ImportError, ImportResult};

/// Configuration keys.
pub mod keys {
    /// Import strategy.
    pub const STRATEGY: &str = "strategy";
    /// Single realm to import.
    pub const REALM_NAME: &str = "realmName";
    /// Directory holding realm and user files.
    pub const DIR: &str = "dir";
    /// Whether user shards are imported.
    pub const WITH_USERS: &str = "withUsers";
    /// Name of the administrative realm.
    pub const ADMIN_REALM: &str = "adminRealm";

    /// Every key understood by the importer.
    pub const ALL: [&str; 5] = [STRATEGY, REALM_NAME, DIR, WITH_USERS, ADMIN_REALM];
}

/// Prefix of environment variables read by [`EnvScope`].
pub const ENV_PREFIX: &str = "KC_MIGRATION_";

/// A source of string configuration values.
pub trait ConfigScope: Send + Sync {
    /// Gets a string configuration value.
    fn get(&self, key: &str) -> Option<&str>;

    /// Gets a boolean configuration value.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(|v| v.trim().to_ascii_lowercase().parse().ok())
            .unwrap_or(default)
    }
}

/// Configuration held in memory.
#[derive(Debug, Clone, Default)]
pub struct MapScope {
    values: HashMap<String, String>,
}

impl MapScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Number of values held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Checks if no value is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapScope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigScope for MapScope {
    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Configuration taken from `KC_MIGRATION_*` environment variables.
///
/// `KC_MIGRATION_REALM_NAME` maps to `realmName`, `KC_MIGRATION_WITH_USERS`
/// to `withUsers`, and so on.
#[derive(Debug, Clone, Default)]
pub struct EnvScope {
    inner: MapScope,
}

impl EnvScope {
    /// Reads the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Builds the scope from explicit variables.
    #[must_use]
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let inner = vars
            .into_iter()
            .filter_map(|(name, value)| {
                env_key(name.as_ref()).map(|key| (key.to_string(), value.into()))
            })
            .collect();
        Self { inner }
    }
}

impl ConfigScope for EnvScope {
    fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key)
    }
}

/// Maps an environment variable name to its configuration key.
fn env_key(var: &str) -> Option<&'static str> {
    let suffix = var.strip_prefix(ENV_PREFIX)?;
    keys::ALL
        .into_iter()
        .find(|key| env_suffix(key) == suffix)
}

/// `realmName` becomes `REALM_NAME`.
fn env_suffix(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

/// What to do with a realm that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Leave existing realms untouched.
    IgnoreExisting,
    /// Tear existing realms down and rebuild them.
    #[default]
    OverwriteExisting,
}

impl FromStr for Strategy {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "IGNORE_EXISTING" => Ok(Self::IgnoreExisting),
            "OVERWRITE_EXISTING" => Ok(Self::OverwriteExisting),
            _ => Err(ImportError::Config(format!(
                "Unknown import strategy '{s}', expected IGNORE_EXISTING or OVERWRITE_EXISTING"
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IgnoreExisting => f.write_str("IGNORE_EXISTING"),
            Self::OverwriteExisting => f.write_str("OVERWRITE_EXISTING"),
        }
    }
}

/// Resolved import configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Strategy for realms that already exist.
    pub strategy: Strategy,
    /// Import only this realm.
    pub realm_name: Option<String>,
    /// Directory holding the realm files.
    pub dir: PathBuf,
    /// Whether user shards are imported.
    pub with_users: bool,
    /// Name of the administrative realm, imported first.
    pub admin_realm: String,
}

impl ImportConfig {
    /// Creates a configuration with defaults for everything but the
    /// directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            strategy: Strategy::default(),
            realm_name: None,
            dir: dir.into(),
            with_users: false,
            admin_realm: DEFAULT_ADMIN_REALM.to_string(),
        }
    }

    /// Sets the strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Restricts the import to one realm.
    #[must_use]
    pub fn with_realm_name(mut self, realm: impl Into<String>) -> Self {
        self.realm_name = Some(realm.into());
        self
    }

    /// Enables user shard import.
    #[must_use]
    pub const fn with_users(mut self, with_users: bool) -> Self {
        self.with_users = with_users;
        self
    }

    /// Sets the administrative realm name.
    #[must_use]
    pub fn with_admin_realm(mut self, realm: impl Into<String>) -> Self {
        self.admin_realm = realm.into();
        self
    }

    /// Resolves the configuration from `layers`, highest precedence first.
    ///
    /// ## Errors
    ///
    /// Returns `ImportError::Config` if `dir` is missing or the strategy is
    /// not recognized.
    pub fn resolve(layers: &[&dyn ConfigScope]) -> ImportResult<Self> {
        let lookup = |key: &str| {
            layers
                .iter()
                .find_map(|scope| scope.get(key))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let dir = lookup(keys::DIR).ok_or_else(|| {
            ImportError::Config(format!("'{}' is required", keys::DIR))
        })?;
        let strategy = lookup(keys::STRATEGY)
            .map(str::parse::<Strategy>)
            .transpose()?
            .unwrap_or_default();
        let with_users = layers
            .iter()
            .find(|scope| scope.get(keys::WITH_USERS).is_some())
            .is_some_and(|scope| scope.get_bool(keys::WITH_USERS, false));

        Ok(Self {
            strategy,
            realm_name: lookup(keys::REALM_NAME).map(str::to_string),
            dir: PathBuf::from(dir),
            with_users,
            admin_realm: lookup(keys::ADMIN_REALM)
                .unwrap_or(DEFAULT_ADMIN_REALM)
                .to_string(),
        })
    }
}
