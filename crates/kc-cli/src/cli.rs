//! CLI argument parsing.

use std::path::PathBuf;

use clap::Parser;
use kc_import::config::{MapScope, keys};

use crate::config::OutputFormat;

/// Imports realm definitions into the identity store.
///
/// Existing realms are torn down and rebuilt; users keep their role and
/// group assignments across the rebuild.
#[derive(Debug, Parser)]
#[command(name = "kc-import")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `<realm>-realm.json` and user shard files.
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Import only this realm.
    #[arg(short, long)]
    pub realm: Option<String>,

    /// What to do with existing realms (IGNORE_EXISTING or
    /// OVERWRITE_EXISTING).
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Also import `<realm>-users-<n>.json` shards.
    #[arg(long)]
    pub with_users: bool,

    /// Name of the administrative realm, imported first.
    #[arg(long)]
    pub admin_realm: Option<String>,

    /// Database URL (overrides config).
    #[arg(long, env = "KC_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Configuration file.
    #[arg(short, long, env = "KC_IMPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Apply schema migrations before importing.
    #[arg(long)]
    pub migrate: bool,

    /// Summary format.
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Import settings given on the command line.
    #[must_use]
    pub fn overrides(&self) -> MapScope {
        let mut scope = MapScope::new();
        if let Some(dir) = &self.dir {
            scope.set(keys::DIR, dir.to_string_lossy());
        }
        if let Some(realm) = &self.realm {
            scope.set(keys::REALM_NAME, realm.as_str());
        }
        if let Some(strategy) = &self.strategy {
            scope.set(keys::STRATEGY, strategy.as_str());
        }
        if self.with_users {
            scope.set(keys::WITH_USERS, "true");
        }
        if let Some(admin) = &self.admin_realm {
            scope.set(keys::ADMIN_REALM, admin.as_str());
        }
        scope
    }
}
