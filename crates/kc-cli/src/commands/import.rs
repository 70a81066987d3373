//! Import command implementation.

use std::sync::Arc;

use kc_import::{EnvScope, ImportConfig, ImportSummary, RealmImporter};
use kc_storage_sql::{PgStore, create_pool, migrate};

use crate::cli::Cli;
use crate::config::CliConfig;
use crate::output::{info, print_summary, warning};
use crate::{CliError, CliResult};

/// Resolves import settings: command line flags first, then `KC_MIGRATION_*`
/// environment variables, then the configuration file.
///
/// ## Errors
///
/// Returns an error if a required setting is missing or invalid.
pub fn resolve_import_config(
    cli: &Cli,
    config: &CliConfig,
    env: &EnvScope,
) -> CliResult<ImportConfig> {
    let overrides = cli.overrides();
    let file = config.import_scope()?;
    Ok(ImportConfig::resolve(&[&overrides, env, &file])?)
}

/// Runs the import command.
///
/// ## Errors
///
/// Returns an error if setup fails or any realm fails to import.
pub async fn run_import(cli: &Cli) -> CliResult<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let import_config = resolve_import_config(cli, &config, &EnvScope::from_env())?;

    let url = cli
        .database_url
        .clone()
        .or_else(|| config.database.url.clone())
        .ok_or_else(|| CliError::Config("database URL is required".to_string()))?;
    let pool = create_pool(&config.pool_config(&url)).await?;
    if cli.migrate || config.database.migrate {
        migrate(&pool).await?;
    }

    let importer = RealmImporter::new(import_config, Arc::new(PgStore::new(pool)))?;
    let realms = importer.realms_to_import();
    if realms.is_empty() {
        warning(&format!(
            "No realm files found in '{}'",
            importer.source().root().display()
        ));
        return Ok(());
    }
    if importer.contains_admin_realm() {
        info(&format!(
            "Administrative realm '{}' found, importing it first",
            importer.config().admin_realm
        ));
    }
    info(&format!(
        "Importing {} realm(s) from '{}' ({})",
        realms.len(),
        importer.source().root().display(),
        importer.config().strategy
    ));

    let summary = importer.import_all().await;
    print_summary(&summary, cli.output)?;
    check_summary(&summary)
}

fn check_summary(summary: &ImportSummary) -> CliResult<()> {
    let failed = summary.failed().count();
    if failed > 0 {
        return Err(CliError::RealmsFailed {
            failed,
            total: summary.results.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use kc_import::Strategy;

    use super::*;

    #[test]
    fn flags_override_environment_and_file() {
        let cli = Cli::parse_from(["kc-import", "--strategy", "ignore-existing"]);
        let config = CliConfig::parse(
            "[import]\ndir = \"/from-file\"\nstrategy = \"OVERWRITE_EXISTING\"\n",
        )
        .unwrap();
        let env = EnvScope::from_vars([("KC_MIGRATION_DIR", "/from-env")]);

        let resolved = resolve_import_config(&cli, &config, &env).unwrap();

        assert_eq!(resolved.dir, std::path::PathBuf::from("/from-env"));
        assert_eq!(resolved.strategy, Strategy::IgnoreExisting);
    }

    #[test]
    fn missing_dir_is_reported() {
        let cli = Cli::parse_from(["kc-import"]);
        let err = resolve_import_config(&cli, &CliConfig::default(), &EnvScope::default())
            .unwrap_err();
        assert!(matches!(err, CliError::Import(_)));
    }

    #[test]
    fn empty_summary_is_success() {
        assert!(check_summary(&ImportSummary::default()).is_ok());
    }
}
