//! Output formatting utilities.

use colored::Colorize;
use kc_import::{ImportSummary, RealmResult};
use serde_json::{Value, json};

use crate::config::OutputFormat;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Prints the result of every realm.
///
/// ## Errors
///
/// Returns an error if the summary cannot be serialized.
pub fn print_summary(summary: &ImportSummary, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Text => {
            for (realm, result) in &summary.results {
                match result {
                    RealmResult::Imported(report) => {
                        let mut line = format!("Realm '{realm}' imported");
                        if report.existed {
                            line.push_str(&format!(
                                ": {} role(s) and {} group(s) remapped, {} row(s) re-pointed, {} orphan(s) removed",
                                report.roles.objects,
                                report.groups.objects,
                                report.roles.rows + report.groups.rows,
                                report.swept.role_mappings + report.swept.group_memberships
                            ));
                        }
                        if let Some(users) = &report.users {
                            line.push_str(&format!(
                                " (users: {} created, {} skipped)",
                                users.created, users.skipped
                            ));
                        }
                        success(&line);
                    }
                    RealmResult::Skipped { users } => {
                        let mut line = format!("Realm '{realm}' already exists, skipped");
                        if let Some(users) = users {
                            line.push_str(&format!(
                                " (users: {} created, {} skipped)",
                                users.created, users.skipped
                            ));
                        }
                        info(&line);
                    }
                    RealmResult::Failed(e) => error(&format!("Realm '{realm}': {e}")),
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary_json(summary)?)?);
        }
    }
    Ok(())
}

/// Builds the JSON form of a summary.
///
/// ## Errors
///
/// Returns an error if a report cannot be serialized.
pub fn summary_json(summary: &ImportSummary) -> crate::CliResult<Value> {
    let mut realms = Vec::with_capacity(summary.results.len());
    for (realm, result) in &summary.results {
        let entry = match result {
            RealmResult::Imported(report) => json!({
                "realm": realm,
                "status": "imported",
                "report": serde_json::to_value(report)?,
            }),
            RealmResult::Skipped { users } => json!({
                "realm": realm,
                "status": "skipped",
                "users": serde_json::to_value(users)?,
            }),
            RealmResult::Failed(e) => json!({
                "realm": realm,
                "status": "failed",
                "error": e.to_string(),
            }),
        };
        realms.push(entry);
    }
    Ok(json!({ "realms": realms }))
}

#[cfg(test)]
mod tests {
    use kc_import::users::UserImportReport;
    use kc_import::{ImportError, ImportReport};

    use super::*;

    #[test]
    fn json_summary_lists_every_realm() {
        let summary = ImportSummary {
            results: vec![
                (
                    "master".to_string(),
                    RealmResult::Imported(Box::new(ImportReport {
                        realm: "master".to_string(),
                        existed: true,
                        ..ImportReport::default()
                    })),
                ),
                (
                    "acme".to_string(),
                    RealmResult::Skipped {
                        users: Some(UserImportReport {
                            shards: 1,
                            created: 2,
                            skipped: 0,
                        }),
                    },
                ),
                (
                    "broken".to_string(),
                    RealmResult::Failed(ImportError::Rebuild("bad".to_string())),
                ),
            ],
        };

        let value = summary_json(&summary).unwrap();
        let realms = value["realms"].as_array().unwrap();

        assert_eq!(realms.len(), 3);
        assert_eq!(realms[0]["status"], "imported");
        assert_eq!(realms[0]["report"]["existed"], true);
        assert_eq!(realms[1]["status"], "skipped");
        assert_eq!(realms[1]["users"]["created"], 2);
        assert_eq!(realms[2]["status"], "failed");
        assert!(realms[2]["error"].as_str().unwrap().contains("bad"));
    }
}
