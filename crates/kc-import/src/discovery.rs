//! Realm file discovery and ordering.

use std::path::Path;

use tracing::warn;

/// Suffix of realm definition files.
pub const REALM_FILE_SUFFIX: &str = "-realm.json";

/// Extracts the realm name from a `<realm>-realm.json` file name.
#[must_use]
pub fn realm_name_from_file(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(REALM_FILE_SUFFIX)
        .filter(|name| !name.is_empty())
}

/// Lists the realms defined in `dir`, administrative realm first.
///
/// An unreadable directory yields no realms.
#[must_use]
pub fn discover_realms(dir: &Path, admin_realm: &str) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Cannot list import directory");
            return Vec::new();
        }
    };

    let names = entries.filter_map(Result::ok).filter_map(|entry| {
        let file_name = entry.file_name();
        file_name
            .to_str()
            .and_then(realm_name_from_file)
            .map(str::to_string)
    });
    order_realms(names, admin_realm)
}

/// Moves the administrative realm to the front, keeping the relative
/// order of the others.
#[must_use]
pub fn order_realms<I>(names: I, admin_realm: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let (admin, mut others): (Vec<_>, Vec<_>) =
        names.into_iter().partition(|name| name == admin_realm);
    if admin.is_empty() {
        return others;
    }
    others.insert(0, admin_realm.to_string());
    others
}

/// Checks whether `dir` defines the administrative realm.
#[must_use]
pub fn contains_admin_realm(dir: &Path, admin_realm: &str) -> bool {
    dir.join(format!("{admin_realm}{REALM_FILE_SUFFIX}")).is_file()
}

/// Returns the shard index of a `<realm>-users-<n>.json` file name.
#[must_use]
pub fn shard_index(file_name: &str, realm: &str) -> Option<u64> {
    let digits = file_name
        .strip_prefix(realm)?
        .strip_prefix("-users-")?
        .strip_suffix(".json")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn admin_realm_goes_first() {
        let ordered = order_realms(names(&["b", "master", "a"]), "master");
        assert_eq!(ordered, names(&["master", "b", "a"]));
    }

    #[test]
    fn ordering_without_admin_realm_is_unchanged() {
        let ordered = order_realms(names(&["b", "a"]), "master");
        assert_eq!(ordered, names(&["b", "a"]));
    }

    #[test]
    fn realm_file_names() {
        assert_eq!(realm_name_from_file("acme-realm.json"), Some("acme"));
        assert_eq!(realm_name_from_file("-realm.json"), None);
        assert_eq!(realm_name_from_file("acme-users-0.json"), None);
        assert_eq!(realm_name_from_file("acme-realm.json.bak"), None);
    }

    #[test]
    fn shard_names() {
        assert_eq!(shard_index("acme-users-0.json", "acme"), Some(0));
        assert_eq!(shard_index("acme-users-12.json", "acme"), Some(12));
        assert_eq!(shard_index("acme-users-.json", "acme"), None);
        assert_eq!(shard_index("acme-users-1a.json", "acme"), None);
        assert_eq!(shard_index("acme-realm.json", "acme"), None);
        assert_eq!(shard_index("acme2-users-0.json", "acme"), None);
    }

    #[test]
    fn discovers_realm_files() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["acme-realm.json", "master-realm.json", "acme-users-0.json", "notes.txt"] {
            std::fs::write(dir.path().join(file), "{}").unwrap();
        }

        let realms = discover_realms(dir.path(), "master");

        assert_eq!(realms.len(), 2);
        assert_eq!(realms[0], "master");
        assert!(realms.contains(&"acme".to_string()));
        assert!(contains_admin_realm(dir.path(), "master"));
        assert!(!contains_admin_realm(dir.path(), "root"));
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_realms(&dir.path().join("absent"), "master").is_empty());
    }
}
