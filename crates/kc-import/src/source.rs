//! Reading realm and user files from the import directory.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::discovery::{self, REALM_FILE_SUFFIX};
use crate::error::{ImportError, ImportResult};
use crate::representation::{RealmRepresentation, UsersShard};

/// The directory realm and user files are read from.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Opens an import directory.
    ///
    /// ## Errors
    ///
    /// Returns `ImportError::Config` if `root` is not an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> ImportResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ImportError::Config(format!(
                "Directory {} doesn't exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// The import directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the definition file of `realm`.
    #[must_use]
    pub fn realm_file(&self, realm: &str) -> PathBuf {
        self.root.join(format!("{realm}{REALM_FILE_SUFFIX}"))
    }

    /// Lists the realms in the directory, administrative realm first.
    #[must_use]
    pub fn realm_names(&self, admin_realm: &str) -> Vec<String> {
        discovery::discover_realms(&self.root, admin_realm)
    }

    /// Checks whether the directory defines the administrative realm.
    #[must_use]
    pub fn contains_admin_realm(&self, admin_realm: &str) -> bool {
        discovery::contains_admin_realm(&self.root, admin_realm)
    }

    /// Reads the definition of `realm`.
    ///
    /// ## Errors
    ///
    /// Returns `ImportError::Io` or `ImportError::Parse` for unreadable
    /// files and `ImportError::RealmFileMismatch` if the file defines
    /// another realm.
    pub fn read_realm(&self, realm: &str) -> ImportResult<RealmRepresentation> {
        let path = self.realm_file(realm);
        let rep: RealmRepresentation = read_json(&path)?;
        if rep.realm != realm {
            return Err(ImportError::RealmFileMismatch {
                path,
                expected: realm.to_string(),
                found: rep.realm,
            });
        }
        Ok(rep)
    }

    /// Lists the user shard files of `realm` in ascending shard order.
    ///
    /// ## Errors
    ///
    /// Returns `ImportError::Io` if the directory cannot be listed.
    pub fn user_shards(&self, realm: &str) -> ImportResult<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.root).map_err(|source| ImportError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut shards: Vec<(u64, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let index = entry
                    .file_name()
                    .to_str()
                    .and_then(|name| discovery::shard_index(name, realm))?;
                Some((index, entry.path()))
            })
            .collect();
        shards.sort_by_key(|(index, _)| *index);
        debug!(realm, count = shards.len(), "Found user shards");

        Ok(shards.into_iter().map(|(_, path)| path).collect())
    }

    /// Reads a user shard and checks it belongs to `realm`.
    ///
    /// ## Errors
    ///
    /// Returns `ImportError::RealmMismatch` if the shard names another
    /// realm, before any of its users is looked at.
    pub fn read_user_shard(&self, path: &Path, realm: &str) -> ImportResult<UsersShard> {
        let shard: UsersShard = read_json(path)?;
        if shard.realm != realm {
            return Err(ImportError::RealmMismatch {
                path: path.to_path_buf(),
                expected: realm.to_string(),
                found: shard.realm,
            });
        }
        Ok(shard)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ImportResult<T> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ImportError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
