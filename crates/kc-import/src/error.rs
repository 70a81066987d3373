//! Import error types.

use std::fmt;
use std::path::PathBuf;

use kc_storage::StorageError;
use thiserror::Error;

use crate::state::ImportState;

/// Step of a realm import, attached to failures for context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportStep {
    /// Reading the realm file.
    Read,
    /// Deleting the existing realm structure.
    Teardown,
    /// Deleting users the representation re-creates.
    PurgeDefaultUsers,
    /// Recreating the realm structure.
    Rebuild,
    /// Re-pointing user association rows.
    Remap,
    /// Deleting association rows that point nowhere.
    Sweep,
    /// Service accounts and authorization settings.
    Authorization,
    /// Importing user shards.
    Users,
}

impl ImportStep {
    /// Returns the step name used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Teardown => "teardown",
            Self::PurgeDefaultUsers => "purge default users",
            Self::Rebuild => "rebuild",
            Self::Remap => "remap",
            Self::Sweep => "sweep",
            Self::Authorization => "authorization",
            Self::Users => "users",
        }
    }
}

impl fmt::Display for ImportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while importing realms.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A user shard declares a different realm than the one being imported.
    #[error(
        "Trying to import users into invalid realm. Realm name: {expected}, found realm name: {found} in {}",
        .path.display()
    )]
    RealmMismatch {
        /// File that was read.
        path: PathBuf,
        /// Realm being imported.
        expected: String,
        /// Realm named by the file.
        found: String,
    },

    /// A realm file defines a realm other than the one its name announces.
    #[error(
        "Realm file {} defines realm {found}, expected {expected}",
        .path.display()
    )]
    RealmFileMismatch {
        /// Realm file that was read.
        path: PathBuf,
        /// Realm derived from the file name.
        expected: String,
        /// Realm named inside the file.
        found: String,
    },

    /// A file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File or directory that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A file is not a valid representation.
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A representation names a role, client, scope or group that does not
    /// exist.
    #[error("Unknown {kind} '{name}'")]
    UnknownReference {
        /// Kind of object referenced.
        kind: &'static str,
        /// Name or path used in the reference.
        name: String,
    },

    /// The representation cannot be turned into a realm structure.
    #[error("Invalid realm representation: {0}")]
    Rebuild(String),

    /// A script policy was uploaded outside of a context allowing it.
    #[error("Script policy '{policy}' of client '{client}' requires script upload to be enabled")]
    ScriptPolicyRejected {
        /// Client owning the authorization settings.
        client: String,
        /// Policy name.
        policy: String,
    },

    /// The realm does not exist.
    #[error("Realm '{0}' does not exist")]
    RealmNotFound(String),

    /// The import state machine was driven out of order.
    #[error("Invalid import state transition from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: ImportState,
        /// Requested state.
        to: ImportState,
    },

    /// A step of a realm import failed.
    #[error("Error during import realm {realm} ({step}): {source}")]
    Step {
        /// Realm being imported.
        realm: String,
        /// Failing step.
        step: ImportStep,
        /// Underlying error.
        source: Box<ImportError>,
    },
}

impl ImportError {
    /// Creates an unknown reference error.
    #[must_use]
    pub fn unknown(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownReference {
            kind,
            name: name.into(),
        }
    }

    /// Wraps an error with the realm and step it happened in.
    #[must_use]
    pub fn in_step(self, realm: impl Into<String>, step: ImportStep) -> Self {
        Self::Step {
            realm: realm.into(),
            step,
            source: Box::new(self),
        }
    }

    /// Returns the failing step, if the error carries one.
    #[must_use]
    pub const fn step(&self) -> Option<ImportStep> {
        match self {
            Self::Step { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Returns the innermost error, skipping step context.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Attaches realm and step context to fallible results.
pub trait StepContext<T> {
    /// Wraps the error, if any, with the realm and step it happened in.
    ///
    /// ## Errors
    ///
    /// Returns `ImportError::Step` wrapping the original error.
    fn in_step(self, realm: &str, step: ImportStep) -> ImportResult<T>;
}

impl<T, E> StepContext<T> for Result<T, E>
where
    E: Into<ImportError>,
{
    fn in_step(self, realm: &str, step: ImportStep) -> ImportResult<T> {
        self.map_err(|e| e.into().in_step(realm, step))
    }
}
