//! Per-realm import state machine.

use std::fmt;

use serde::Serialize;

use crate::error::{ImportError, ImportResult};

/// Progress of a single realm import.
///
/// ```text
/// NotStarted -> TornDown -> Rebuilt -> Remapped -> Swept -> AuthorizationConfigured
/// NotStarted -> Rebuilt -> AuthorizationConfigured      (realm did not exist)
/// NotStarted -> SkippedExisting                         (IgnoreExisting strategy)
/// SkippedExisting -> UsersImported -> Done
/// AuthorizationConfigured -> UsersImported -> Done
/// AuthorizationConfigured -> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ImportState {
    /// Nothing has happened yet.
    NotStarted,
    /// The existing structure was deleted.
    TornDown,
    /// The structure was recreated.
    Rebuilt,
    /// User association rows were re-pointed.
    Remapped,
    /// Rows pointing nowhere were deleted.
    Swept,
    /// Service accounts and authorization settings are in place.
    AuthorizationConfigured,
    /// User shards were imported.
    UsersImported,
    /// The import finished.
    Done,
    /// The realm already existed and was left alone.
    SkippedExisting,
}

impl ImportState {
    /// Checks whether `next` may follow this state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::NotStarted,
                Self::TornDown | Self::Rebuilt | Self::SkippedExisting
            ) | (Self::TornDown, Self::Rebuilt)
                | (Self::Rebuilt, Self::Remapped | Self::AuthorizationConfigured)
                | (Self::Remapped, Self::Swept)
                | (Self::Swept, Self::AuthorizationConfigured)
                | (
                    Self::AuthorizationConfigured,
                    Self::UsersImported | Self::Done
                )
                | (Self::SkippedExisting, Self::UsersImported)
                | (Self::UsersImported, Self::Done)
        )
    }

    /// Checks whether an import may end in this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::SkippedExisting)
    }
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::TornDown => "torn down",
            Self::Rebuilt => "rebuilt",
            Self::Remapped => "remapped",
            Self::Swept => "swept",
            Self::AuthorizationConfigured => "authorization configured",
            Self::UsersImported => "users imported",
            Self::Done => "done",
            Self::SkippedExisting => "skipped existing",
        };
        f.write_str(name)
    }
}

/// Tracks the states a realm import went through.
#[derive(Debug, Clone)]
pub struct RealmProgress {
    history: Vec<ImportState>,
}

impl RealmProgress {
    /// Starts tracking a realm import.
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: vec![ImportState::NotStarted],
        }
    }

    /// Current state.
    #[must_use]
    pub fn current(&self) -> ImportState {
        self.history
            .last()
            .copied()
            .unwrap_or(ImportState::NotStarted)
    }

    /// Moves to `next`.
    ///
    /// ## Errors
    ///
    /// Returns `ImportError::InvalidTransition` if `next` may not follow the
    /// current state.
    pub fn advance(&mut self, next: ImportState) -> ImportResult<()> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(ImportError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        self.history.push(next);
        Ok(())
    }

    /// Every state visited so far, in order.
    #[must_use]
    pub fn history(&self) -> &[ImportState] {
        &self.history
    }

    /// Consumes the tracker, returning its history.
    #[must_use]
    pub fn into_history(self) -> Vec<ImportState> {
        self.history
    }
}

impl Default for RealmProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reimport_path_is_valid() {
        let mut progress = RealmProgress::new();
        for state in [
            ImportState::TornDown,
            ImportState::Rebuilt,
            ImportState::Remapped,
            ImportState::Swept,
            ImportState::AuthorizationConfigured,
            ImportState::UsersImported,
            ImportState::Done,
        ] {
            progress.advance(state).unwrap();
        }

        assert_eq!(progress.current(), ImportState::Done);
        assert_eq!(progress.history().len(), 8);
    }

    #[test]
    fn new_realm_skips_remap() {
        let mut progress = RealmProgress::new();
        progress.advance(ImportState::Rebuilt).unwrap();
        progress.advance(ImportState::AuthorizationConfigured).unwrap();
        progress.advance(ImportState::Done).unwrap();

        assert!(progress.current().is_terminal());
    }

    #[test]
    fn out_of_order_transition_is_rejected() {
        let mut progress = RealmProgress::new();
        progress.advance(ImportState::TornDown).unwrap();

        let err = progress.advance(ImportState::Swept).unwrap_err();
        assert!(matches!(
            err,
            ImportError::InvalidTransition {
                from: ImportState::TornDown,
                to: ImportState::Swept
            }
        ));
        assert_eq!(progress.current(), ImportState::TornDown);
    }

    #[test]
    fn skipped_realm_cannot_continue() {
        assert!(ImportState::NotStarted.can_transition_to(ImportState::SkippedExisting));
        assert!(!ImportState::SkippedExisting.can_transition_to(ImportState::Rebuilt));
        assert!(!ImportState::SkippedExisting.can_transition_to(ImportState::AuthorizationConfigured));
        assert!(!ImportState::Done.can_transition_to(ImportState::NotStarted));
    }

    #[test]
    fn skipped_realm_may_still_import_users() {
        let mut progress = RealmProgress::new();
        progress.advance(ImportState::SkippedExisting).unwrap();
        assert!(progress.current().is_terminal());

        progress.advance(ImportState::UsersImported).unwrap();
        progress.advance(ImportState::Done).unwrap();

        assert_eq!(
            progress.history(),
            [
                ImportState::NotStarted,
                ImportState::SkippedExisting,
                ImportState::UsersImported,
                ImportState::Done,
            ]
        );
    }
}
