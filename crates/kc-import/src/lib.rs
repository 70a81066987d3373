//! # kc-import
//!
//! Re-applies declarative realm definitions to a live identity store.
//!
//! Every import of an existing realm destroys and recreates its structure
//! (clients, client scopes, roles, groups), which hands every structural
//! object a new id. This crate keeps user accounts and their role and group
//! assignments alive across that cycle:
//!
//! 1. [`teardown`] deletes the realm structure but leaves users alone.
//! 2. [`rebuild`] recreates the structure from the representation.
//! 3. [`remap`] re-points user association rows from old ids to the new
//!    ids of same-named objects, then sweeps rows left pointing nowhere.
//!
//! [`RealmImporter`] sequences these steps per realm, found through
//! [`discovery`] in a directory read by [`DirectorySource`].

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod provision;
pub mod rebuild;
pub mod remap;
pub mod representation;
pub mod source;
pub mod state;
pub mod teardown;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigScope, EnvScope, ImportConfig, MapScope, Strategy};
pub use error::{ImportError, ImportResult, ImportStep, StepContext};
pub use events::{RealmEvent, RealmEventBus, RealmEventListener};
pub use orchestrator::{ImportOutcome, ImportReport, ImportSummary, RealmImporter, RealmResult};
pub use rebuild::{AuthorizationContext, RealmRebuilder, StoreRealmRebuilder};
pub use representation::{RealmRepresentation, UserRepresentation, UsersShard};
pub use source::DirectorySource;
pub use state::ImportState;
pub use users::UserImportEngine;
