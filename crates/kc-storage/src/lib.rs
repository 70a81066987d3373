//! # kc-storage
//!
//! Storage abstraction traits for realm import.
//!
//! Every operation runs inside a unit of work: a [`Store`] hands out a
//! [`StoreTransaction`], all reads observe the writes made earlier on the
//! same transaction, and nothing is visible to other units of work until
//! [`StoreTransaction::commit`].
//!
//! ## Store Traits
//!
//! - [`RealmStore`] - realms, default groups, client registration tokens
//! - [`ClientStore`] - clients, client/scope links, authorization settings
//! - [`ClientScopeStore`] - client scopes and their association rows
//! - [`RoleStore`] - roles and composite relations
//! - [`GroupStore`] - groups and group role grants
//! - [`UserStore`] - users and their role/group associations
//! - [`MembershipStore`] - bulk re-pointing and orphan sweeps

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod client;
pub mod error;
pub mod group;
pub mod membership;
pub mod memory;
pub mod realm;
pub mod role;
pub mod store;
pub mod user;

pub use client::{ClientScopeStore, ClientStore};
pub use error::{StorageError, StorageResult};
pub use group::GroupStore;
pub use membership::MembershipStore;
pub use memory::{MemoryState, MemoryStore};
pub use realm::RealmStore;
pub use role::RoleStore;
pub use store::{Store, StoreTransaction};
pub use user::UserStore;
