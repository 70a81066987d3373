//! # kc-model
//!
//! Domain models for realm import (Realm, Client, Role, Group, User).
//!
//! This crate defines the entities the import engine tears down,
//! rebuilds, and reconciles, together with the association rows that
//! link users to roles and groups.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod client;
pub mod group;
pub mod mapping;
pub mod realm;
pub mod role;
pub mod user;

pub use client::{Client, ClientScope};
pub use group::Group;
pub use mapping::{GroupMembership, RoleMapping};
pub use realm::{ClientInitialAccess, Realm};
pub use role::{Role, RoleKey};
pub use user::User;
