//! # kc-storage-sql
//!
//! SQLx-based storage implementation for realm import.
//!
//! This crate provides `PostgreSQL` storage using `SQLx`. A [`PgStore`]
//! opens one database transaction per unit of work; every statement of
//! that unit runs on the same connection, and rows about to be deleted are
//! locked with `SELECT ... FOR UPDATE` first.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

mod client;
mod convert;
mod entities;
pub mod error;
mod group;
mod membership;
pub mod pool;
mod realm;
mod role;
pub mod store;
mod user;

pub use pool::{PoolConfig, create_pool, migrate};
pub use store::{PgStore, PgTransaction};
