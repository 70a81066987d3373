//! # kc-cli
//!
//! The `kc-import` command: imports realm definition files from a
//! directory into a `PostgreSQL` database, preserving the role and group
//! assignments of existing users.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]
#![allow(clippy::uninlined_format_args)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
