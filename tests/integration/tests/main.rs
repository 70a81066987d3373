//! End-to-End Integration Tests
//!
//! These tests run realm imports against an ephemeral PostgreSQL instance
//! started with testcontainers.

mod common;
mod memberships;
mod reimport;
