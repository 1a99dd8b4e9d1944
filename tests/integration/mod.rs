//! Integration test suite for ferryctl
//!
//! End-to-end tests of the upgrade and rollback lifecycle through the public
//! library API, using an in-memory release host and temporary install
//! directories, plus smoke tests of the compiled binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **scenarios**: complete upgrade, check and rollback flows
//! - **platform_policy**: per-platform gating with no side effects
//! - **failure_modes**: each failure kind and the state it leaves behind
//! - **cli**: the `ferryctl` binary

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod failure_modes;
mod platform_policy;
mod scenarios;
