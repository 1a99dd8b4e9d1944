//! ferryctl - remote resource configuration client
//!
//! This crate holds the lifecycle machinery of the `ferryctl` binary: it can
//! upgrade itself from published releases and roll back to the binary it
//! replaced.
//!
//! # Core Modules
//!
//! - [`cli`] - clap command tree (`upgrade`, `version`)
//! - [`config`] - global configuration (`~/.ferryctl/config.toml`)
//! - [`core`] - application error types and user-facing error rendering
//! - [`upgrade`] - platform policy, version decisions, release lookup,
//!   executable replacement and the coordinating state machine
//!
//! # Upgrade Lifecycle
//!
//! ```text
//! ferryctl upgrade            # latest release, if newer
//! ferryctl upgrade v0.2.21    # explicit release
//! ferryctl upgrade --check    # report only
//! ferryctl upgrade rollback   # restore the previous binary
//! ```
//!
//! The previous binary is kept next to the executable as `<exe>.backup`
//! and the executable itself is only ever replaced by rename, so the path
//! always holds a complete binary.

pub mod cli;
pub mod config;
pub mod core;
pub mod upgrade;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
