//! Configuration management for ferryctl
//!
//! ferryctl reads a single user-wide TOML file. Its `[upgrade]` table
//! configures where releases come from, which executable is replaced and
//! which platforms may upgrade or roll back.
//!
//! **Location:**
//! - Unix/macOS: `~/.ferryctl/config.toml`
//! - Windows: `%LOCALAPPDATA%\ferryctl\config.toml`
//!
//! **Override order:** `--config <PATH>`, then `FERRYCTL_CONFIG_PATH`, then
//! the default location. A missing file means "all defaults".

pub mod global;

pub use global::GlobalConfig;
