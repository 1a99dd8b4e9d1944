//! Core types for ferryctl
//!
//! Application-wide error handling:
//! - [`FerryError`] - enumerated failure cases, wrapping upgrade failures unchanged
//! - [`ErrorContext`] - error plus the details and suggestion shown to users
//! - [`user_friendly_error`] - convert any [`anyhow::Error`] for CLI display
//!
//! # Examples
//!
//! ```rust,no_run
//! use ferryctl::core::user_friendly_error;
//!
//! fn run() -> anyhow::Result<()> {
//!     anyhow::bail!("something failed")
//! }
//!
//! if let Err(e) = run() {
//!     user_friendly_error(e).display();
//! }
//! ```

pub mod error;
pub mod error_formatting;

pub use error::{ErrorContext, FerryError};
pub use error_formatting::{create_error_context, user_friendly_error};
