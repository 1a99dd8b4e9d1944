//! Error handling for ferryctl
//!
//! Two layers, as elsewhere in the crate:
//! - [`FerryError`] enumerates application failures. Upgrade and rollback
//!   failures are carried unchanged as [`FerryError::Upgrade`].
//! - [`ErrorContext`] pairs an error with the details and suggestion shown
//!   to the user. Build one from any [`anyhow::Error`] with
//!   [`user_friendly_error`](super::user_friendly_error).
//!
//! # Examples
//!
//! ```rust,no_run
//! use ferryctl::core::{ErrorContext, FerryError};
//!
//! let context = ErrorContext::new(FerryError::ConfigError {
//!     message: "unknown key 'repo'".to_string(),
//! })
//! .with_suggestion("Check ~/.ferryctl/config.toml");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::upgrade::UpgradeError;

/// Failure cases of the ferryctl application.
#[derive(Error, Debug)]
pub enum FerryError {
    /// An upgrade, check or rollback step failed.
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),

    /// Configuration is invalid
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// The configuration file is not valid TOML or has unexpected keys
    #[error("Invalid configuration file syntax in {file}")]
    ConfigParseError {
        /// Path of the file that failed to parse
        file: String,
        /// Parser message
        reason: String,
    },

    /// Permission denied
    #[error("Permission denied: {operation}")]
    PermissionDenied {
        /// The operation that was denied
        operation: String,
        /// Path where permission was denied
        path: String,
    },

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// An error together with what the user should see about it.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: FerryError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: FerryError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion, rendered in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details, rendered in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}
