//! Error formatting utilities for ferryctl
//!
//! Converts arbitrary errors into an [`ErrorContext`] with a remediation
//! hint suited to the failure kind.

use super::error::{ErrorContext, FerryError};
use crate::upgrade::UpgradeError;

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Recognizes [`FerryError`] and [`UpgradeError`] (directly or behind
/// `anyhow` context), IO permission failures and TOML syntax errors.
/// Anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<FerryError>() {
        Ok(ferry_error) => return create_error_context(ferry_error),
        Err(error) => error,
    };
    let error = match error.downcast::<UpgradeError>() {
        Ok(upgrade_error) => return create_error_context(FerryError::Upgrade(upgrade_error)),
        Err(error) => error,
    };

    // Walk the error chain for errors wrapped inside other error types
    for cause in error.chain() {
        if let Some(upgrade_error) = cause.downcast_ref::<UpgradeError>() {
            let context = ErrorContext::new(FerryError::Other {
                message: chain_message(&error),
            });
            return match upgrade_error.suggestion() {
                Some(suggestion) => context.with_suggestion(suggestion),
                None => context,
            };
        }

        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            if io_error.kind() == std::io::ErrorKind::PermissionDenied {
                return ErrorContext::new(FerryError::PermissionDenied {
                    operation: error.to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check file permissions and try running with appropriate privileges")
                .with_details(io_error.to_string());
            }
        }

        if let Some(toml_error) = cause.downcast_ref::<toml::de::Error>() {
            return ErrorContext::new(FerryError::ConfigParseError {
                file: "config.toml".to_string(),
                reason: toml_error.to_string(),
            })
            .with_suggestion("Check the TOML syntax in your ferryctl config file")
            .with_details(toml_error.to_string());
        }
    }

    ErrorContext::new(FerryError::Other {
        message: chain_message(&error),
    })
}

/// Build the context for a known [`FerryError`].
pub fn create_error_context(error: FerryError) -> ErrorContext {
    match error {
        FerryError::Upgrade(upgrade_error) => {
            let suggestion = upgrade_error.suggestion();
            let details = upgrade_details(&upgrade_error);
            let mut context = ErrorContext::new(FerryError::Upgrade(upgrade_error));
            if let Some(details) = details {
                context = context.with_details(details);
            }
            match suggestion {
                Some(suggestion) => context.with_suggestion(suggestion),
                None => context,
            }
        }
        FerryError::ConfigParseError {
            file,
            reason,
        } => {
            let suggestion = format!("Check the syntax in '{file}'; it must be valid TOML");
            ErrorContext::new(FerryError::ConfigParseError {
                file,
                reason: reason.clone(),
            })
            .with_suggestion(suggestion)
            .with_details(reason)
        }
        FerryError::ConfigError {
            message,
        } => ErrorContext::new(FerryError::ConfigError {
            message,
        })
        .with_suggestion("Check the [upgrade] section of your ferryctl config file"),
        FerryError::PermissionDenied {
            operation,
            path,
        } => {
            let details = format!("Permission denied for '{operation}' on path: {path}");
            ErrorContext::new(FerryError::PermissionDenied {
                operation,
                path,
            })
            .with_suggestion("Check file permissions and try running with appropriate privileges")
            .with_details(details)
        }
        other => ErrorContext::new(other)
            .with_suggestion("Re-run with --verbose for more details"),
    }
}

fn upgrade_details(error: &UpgradeError) -> Option<String> {
    match error {
        UpgradeError::Transport {
            ..
        } => Some("This failure is usually temporary; nothing on disk was changed".to_string()),
        UpgradeError::Replace {
            source,
            ..
        } => Some(format!(
            "{source}. The existing ferryctl executable was left in place"
        )),
        UpgradeError::VersionParse {
            ..
        } => Some("The running build reports a version ferryctl cannot interpret".to_string()),
        UpgradeError::NotFound {
            artifact,
            ..
        } => Some(format!("The release does not publish '{artifact}'")),
        _ => None,
    }
}

fn chain_message(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }
    message
}
