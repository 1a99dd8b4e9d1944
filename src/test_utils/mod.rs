//! Test utilities for ferryctl
//!
//! Helpers shared by unit tests and the integration suite: one-time logging
//! setup, an in-memory [`ReleaseSource`](crate::upgrade::ReleaseSource) and
//! small filesystem fixtures.
//!
//! # Example
//!
//! ```rust,no_run
//! use ferryctl::test_utils::StaticReleaseSource;
//!
//! let source = StaticReleaseSource::new()
//!     .with_asset("v0.2.21", "ferryctl-linux-x86_64", b"binary");
//! assert_eq!(source.request_count(), 0);
//! ```

pub mod release_source;

pub use release_source::StaticReleaseSource;

use std::path::Path;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. An explicit `level` wins; otherwise
/// `RUST_LOG` is used, and with neither set logging stays off.
///
/// ```bash
/// RUST_LOG=ferryctl=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Write `content` to `path` and mark it executable.
pub fn write_executable(path: &Path, content: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}
