//! Test utilities for selfup
//!
//! Helpers shared by unit and integration tests:
//! - [`MockFetcher`]: an in-memory [`Fetcher`](crate::upgrade::Fetcher) with canned responses
//! - [`ArchiveFixture`]: builds `.tar.gz` and `.zip` release archives
//! - [`signed_release`], [`sign`], [`test_signing_key`]: a fixed Ed25519 test key
//! - [`release_index`]: a release index body in the GitHub API shape
//!
//! # Example
//!
//! ```rust,ignore
//! use selfup::test_utils::{MockFetcher, release_index};
//!
//! let fetcher = MockFetcher::new().respond(
//!     "https://api.example.com/repos/acme/widget/releases?per_page=30",
//!     200,
//!     release_index(&[("v1.4.0", false)]),
//! );
//! ```

pub mod fixtures;
pub mod mock_fetcher;

pub use fixtures::{
    ArchiveFixture, public_key, release_index, sign, signed_release, test_signing_key,
};
pub use mock_fetcher::MockFetcher;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. `level` wins over `RUST_LOG`; with
/// neither set, nothing is logged.
///
/// ```bash
/// RUST_LOG=selfup=debug cargo test
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
            .try_init();
    });
}
