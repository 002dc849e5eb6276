//! Release discovery and self-update.
//!
//! # Architecture Overview
//!
//! - **[`ReleaseCatalog`]**: lists the releases a binary may upgrade to
//! - **[`SelfUpdater`]**: downloads a release asset and swaps it in
//! - **[`Fetcher`]**: the network capability both of them use
//! - **[`SignatureVerifier`]**: the trust check every binary must pass
//! - **[`backup::BackupManager`]**: the rename dance and rollback
//!
//! ## Update Process Flow
//!
//! ```text
//! 1. Discover
//!    ├── GET {index}/repos/{project}/releases?per_page=N
//!    ├── drop prereleases, non-newer and (optionally) major releases
//!    └── newest first, at most five
//!
//! 2. Fetch
//!    └── GET asset URL with Accept: application/octet-stream
//!
//! 3. Extract
//!    ├── tar.gz (Unix-like) or zip (Windows)
//!    ├── executable -> temp file beside the target, mode 0755
//!    └── signature  -> memory
//!
//! 4. Verify
//!    ├── both artifacts present
//!    └── signature valid for the trusted key
//!
//! 5. Apply
//!    ├── remove <binary>.old
//!    ├── <binary>      -> <binary>.old
//!    └── temp file     -> <binary>
//! ```
//!
//! Steps 2 to 4 never touch the destination binary. Any failure there removes
//! the temp file, so a rejected release leaves the directory as it was.
//!
//! # Security Considerations
//!
//! Transport security is optional: the HTTP client may be configured to
//! accept any certificate. What makes an upgrade trustworthy is the detached
//! signature, checked before the swap against a key the caller supplies.
//!
//! # Concurrency
//!
//! Two upgrades of the same binary must not run at once; nothing here locks
//! the destination.
//!
//! # Module Structure
//!
//! - [`catalog`]: release listing and asset matching
//! - [`fetch`]: the `Fetcher` trait and its `reqwest` implementation
//! - [`archive`]: tar.gz and zip extraction
//! - [`verification`]: signature checks and checksums
//! - [`backup`]: swapping binaries and rollback
//! - [`self_updater`]: the upgrade stage machine

pub mod archive;
pub mod backup;
pub mod catalog;
pub mod fetch;
pub mod self_updater;
pub mod verification;


pub use archive::{ArchiveFormat, ArtifactNames, Platform};
pub use catalog::{Asset, MAX_RELEASES, Release, ReleaseCatalog, matching_assets};
pub use fetch::{FetchResponse, Fetcher, HttpFetcher};
pub use self_updater::SelfUpdater;
pub use verification::{Ed25519Verifier, SignatureVerifier};
