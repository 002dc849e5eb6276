//! Integration test suite for selfup
//!
//! End-to-end tests against the public API (driven by the in-memory
//! `MockFetcher` from `selfup::test_utils`) and against the built binary.
//! Nothing here touches the network.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **catalog**: release discovery through `ReleaseCatalog`
//! - **apply**: full upgrade attempts through `SelfUpdater`
//! - **cli**: the `selfup` binary

mod apply;
mod catalog;
mod cli;
