//! Core types shared by every selfup module.
//!
//! - [`error`] - the [`UpgradeError`] taxonomy and user-facing error rendering

pub mod error;

pub use error::{ErrorContext, ErrorKind, INSTALL_OPERATION, UpgradeError, user_friendly_error};
