//! Error handling for selfup
//!
//! Every fallible library operation returns [`UpgradeError`]. The variants are
//! fine-grained so log lines and CLI output can say exactly what went wrong,
//! while [`UpgradeError::kind`] folds them back into the categories callers
//! usually branch on:
//!
//! | [`ErrorKind`]  | Raised when                                              |
//! |----------------|----------------------------------------------------------|
//! | `Fetch`        | transport failure or non-success HTTP status             |
//! | `Decode`       | the release index response does not match its schema     |
//! | `Archive`      | the downloaded archive is not a valid tar.gz / zip       |
//! | `Io`           | a local filesystem operation failed                      |
//! | `Verification` | binary or signature missing, bad key, bad signature      |
//! | `Usage`        | caller input is invalid (asset pattern)                  |
//!
//! A failure in any stage before the final install leaves the running binary
//! untouched. The only exception is [`UpgradeError::Io`] raised by the second
//! rename of the swap, which leaves the previous binary at `<binary>.old`;
//! [`user_friendly_error`] points the operator at it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use selfup::core::{ErrorKind, UpgradeError};
//!
//! fn should_retry_later(err: &UpgradeError) -> bool {
//!     matches!(err.kind(), ErrorKind::Fetch)
//! }
//! ```

use colored::Colorize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Operation name used for the rename that installs the verified binary.
///
/// An [`UpgradeError::Io`] carrying this operation is the one failure that
/// leaves the binary path empty with the previous binary at `<binary>.old`.
pub const INSTALL_OPERATION: &str = "install new binary as";

/// Coarse failure category of an [`UpgradeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network or transport failure, including non-success status codes.
    Fetch,
    /// The release index body could not be decoded.
    Decode,
    /// The archive container could not be parsed.
    Archive,
    /// Local filesystem failure.
    Io,
    /// The release could not be authenticated.
    Verification,
    /// Invalid caller input, such as a malformed asset pattern.
    Usage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Decode => "decode",
            Self::Archive => "archive",
            Self::Io => "io",
            Self::Verification => "verification",
            Self::Usage => "usage",
        };
        f.write_str(name)
    }
}

/// The error type for all selfup operations.
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// The transport failed before a response was received.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        /// URL that was requested
        url: String,
        /// Transport error message
        reason: String,
    },

    /// The server answered with a status outside the 2xx range.
    #[error("Request to {url} returned HTTP {status}")]
    FetchStatus {
        /// URL that was requested
        url: String,
        /// Numeric status code
        status: u16,
    },

    /// The release index body did not match the expected schema.
    #[error("Failed to decode release index: {reason}")]
    Decode {
        /// Decoder error message
        reason: String,
    },

    /// The archive stream is not a valid container of the expected format.
    #[error("Invalid {format} archive: {reason}")]
    Archive {
        /// Container format ("tar.gz" or "zip")
        format: &'static str,
        /// Reader error message
        reason: String,
    },

    /// A local filesystem operation failed.
    #[error("Failed to {operation} {}: {source}", path.display())]
    Io {
        /// What was being attempted, phrased as a verb ("create temporary file in")
        operation: &'static str,
        /// Path the operation targeted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The archive did not contain the executable payload.
    #[error("No upgrade found in release archive")]
    MissingBinary,

    /// The archive did not contain the detached signature.
    #[error("No signature found in release archive")]
    MissingSignature,

    /// The trusted key could not be parsed.
    #[error("Invalid public key: {reason}")]
    InvalidKey {
        /// Parser error message
        reason: String,
    },

    /// The signature file could not be parsed.
    #[error("Invalid signature: {reason}")]
    InvalidSignature {
        /// Parser error message
        reason: String,
    },

    /// The signature does not match the binary under the trusted key.
    #[error("Signature verification failed: {reason}")]
    SignatureMismatch {
        /// Verifier error message
        reason: String,
    },

    /// An asset name pattern is not a valid regular expression.
    #[error("Invalid asset pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The rejected pattern
        pattern: String,
        /// Regex compiler error message
        reason: String,
    },
}

impl UpgradeError {
    /// Build an [`UpgradeError::Io`] for `path`.
    pub fn io(operation: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// The failure category this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch { .. } | Self::FetchStatus { .. } => ErrorKind::Fetch,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Archive { .. } => ErrorKind::Archive,
            Self::Io { .. } => ErrorKind::Io,
            Self::MissingBinary
            | Self::MissingSignature
            | Self::InvalidKey { .. }
            | Self::InvalidSignature { .. }
            | Self::SignatureMismatch { .. } => ErrorKind::Verification,
            Self::InvalidPattern { .. } => ErrorKind::Usage,
        }
    }
}

/// An error message decorated with optional details and a suggestion.
///
/// Produced by [`user_friendly_error`] for display at the top level of the
/// binary. The message is captured as text so any `anyhow` chain can be
/// rendered, not only [`UpgradeError`].
#[derive(Debug)]
pub struct ErrorContext {
    /// The rendered error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

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
        write!(f, "{}", self.message)?;

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

/// Convert any error into an [`ErrorContext`] with a suggestion where one
/// applies.
///
/// The anyhow chain is walked so an [`UpgradeError`] wrapped in CLI context
/// is still recognised. The top-level message keeps the outer context.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = format!("{error:#}");

    let upgrade_error = error.chain().find_map(|cause| cause.downcast_ref::<UpgradeError>());
    let Some(upgrade_error) = upgrade_error else {
        return ErrorContext::new(message);
    };

    let context = ErrorContext::new(message);
    match upgrade_error {
        UpgradeError::Fetch { .. } => context
            .with_suggestion("Check your network connection and try again later")
            .with_details("The running binary was not modified"),
        UpgradeError::FetchStatus { status, .. } if *status == 403 || *status == 429 => context
            .with_suggestion("The release index is rate limiting requests; wait before retrying")
            .with_details("The running binary was not modified"),
        UpgradeError::FetchStatus { status, .. } if *status == 404 => context
            .with_suggestion("Check the project name and the asset URL")
            .with_details("The running binary was not modified"),
        UpgradeError::FetchStatus { .. } | UpgradeError::Decode { .. } => {
            context.with_details("The running binary was not modified")
        }
        UpgradeError::Archive { .. } => context
            .with_suggestion("Make sure the asset matches this platform (tar.gz for Unix, zip for Windows)")
            .with_details("The running binary was not modified"),
        UpgradeError::Io {
            operation: INSTALL_OPERATION,
            path,
            ..
        } => {
            let mut old = path.clone().into_os_string();
            old.push(".old");
            context
                .with_suggestion(format!(
                    "Restore the previous binary with `selfup rollback --binary {}` or rename {} back manually",
                    path.display(),
                    Path::new(&old).display()
                ))
                .with_details("The binary was moved aside but the new one could not be installed")
        }
        UpgradeError::Io { source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
            context.with_suggestion(
                "Run with permission to write the binary's directory (sudo/Administrator) or check file ownership",
            )
        }
        UpgradeError::Io { .. } => context,
        UpgradeError::MissingBinary | UpgradeError::MissingSignature => context
            .with_suggestion("Pick the release asset built for this platform")
            .with_details("The running binary was not modified"),
        UpgradeError::InvalidKey { .. } => context.with_suggestion(
            "Provide the trusted key as 32 raw bytes, 64 hex characters or a PEM PUBLIC KEY",
        ),
        UpgradeError::InvalidSignature { .. } | UpgradeError::SignatureMismatch { .. } => context
            .with_suggestion("Do not install this release; it was not signed by the trusted key")
            .with_details("The downloaded binary was discarded and the running binary was not modified"),
        UpgradeError::InvalidPattern { .. } => {
            context.with_suggestion("Use a valid regular expression, e.g. 'linux-amd64'")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_verification_failures() {
        assert_eq!(UpgradeError::MissingBinary.kind(), ErrorKind::Verification);
        assert_eq!(UpgradeError::MissingSignature.kind(), ErrorKind::Verification);
        assert_eq!(
            UpgradeError::SignatureMismatch {
                reason: "bad".to_string()
            }
            .kind(),
            ErrorKind::Verification
        );
        assert_eq!(
            UpgradeError::FetchStatus {
                url: "https://example.com".to_string(),
                status: 500
            }
            .kind(),
            ErrorKind::Fetch
        );
    }

    #[test]
    fn test_io_error_message_includes_path() {
        let err = UpgradeError::io(
            "create temporary file in",
            "/opt/app",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.to_string(), "Failed to create temporary file in /opt/app: denied");
    }

    #[test]
    fn test_user_friendly_error_points_at_backup_after_failed_install() {
        let err = UpgradeError::io(
            INSTALL_OPERATION,
            "/opt/app/tool",
            io::Error::other("disk full"),
        );
        let context = user_friendly_error(anyhow::Error::new(err).context("Upgrade failed"));

        assert!(context.message.starts_with("Upgrade failed"));
        let suggestion = context.suggestion.expect("suggestion present");
        assert!(suggestion.contains("/opt/app/tool.old"));
    }

    #[test]
    fn test_user_friendly_error_plain_anyhow() {
        let context = user_friendly_error(anyhow::anyhow!("something else"));
        assert_eq!(context.message, "something else");
        assert!(context.suggestion.is_none());
    }

    #[test]
    fn test_error_context_display() {
        let context = ErrorContext::new("boom").with_details("d").with_suggestion("s");
        assert_eq!(context.to_string(), "boom\nDetails: d\nSuggestion: s");
    }
}
