//! Signature and checksum verification for extracted binaries.
//!
//! A release ships a detached signature next to the executable. Before
//! anything on disk is touched the signature is checked against the trusted
//! public key through a [`SignatureVerifier`]. The default implementation,
//! [`Ed25519Verifier`], accepts keys and signatures in the encodings release
//! tooling commonly emits:
//!
//! | Input     | Accepted encodings                                         |
//! |-----------|------------------------------------------------------------|
//! | key       | 32 raw bytes, 64 hex characters, PEM `PUBLIC KEY`, DER SPKI |
//! | signature | 64 raw bytes, 128 hex characters                           |
//!
//! Surrounding whitespace in text encodings is ignored.

use ed25519_dalek::pkcs8::DecodePublicKey;
use ed25519_dalek::{Signature, VerifyingKey};
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

use crate::core::UpgradeError;

/// Checks a detached signature over a payload stream.
pub trait SignatureVerifier: Send + Sync {
    /// Verify that `signature` over the bytes of `data` was made by `key`.
    ///
    /// # Errors
    ///
    /// - [`UpgradeError::InvalidKey`] if `key` cannot be decoded
    /// - [`UpgradeError::InvalidSignature`] if `signature` cannot be decoded
    /// - [`UpgradeError::SignatureMismatch`] if the signature does not match
    /// - [`UpgradeError::Archive`] if `data` cannot be read
    fn verify(&self, key: &[u8], signature: &[u8], data: &mut dyn Read) -> Result<(), UpgradeError>;
}

/// Ed25519 detached signatures, checked with strict verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    /// Decode a trusted public key.
    pub fn parse_key(key: &[u8]) -> Result<VerifyingKey, UpgradeError> {
        if let Ok(raw) = <&[u8; 32]>::try_from(key) {
            return VerifyingKey::from_bytes(raw).map_err(invalid_key);
        }

        if let Ok(text) = std::str::from_utf8(key) {
            let text = text.trim();
            if text.starts_with("-----BEGIN") {
                return VerifyingKey::from_public_key_pem(text).map_err(invalid_key);
            }
            if let Ok(bytes) = hex::decode(text) {
                let raw: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    UpgradeError::InvalidKey {
                        reason: format!("expected 32 bytes, got {}", bytes.len()),
                    }
                })?;
                return VerifyingKey::from_bytes(&raw).map_err(invalid_key);
            }
        }

        VerifyingKey::from_public_key_der(key).map_err(|_| UpgradeError::InvalidKey {
            reason: format!(
                "{} bytes is neither a raw, hex, PEM nor DER encoded Ed25519 key",
                key.len()
            ),
        })
    }

    /// Decode a detached signature.
    pub fn parse_signature(signature: &[u8]) -> Result<Signature, UpgradeError> {
        if signature.len() == Signature::BYTE_SIZE {
            return Signature::try_from(signature).map_err(invalid_signature);
        }

        let text = std::str::from_utf8(signature).map_err(|_| UpgradeError::InvalidSignature {
            reason: format!("expected 64 raw bytes or hex text, got {} bytes", signature.len()),
        })?;
        let bytes = hex::decode(text.trim()).map_err(invalid_signature)?;
        Signature::try_from(bytes.as_slice()).map_err(invalid_signature)
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, key: &[u8], signature: &[u8], data: &mut dyn Read) -> Result<(), UpgradeError> {
        let key = Self::parse_key(key)?;
        let signature = Self::parse_signature(signature)?;

        let mut payload = Vec::new();
        data.read_to_end(&mut payload).map_err(|e| UpgradeError::Archive {
            format: "payload",
            reason: e.to_string(),
        })?;
        debug!("Verifying Ed25519 signature over {} bytes", payload.len());

        key.verify_strict(&payload, &signature).map_err(|e| UpgradeError::SignatureMismatch {
            reason: e.to_string(),
        })
    }
}

/// SHA-256 of a file, formatted as `sha256:<hex>`.
pub fn compute_sha256(path: &Path) -> Result<String, UpgradeError> {
    debug!("Computing SHA256 checksum for: {}", path.display());

    let mut file =
        std::fs::File::open(path).map_err(|e| UpgradeError::io("open", path, e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| UpgradeError::io("read", path, e))?;

    Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
}

fn invalid_key(error: impl std::fmt::Display) -> UpgradeError {
    UpgradeError::InvalidKey {
        reason: error.to_string(),
    }
}

fn invalid_signature(error: impl std::fmt::Display) -> UpgradeError {
    UpgradeError::InvalidSignature {
        reason: error.to_string(),
    }
}
