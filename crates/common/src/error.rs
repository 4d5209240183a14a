//! Common error taxonomy shared across crates.

use thiserror::Error;

use crate::algorithm::Algorithm;

/// Top-level crypto-core error type.
///
/// Everything in this core is fail-closed: ambiguous or erroneous conditions
/// surface as one of these variants rather than being coerced into a default
/// key or algorithm. The one fail-soft boundary is
/// `KeyRotationService::validate`, which converts [`CryptoError::PolicyViolation`]
/// into a report value for health checks.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The requested key id (or the active key) is absent from the provider.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A key-set invariant is broken — zero or more than one active key, or
    /// an illegal lifecycle transition such as promoting a retired key.
    #[error("key rotation policy violation: {0}")]
    PolicyViolation(String),

    /// The algorithm is in the catalog but has no registered implementation.
    #[error("algorithm not supported: {0}")]
    AlgorithmNotSupported(Algorithm),

    /// The key id is absent from the execution-layer key map. Distinct from
    /// [`CryptoError::KeyNotFound`], which is a provider-level failure.
    #[error("crypto key not found in key map: {0}")]
    CryptoKeyNotFound(String),

    /// Decryption failed. Wraps every lower-level cipher failure — wrong key,
    /// tampered ciphertext, malformed IV — so callers cannot distinguish the
    /// cases. The original cause is retained for operator diagnostics.
    #[error("decryption failed")]
    DecryptionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Encryption failed in the underlying cipher.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// The key storage backend failed while reading or writing keys.
    #[error("key storage failure: {0}")]
    Storage(String),

    /// A persisted envelope string does not match the expected format.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
}

impl CryptoError {
    /// Wrap a lower-level cipher failure as a decryption failure.
    ///
    /// Used at the decrypt boundary to collapse all cipher-layer errors into
    /// one stable failure type while keeping the cause as `source`.
    pub fn decryption<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CryptoError::DecryptionFailed(Box::new(cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_includes_key_id() {
        let e = CryptoError::KeyNotFound("k-2024".into());
        assert!(e.to_string().contains("k-2024"));
    }

    #[test]
    fn decryption_failure_hides_cause_in_display() {
        let cause = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad tag");
        let e = CryptoError::decryption(cause);
        // Callers see one stable message; the cause lives behind source().
        assert_eq!(e.to_string(), "decryption failed");
        assert!(e.source().unwrap().to_string().contains("bad tag"));
    }

    #[test]
    fn algorithm_not_supported_names_the_algorithm() {
        let e = CryptoError::AlgorithmNotSupported(Algorithm::Aes256Cbc);
        assert!(e.to_string().contains("aes-256-cbc"));
    }
}
