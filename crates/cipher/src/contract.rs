//! The per-algorithm encrypt/decrypt contract.

use keywheel_common::{CryptoError, CryptoMetadata, EncryptionResult};

/// A single cipher implementation behind one [`Algorithm`] catalog entry.
///
/// Implementations must supply IV and tag exactly as the algorithm's
/// structural metadata dictates, and *any* failure during either operation
/// must surface as an error — there is no sentinel-value return path.
///
/// [`Algorithm`]: keywheel_common::Algorithm
pub trait CipherAlgorithm: Send + Sync {
    /// Encrypt `plaintext` under `key`, generating any IV internally.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EncryptionFailed`] on an invalid key length or
    /// an internal cipher failure.
    fn encrypt(&self, plaintext: &[u8], key: &[u8]) -> Result<EncryptionResult, CryptoError>;

    /// Decrypt `ciphertext` under `key` using the stored `metadata`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptionFailed`] on any failure: wrong key,
    /// tampered ciphertext, missing or malformed IV/tag.
    fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &[u8],
        metadata: &CryptoMetadata,
    ) -> Result<Vec<u8>, CryptoError>;
}
