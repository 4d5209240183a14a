//! Cipher suite implementations for the algorithm catalog.
//!
//! One type per catalog entry, each implementing
//! [`CipherAlgorithm`](crate::contract::CipherAlgorithm). IVs/nonces are
//! generated per call from the OS CSPRNG; AEAD tags are detached so the
//! envelope stores them explicitly.

mod aead;
mod cbc;

pub use aead::{Aes128GcmSuite, Aes256GcmSuite, ChaCha20Poly1305Suite};
pub use cbc::Aes256CbcSuite;

use thiserror::Error;

/// Low-level cipher failures. Wrapped into the shared error taxonomy at the
/// suite boundary; the message never includes key or plaintext bytes.
#[derive(Debug, Error)]
pub(crate) enum SuiteError {
    /// The key has the wrong length for the algorithm.
    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    /// The IV is absent or has the wrong length.
    #[error("missing or malformed iv")]
    BadIv,

    /// The authentication tag is absent or has the wrong length.
    #[error("missing or malformed authentication tag")]
    BadTag,

    /// The AEAD primitive rejected the operation (authentication failure on
    /// decrypt, internal error on encrypt).
    #[error("aead operation failed")]
    AeadFailure,

    /// CBC padding was invalid after decryption.
    #[error("invalid block padding")]
    BadPadding,
}
