//! Shared value objects, envelope format, and errors for the `keywheel`
//! crypto core.

pub mod algorithm;
pub mod envelope;
pub mod error;

pub use algorithm::Algorithm;
pub use envelope::{CryptoMetadata, EncryptionResult, Envelope};
pub use error::CryptoError;
