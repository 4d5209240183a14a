//! The [`KeyProvider`] storage seam.
//!
//! Implementations live in infrastructure code (database, vault, or the
//! in-memory provider in this crate); the rotation policy and service operate
//! purely against this trait.

use keywheel_common::CryptoError;

use crate::key::Key;

/// Supplies keys and persists lifecycle transitions.
///
/// # Contract
///
/// - [`KeyProvider::promote`] atomically sets the target key `Active` and the
///   previously-active key `Inactive`: no concurrent reader may observe zero
///   or two active keys, and two concurrent promotes must serialize.
///   Implementations backed by shared storage must use a single transaction
///   with row locking.
/// - `promote` fails with [`CryptoError::KeyNotFound`] if the target is
///   absent, and with [`CryptoError::PolicyViolation`] if the target is
///   retired — retirement is a deliberate end-of-life marker, never undone by
///   promotion.
#[cfg_attr(test, mockall::automock)]
pub trait KeyProvider: Send + Sync {
    /// Return every key this provider holds.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Storage`] if the backend cannot be read.
    fn all(&self) -> Result<Vec<Key>, CryptoError>;

    /// Return the single active key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if no key is active.
    fn active(&self) -> Result<Key, CryptoError>;

    /// Look up a key by id.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if the id is unknown.
    fn find(&self, key_id: &str) -> Result<Key, CryptoError>;

    /// Atomically make `key_id` the active key and demote the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if the target does not exist, or
    /// [`CryptoError::PolicyViolation`] if the target is retired.
    fn promote(&self, key_id: &str) -> Result<(), CryptoError>;
}
