//! Pure rotation decision logic over a [`KeyProvider`] snapshot.

use keywheel_common::CryptoError;

use crate::key::Key;
use crate::provider::KeyProvider;

/// Enforces the key-set invariants and resolves which key to use for a given
/// operation. Holds no state and performs no persistence of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyRotationPolicy;

impl KeyRotationPolicy {
    /// Check the key-set invariants: exactly one key must be active.
    ///
    /// Used as a readiness check; never silently skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::PolicyViolation`] if zero or more than one key
    /// is active, and propagates provider failures unchanged.
    pub fn validate(&self, provider: &dyn KeyProvider) -> Result<(), CryptoError> {
        let keys = provider.all()?;
        let active: Vec<&Key> = keys.iter().filter(|k| k.status().can_encrypt()).collect();
        match active.len() {
            1 => Ok(()),
            0 => Err(CryptoError::PolicyViolation(
                "no active key in key set".into(),
            )),
            n => {
                let ids: Vec<&str> = active.iter().map(|k| k.id()).collect();
                Err(CryptoError::PolicyViolation(format!(
                    "{n} active keys in key set: {}",
                    ids.join(", ")
                )))
            }
        }
    }

    /// Resolve the key new ciphertext must be produced under.
    ///
    /// This is the single chokepoint that prevents encrypting with a
    /// non-active key, even if a caller holds a stale reference.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if no key is active.
    pub fn encryption_key(&self, provider: &dyn KeyProvider) -> Result<Key, CryptoError> {
        provider.active()
    }

    /// Resolve the key to decrypt a ciphertext produced under `key_id`.
    ///
    /// Every lifecycle status may decrypt today, so this effectively allows
    /// any known key id. The status filter exists so a future policy (for
    /// example, hard key destruction) can add a decrypt-deny rule without
    /// touching callers.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if the id is unknown, or
    /// [`CryptoError::PolicyViolation`] if the key's status forbids
    /// decryption.
    pub fn decryption_key(
        &self,
        provider: &dyn KeyProvider,
        key_id: &str,
    ) -> Result<Key, CryptoError> {
        let key = provider.find(key_id)?;
        if !key.status().can_decrypt() {
            return Err(CryptoError::PolicyViolation(format!(
                "key {key_id} is not usable for decryption"
            )));
        }
        Ok(key)
    }
}
