//! Maps catalog entries to their cipher implementations.

use std::collections::HashMap;
use std::sync::Arc;

use keywheel_common::{Algorithm, CryptoError};

use crate::config::CryptoConfig;
use crate::contract::CipherAlgorithm;
use crate::suites::{Aes128GcmSuite, Aes256CbcSuite, Aes256GcmSuite, ChaCha20Poly1305Suite};

/// Registry resolving an [`Algorithm`] to its [`CipherAlgorithm`]
/// implementation.
///
/// An algorithm that is in the catalog but not registered here is disabled:
/// environments forbid a cipher (for example AES-256-CBC) by simply not
/// wiring it up. The registry is immutable once built and safe to share
/// across threads.
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    suites: HashMap<Algorithm, Arc<dyn CipherAlgorithm>>,
}

impl AlgorithmRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation for `algorithm`, replacing any previous
    /// one.
    pub fn register(mut self, algorithm: Algorithm, suite: Arc<dyn CipherAlgorithm>) -> Self {
        self.suites.insert(algorithm, suite);
        self
    }

    /// Build a registry with the recommended AEAD suites wired up and no
    /// legacy ciphers.
    pub fn standard() -> Self {
        Self::new()
            .register(Algorithm::Aes256Gcm, Arc::new(Aes256GcmSuite))
            .register(Algorithm::Aes128Gcm, Arc::new(Aes128GcmSuite))
            .register(Algorithm::ChaCha20Poly1305, Arc::new(ChaCha20Poly1305Suite))
    }

    /// Build a registry according to configuration: AEAD suites always,
    /// AES-256-CBC only when explicitly allowed.
    pub fn from_config(config: &CryptoConfig) -> Self {
        let registry = Self::standard();
        if config.allow_legacy_cbc {
            registry.register(Algorithm::Aes256Cbc, Arc::new(Aes256CbcSuite))
        } else {
            registry
        }
    }

    /// Returns `true` if `algorithm` has a registered implementation.
    pub fn has(&self, algorithm: Algorithm) -> bool {
        self.suites.contains_key(&algorithm)
    }

    /// Resolve the implementation for `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AlgorithmNotSupported`] if nothing is
    /// registered for it.
    pub fn get(&self, algorithm: Algorithm) -> Result<Arc<dyn CipherAlgorithm>, CryptoError> {
        self.suites
            .get(&algorithm)
            .cloned()
            .ok_or(CryptoError::AlgorithmNotSupported(algorithm))
    }

    /// Every algorithm currently registered.
    pub fn registered(&self) -> Vec<Algorithm> {
        Algorithm::ALL
            .into_iter()
            .filter(|alg| self.has(*alg))
            .collect()
    }
}

impl std::fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("registered", &self.registered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_only_aead_suites() {
        let registry = AlgorithmRegistry::standard();
        assert!(registry.has(Algorithm::Aes256Gcm));
        assert!(registry.has(Algorithm::Aes128Gcm));
        assert!(registry.has(Algorithm::ChaCha20Poly1305));
        assert!(!registry.has(Algorithm::Aes256Cbc));
    }

    #[test]
    fn unregistered_algorithm_is_not_supported() {
        let registry = AlgorithmRegistry::standard();
        assert!(matches!(
            registry.get(Algorithm::Aes256Cbc),
            Err(CryptoError::AlgorithmNotSupported(Algorithm::Aes256Cbc))
        ));
    }

    #[test]
    fn config_gates_the_legacy_cipher() {
        let mut config = CryptoConfig::default();
        assert!(!AlgorithmRegistry::from_config(&config).has(Algorithm::Aes256Cbc));
        config.allow_legacy_cbc = true;
        assert!(AlgorithmRegistry::from_config(&config).has(Algorithm::Aes256Cbc));
    }

    #[test]
    fn registered_lists_in_catalog_order() {
        let registry = AlgorithmRegistry::standard();
        assert_eq!(
            registry.registered(),
            vec![
                Algorithm::Aes256Gcm,
                Algorithm::Aes128Gcm,
                Algorithm::ChaCha20Poly1305
            ]
        );
    }
}
