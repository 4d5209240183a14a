//! [`ReversibleCryptoService`]: symmetric encryption against the rotating
//! key set.
//!
//! The service is handed a [`CryptoKeyExport`] at construction and never
//! talks to a [`KeyProvider`] directly, so rotation state is frozen per
//! instance. Rebuild the service from a fresh export after rotating; old
//! ciphertext stays readable because decryption resolves keys by the id
//! recorded in the envelope, not by active status.
//!
//! [`KeyProvider`]: keywheel_keyring::KeyProvider

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use keywheel_common::{Algorithm, CryptoError, CryptoMetadata, EncryptionResult, Envelope};
use keywheel_keyring::{CryptoKeyExport, KeyMaterial};

use crate::registry::AlgorithmRegistry;

/// Output of [`ReversibleCryptoService::encrypt`]: the cipher result plus the
/// key id and algorithm a caller must persist to decrypt later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    /// Ciphertext and operation metadata.
    pub result: EncryptionResult,
    /// Id of the key the ciphertext was produced under.
    pub key_id: String,
    /// Algorithm used.
    pub algorithm: Algorithm,
}

impl EncryptedPayload {
    /// Assemble the durable envelope for this payload.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidEnvelope`] if the payload's iv/tag shape
    /// does not match the algorithm, which indicates a cipher implementation
    /// bug rather than caller error.
    pub fn into_envelope(self) -> Result<Envelope, CryptoError> {
        Envelope::new(self.key_id, self.algorithm, self.result)
    }
}

/// Symmetric encrypt/decrypt over an exported key set.
///
/// Encryption always uses the active key and the configured algorithm.
/// Decryption honours whatever key id and algorithm the caller stored, as
/// long as the key was exported and the algorithm is registered.
pub struct ReversibleCryptoService {
    registry: Arc<AlgorithmRegistry>,
    keys: HashMap<String, KeyMaterial>,
    active_key_id: String,
    active_algorithm: Algorithm,
}

impl ReversibleCryptoService {
    /// Build a service from a registry, a key export, and the algorithm to
    /// use for new encryptions.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::CryptoKeyNotFound`] if the export's active key
    /// id has no material, which would make every encrypt call fail.
    pub fn new(
        registry: Arc<AlgorithmRegistry>,
        export: CryptoKeyExport,
        active_algorithm: Algorithm,
    ) -> Result<Self, CryptoError> {
        if !export.keys.contains_key(&export.active_key_id) {
            return Err(CryptoError::CryptoKeyNotFound(export.active_key_id));
        }
        Ok(Self {
            registry,
            keys: export.keys,
            active_key_id: export.active_key_id,
            active_algorithm,
        })
    }

    /// Id of the key new ciphertext is produced under.
    pub fn active_key_id(&self) -> &str {
        &self.active_key_id
    }

    /// Algorithm new ciphertext is produced with.
    pub fn active_algorithm(&self) -> Algorithm {
        self.active_algorithm
    }

    /// Encrypt `plaintext` under the active key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AlgorithmNotSupported`] if the configured
    /// algorithm is not registered, [`CryptoError::CryptoKeyNotFound`] if the
    /// active key's material is missing, and
    /// [`CryptoError::EncryptionFailed`] on cipher failure.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedPayload, CryptoError> {
        let suite = self.registry.get(self.active_algorithm)?;
        let key = self
            .keys
            .get(&self.active_key_id)
            .ok_or_else(|| CryptoError::CryptoKeyNotFound(self.active_key_id.clone()))?;

        let result = suite.encrypt(plaintext, key.as_bytes())?;
        self.check_result_shape(&result)?;

        debug!(
            key_id = %self.active_key_id,
            algorithm = %self.active_algorithm,
            "encrypted payload"
        );
        Ok(EncryptedPayload {
            result,
            key_id: self.active_key_id.clone(),
            algorithm: self.active_algorithm,
        })
    }

    /// Decrypt ciphertext produced under `key_id` with `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AlgorithmNotSupported`] for an unregistered
    /// algorithm and [`CryptoError::CryptoKeyNotFound`] for an unexported key
    /// id. Every other failure — wrong key, tampered ciphertext, missing or
    /// malformed iv/tag — collapses to [`CryptoError::DecryptionFailed`] so
    /// callers cannot distinguish them.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        key_id: &str,
        algorithm: Algorithm,
        metadata: &CryptoMetadata,
    ) -> Result<Vec<u8>, CryptoError> {
        let suite = self.registry.get(algorithm)?;
        let key = self
            .keys
            .get(key_id)
            .ok_or_else(|| CryptoError::CryptoKeyNotFound(key_id.to_owned()))?;

        suite
            .decrypt(ciphertext, key.as_bytes(), metadata)
            .map_err(|e| match e {
                e @ CryptoError::DecryptionFailed(_) => e,
                other => CryptoError::decryption(other),
            })
    }

    /// Encrypt `plaintext` and assemble the durable envelope in one step.
    ///
    /// # Errors
    ///
    /// As [`Self::encrypt`], plus [`CryptoError::InvalidEnvelope`] if the
    /// cipher produced a malformed iv/tag shape.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Envelope, CryptoError> {
        self.encrypt(plaintext)?.into_envelope()
    }

    /// Decrypt a stored envelope.
    ///
    /// # Errors
    ///
    /// As [`Self::decrypt`].
    pub fn open(&self, envelope: &Envelope) -> Result<Vec<u8>, CryptoError> {
        self.decrypt(
            &envelope.cipher,
            &envelope.key_id,
            envelope.algorithm,
            &envelope.metadata(),
        )
    }

    /// A cipher returning an iv/tag shape its own algorithm forbids would
    /// produce envelopes that can never be decrypted. Catch that here instead
    /// of at read time.
    fn check_result_shape(&self, result: &EncryptionResult) -> Result<(), CryptoError> {
        let alg = self.active_algorithm;
        let iv_ok = match &result.iv {
            Some(iv) => alg.requires_iv() && iv.len() == alg.iv_len(),
            None => !alg.requires_iv(),
        };
        let tag_ok = match (&result.tag, alg.tag_len()) {
            (Some(tag), Some(len)) => tag.len() == len,
            (None, None) => true,
            _ => false,
        };
        if !iv_ok || !tag_ok {
            return Err(CryptoError::EncryptionFailed(format!(
                "{alg} produced an iv/tag shape that violates its own metadata"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ReversibleCryptoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReversibleCryptoService")
            .field("active_key_id", &self.active_key_id)
            .field("active_algorithm", &self.active_algorithm)
            .field("key_count", &self.keys.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CryptoConfig;

    use keywheel_keyring::{InMemoryKeyProvider, Key, KeyRotationService, KeyStatus};

    fn export(active: &str, ids: &[&str], key_len: usize) -> CryptoKeyExport {
        let keys = ids
            .iter()
            .map(|id| {
                let mut material = vec![0u8; key_len];
                for (i, b) in material.iter_mut().enumerate() {
                    *b = id.as_bytes()[0] ^ (i as u8);
                }
                (id.to_string(), KeyMaterial::new(material))
            })
            .collect();
        CryptoKeyExport {
            keys,
            active_key_id: active.into(),
        }
    }

    fn service(algorithm: Algorithm) -> ReversibleCryptoService {
        let config = CryptoConfig {
            allow_legacy_cbc: true,
            ..CryptoConfig::default()
        };
        ReversibleCryptoService::new(
            Arc::new(AlgorithmRegistry::from_config(&config)),
            export("k1", &["k1", "k2"], algorithm.key_len()),
            algorithm,
        )
        .unwrap()
    }

    #[test]
    fn round_trip_every_registered_algorithm() {
        for algorithm in Algorithm::ALL {
            let svc = service(algorithm);
            let payload = svc.encrypt(b"123-45-6789").unwrap();
            assert_eq!(payload.key_id, "k1");
            assert_eq!(payload.algorithm, algorithm);
            let plaintext = svc
                .decrypt(
                    &payload.result.cipher,
                    &payload.key_id,
                    payload.algorithm,
                    &payload.result.metadata(),
                )
                .unwrap();
            assert_eq!(plaintext, b"123-45-6789");
        }
    }

    #[test]
    fn plaintext_containing_the_key_bytes_round_trips() {
        for algorithm in Algorithm::ALL {
            let svc = service(algorithm);
            let key_bytes = export("k1", &["k1"], algorithm.key_len()).keys["k1"]
                .as_bytes()
                .to_vec();
            let envelope = svc.seal(&key_bytes).unwrap();
            assert_eq!(svc.open(&envelope).unwrap(), key_bytes, "{algorithm}");
        }
    }

    #[test]
    fn empty_plaintext_round_trips() {
        for algorithm in Algorithm::ALL {
            let svc = service(algorithm);
            let envelope = svc.seal(b"").unwrap();
            assert_eq!(svc.open(&envelope).unwrap(), b"", "{algorithm}");
        }
    }

    #[test]
    fn seal_then_open_via_string_repr() {
        let svc = service(Algorithm::Aes256Gcm);
        let stored = svc.seal(b"account=12345").unwrap().to_string_repr();
        let envelope = Envelope::from_str_repr(&stored).unwrap();
        assert_eq!(svc.open(&envelope).unwrap(), b"account=12345");
    }

    #[test]
    fn ciphertext_never_echoes_plaintext_or_key() {
        let svc = service(Algorithm::Aes256Gcm);
        let payload = svc.encrypt(b"needle-needle-needle").unwrap();
        let cipher = payload.result.cipher;
        assert_ne!(cipher, b"needle-needle-needle");
        assert!(!cipher
            .windows(6)
            .any(|w| w == b"needle"));
    }

    #[test]
    fn unregistered_algorithm_is_rejected_before_key_lookup() {
        let registry = Arc::new(AlgorithmRegistry::standard());
        let svc = ReversibleCryptoService::new(
            registry,
            export("k1", &["k1"], 32),
            Algorithm::Aes256Cbc,
        )
        .unwrap();
        assert!(matches!(
            svc.encrypt(b"x"),
            Err(CryptoError::AlgorithmNotSupported(Algorithm::Aes256Cbc))
        ));
        assert!(matches!(
            svc.decrypt(b"x", "k1", Algorithm::Aes256Cbc, &CryptoMetadata::default()),
            Err(CryptoError::AlgorithmNotSupported(Algorithm::Aes256Cbc))
        ));
    }

    #[test]
    fn unknown_key_id_is_its_own_error() {
        let svc = service(Algorithm::Aes256Gcm);
        let payload = svc.encrypt(b"x").unwrap();
        assert!(matches!(
            svc.decrypt(
                &payload.result.cipher,
                "ghost",
                payload.algorithm,
                &payload.result.metadata(),
            ),
            Err(CryptoError::CryptoKeyNotFound(id)) if id == "ghost"
        ));
    }

    #[test]
    fn construction_rejects_export_without_active_material() {
        let mut bad = export("k1", &["k2"], 32);
        bad.active_key_id = "k1".into();
        assert!(matches!(
            ReversibleCryptoService::new(
                Arc::new(AlgorithmRegistry::standard()),
                bad,
                Algorithm::Aes256Gcm,
            ),
            Err(CryptoError::CryptoKeyNotFound(_))
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_closed() {
        let svc = service(Algorithm::Aes256Gcm);
        let payload = svc.encrypt(b"integrity matters").unwrap();
        let mut cipher = payload.result.cipher.clone();
        cipher[0] ^= 0x01;
        assert!(matches!(
            svc.decrypt(&cipher, "k1", payload.algorithm, &payload.result.metadata()),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn tampered_tag_fails_closed() {
        let svc = service(Algorithm::ChaCha20Poly1305);
        let payload = svc.encrypt(b"integrity matters").unwrap();
        let mut metadata = payload.result.metadata();
        if let Some(tag) = metadata.tag.as_mut() {
            tag[0] ^= 0x01;
        }
        assert!(matches!(
            svc.decrypt(&payload.result.cipher, "k1", payload.algorithm, &metadata),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn missing_metadata_collapses_to_decryption_failed() {
        let svc = service(Algorithm::Aes256Gcm);
        let payload = svc.encrypt(b"x").unwrap();
        let err = svc.decrypt(
            &payload.result.cipher,
            "k1",
            payload.algorithm,
            &CryptoMetadata::default(),
        );
        assert!(matches!(err, Err(CryptoError::DecryptionFailed(_))));
        // The message never says which input was wrong.
        assert_eq!(err.unwrap_err().to_string(), "decryption failed");
    }

    #[test]
    fn old_ciphertext_survives_rotation() {
        let provider = InMemoryKeyProvider::with_keys(vec![
            Key::new("k1", KeyMaterial::new(vec![0x11; 32]), KeyStatus::Active),
            Key::new("k2", KeyMaterial::new(vec![0x22; 32]), KeyStatus::Inactive),
        ])
        .unwrap();
        let rotation = KeyRotationService::new(Arc::new(provider));
        let registry = Arc::new(AlgorithmRegistry::standard());

        let before = ReversibleCryptoService::new(
            registry.clone(),
            rotation.export_for_crypto().unwrap(),
            Algorithm::Aes256Gcm,
        )
        .unwrap();
        let envelope = before.seal(b"written before rotation").unwrap();
        assert_eq!(envelope.key_id, "k1");

        rotation.rotate_to("k2").unwrap();

        let after = ReversibleCryptoService::new(
            registry,
            rotation.export_for_crypto().unwrap(),
            Algorithm::Aes256Gcm,
        )
        .unwrap();
        assert_eq!(after.active_key_id(), "k2");
        // New writes go under k2, old reads still resolve k1 by envelope id.
        assert_eq!(after.seal(b"new").unwrap().key_id, "k2");
        assert_eq!(after.open(&envelope).unwrap(), b"written before rotation");
    }
}
