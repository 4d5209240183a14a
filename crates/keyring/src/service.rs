//! [`KeyRotationService`]: the façade other subsystems call.
//!
//! Orchestrates [`KeyRotationPolicy`] decisions over an injected
//! [`KeyProvider`]. Stateless and safe for concurrent use: the service holds
//! only the provider reference and a copy of the (zero-sized) policy.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use keywheel_common::CryptoError;

use crate::key::{Key, KeyMaterial, KeyStatus};
use crate::policy::KeyRotationPolicy;
use crate::provider::KeyProvider;

/// Result of a readiness check. The only fail-soft surface in the core:
/// health-check call sites get a report instead of an exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the key-set invariants hold.
    pub ok: bool,
    /// Human-readable failure reason when `ok` is false.
    pub reason: Option<String>,
}

/// Crypto-ready export of the whole key set.
///
/// The only place raw material leaves the rotation boundary. Consumed by a
/// crypto-execution layer that needs to resolve keys by id without depending
/// on [`KeyProvider`].
#[derive(Debug)]
pub struct CryptoKeyExport {
    /// Every decryptable key's raw material, keyed by id.
    pub keys: HashMap<String, KeyMaterial>,
    /// Id of the key new ciphertext must be produced under.
    pub active_key_id: String,
}

/// Read-only partition of the key set by status, for audit and debug
/// surfaces.
///
/// The [`Key`] values still carry raw material in memory; anything formatting
/// this for logs or UI must rely on the redacted `Debug` of
/// [`KeyMaterial`] and must not extract the bytes.
#[derive(Debug)]
pub struct KeySetSnapshot {
    /// The single active key, if the set currently has one.
    pub active: Option<Key>,
    /// Keys rotated out but still decryptable.
    pub inactive: Vec<Key>,
    /// Keys at administrative end-of-life.
    pub retired: Vec<Key>,
}

/// Outcome of a rotation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationOutcome {
    /// Id of the key that is active after the call.
    pub new_active_key_id: String,
    /// Id of the key that was active before the call.
    ///
    /// Best-effort under concurrent rotation: the value is read before the
    /// provider's atomic swap, so two racing `rotate_to` calls may both
    /// report the same previous id. The key set itself never tears — only
    /// this report field is affected.
    pub previous_active_key_id: String,
    /// `false` when the request was an idempotent no-op.
    pub rotation_occurred: bool,
}

/// Orchestrates key rotation over an injected provider.
#[derive(Clone)]
pub struct KeyRotationService {
    provider: Arc<dyn KeyProvider>,
    policy: KeyRotationPolicy,
}

impl KeyRotationService {
    /// Build a service over `provider`.
    pub fn new(provider: Arc<dyn KeyProvider>) -> Self {
        Self {
            provider,
            policy: KeyRotationPolicy,
        }
    }

    /// Run the policy invariant check and fold the result into a
    /// [`ValidationReport`].
    ///
    /// This is deliberately the single fail-soft boundary in the core, so
    /// readiness probes can report status without crashing. Everywhere else,
    /// errors propagate.
    pub fn validate(&self) -> ValidationReport {
        match self.policy.validate(self.provider.as_ref()) {
            Ok(()) => ValidationReport {
                ok: true,
                reason: None,
            },
            Err(e) => {
                warn!(error = %e, "key set failed validation");
                ValidationReport {
                    ok: false,
                    reason: Some(e.to_string()),
                }
            }
        }
    }

    /// The key new ciphertext must be produced under.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if no key is active.
    pub fn active_encryption_key(&self) -> Result<Key, CryptoError> {
        self.policy.encryption_key(self.provider.as_ref())
    }

    /// The key to decrypt ciphertext produced under `key_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] for unknown ids.
    pub fn decryption_key(&self, key_id: &str) -> Result<Key, CryptoError> {
        self.policy.decryption_key(self.provider.as_ref(), key_id)
    }

    /// Export raw material for every decryptable key plus the active id, for
    /// consumption by a crypto-execution layer.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if no active key resolves, and
    /// propagates provider failures.
    pub fn export_for_crypto(&self) -> Result<CryptoKeyExport, CryptoError> {
        let active = self.policy.encryption_key(self.provider.as_ref())?;
        let keys = self
            .provider
            .all()?
            .into_iter()
            .filter(|k| k.status().can_decrypt())
            .map(|k| (k.id().to_owned(), k.material().clone()))
            .collect();
        Ok(CryptoKeyExport {
            keys,
            active_key_id: active.id().to_owned(),
        })
    }

    /// Partition the key set by lifecycle status.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub fn snapshot(&self) -> Result<KeySetSnapshot, CryptoError> {
        let mut snapshot = KeySetSnapshot {
            active: None,
            inactive: Vec::new(),
            retired: Vec::new(),
        };
        for key in self.provider.all()? {
            match key.status() {
                KeyStatus::Active => snapshot.active = Some(key),
                KeyStatus::Inactive => snapshot.inactive.push(key),
                KeyStatus::Retired => snapshot.retired.push(key),
            }
        }
        Ok(snapshot)
    }

    /// Make `new_active_key_id` the active key.
    ///
    /// Idempotent: requesting the currently-active key is a no-op reported
    /// with `rotation_occurred = false`. Atomicity of the underlying swap is
    /// the provider's contract; the `previous_active_key_id` in the outcome
    /// is read before the swap and is best-effort when rotations race (see
    /// [`RotationOutcome`]).
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if either the current active key
    /// or the target is absent, and [`CryptoError::PolicyViolation`] if the
    /// target is retired.
    pub fn rotate_to(&self, new_active_key_id: &str) -> Result<RotationOutcome, CryptoError> {
        let current = self.policy.encryption_key(self.provider.as_ref())?;

        if current.id() == new_active_key_id {
            info!(key_id = %current.id(), "rotation requested to already-active key; no-op");
            return Ok(RotationOutcome {
                new_active_key_id: current.id().to_owned(),
                previous_active_key_id: current.id().to_owned(),
                rotation_occurred: false,
            });
        }

        self.provider.promote(new_active_key_id)?;
        info!(
            previous = %current.id(),
            new = %new_active_key_id,
            "rotated active key"
        );
        Ok(RotationOutcome {
            new_active_key_id: new_active_key_id.to_owned(),
            previous_active_key_id: current.id().to_owned(),
            rotation_occurred: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyMaterial;
    use crate::memory::InMemoryKeyProvider;
    use crate::provider::MockKeyProvider;

    fn key(id: &str, status: KeyStatus) -> Key {
        Key::new(id, KeyMaterial::new(vec![0x33; 32]), status)
    }

    fn service_with_keys(keys: Vec<Key>) -> KeyRotationService {
        let provider = InMemoryKeyProvider::with_keys(keys).unwrap();
        KeyRotationService::new(Arc::new(provider))
    }

    #[test]
    fn validate_reports_ok_for_healthy_set() {
        let service = service_with_keys(vec![
            key("k1", KeyStatus::Active),
            key("k2", KeyStatus::Inactive),
        ]);
        let report = service.validate();
        assert!(report.ok);
        assert!(report.reason.is_none());
    }

    #[test]
    fn validate_reports_reason_instead_of_failing() {
        let service = service_with_keys(vec![key("k1", KeyStatus::Inactive)]);
        let report = service.validate();
        assert!(!report.ok);
        assert!(report.reason.unwrap().contains("no active key"));
    }

    #[test]
    fn rotate_to_swaps_and_reports_transition() {
        let service = service_with_keys(vec![
            key("k1", KeyStatus::Active),
            key("k2", KeyStatus::Inactive),
        ]);
        let outcome = service.rotate_to("k2").unwrap();
        assert_eq!(
            outcome,
            RotationOutcome {
                new_active_key_id: "k2".into(),
                previous_active_key_id: "k1".into(),
                rotation_occurred: true,
            }
        );
        assert_eq!(service.active_encryption_key().unwrap().id(), "k2");
        assert_eq!(
            service.decryption_key("k1").unwrap().status(),
            KeyStatus::Inactive
        );
    }

    #[test]
    fn rotate_to_same_key_twice_is_idempotent() {
        let service = service_with_keys(vec![
            key("k1", KeyStatus::Active),
            key("k2", KeyStatus::Inactive),
        ]);
        let first = service.rotate_to("k2").unwrap();
        assert!(first.rotation_occurred);

        let second = service.rotate_to("k2").unwrap();
        assert!(!second.rotation_occurred);
        assert_eq!(second.previous_active_key_id, "k2");

        // Provider state is unchanged by the no-op.
        let snapshot = service.snapshot().unwrap();
        assert_eq!(snapshot.active.unwrap().id(), "k2");
        assert_eq!(snapshot.inactive.len(), 1);
    }

    #[test]
    fn rotate_to_unknown_key_fails_and_keeps_state() {
        let service = service_with_keys(vec![key("k1", KeyStatus::Active)]);
        assert!(matches!(
            service.rotate_to("missing"),
            Err(CryptoError::KeyNotFound(_))
        ));
        assert_eq!(service.active_encryption_key().unwrap().id(), "k1");
    }

    #[test]
    fn export_contains_every_key_and_the_active_id() {
        let service = service_with_keys(vec![
            key("k1", KeyStatus::Active),
            key("k2", KeyStatus::Inactive),
            key("k3", KeyStatus::Retired),
        ]);
        let export = service.export_for_crypto().unwrap();
        assert_eq!(export.active_key_id, "k1");
        // Retired keys stay decryptable, so they are exported too.
        assert_eq!(export.keys.len(), 3);
        assert!(export.keys.contains_key("k3"));
    }

    #[test]
    fn export_fails_without_an_active_key() {
        let service = service_with_keys(vec![key("k1", KeyStatus::Inactive)]);
        assert!(matches!(
            service.export_for_crypto(),
            Err(CryptoError::KeyNotFound(_))
        ));
    }

    #[test]
    fn snapshot_partitions_by_status() {
        let service = service_with_keys(vec![
            key("k1", KeyStatus::Active),
            key("k2", KeyStatus::Inactive),
            key("k3", KeyStatus::Inactive),
            key("k4", KeyStatus::Retired),
        ]);
        let snapshot = service.snapshot().unwrap();
        assert_eq!(snapshot.active.unwrap().id(), "k1");
        assert_eq!(snapshot.inactive.len(), 2);
        assert_eq!(snapshot.retired.len(), 1);
    }

    #[test]
    fn provider_failure_propagates_through_export() {
        let mut provider = MockKeyProvider::new();
        provider
            .expect_active()
            .returning(|| Ok(key("k1", KeyStatus::Active)));
        provider
            .expect_all()
            .returning(|| Err(CryptoError::Storage("backend offline".into())));
        let service = KeyRotationService::new(Arc::new(provider));
        assert!(matches!(
            service.export_for_crypto(),
            Err(CryptoError::Storage(_))
        ));
    }
}
