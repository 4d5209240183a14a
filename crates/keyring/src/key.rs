//! The [`Key`] value object and its lifecycle status.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Lifecycle status of a key.
///
/// Transitions form `Active ⇄ Inactive → Retired`; `Retired` is terminal and
/// a retired key is never promoted back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    /// The single key new ciphertext is produced under.
    Active,
    /// Rotated out; still valid for decryption.
    Inactive,
    /// Administrative end-of-life: decrypt-only, candidate for eventual purge.
    Retired,
}

impl KeyStatus {
    /// Only the active key may encrypt.
    pub const fn can_encrypt(self) -> bool {
        matches!(self, KeyStatus::Active)
    }

    /// Every status may decrypt — rotated-out keys remain usable for old
    /// ciphertext indefinitely; rotation never forces re-encryption.
    pub const fn can_decrypt(self) -> bool {
        match self {
            KeyStatus::Active | KeyStatus::Inactive | KeyStatus::Retired => true,
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyStatus::Active => "active",
            KeyStatus::Inactive => "inactive",
            KeyStatus::Retired => "retired",
        };
        f.write_str(s)
    }
}

/// Raw symmetric key bytes.
///
/// The buffer is zeroed when dropped, and the `Debug` impl never prints the
/// material — not even in debug builds. This type deliberately has no serde
/// support: raw material must never cross a serialization boundary.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    /// Wrap raw key bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes. Callers must not copy them into logs, error
    /// messages, or serialized structures.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the key material in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the material is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}

impl From<Vec<u8>> for KeyMaterial {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// An immutable key: identity + raw material + lifecycle status.
///
/// Status transitions go through [`Key::with_status`], which builds a new
/// value instead of mutating in place, so old snapshots stay safe to share
/// across threads.
#[derive(Debug, Clone)]
pub struct Key {
    id: String,
    material: KeyMaterial,
    status: KeyStatus,
    created_at: DateTime<Utc>,
}

impl Key {
    /// Construct a key with an operator-assigned id.
    ///
    /// Ids are stable and never reused; assigning them is an out-of-band
    /// operator action.
    pub fn new(id: impl Into<String>, material: KeyMaterial, status: KeyStatus) -> Self {
        Self {
            id: id.into(),
            material,
            status,
            created_at: Utc::now(),
        }
    }

    /// Construct a key with a freshly generated UUID id.
    pub fn with_generated_id(material: KeyMaterial, status: KeyStatus) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), material, status)
    }

    /// Stable identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw key material. See [`KeyMaterial`] for handling rules.
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// Current lifecycle status.
    pub fn status(&self) -> KeyStatus {
        self.status
    }

    /// Creation timestamp, for audit ordering.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Return a copy of this key with a new status. The original is left
    /// untouched.
    pub fn with_status(&self, status: KeyStatus) -> Self {
        Self {
            id: self.id.clone(),
            material: self.material.clone(),
            status,
            created_at: self.created_at,
        }
    }
}
