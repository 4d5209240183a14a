//! Key lifecycle, rotation policy, and rotation orchestration.
//!
//! The model: a [`key::Key`] is an immutable value (id + raw material +
//! lifecycle status); a [`provider::KeyProvider`] holds the key set and
//! persists transitions; [`policy::KeyRotationPolicy`] enforces the
//! exactly-one-active-key invariant; [`service::KeyRotationService`] is the
//! façade everything above this crate calls.

pub mod key;
pub mod memory;
pub mod policy;
pub mod provider;
pub mod service;

pub use key::{Key, KeyMaterial, KeyStatus};
pub use memory::InMemoryKeyProvider;
pub use policy::KeyRotationPolicy;
pub use provider::KeyProvider;
pub use service::{
    CryptoKeyExport, KeyRotationService, KeySetSnapshot, RotationOutcome, ValidationReport,
};
