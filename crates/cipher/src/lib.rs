//! Cipher execution: algorithm suites, the registry, and the
//! envelope-encryption service.
//!
//! The crate sits above `keywheel-keyring`: the rotation layer decides which
//! keys exist and which one is active; this crate turns an exported key set
//! into encrypt/decrypt operations. See [`service::ReversibleCryptoService`]
//! for the main entry point.

pub mod config;
pub mod contract;
pub mod registry;
pub mod service;
pub mod suites;
pub mod telemetry;

pub use config::CryptoConfig;
pub use contract::CipherAlgorithm;
pub use registry::AlgorithmRegistry;
pub use service::{EncryptedPayload, ReversibleCryptoService};
pub use suites::{Aes128GcmSuite, Aes256CbcSuite, Aes256GcmSuite, ChaCha20Poly1305Suite};
