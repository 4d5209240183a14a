//! In-memory [`KeyProvider`] for tests and embedded deployments.
//!
//! Backed by `arc-swap`: readers load an immutable snapshot of the whole key
//! set without locking, and writers serialize on a mutex before atomically
//! swapping in a replacement snapshot. A concurrent reader therefore always
//! observes either the pre-promote or the post-promote key set, never a state
//! with zero or two active keys.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use keywheel_common::CryptoError;

use crate::key::{Key, KeyStatus};
use crate::provider::KeyProvider;

/// Thread-safe in-memory key set.
#[derive(Debug)]
pub struct InMemoryKeyProvider {
    snapshot: ArcSwap<Vec<Key>>,
    // Serializes register/promote so two writers cannot both derive a new
    // snapshot from the same parent.
    write_lock: Mutex<()>,
}

impl InMemoryKeyProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::new(Arc::new(Vec::new())),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a provider pre-populated with `keys`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`InMemoryKeyProvider::register`] applied to
    /// each key in order.
    pub fn with_keys(keys: impl IntoIterator<Item = Key>) -> Result<Self, CryptoError> {
        let provider = Self::new();
        for key in keys {
            provider.register(key)?;
        }
        Ok(provider)
    }

    /// Register a key created out-of-band.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::PolicyViolation`] if the id is already taken
    /// (ids are never reused) or if the key is active while another active
    /// key exists.
    pub fn register(&self, key: Key) -> Result<(), CryptoError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CryptoError::Storage("key set lock poisoned".into()))?;
        let current = self.snapshot.load();

        if current.iter().any(|k| k.id() == key.id()) {
            return Err(CryptoError::PolicyViolation(format!(
                "key id already registered: {}",
                key.id()
            )));
        }
        if key.status().can_encrypt() && current.iter().any(|k| k.status().can_encrypt()) {
            return Err(CryptoError::PolicyViolation(
                "cannot register a second active key".into(),
            ));
        }

        let mut next = current.as_ref().clone();
        next.push(key);
        self.snapshot.store(Arc::new(next));
        Ok(())
    }

    /// Mark a key retired. Retired keys remain decryptable but can never be
    /// promoted again.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] for an unknown id, or
    /// [`CryptoError::PolicyViolation`] when retiring the active key — it
    /// must be rotated out first.
    pub fn retire(&self, key_id: &str) -> Result<(), CryptoError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CryptoError::Storage("key set lock poisoned".into()))?;
        let current = self.snapshot.load();

        let target = current
            .iter()
            .find(|k| k.id() == key_id)
            .ok_or_else(|| CryptoError::KeyNotFound(key_id.to_owned()))?;
        if target.status() == KeyStatus::Active {
            return Err(CryptoError::PolicyViolation(format!(
                "cannot retire the active key {key_id}; rotate first"
            )));
        }

        let next: Vec<Key> = current
            .iter()
            .map(|k| {
                if k.id() == key_id {
                    k.with_status(KeyStatus::Retired)
                } else {
                    k.clone()
                }
            })
            .collect();
        self.snapshot.store(Arc::new(next));
        Ok(())
    }
}

impl Default for InMemoryKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyProvider for InMemoryKeyProvider {
    fn all(&self) -> Result<Vec<Key>, CryptoError> {
        Ok(self.snapshot.load().as_ref().clone())
    }

    fn active(&self) -> Result<Key, CryptoError> {
        self.snapshot
            .load()
            .iter()
            .find(|k| k.status().can_encrypt())
            .cloned()
            .ok_or_else(|| CryptoError::KeyNotFound("no active key".into()))
    }

    fn find(&self, key_id: &str) -> Result<Key, CryptoError> {
        self.snapshot
            .load()
            .iter()
            .find(|k| k.id() == key_id)
            .cloned()
            .ok_or_else(|| CryptoError::KeyNotFound(key_id.to_owned()))
    }

    fn promote(&self, key_id: &str) -> Result<(), CryptoError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CryptoError::Storage("key set lock poisoned".into()))?;
        let current = self.snapshot.load();

        let target = current
            .iter()
            .find(|k| k.id() == key_id)
            .ok_or_else(|| CryptoError::KeyNotFound(key_id.to_owned()))?;
        if target.status() == KeyStatus::Retired {
            return Err(CryptoError::PolicyViolation(format!(
                "cannot promote retired key {key_id}"
            )));
        }
        if target.status() == KeyStatus::Active {
            return Ok(());
        }

        // Build the post-promote key set and publish it in one atomic swap.
        let next: Vec<Key> = current
            .iter()
            .map(|k| {
                if k.id() == key_id {
                    k.with_status(KeyStatus::Active)
                } else if k.status() == KeyStatus::Active {
                    k.with_status(KeyStatus::Inactive)
                } else {
                    k.clone()
                }
            })
            .collect();
        self.snapshot.store(Arc::new(next));
        Ok(())
    }
}
