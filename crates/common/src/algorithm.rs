//! The closed catalog of approved reversible encryption algorithms.
//!
//! This enum is a security decision surface: adding a variant is equivalent to
//! approving a new cipher for production use. Callers never instantiate cipher
//! implementations from it directly — they ask an `AlgorithmRegistry` whether
//! a variant is currently wired up, so an environment can forbid an algorithm
//! by simply not registering it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Approved reversible encryption algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// AES-256-GCM — AEAD, 256-bit key, 96-bit nonce, 128-bit tag.
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,

    /// AES-128-GCM — AEAD, 128-bit key. Approved but not recommended for
    /// new data; retained for interoperability with existing ciphertext.
    #[serde(rename = "aes-128-gcm")]
    Aes128Gcm,

    /// ChaCha20-Poly1305 — AEAD, 256-bit key, constant-time in software.
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,

    /// AES-256-CBC — **unauthenticated**, legacy-only. Requires an IV,
    /// produces no tag. Must be explicitly enabled via configuration.
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
}

impl Algorithm {
    /// Every variant, in catalog order. Useful for exhaustive registry
    /// construction and metadata tests.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Aes256Gcm,
        Algorithm::Aes128Gcm,
        Algorithm::ChaCha20Poly1305,
        Algorithm::Aes256Cbc,
    ];

    /// Returns `true` if this algorithm needs an IV/nonce supplied alongside
    /// the ciphertext. True for every catalog entry today, but decrypt paths
    /// must consult this rather than assume.
    pub const fn requires_iv(self) -> bool {
        match self {
            Algorithm::Aes256Gcm
            | Algorithm::Aes128Gcm
            | Algorithm::ChaCha20Poly1305
            | Algorithm::Aes256Cbc => true,
        }
    }

    /// Returns `true` if this algorithm produces and requires an
    /// authentication tag.
    pub const fn requires_tag(self) -> bool {
        self.is_aead()
    }

    /// Returns `true` for authenticated (AEAD) modes.
    pub const fn is_aead(self) -> bool {
        match self {
            Algorithm::Aes256Gcm | Algorithm::Aes128Gcm | Algorithm::ChaCha20Poly1305 => true,
            Algorithm::Aes256Cbc => false,
        }
    }

    /// Returns `true` for the algorithms recommended for newly encrypted
    /// data. AES-128-GCM is approved but below the preferred security margin;
    /// AES-256-CBC is legacy-only.
    pub const fn is_recommended(self) -> bool {
        matches!(self, Algorithm::Aes256Gcm | Algorithm::ChaCha20Poly1305)
    }

    /// Required key length in bytes.
    pub const fn key_len(self) -> usize {
        match self {
            Algorithm::Aes256Gcm | Algorithm::ChaCha20Poly1305 | Algorithm::Aes256Cbc => 32,
            Algorithm::Aes128Gcm => 16,
        }
    }

    /// Required IV/nonce length in bytes.
    pub const fn iv_len(self) -> usize {
        match self {
            Algorithm::Aes256Gcm | Algorithm::Aes128Gcm | Algorithm::ChaCha20Poly1305 => 12,
            Algorithm::Aes256Cbc => 16,
        }
    }

    /// Authentication tag length in bytes, or `None` for unauthenticated
    /// modes.
    pub const fn tag_len(self) -> Option<usize> {
        match self {
            Algorithm::Aes256Gcm | Algorithm::Aes128Gcm | Algorithm::ChaCha20Poly1305 => Some(16),
            Algorithm::Aes256Cbc => None,
        }
    }

    /// Stable identifier used in envelopes and configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Algorithm::Aes256Gcm => "aes-256-gcm",
            Algorithm::Aes128Gcm => "aes-128-gcm",
            Algorithm::ChaCha20Poly1305 => "chacha20-poly1305",
            Algorithm::Aes256Cbc => "aes-256-cbc",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown algorithm identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown algorithm identifier: {0}")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aes-256-gcm" => Ok(Algorithm::Aes256Gcm),
            "aes-128-gcm" => Ok(Algorithm::Aes128Gcm),
            "chacha20-poly1305" => Ok(Algorithm::ChaCha20Poly1305),
            "aes-256-cbc" => Ok(Algorithm::Aes256Cbc),
            other => Err(UnknownAlgorithm(other.to_owned())),
        }
    }
}
