//! Envelope value objects: cipher output, decrypt metadata, and the durable
//! storage format.
//!
//! # Envelope string format
//!
//! ```text
//! v1.<base64url(key_id)>.<algorithm>.<base64url(iv)>.<base64url(tag)>.<base64url(ciphertext)>
//! ```
//!
//! All base64 segments use URL-safe encoding without padding. The iv and tag
//! segments are empty when the algorithm does not use them; presence is
//! validated against the algorithm's structural metadata on both encode and
//! parse. The `v1` prefix enables future format migration without breaking
//! existing ciphertext.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;
use crate::error::CryptoError;

/// Prefix that appears at the start of every envelope string.
pub const VERSION_PREFIX: &str = "v1";

/// Output of a single cipher encryption call.
///
/// Presence of `iv` and `tag` is dictated by the algorithm that produced the
/// result, never by caller choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionResult {
    /// Raw ciphertext bytes (tag excluded — AEAD tags are detached).
    pub cipher: Vec<u8>,
    /// IV/nonce used for this operation, if the algorithm takes one.
    pub iv: Option<Vec<u8>>,
    /// Detached authentication tag, for AEAD algorithms only.
    pub tag: Option<Vec<u8>>,
}

impl EncryptionResult {
    /// Extract the decrypt-side metadata (iv + tag) from this result.
    pub fn metadata(&self) -> CryptoMetadata {
        CryptoMetadata {
            iv: self.iv.clone(),
            tag: self.tag.clone(),
        }
    }
}

/// Input metadata required to decrypt a ciphertext.
///
/// Must match what the chosen algorithm requires; the decrypt path fails
/// closed when a required field is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CryptoMetadata {
    /// IV/nonce stored alongside the ciphertext.
    pub iv: Option<Vec<u8>>,
    /// Authentication tag stored alongside the ciphertext.
    pub tag: Option<Vec<u8>>,
}

/// The durable envelope: ciphertext plus everything needed to decrypt it
/// later, independent of which key is active at that point.
///
/// Losing any field makes the ciphertext unrecoverable, so the whole value is
/// what callers must persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Id of the key the ciphertext was produced under.
    pub key_id: String,
    /// Algorithm the ciphertext was produced with.
    pub algorithm: Algorithm,
    /// Raw ciphertext bytes.
    pub cipher: Vec<u8>,
    /// IV/nonce, when the algorithm uses one.
    pub iv: Option<Vec<u8>>,
    /// Detached authentication tag, for AEAD algorithms.
    pub tag: Option<Vec<u8>>,
}

impl Envelope {
    /// Assemble an envelope from a cipher result and the key/algorithm pair
    /// that produced it.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidEnvelope`] if the result's iv/tag shape
    /// does not match the algorithm's structural requirements.
    pub fn new(
        key_id: impl Into<String>,
        algorithm: Algorithm,
        result: EncryptionResult,
    ) -> Result<Self, CryptoError> {
        let envelope = Self {
            key_id: key_id.into(),
            algorithm,
            cipher: result.cipher,
            iv: result.iv,
            tag: result.tag,
        };
        envelope.check_shape()?;
        Ok(envelope)
    }

    /// Extract the decrypt-side metadata (iv + tag).
    pub fn metadata(&self) -> CryptoMetadata {
        CryptoMetadata {
            iv: self.iv.clone(),
            tag: self.tag.clone(),
        }
    }

    /// Encode this envelope to its canonical string representation.
    pub fn to_string_repr(&self) -> String {
        let b64 = |bytes: &Option<Vec<u8>>| {
            bytes
                .as_ref()
                .map(|b| URL_SAFE_NO_PAD.encode(b))
                .unwrap_or_default()
        };
        format!(
            "{}.{}.{}.{}.{}.{}",
            VERSION_PREFIX,
            URL_SAFE_NO_PAD.encode(self.key_id.as_bytes()),
            self.algorithm,
            b64(&self.iv),
            b64(&self.tag),
            URL_SAFE_NO_PAD.encode(&self.cipher),
        )
    }

    /// Parse an envelope string back into an [`Envelope`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidEnvelope`] if the string does not match
    /// the expected structure, names an unknown algorithm, or carries an
    /// iv/tag shape the named algorithm does not permit.
    pub fn from_str_repr(s: &str) -> Result<Self, CryptoError> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 6 || parts[0] != VERSION_PREFIX {
            return Err(CryptoError::InvalidEnvelope(
                "expected v1.<key>.<alg>.<iv>.<tag>.<cipher>".into(),
            ));
        }

        let key_id_bytes = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| CryptoError::InvalidEnvelope("key id is not valid base64".into()))?;
        let key_id = String::from_utf8(key_id_bytes)
            .map_err(|_| CryptoError::InvalidEnvelope("key id is not valid UTF-8".into()))?;

        let algorithm: Algorithm = parts[2]
            .parse()
            .map_err(|e| CryptoError::InvalidEnvelope(format!("{e}")))?;

        let decode_opt = |segment: &str, name: &str| -> Result<Option<Vec<u8>>, CryptoError> {
            if segment.is_empty() {
                return Ok(None);
            }
            URL_SAFE_NO_PAD
                .decode(segment)
                .map(Some)
                .map_err(|_| CryptoError::InvalidEnvelope(format!("{name} is not valid base64")))
        };

        let envelope = Self {
            key_id,
            algorithm,
            iv: decode_opt(parts[3], "iv")?,
            tag: decode_opt(parts[4], "tag")?,
            cipher: URL_SAFE_NO_PAD
                .decode(parts[5])
                .map_err(|_| CryptoError::InvalidEnvelope("cipher is not valid base64".into()))?,
        };
        envelope.check_shape()?;
        Ok(envelope)
    }

    /// Validate iv/tag presence and lengths against the algorithm's metadata.
    fn check_shape(&self) -> Result<(), CryptoError> {
        let alg = self.algorithm;
        match (&self.iv, alg.requires_iv()) {
            (Some(iv), true) if iv.len() == alg.iv_len() => {}
            (None, false) => {}
            (Some(_), true) => {
                return Err(CryptoError::InvalidEnvelope(format!(
                    "{alg} requires a {}-byte iv",
                    alg.iv_len()
                )))
            }
            (Some(_), false) => {
                return Err(CryptoError::InvalidEnvelope(format!(
                    "{alg} does not take an iv"
                )))
            }
            (None, true) => {
                return Err(CryptoError::InvalidEnvelope(format!("{alg} requires an iv")))
            }
        }
        match (&self.tag, alg.tag_len()) {
            (Some(tag), Some(len)) if tag.len() == len => {}
            (None, None) => {}
            (Some(_), Some(len)) => {
                return Err(CryptoError::InvalidEnvelope(format!(
                    "{alg} requires a {len}-byte tag"
                )))
            }
            (Some(_), None) => {
                return Err(CryptoError::InvalidEnvelope(format!(
                    "{alg} does not produce a tag"
                )))
            }
            (None, Some(_)) => {
                return Err(CryptoError::InvalidEnvelope(format!("{alg} requires a tag")))
            }
        }
        Ok(())
    }
}
