//! AEAD suites: AES-256-GCM, AES-128-GCM, and ChaCha20-Poly1305.
//!
//! All three run through one generic helper over the shared `aead` traits.
//! A fresh random nonce is generated per call — nonce reuse under GCM is
//! catastrophic, breaking both confidentiality and authentication.

use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{AeadInPlace, KeyInit, Nonce, OsRng, Tag};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use chacha20poly1305::ChaCha20Poly1305;

use keywheel_common::{CryptoError, CryptoMetadata, EncryptionResult};

use super::SuiteError;
use crate::contract::CipherAlgorithm;

/// AES-256-GCM. Recommended default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256GcmSuite;

/// AES-128-GCM. Approved for interoperability with existing ciphertext.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes128GcmSuite;

/// ChaCha20-Poly1305. Recommended where constant-time software performance
/// matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaCha20Poly1305Suite;

impl CipherAlgorithm for Aes256GcmSuite {
    fn encrypt(&self, plaintext: &[u8], key: &[u8]) -> Result<EncryptionResult, CryptoError> {
        aead_encrypt::<Aes256Gcm>(plaintext, key)
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &[u8],
        metadata: &CryptoMetadata,
    ) -> Result<Vec<u8>, CryptoError> {
        aead_decrypt::<Aes256Gcm>(ciphertext, key, metadata)
    }
}

impl CipherAlgorithm for Aes128GcmSuite {
    fn encrypt(&self, plaintext: &[u8], key: &[u8]) -> Result<EncryptionResult, CryptoError> {
        aead_encrypt::<Aes128Gcm>(plaintext, key)
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &[u8],
        metadata: &CryptoMetadata,
    ) -> Result<Vec<u8>, CryptoError> {
        aead_decrypt::<Aes128Gcm>(ciphertext, key, metadata)
    }
}

impl CipherAlgorithm for ChaCha20Poly1305Suite {
    fn encrypt(&self, plaintext: &[u8], key: &[u8]) -> Result<EncryptionResult, CryptoError> {
        aead_encrypt::<ChaCha20Poly1305>(plaintext, key)
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &[u8],
        metadata: &CryptoMetadata,
    ) -> Result<Vec<u8>, CryptoError> {
        aead_decrypt::<ChaCha20Poly1305>(ciphertext, key, metadata)
    }
}

fn invalid_key_length<C: KeyInit>(got: usize) -> SuiteError {
    SuiteError::InvalidKeyLength {
        expected: C::KeySize::USIZE,
        got,
    }
}

fn aead_encrypt<C>(plaintext: &[u8], key: &[u8]) -> Result<EncryptionResult, CryptoError>
where
    C: AeadInPlace + KeyInit,
{
    let cipher = C::new_from_slice(key)
        .map_err(|_| CryptoError::EncryptionFailed(invalid_key_length::<C>(key.len()).to_string()))?;

    // OS CSPRNG nonce, fresh per call.
    let mut nonce_bytes = vec![0u8; C::NonceSize::USIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::<C>::from_slice(&nonce_bytes);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(nonce, b"", &mut buffer)
        .map_err(|_| CryptoError::EncryptionFailed(SuiteError::AeadFailure.to_string()))?;

    Ok(EncryptionResult {
        cipher: buffer,
        iv: Some(nonce_bytes),
        tag: Some(tag.to_vec()),
    })
}

fn aead_decrypt<C>(
    ciphertext: &[u8],
    key: &[u8],
    metadata: &CryptoMetadata,
) -> Result<Vec<u8>, CryptoError>
where
    C: AeadInPlace + KeyInit,
{
    let cipher = C::new_from_slice(key)
        .map_err(|_| CryptoError::decryption(invalid_key_length::<C>(key.len())))?;

    let iv = metadata
        .iv
        .as_deref()
        .filter(|iv| iv.len() == C::NonceSize::USIZE)
        .ok_or_else(|| CryptoError::decryption(SuiteError::BadIv))?;
    let nonce = Nonce::<C>::from_slice(iv);

    let tag_bytes = metadata
        .tag
        .as_deref()
        .filter(|tag| tag.len() == C::TagSize::USIZE)
        .ok_or_else(|| CryptoError::decryption(SuiteError::BadTag))?;
    let tag = Tag::<C>::from_slice(tag_bytes);

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(nonce, b"", &mut buffer, tag)
        .map_err(|_| CryptoError::decryption(SuiteError::AeadFailure))?;
    Ok(buffer)
}
