//! AES-256-CBC with PKCS#7 padding. Legacy-only.
//!
//! CBC provides no authentication: tampering is not reliably detected, and
//! careless deployment invites padding-oracle attacks. The suite exists to
//! read ciphertext from systems that predate the AEAD catalog entries and is
//! only registered when configuration explicitly allows it.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use rand::rngs::OsRng;
use rand::RngCore;

use keywheel_common::{Algorithm, CryptoError, CryptoMetadata, EncryptionResult};

use super::SuiteError;
use crate::contract::CipherAlgorithm;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES-256-CBC suite. See the module docs for the restrictions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256CbcSuite;

impl CipherAlgorithm for Aes256CbcSuite {
    fn encrypt(&self, plaintext: &[u8], key: &[u8]) -> Result<EncryptionResult, CryptoError> {
        let mut iv = [0u8; 16];
        OsRng.fill_bytes(&mut iv);

        let encryptor = Aes256CbcEnc::new_from_slices(key, &iv).map_err(|_| {
            CryptoError::EncryptionFailed(
                SuiteError::InvalidKeyLength {
                    expected: Algorithm::Aes256Cbc.key_len(),
                    got: key.len(),
                }
                .to_string(),
            )
        })?;
        let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        Ok(EncryptionResult {
            cipher: ciphertext,
            iv: Some(iv.to_vec()),
            tag: None,
        })
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &[u8],
        metadata: &CryptoMetadata,
    ) -> Result<Vec<u8>, CryptoError> {
        let iv = metadata
            .iv
            .as_deref()
            .filter(|iv| iv.len() == Algorithm::Aes256Cbc.iv_len())
            .ok_or_else(|| CryptoError::decryption(SuiteError::BadIv))?;

        let decryptor = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| {
            CryptoError::decryption(SuiteError::InvalidKeyLength {
                expected: Algorithm::Aes256Cbc.key_len(),
                got: key.len(),
            })
        })?;
        decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::decryption(SuiteError::BadPadding))
    }
}
