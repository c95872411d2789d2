//! Token encryption at rest and OAuth state signing.
//!
//! Stored secrets use AES-256-GCM with a versioned prefix so encrypted and
//! plaintext (pre-migration) values can coexist in the same column:
//! `enc:v1:<iv b64>:<tag b64>:<ciphertext b64>`.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::{Aes256Gcm, KeyInit, aead::Aead};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::AdmetraError;

pub const ENCRYPTION_PREFIX: &str = "enc:v1:";
const IV_BYTES: usize = 12;
const TAG_BYTES: usize = 16;

#[derive(Clone)]
pub struct TokenCipher {
    key: [u8; 32],
}

impl TokenCipher {
    /// Build the cipher from a base64-encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, AdmetraError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| AdmetraError::Crypto(format!("token key is not valid base64: {e}")))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AdmetraError::Crypto("token key must be 32 bytes".to_string()))?;
        Ok(Self { key })
    }

    pub fn is_encrypted(value: &str) -> bool {
        value.starts_with(ENCRYPTION_PREFIX)
    }

    /// Encrypt a secret for storage. Empty and already-encrypted values pass
    /// through unchanged.
    pub fn encrypt(&self, value: &str) -> Result<String, AdmetraError> {
        if value.is_empty() || Self::is_encrypted(value) {
            return Ok(value.to_owned());
        }

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let mut iv = [0u8; IV_BYTES];
        rand::thread_rng().fill_bytes(&mut iv);

        let sealed = cipher
            .encrypt(GenericArray::from_slice(&iv), value.as_bytes())
            .map_err(|e| AdmetraError::Crypto(format!("encryption failed: {e}")))?;
        // aes-gcm appends the tag to the ciphertext; store them separately to
        // match the `enc:v1:iv:tag:data` wire format.
        let (body, tag) = sealed.split_at(sealed.len() - TAG_BYTES);

        Ok(format!(
            "enc:v1:{}:{}:{}",
            STANDARD.encode(iv),
            STANDARD.encode(tag),
            STANDARD.encode(body),
        ))
    }

    /// Decrypt a stored secret. Values without the prefix are returned as-is
    /// (plaintext rows written before encryption was enabled).
    pub fn decrypt(&self, value: &str) -> Result<String, AdmetraError> {
        if value.is_empty() || !Self::is_encrypted(value) {
            return Ok(value.to_owned());
        }

        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() != 5 {
            return Err(AdmetraError::Crypto(
                "invalid encrypted payload format".to_string(),
            ));
        }

        let decode = |part: &str| {
            STANDARD
                .decode(part)
                .map_err(|e| AdmetraError::Crypto(format!("invalid encrypted payload: {e}")))
        };
        let iv = decode(parts[2])?;
        let tag = decode(parts[3])?;
        let data = decode(parts[4])?;

        if iv.len() != IV_BYTES || tag.len() != TAG_BYTES {
            return Err(AdmetraError::Crypto(
                "invalid encrypted payload".to_string(),
            ));
        }

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let mut sealed = data;
        sealed.extend_from_slice(&tag);

        let plain = cipher
            .decrypt(GenericArray::from_slice(&iv), sealed.as_slice())
            .map_err(|e| AdmetraError::Crypto(format!("decryption failed: {e}")))?;

        String::from_utf8(plain)
            .map_err(|e| AdmetraError::Crypto(format!("decrypted value is not UTF-8: {e}")))
    }
}

/// HMAC-SHA256 signature over an encoded state payload, base64url-encoded.
pub fn sign_state(secret: &str, payload: &str) -> String {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Constant-time signature check.
pub fn verify_signature(secret: &str, payload: &str, signature: &str) -> bool {
    let expected = sign_state(secret, payload);
    bool::from(expected.as_bytes().ct_eq(signature.as_bytes()))
}
