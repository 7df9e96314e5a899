//! Authenticated field cipher.
//!
//! AES-256-GCM with a fresh random 96-bit nonce per call. The stored form is
//! standard base64 of `nonce || ciphertext || tag`, so equal plaintexts do not
//! produce equal ciphertexts.
//!
//! The key is derived once from a server secret; the derived key never leaves
//! this type.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LABEL: &[u8] = b"safeaid.field-encryption.v1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("decryption failed")]
    DecryptionFailure,
}

/// Ciphertext of one sensitive field, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedField(String);

impl EncryptedField {
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Encrypts and decrypts UTF-8 field values under one derived key.
#[derive(Clone)]
pub struct FieldCipher {
    aead: Aes256Gcm,
}

impl core::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// Derive the field key from a server secret.
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Result<Self, CipherError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(CipherError::InvalidInput("encryption secret must not be empty"));
        }

        let mut hasher = Sha256::new();
        hasher.update(KEY_LABEL);
        hasher.update(secret);
        let digest = hasher.finalize();

        let key = Key::<Aes256Gcm>::from_slice(digest.as_slice());
        Ok(Self {
            aead: Aes256Gcm::new(key),
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedField, CipherError> {
        if plaintext.is_empty() {
            return Err(CipherError::InvalidInput("cannot encrypt an empty value"));
        }

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .aead
            .encrypt(&nonce, plaintext.as_bytes())
            // Only fails on plaintexts beyond AES-GCM's length limit.
            .map_err(|_| CipherError::InvalidInput("value too large to encrypt"))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&ciphertext);
        Ok(EncryptedField(STANDARD.encode(out)))
    }

    pub fn decrypt(&self, field: &EncryptedField) -> Result<String, CipherError> {
        if field.0.is_empty() {
            return Err(CipherError::InvalidInput("cannot decrypt an empty value"));
        }

        let raw = STANDARD
            .decode(field.0.as_bytes())
            .map_err(|_| CipherError::InvalidInput("ciphertext is not valid base64"))?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::InvalidInput("ciphertext is truncated"));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .aead
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::DecryptionFailure)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::DecryptionFailure)
    }

    /// Encrypt an optional field; absent and empty values stay absent.
    pub fn encrypt_opt(&self, plaintext: Option<&str>) -> Result<Option<EncryptedField>, CipherError> {
        match plaintext {
            Some(p) if !p.is_empty() => self.encrypt(p).map(Some),
            _ => Ok(None),
        }
    }

    pub fn decrypt_opt(&self, field: Option<&EncryptedField>) -> Result<Option<String>, CipherError> {
        field.map(|f| self.decrypt(f)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cipher() -> FieldCipher {
        FieldCipher::from_secret("unit-test-secret").unwrap()
    }

    #[test]
    fn round_trip() {
        let c = cipher();
        let sealed = c.encrypt("Town A").unwrap();
        assert_ne!(sealed.as_str(), "Town A");
        assert_eq!(c.decrypt(&sealed).unwrap(), "Town A");
    }

    #[test]
    fn equal_plaintexts_get_distinct_ciphertexts() {
        let c = cipher();
        let a = c.encrypt("same").unwrap();
        let b = c.encrypt("same").unwrap();
        assert_ne!(a, b);
        assert_eq!(c.decrypt(&a).unwrap(), c.decrypt(&b).unwrap());
    }

    #[test]
    fn empty_input_is_rejected_both_ways() {
        let c = cipher();
        assert!(matches!(c.encrypt(""), Err(CipherError::InvalidInput(_))));
        assert!(matches!(
            c.decrypt(&EncryptedField::from_stored("")),
            Err(CipherError::InvalidInput(_))
        ));
    }

    #[test]
    fn malformed_ciphertext_is_invalid_input() {
        let c = cipher();
        assert!(matches!(
            c.decrypt(&EncryptedField::from_stored("%%% not base64")),
            Err(CipherError::InvalidInput(_))
        ));
        assert!(matches!(
            c.decrypt(&EncryptedField::from_stored(STANDARD.encode([0u8; 8]))),
            Err(CipherError::InvalidInput(_))
        ));
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let sealed = cipher().encrypt("Town A").unwrap();
        let other = FieldCipher::from_secret("another-secret").unwrap();
        assert_eq!(other.decrypt(&sealed), Err(CipherError::DecryptionFailure));
    }

    #[test]
    fn tampering_is_detected() {
        let c = cipher();
        let sealed = c.encrypt("Town A").unwrap();
        let mut raw = STANDARD.decode(sealed.as_str()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = EncryptedField::from_stored(STANDARD.encode(raw));
        assert_eq!(c.decrypt(&tampered), Err(CipherError::DecryptionFailure));
    }

    #[test]
    fn optional_helpers_skip_absent_values() {
        let c = cipher();
        assert_eq!(c.encrypt_opt(None).unwrap(), None);
        assert_eq!(c.encrypt_opt(Some("")).unwrap(), None);
        let sealed = c.encrypt_opt(Some("asthma")).unwrap();
        assert_eq!(c.decrypt_opt(sealed.as_ref()).unwrap().as_deref(), Some("asthma"));
        assert_eq!(c.decrypt_opt(None).unwrap(), None);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(FieldCipher::from_secret("").is_err());
    }

    #[test]
    fn stored_form_is_a_bare_json_string() {
        let sealed = cipher().encrypt("x").unwrap();
        let json = serde_json::to_value(&sealed).unwrap();
        assert_eq!(json.as_str(), Some(sealed.as_str()));
    }

    proptest! {
        /// Property: decrypt(encrypt(s)) == s for every non-empty string.
        #[test]
        fn decrypt_inverts_encrypt(s in ".{1,200}") {
            let c = cipher();
            let sealed = c.encrypt(&s).unwrap();
            prop_assert_eq!(c.decrypt(&sealed).unwrap(), s);
        }
    }
}
