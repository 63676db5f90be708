//! At-rest encryption of tenant secrets.
//!
//! Values are stored as a tagged envelope
//! `enc:v1:<iv-b64>:<tag-b64>:<ciphertext-b64>` produced with
//! AES-256-GCM. The cipher key is the SHA-256 digest of a shared
//! application secret, so the envelope format is byte-compatible across
//! restarts as long as the secret is unchanged.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use stratus_core::error::StratusError;
use thiserror::Error;

/// Envelope marker. Values without it are treated as legacy plaintext.
const ENVELOPE_TAG: &str = "enc:v1:";

const NONCE_LEN: usize = 12;
const AUTH_TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum DecryptionError {
    #[error("malformed envelope: {0}")]
    Malformed(&'static str),

    #[error("AES-GCM: {0}")]
    Cipher(String),
}

impl From<DecryptionError> for StratusError {
    fn from(err: DecryptionError) -> Self {
        StratusError::Crypto(err.to_string())
    }
}

/// Symmetric codec over key material held in process memory.
#[derive(Clone)]
pub struct SecretCodec {
    key: [u8; 32],
}

impl SecretCodec {
    /// Derive the 256-bit cipher key by hashing the application secret.
    pub fn new(app_secret: &str) -> Self {
        let mut key = [0u8; 32];
        key.copy_from_slice(&Sha256::digest(app_secret.as_bytes()));
        Self { key }
    }

    /// Encrypt a plaintext value into an `enc:v1:` envelope.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, DecryptionError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // The aead API returns ciphertext || tag; the envelope keeps
        // them in separate segments.
        let mut combined = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| DecryptionError::Cipher(format!("encrypt: {e}")))?;
        let tag = combined.split_off(combined.len() - AUTH_TAG_LEN);

        Ok(format!(
            "{ENVELOPE_TAG}{}:{}:{}",
            STANDARD.encode(nonce_bytes),
            STANDARD.encode(tag),
            STANDARD.encode(combined),
        ))
    }

    /// Decrypt an `enc:v1:` envelope back to plaintext.
    ///
    /// Idempotent on already-plaintext input: anything not starting
    /// with the envelope tag is returned unchanged, which lets
    /// unencrypted legacy values migrate lazily. A malformed envelope
    /// never yields partial plaintext.
    pub fn decrypt(&self, value: &str) -> Result<String, DecryptionError> {
        let Some(body) = value.strip_prefix(ENVELOPE_TAG) else {
            return Ok(value.to_owned());
        };

        let segments: Vec<&str> = body.split(':').collect();
        let [iv_b64, tag_b64, data_b64] = segments.as_slice() else {
            return Err(DecryptionError::Malformed("expected 3 segments"));
        };

        let iv = STANDARD
            .decode(iv_b64)
            .map_err(|_| DecryptionError::Malformed("bad iv base64"))?;
        let tag = STANDARD
            .decode(tag_b64)
            .map_err(|_| DecryptionError::Malformed("bad tag base64"))?;
        let data = STANDARD
            .decode(data_b64)
            .map_err(|_| DecryptionError::Malformed("bad ciphertext base64"))?;

        if iv.len() != NONCE_LEN {
            return Err(DecryptionError::Malformed("wrong iv length"));
        }
        if tag.len() != AUTH_TAG_LEN {
            return Err(DecryptionError::Malformed("wrong tag length"));
        }

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Nonce::from_slice(&iv);

        let mut combined = data;
        combined.extend_from_slice(&tag);

        let plaintext = cipher
            .decrypt(nonce, combined.as_ref())
            .map_err(|e| DecryptionError::Cipher(format!("decrypt: {e}")))?;

        String::from_utf8(plaintext).map_err(|_| DecryptionError::Malformed("not utf-8"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> SecretCodec {
        SecretCodec::new("test-app-secret")
    }

    #[test]
    fn roundtrip() {
        let c = codec();
        let envelope = c.encrypt("auth_abc123").unwrap();
        assert!(envelope.starts_with("enc:v1:"));
        assert_eq!(c.decrypt(&envelope).unwrap(), "auth_abc123");
    }

    #[test]
    fn roundtrip_empty_string() {
        let c = codec();
        let envelope = c.encrypt("").unwrap();
        assert_eq!(c.decrypt(&envelope).unwrap(), "");
    }

    #[test]
    fn roundtrip_unicode() {
        let c = codec();
        let input = "pässwörd-秘密-🔑";
        let envelope = c.encrypt(input).unwrap();
        assert_eq!(c.decrypt(&envelope).unwrap(), input);
    }

    #[test]
    fn plaintext_passes_through_unchanged() {
        let c = codec();
        assert_eq!(c.decrypt("legacy-plain-key").unwrap(), "legacy-plain-key");
        assert_eq!(c.decrypt("").unwrap(), "");
        // A value that merely mentions the tag mid-string is plaintext.
        assert_eq!(c.decrypt("xenc:v1:abc").unwrap(), "xenc:v1:abc");
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        let c = codec();
        let err = c.decrypt("enc:v1:onlytwo:segments").unwrap_err();
        assert!(matches!(err, DecryptionError::Malformed(_)));
    }

    #[test]
    fn bad_base64_is_malformed() {
        let c = codec();
        let err = c.decrypt("enc:v1:!!!:!!!:!!!").unwrap_err();
        assert!(matches!(err, DecryptionError::Malformed(_)));
    }

    #[test]
    fn truncated_iv_is_malformed() {
        let c = codec();
        // 4-byte iv instead of 12.
        let err = c.decrypt("enc:v1:AAAAAA==:AAAAAAAAAAAAAAAAAAAAAA==:AAAA").unwrap_err();
        assert!(matches!(err, DecryptionError::Malformed("wrong iv length")));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let c = codec();
        let envelope = c.encrypt("secret-value").unwrap();
        let mut parts: Vec<String> = envelope.split(':').map(String::from).collect();
        let data = STANDARD.decode(parts.last().unwrap()).unwrap();
        let mut flipped = data.clone();
        flipped[0] ^= 0xff;
        *parts.last_mut().unwrap() = STANDARD.encode(flipped);
        let err = c.decrypt(&parts.join(":")).unwrap_err();
        assert!(matches!(err, DecryptionError::Cipher(_)));
    }

    #[test]
    fn different_app_secret_fails() {
        let envelope = codec().encrypt("secret-value").unwrap();
        let other = SecretCodec::new("other-app-secret");
        assert!(other.decrypt(&envelope).is_err());
    }

    #[test]
    fn envelopes_are_salted() {
        let c = codec();
        // Fresh nonce per call: same plaintext, different envelopes.
        assert_ne!(c.encrypt("same").unwrap(), c.encrypt("same").unwrap());
    }
}
