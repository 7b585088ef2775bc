//! AES-256-GCM encryptor for sensitive audit details at rest.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use sha2::{Digest, Sha256};
use vigil_application::FieldEncryptor;
use vigil_core::{AppError, AppResult};
use vigil_domain::{AuditDetails, EncryptedPayload};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// AES-256-GCM encryptor producing hex `{data, iv, tag}` envelopes.
#[derive(Clone)]
pub struct AesFieldEncryptor {
    cipher: Aes256Gcm,
}

impl AesFieldEncryptor {
    /// Creates a new encryptor from a 32-byte key.
    pub fn new(key_bytes: &[u8; 32]) -> Self {
        let cipher = Aes256Gcm::new(key_bytes.into());
        Self { cipher }
    }

    /// Creates a new encryptor from a hex-encoded 32-byte key.
    pub fn from_hex(hex_key: &str) -> AppResult<Self> {
        let decoded = hex::decode(hex_key).map_err(|error| {
            AppError::Validation(format!("invalid AUDIT_ENCRYPTION_KEY hex: {error}"))
        })?;

        if decoded.len() != 32 {
            return Err(AppError::Validation(
                "AUDIT_ENCRYPTION_KEY must be exactly 32 bytes (64 hex chars)".to_owned(),
            ));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&decoded);
        Ok(Self::new(&key))
    }

    /// Creates an encryptor from configured key material.
    ///
    /// 64 hex characters are used as the raw key; anything else is treated as
    /// a passphrase and hashed with SHA-256.
    pub fn from_key_material(material: &str) -> AppResult<Self> {
        let material = material.trim();
        if material.is_empty() {
            return Err(AppError::Validation(
                "AUDIT_ENCRYPTION_KEY must not be empty".to_owned(),
            ));
        }

        if material.len() == 64 && material.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Self::from_hex(material);
        }

        let digest = Sha256::digest(material.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Ok(Self::new(&key))
    }
}

fn decode_part(name: &str, value: &str) -> AppResult<Vec<u8>> {
    hex::decode(value)
        .map_err(|error| AppError::Crypto(format!("envelope {name} is not valid hex: {error}")))
}

impl FieldEncryptor for AesFieldEncryptor {
    fn encrypt(&self, details: &AuditDetails) -> AppResult<EncryptedPayload> {
        let plaintext = serde_json::to_vec(details)
            .map_err(|error| AppError::Internal(format!("failed to serialize details: {error}")))?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|error| AppError::Crypto(format!("failed to encrypt details: {error}")))?;

        // aes-gcm appends the 16-byte tag to the ciphertext
        let split = sealed.len().saturating_sub(TAG_LEN);
        let (ciphertext, tag) = sealed.split_at(split);

        Ok(EncryptedPayload::new(
            hex::encode(ciphertext),
            hex::encode(nonce),
            hex::encode(tag),
        ))
    }

    fn decrypt(&self, payload: &EncryptedPayload) -> AppResult<AuditDetails> {
        if !payload.encrypted {
            return Err(AppError::Crypto("payload is not marked encrypted".to_owned()));
        }

        let nonce_bytes = decode_part("iv", &payload.iv)?;
        let tag = decode_part("tag", &payload.tag)?;
        let mut sealed = decode_part("data", &payload.data)?;

        let nonce_array: [u8; NONCE_LEN] = nonce_bytes
            .try_into()
            .map_err(|_| AppError::Crypto("iv must be exactly 12 bytes".to_owned()))?;
        if tag.len() != TAG_LEN {
            return Err(AppError::Crypto("tag must be exactly 16 bytes".to_owned()));
        }

        sealed.extend_from_slice(&tag);
        let nonce = Nonce::from(nonce_array);
        let plaintext = self
            .cipher
            .decrypt(&nonce, sealed.as_slice())
            .map_err(|error| AppError::Crypto(format!("failed to decrypt details: {error}")))?;

        serde_json::from_slice(&plaintext)
            .map_err(|error| AppError::Crypto(format!("decrypted details are not JSON: {error}")))
    }
}
