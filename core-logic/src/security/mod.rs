use crate::error::SecurityError;
use aes_gcm::{
    aead::{Aead, NewAead}, // NewAead for 0.9/0.4
    Aes256Gcm,
    Nonce,
};
use serde::Deserialize;
use zeroize::Zeroize;

/// The `encrypted` block of a wallet JSON file, all fields hex encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct EncryptedBlock {
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
    pub tag: String,
}

impl EncryptedBlock {
    pub fn decrypt(&self, password: &str) -> Result<String, SecurityError> {
        SecurityUtils::decrypt_components(
            &self.ciphertext,
            &self.iv,
            &self.salt,
            &self.tag,
            password,
        )
    }
}

pub struct SecurityUtils;

impl SecurityUtils {
    /// Scrypt parameters matching Node's `crypto.scryptSync` defaults (N=16384, r=8, p=1).
    const SCRYPT_LOG_N: u8 = 14;
    const SCRYPT_R: u32 = 8;
    const SCRYPT_P: u32 = 1;
    const KEY_LEN: usize = 32;

    pub fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; 32], SecurityError> {
        let params = scrypt::Params::new(
            Self::SCRYPT_LOG_N,
            Self::SCRYPT_R,
            Self::SCRYPT_P,
            Self::KEY_LEN,
        )
        .map_err(|e| SecurityError::CryptographyFailed {
            reason: format!("invalid scrypt params: {}", e),
        })?;

        let mut key = [0u8; 32];
        scrypt::scrypt(password.as_bytes(), salt, &params, &mut key).map_err(|e| {
            SecurityError::CryptographyFailed {
                reason: format!("scrypt failed: {}", e),
            }
        })?;
        Ok(key)
    }

    pub fn decrypt_components(
        ciphertext_hex: &str,
        iv_hex: &str,
        salt_hex: &str,
        tag_hex: &str,
        password: &str,
    ) -> Result<String, SecurityError> {
        let ciphertext = decode_field("ciphertext", ciphertext_hex)?;
        let iv = decode_field("iv", iv_hex)?;
        let salt = decode_field("salt", salt_hex)?;
        let tag = decode_field("tag", tag_hex)?;

        if iv.len() != 12 {
            return Err(SecurityError::CryptographyFailed {
                reason: format!("iv must be 12 bytes, got {}", iv.len()),
            });
        }

        let mut key = Self::derive_key(password, &salt)?;
        let cipher = Aes256Gcm::new(&key.into());
        key.zeroize();

        // aes-gcm expects the tag appended to the ciphertext
        let mut payload = ciphertext;
        payload.extend_from_slice(&tag);

        let mut plaintext = cipher
            .decrypt(Nonce::from_slice(&iv), payload.as_ref())
            .map_err(|e| SecurityError::CryptographyFailed {
                reason: format!("decryption failed: {}", e),
            })?;

        let text = String::from_utf8(plaintext.clone()).map_err(|_| {
            SecurityError::CryptographyFailed {
                reason: "decrypted data is not valid UTF-8".to_string(),
            }
        });
        plaintext.zeroize();
        text
    }
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, SecurityError> {
    hex::decode(value).map_err(|_| SecurityError::InvalidHex {
        field: field.to_string(),
    })
}
