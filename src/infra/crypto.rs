use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hkdf::Hkdf;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use sha2::Sha256;

use crate::app_error::{AppError, AppResult};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const HKDF_SALT: &[u8] = b"authgate-cookie-v1";
const HKDF_INFO: &[u8] = b"aes-256-gcm";

/// Seals values into opaque cookie payloads with AES-256-GCM.
///
/// The key is derived from `COOKIE_SECRET` with HKDF-SHA256. `purpose` is
/// bound as associated data, so a value sealed for one cookie does not
/// open under another name.
#[derive(Clone)]
pub struct SessionSealer {
    key: aes_gcm::Key<Aes256Gcm>,
}

impl SessionSealer {
    pub fn from_secret(secret: &SecretString) -> AppResult<Self> {
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret.expose_secret().as_bytes());
        let mut okm = [0u8; KEY_LEN];
        hk.expand(HKDF_INFO, &mut okm)
            .map_err(|e| AppError::Internal(format!("key derivation failed: {e}")))?;
        let key = *aes_gcm::Key::<Aes256Gcm>::from_slice(&okm);
        Ok(Self { key })
    }

    pub fn seal<T: Serialize>(&self, purpose: &str, value: &T) -> AppResult<String> {
        let plaintext =
            serde_json::to_vec(value).map_err(|e| AppError::Internal(e.to_string()))?;

        let cipher = Aes256Gcm::new(&self.key);
        let nonce_bytes = rand::random::<[u8; NONCE_LEN]>();
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: &plaintext,
                    aad: purpose.as_bytes(),
                },
            )
            .map_err(|e| AppError::Internal(format!("seal failed: {e}")))?;

        let mut buffer = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        buffer.extend_from_slice(nonce);
        buffer.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(buffer))
    }

    /// Tampered, truncated or foreign payloads are `InvalidToken`.
    pub fn unseal<T: DeserializeOwned>(&self, purpose: &str, sealed: &str) -> AppResult<T> {
        let data = URL_SAFE_NO_PAD
            .decode(sealed.as_bytes())
            .map_err(|_| AppError::InvalidToken("malformed cookie".into()))?;
        if data.len() <= NONCE_LEN {
            return Err(AppError::InvalidToken("cookie too short".into()));
        }

        let (nonce_bytes, cipher_bytes) = data.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(&self.key);
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: cipher_bytes,
                    aad: purpose.as_bytes(),
                },
            )
            .map_err(|_| AppError::InvalidToken("cookie failed authentication".into()))?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| AppError::InvalidToken(format!("cookie payload: {e}")))
    }
}
