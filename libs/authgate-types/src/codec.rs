//! Password obfuscation for the change-password exchange.
//!
//! A fresh 32-byte key is issued by `GET /api/auth/encryption-key` right
//! before each submission. The client XORs the UTF-8 password bytes with the
//! key repeated cyclically and base64-encodes the result; the server applies
//! the same transform to recover the password.
//!
//! # Security Note
//! This is not encryption. The key travels over the same channel as the
//! payload it protects, so anyone able to read the key-issuance response can
//! recover the password. It only keeps the plaintext password out of request
//! bodies; confidentiality comes from TLS.

use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;

use crate::CodecError;

/// Length in bytes of a generated key.
pub const KEY_LEN: usize = 32;

/// Generates a random key: 32 bytes from the OS RNG, base64-encoded.
pub fn generate_key() -> String {
    let mut bytes = [0u8; KEY_LEN];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    general_purpose::STANDARD.encode(bytes)
}

/// Obfuscates `plaintext` with `key`, returning base64 ciphertext.
pub fn encode(plaintext: &str, key: &str) -> Result<String, CodecError> {
    let key_bytes = decode_key(key)?;
    Ok(general_purpose::STANDARD.encode(xor_cycle(plaintext.as_bytes(), &key_bytes)))
}

/// Reverses [`encode`].
pub fn decode(ciphertext: &str, key: &str) -> Result<String, CodecError> {
    let key_bytes = decode_key(key)?;
    let data = general_purpose::STANDARD
        .decode(ciphertext.as_bytes())
        .map_err(|_| CodecError::InvalidCiphertext)?;
    String::from_utf8(xor_cycle(&data, &key_bytes)).map_err(|_| CodecError::InvalidUtf8)
}

fn decode_key(key: &str) -> Result<Vec<u8>, CodecError> {
    let bytes = general_purpose::STANDARD
        .decode(key.as_bytes())
        .map_err(|_| CodecError::InvalidKey)?;
    if bytes.is_empty() {
        return Err(CodecError::EmptyKey);
    }
    Ok(bytes)
}

fn xor_cycle(data: &[u8], key: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(key.iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "a",
        "hunter2",
        "correct horse battery staple",
        "p@$$w0rd!#%^&*()_+-={}[]|\\:;\"'<>,.?/~`",
        "密码修改成功",
        "pässwörd 🔐 with emoji",
        "a password that is comfortably longer than the thirty-two byte key so it wraps",
    ];

    #[test]
    fn test_generate_key_is_32_bytes_base64() {
        let key = generate_key();
        let raw = general_purpose::STANDARD.decode(&key).unwrap();
        assert_eq!(raw.len(), KEY_LEN);
    }

    #[test]
    fn test_generate_key_is_not_reused() {
        assert_ne!(generate_key(), generate_key());
    }

    #[test]
    fn test_round_trip_over_samples_and_keys() {
        for _ in 0..64 {
            let key = generate_key();
            for sample in SAMPLES {
                let cipher = encode(sample, &key).unwrap();
                assert_eq!(decode(&cipher, &key).unwrap(), *sample);
            }
        }
    }

    #[test]
    fn test_encode_hides_plaintext() {
        let key = generate_key();
        let cipher = encode("hunter2-hunter2", &key).unwrap();
        assert!(!cipher.contains("hunter2"));
    }

    #[test]
    fn test_known_vector() {
        // key = [0x01, 0x02], "abc" = [0x61, 0x62, 0x63]
        let key = general_purpose::STANDARD.encode([0x01u8, 0x02]);
        let cipher = encode("abc", &key).unwrap();
        let raw = general_purpose::STANDARD.decode(&cipher).unwrap();
        assert_eq!(raw, vec![0x60, 0x60, 0x62]);
    }

    #[test]
    fn test_encode_and_decode_are_the_same_transform() {
        let key = generate_key();
        let once = xor_cycle(b"same transform", &general_purpose::STANDARD.decode(&key).unwrap());
        let twice = xor_cycle(&once, &general_purpose::STANDARD.decode(&key).unwrap());
        assert_eq!(twice, b"same transform");
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(encode("x", "not base64!!"), Err(CodecError::InvalidKey));
        assert_eq!(encode("x", ""), Err(CodecError::EmptyKey));
        let key = generate_key();
        assert_eq!(decode("%%%", &key), Err(CodecError::InvalidCiphertext));
    }

    #[test]
    fn test_wrong_key_does_not_recover_plaintext() {
        let cipher = encode("hunter2-hunter2", &generate_key()).unwrap();
        let other = generate_key();
        assert_ne!(decode(&cipher, &other).ok().as_deref(), Some("hunter2-hunter2"));
    }
}
