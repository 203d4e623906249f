// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Cipher
//!
//! Text-in, text-out encryption used by the publish pipeline. The sealed
//! bytes are base64-encoded (URL-safe alphabet) and returned as a JSON string
//! literal, so the output is itself valid serialized message text. The
//! URL-safe alphabet needs no percent escaping apart from padding.

use base64::Engine;

use super::encryption::{decrypt, encrypt, CryptoError, SymmetricKey};

/// Encrypts serialized message text under a cipher key.
///
/// An empty key means "no encryption": implementations must return the
/// input unchanged.
pub trait Cipher: Send + Sync {
    /// Size estimation relies on the output being a function of `text` and
    /// `cipher_key` alone.
    fn encrypt(&self, text: &str, cipher_key: &str) -> Result<String, CryptoError>;
}

/// Default cipher: XChaCha20-Poly1305 with a SHA-256 derived key.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCipher;

impl MessageCipher {
    /// Reverses [`Cipher::encrypt`], returning the original message text.
    pub fn decrypt(&self, text: &str, cipher_key: &str) -> Result<String, CryptoError> {
        if cipher_key.is_empty() {
            return Ok(text.to_string());
        }

        let encoded = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .ok_or(CryptoError::InvalidEncoding)?;
        let sealed = base64::engine::general_purpose::URL_SAFE
            .decode(encoded)
            .map_err(|_| CryptoError::InvalidEncoding)?;

        let plaintext = decrypt(&SymmetricKey::derive(cipher_key), &sealed)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl Cipher for MessageCipher {
    fn encrypt(&self, text: &str, cipher_key: &str) -> Result<String, CryptoError> {
        if cipher_key.is_empty() {
            return Ok(text.to_string());
        }
        let sealed = encrypt(&SymmetricKey::derive(cipher_key), text.as_bytes())?;
        Ok(to_json_string(&sealed))
    }
}

/// Base64-encodes sealed bytes as a JSON string literal.
fn to_json_string(sealed: &[u8]) -> String {
    // The base64 alphabet needs no JSON escaping, so quoting is enough
    format!(
        "\"{}\"",
        base64::engine::general_purpose::URL_SAFE.encode(sealed)
    )
}
