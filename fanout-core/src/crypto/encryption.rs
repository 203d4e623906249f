// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Symmetric Encryption (XChaCha20-Poly1305)
//!
//! Authenticated encryption for published message payloads.
//!
//! Ciphertext format: `algorithm_tag (1 byte) || nonce (24 bytes) || ciphertext || tag (16 bytes)`
//!   - Tag `0x02`: XChaCha20-Poly1305
//!
//! Keys are derived from the client's cipher key string with SHA-256, so every
//! client configured with the same cipher key can read the others' messages.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::XChaCha20Poly1305;
use ring::digest::{digest, SHA256};
use ring::hmac;
use thiserror::Error;
use zeroize::Zeroize;

/// Encryption error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Decryption failed: data may be corrupted or wrong key")]
    DecryptionFailed,
    #[error("Ciphertext too short")]
    CiphertextTooShort,
    #[error("Unsupported algorithm tag: {0:#04x}")]
    UnsupportedAlgorithm(u8),
    #[error("Ciphertext is not valid base64 text")]
    InvalidEncoding,
}

/// Algorithm tag for XChaCha20-Poly1305.
const ALG_TAG_XCHACHA20: u8 = 0x02;

/// Nonce size for XChaCha20-Poly1305 (192 bits = 24 bytes).
const XCHACHA20_NONCE_SIZE: usize = 24;
/// Authentication tag size.
const TAG_SIZE: usize = 16;
/// Domain separation for nonce derivation.
const NONCE_LABEL: &[u8] = b"fanout-message-nonce";

/// 256-bit symmetric encryption key.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; 32],
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose key bytes in debug output
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl SymmetricKey {
    /// Derives a key from a cipher key string (SHA-256 of its UTF-8 bytes).
    pub fn derive(cipher_key: &str) -> Self {
        let hash = digest(&SHA256, cipher_key.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(hash.as_ref());
        SymmetricKey { bytes }
    }

    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        SymmetricKey { bytes }
    }

    /// Returns a reference to the key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

/// Encrypts data using XChaCha20-Poly1305 with a synthetic nonce.
///
/// The nonce is HMAC-SHA256 of the plaintext under the key, truncated to
/// 24 bytes, so equal plaintexts under one key give equal ciphertexts.
/// A request measured before publishing is byte-identical to the one sent.
///
/// Output format: `0x02 || nonce (24 bytes) || ciphertext || tag (16 bytes)`
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    seal(key, &synthetic_nonce(key, plaintext), plaintext)
}

fn synthetic_nonce(key: &SymmetricKey, plaintext: &[u8]) -> [u8; XCHACHA20_NONCE_SIZE] {
    let mac_key = hmac::Key::new(hmac::HMAC_SHA256, key.as_bytes());
    let mut context = hmac::Context::with_key(&mac_key);
    context.update(NONCE_LABEL);
    context.update(plaintext);
    let tag = context.sign();

    let mut nonce = [0u8; XCHACHA20_NONCE_SIZE];
    nonce.copy_from_slice(&tag.as_ref()[..XCHACHA20_NONCE_SIZE]);
    nonce
}

fn seal(
    key: &SymmetricKey,
    nonce_bytes: &[u8; XCHACHA20_NONCE_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = chacha20poly1305::XNonce::from_slice(nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut output = Vec::with_capacity(1 + XCHACHA20_NONCE_SIZE + ciphertext.len());
    output.push(ALG_TAG_XCHACHA20);
    output.extend_from_slice(nonce_bytes);
    output.extend_from_slice(&ciphertext);

    Ok(output)
}

/// Decrypts data produced by [`encrypt`].
pub fn decrypt(key: &SymmetricKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let Some((&tag, data)) = ciphertext.split_first() else {
        return Err(CryptoError::CiphertextTooShort);
    };
    if tag != ALG_TAG_XCHACHA20 {
        return Err(CryptoError::UnsupportedAlgorithm(tag));
    }
    if data.len() < XCHACHA20_NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::CiphertextTooShort);
    }

    let nonce = chacha20poly1305::XNonce::from_slice(&data[..XCHACHA20_NONCE_SIZE]);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(nonce, &data[XCHACHA20_NONCE_SIZE..])
        .map_err(|_| CryptoError::DecryptionFailed)
}
