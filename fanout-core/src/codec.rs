// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Codec
//!
//! Serializes structured messages to their canonical wire text (JSON).

use serde_json::Value;
use thiserror::Error;

/// Codec error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("value is not representable as JSON: {0}")]
    Unrepresentable(String),
    #[error("malformed JSON text: {0}")]
    Malformed(String),
}

/// Converts messages to and from their wire text.
pub trait MessageCodec: Send + Sync {
    /// Serializes `value` to canonical text.
    fn encode(&self, value: &Value) -> Result<String, EncodeError>;

    /// Parses text previously produced by [`MessageCodec::encode`].
    fn decode(&self, text: &str) -> Result<Value, EncodeError>;
}

/// JSON codec backed by `serde_json`.
///
/// Object keys keep their insertion order only if `serde_json` is built with
/// `preserve_order`; by default they are emitted sorted, which keeps the
/// encoded text stable across runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, EncodeError> {
        serde_json::to_string(value).map_err(|e| EncodeError::Unrepresentable(e.to_string()))
    }

    fn decode(&self, text: &str) -> Result<Value, EncodeError> {
        serde_json::from_str(text).map_err(|e| EncodeError::Malformed(e.to_string()))
    }
}

/// Converts any serializable value into a message.
///
/// This is where non-representable input (maps with non-string keys, failing
/// `Serialize` impls) is caught.
pub fn to_message<T: serde::Serialize>(value: &T) -> Result<Value, EncodeError> {
    serde_json::to_value(value).map_err(|e| EncodeError::Unrepresentable(e.to_string()))
}
