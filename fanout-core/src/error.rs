// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Publish Error Types
//!
//! Unified error types for the publish and size-estimation paths.

use thiserror::Error;

pub use crate::codec::EncodeError;
pub use crate::crypto::CryptoError;
pub use crate::transport::TransportError;

/// Error delivered with a failed publish.
///
/// Only [`PublishError::Dispatch`] comes with a retry handle; every other
/// variant is local to the run that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Channel name was empty.
    #[error("channel name must not be empty")]
    InvalidChannel,

    /// Message or metadata could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Message encryption failed under the configured cipher key.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Transport reported a failure while sending the request.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] TransportError),
}

impl PublishError {
    /// Returns true if re-running the pipeline may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PublishError::Dispatch(_))
    }
}

/// Error delivered by a message size computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    /// Channel name was empty.
    #[error("channel name must not be empty")]
    InvalidChannel,

    /// Message or metadata could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Message encryption failed under the configured cipher key.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Errors raised while building a client configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("publish key is required")]
    MissingPublishKey,

    #[error("subscribe key is required")]
    MissingSubscribeKey,

    #[error("a transport is required")]
    MissingTransport,

    #[error("failed to start background worker: {0}")]
    Worker(String),
}

/// Failures the shared transform chain can produce.
///
/// Converted into [`PublishError`] or [`SizeError`] depending on the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl From<PipelineError> for PublishError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Encode(e) => PublishError::Encode(e),
            PipelineError::Crypto(e) => PublishError::Crypto(e),
        }
    }
}

impl From<PipelineError> for SizeError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Encode(e) => SizeError::Encode(e),
            PipelineError::Crypto(e) => SizeError::Crypto(e),
        }
    }
}

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;
