// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Trait
//!
//! Platform-agnostic abstraction for the network call that carries a
//! publish request, and for computing the size that request would have.

mod mock;

pub use mock::{MockTransport, SentRequest};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::RequestParameters;

/// Transport error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Malformed server response: {0}")]
    InvalidResponse(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Kind of request being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Operation {
    Publish,
}

/// Server acknowledgment of a published message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishAck {
    /// Server-assigned publish timetoken (opaque).
    pub timetoken: String,
}

/// Where and as whom requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Origin host name.
    pub origin: String,
    pub publish_key: String,
    pub subscribe_key: String,
    /// Client user id sent with every request.
    pub user_id: String,
    /// Optional access token.
    pub auth_key: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            origin: crate::config::DEFAULT_ORIGIN.to_string(),
            publish_key: String::new(),
            subscribe_key: String::new(),
            user_id: String::new(),
            auth_key: None,
        }
    }
}

/// Transport trait for the publish pipeline.
///
/// Implementations are shared between the worker running a publish and any
/// retry issued later, so methods take `&self`.
///
/// # Example
///
/// ```ignore
/// use fanout_core::transport::{MockTransport, Operation, Transport};
///
/// let transport = MockTransport::new();
/// let ack = transport.send(Operation::Publish, &params)?;
/// println!("published at {}", ack.timetoken);
/// ```
pub trait Transport: Send + Sync {
    /// Sends the request and waits for the server's answer.
    fn send(&self, operation: Operation, params: &RequestParameters) -> TransportResult<PublishAck>;

    /// Returns the size in bytes the request would have on the wire.
    ///
    /// Must not perform any I/O.
    fn estimate_size(&self, operation: Operation, params: &RequestParameters) -> usize;
}
