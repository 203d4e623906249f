// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fanout Core Library
//!
//! Publish pipeline of the Fanout pub/sub client. Turns an application
//! message into a network-ready publish request:
//!
//! serialize → encrypt → merge push payloads → compress → assemble → dispatch
//!
//! with per-client sequence numbers, retry of failed dispatches, and a size
//! estimation path that mirrors publishing without sending anything.

pub mod client;
pub mod codec;
pub mod compression;
pub mod config;
pub mod crypto;
pub mod error;
pub mod executor;
pub mod options;
pub mod pipeline;
pub mod push;
pub mod request;
pub mod sequence;
pub mod status;
pub mod transport;

pub use client::{Completion, Publisher, PublisherBuilder};
pub use codec::{JsonCodec, MessageCodec};
pub use compression::{Compressor, GzipCompressor};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use crypto::{Cipher, MessageCipher, SymmetricKey};
pub use error::{
    ConfigError, CryptoError, EncodeError, PublishError, PublishResult, SizeError, TransportError,
};
pub use executor::{BackgroundExecutor, Executor, InlineExecutor, SharedExecutor};
#[cfg(feature = "tokio")]
pub use executor::TokioExecutor;
pub use options::{PublishOptions, PublishRequest, PublishRequestBuilder};
pub use push::{merge_push_payloads, PushPayloads};
pub use request::{assemble, RequestParameters};
pub use sequence::{SequenceCounter, SequenceSource};
pub use status::{PublishStatus, RetryHandle};
pub use transport::{MockTransport, Operation, PublishAck, Transport, TransportConfig};
