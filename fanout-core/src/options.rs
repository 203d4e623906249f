// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Publish Options and Requests
//!
//! A [`PublishRequest`] holds every logical argument of one publish call. It
//! is also what a retry re-submits, so it is plain data: cloneable and
//! serializable, with no reference back to the client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::{to_message, EncodeError};
use crate::push::PushPayloads;

/// Per-publish options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishOptions {
    /// Store the message in channel history. Default: `true`.
    pub should_store: bool,
    /// Per-message storage TTL in hours. Default: server setting.
    pub ttl: Option<u32>,
    /// Send the message gzip-compressed in the request body. Default: `false`.
    pub compress: bool,
    /// Replicate the message to other data centers. Default: `true`.
    pub replicate: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        PublishOptions {
            should_store: true,
            ttl: None,
            compress: false,
            replicate: true,
        }
    }
}

impl PublishOptions {
    pub fn store(mut self, should_store: bool) -> Self {
        self.should_store = should_store;
        self
    }

    pub fn ttl(mut self, hours: u32) -> Self {
        self.ttl = Some(hours);
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn replicate(mut self, replicate: bool) -> Self {
        self.replicate = replicate;
        self
    }

    /// Resolves option interactions: a TTL has no meaning for a message that
    /// is not stored, so it is dropped.
    pub fn normalized(self) -> Self {
        if self.should_store {
            self
        } else {
            PublishOptions { ttl: None, ..self }
        }
    }
}

/// All logical arguments of one publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Target channel (must be non-empty).
    pub channel: String,
    /// Message body.
    pub message: Value,
    /// Vendor push payloads to merge into the message.
    #[serde(default)]
    pub payloads: PushPayloads,
    #[serde(default)]
    pub options: PublishOptions,
    /// Server-side filtering metadata.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl PublishRequest {
    /// Creates a request with default options and no push payloads.
    pub fn new(channel: impl Into<String>, message: impl Into<Value>) -> Self {
        PublishRequest {
            channel: channel.into(),
            message: message.into(),
            payloads: PushPayloads::new(),
            options: PublishOptions::default(),
            metadata: None,
        }
    }

    /// Starts a fluent builder.
    pub fn builder(channel: impl Into<String>, message: impl Into<Value>) -> PublishRequestBuilder {
        PublishRequestBuilder {
            request: PublishRequest::new(channel, message),
        }
    }

    /// Starts a builder from any serializable message.
    pub fn try_builder<T: Serialize>(
        channel: impl Into<String>,
        message: &T,
    ) -> Result<PublishRequestBuilder, EncodeError> {
        Ok(Self::builder(channel, to_message(message)?))
    }
}

/// Builder for [`PublishRequest`].
#[derive(Debug, Clone)]
pub struct PublishRequestBuilder {
    request: PublishRequest,
}

impl PublishRequestBuilder {
    /// Adds one vendor push payload.
    pub fn push_payload(mut self, token: impl Into<String>, payload: impl Into<Value>) -> Self {
        self.request.payloads.insert(token.into(), payload.into());
        self
    }

    /// Replaces all push payloads.
    pub fn payloads(mut self, payloads: PushPayloads) -> Self {
        self.request.payloads = payloads;
        self
    }

    pub fn options(mut self, options: PublishOptions) -> Self {
        self.request.options = options;
        self
    }

    pub fn store(mut self, should_store: bool) -> Self {
        self.request.options.should_store = should_store;
        self
    }

    pub fn ttl(mut self, hours: u32) -> Self {
        self.request.options.ttl = Some(hours);
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.request.options.compress = compress;
        self
    }

    pub fn replicate(mut self, replicate: bool) -> Self {
        self.request.options.replicate = replicate;
        self
    }

    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.request.metadata = Some(metadata);
        self
    }

    /// Adds one metadata entry.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request
            .metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> PublishRequest {
        self.request
    }
}
