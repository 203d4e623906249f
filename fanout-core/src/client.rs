// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Publisher
//!
//! Entry point for publishing messages and measuring publish requests.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fanout_core::{ClientConfig, MockTransport, Publisher, PublishRequest};
//!
//! let config = ClientConfig::builder()
//!     .publish_key("pub-key")
//!     .subscribe_key("sub-key")
//!     .build()?;
//! let publisher = Publisher::new(config, Arc::new(MockTransport::new()))?;
//!
//! let request = PublishRequest::builder("alerts", "hello")
//!     .push_payload("aps", serde_json::json!({"alert": "hello"}))
//!     .compress(true)
//!     .build();
//!
//! publisher.publish(request, |status| {
//!     if status.is_error() {
//!         status.retry();
//!     }
//! });
//! ```

use std::sync::Arc;

use crate::codec::{JsonCodec, MessageCodec};
use crate::compression::{Compressor, GzipCompressor};
use crate::config::ClientConfig;
use crate::crypto::{Cipher, MessageCipher};
use crate::error::{ConfigError, PublishError, SizeError};
use crate::executor::{BackgroundExecutor, InlineExecutor, SharedExecutor};
use crate::options::PublishRequest;
use crate::pipeline::PipelineContext;
use crate::sequence::{SequenceCounter, SequenceSource};
use crate::status::{PublishStatus, RetryHandle};
use crate::transport::{Operation, Transport};

/// Completion handler for publishes.
///
/// Shared because a retried publish reports to the same handler again.
pub type Completion = Arc<dyn Fn(PublishStatus) + Send + Sync>;

/// Name of the default processing thread.
const WORKER_NAME: &str = "fanout-publish";

/// Publishes messages through the transform pipeline.
#[derive(Debug, Clone)]
pub struct Publisher {
    context: Arc<PipelineContext>,
}

impl Publisher {
    /// Creates a publisher with default collaborators: JSON codec,
    /// XChaCha20 cipher, gzip, a fresh sequence counter, a background
    /// worker thread, and inline completion delivery.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        PublisherBuilder::new(config).transport(transport).build()
    }

    /// Starts a builder for custom collaborators.
    pub fn builder(config: ClientConfig) -> PublisherBuilder {
        PublisherBuilder::new(config)
    }

    /// Returns the configuration snapshot this publisher runs with.
    pub fn config(&self) -> &ClientConfig {
        &self.context.config
    }

    /// Sequence number the next publish will use.
    pub fn next_sequence(&self) -> u64 {
        self.context.sequence.peek()
    }

    /// Publishes a message.
    ///
    /// `completion` is called exactly once per run on the callback context.
    /// Dispatch failures carry a retry handle; invoking it runs the whole
    /// pipeline again and reports to the same `completion`.
    pub fn publish<F>(&self, request: PublishRequest, completion: F)
    where
        F: Fn(PublishStatus) + Send + Sync + 'static,
    {
        run_publish(Arc::clone(&self.context), request, Arc::new(completion));
    }

    /// Computes the size in bytes `request` would have if published now.
    ///
    /// Runs the same transforms as [`Publisher::publish`] but only peeks at
    /// the sequence counter and sends nothing.
    pub fn message_size<F>(&self, request: PublishRequest, completion: F)
    where
        F: FnOnce(Result<usize, SizeError>) + Send + 'static,
    {
        let context = Arc::clone(&self.context);

        if request.channel.is_empty() {
            context.callback.execute(Box::new(move || completion(Err(SizeError::InvalidChannel))));
            return;
        }

        let seqn = context.sequence.peek();
        let worker = Arc::clone(context.worker());
        worker.execute(Box::new(move || {
            let result = context
                .prepare(&request, seqn)
                .map(|params| context.transport.estimate_size(Operation::Publish, &params))
                .map_err(SizeError::from);

            if let Ok(size) = &result {
                tracing::debug!(channel = %request.channel, seqn, size, "publish request sized");
            }
            context.callback.execute(Box::new(move || completion(result)));
        }));
    }
}

/// Runs one publish: allocate, transform, dispatch, deliver.
///
/// Allocation happens on the calling thread before the hop to the worker,
/// so concurrent publishes get sequence numbers in call order even when
/// their transforms finish out of order.
pub(crate) fn run_publish(
    context: Arc<PipelineContext>,
    request: PublishRequest,
    completion: Completion,
) {
    if request.channel.is_empty() {
        let status = PublishStatus::failed(PublishError::InvalidChannel, None, None);
        context.callback.execute(Box::new(move || completion(status)));
        return;
    }

    let seqn = context.sequence.allocate();
    let worker = Arc::clone(context.worker());
    worker.execute(Box::new(move || {
        let status = match context.prepare(&request, seqn) {
            Err(e) => PublishStatus::failed(e.into(), Some(seqn), None),
            Ok(params) => match context.transport.send(Operation::Publish, &params) {
                Ok(ack) => {
                    tracing::debug!(
                        channel = %request.channel,
                        seqn,
                        timetoken = %ack.timetoken,
                        "published"
                    );
                    PublishStatus::succeeded(ack, seqn)
                }
                Err(e) => {
                    tracing::warn!(
                        channel = %request.channel,
                        seqn,
                        error = %e,
                        "publish dispatch failed"
                    );
                    let retry = RetryHandle::new(
                        Arc::clone(&context),
                        request,
                        Arc::clone(&completion),
                    );
                    PublishStatus::failed(PublishError::Dispatch(e), Some(seqn), Some(retry))
                }
            },
        };

        context.callback.execute(Box::new(move || completion(status)));
    }));
}

/// Builder for [`Publisher`].
pub struct PublisherBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    codec: Arc<dyn MessageCodec>,
    cipher: Arc<dyn Cipher>,
    compressor: Arc<dyn Compressor>,
    sequence: Arc<dyn SequenceSource>,
    processing: Option<SharedExecutor>,
    callback: SharedExecutor,
}

impl PublisherBuilder {
    /// Creates a builder with default collaborators.
    pub fn new(config: ClientConfig) -> Self {
        PublisherBuilder {
            config,
            transport: None,
            codec: Arc::new(JsonCodec),
            cipher: Arc::new(MessageCipher),
            compressor: Arc::new(GzipCompressor::default()),
            sequence: Arc::new(SequenceCounter::new()),
            processing: None,
            callback: Arc::new(InlineExecutor),
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn codec(mut self, codec: Arc<dyn MessageCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn cipher(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    /// Sets the sequence source, e.g. one restored from persisted state.
    pub fn sequence(mut self, sequence: Arc<dyn SequenceSource>) -> Self {
        self.sequence = sequence;
        self
    }

    /// Sets the context transforms run on. Defaults to a dedicated thread.
    pub fn processing_executor(mut self, executor: SharedExecutor) -> Self {
        self.processing = Some(executor);
        self
    }

    /// Sets the context completions are delivered on. Defaults to inline.
    pub fn callback_executor(mut self, executor: SharedExecutor) -> Self {
        self.callback = executor;
        self
    }

    /// Builds the publisher.
    pub fn build(self) -> Result<Publisher, ConfigError> {
        self.config.validate()?;
        let transport = self.transport.ok_or(ConfigError::MissingTransport)?;

        let processing: SharedExecutor = match self.processing {
            Some(executor) => executor,
            // Constrained hosts never use the worker, so don't start one
            None if self.config.constrained_host => Arc::clone(&self.callback),
            None => Arc::new(
                BackgroundExecutor::spawn(WORKER_NAME)
                    .map_err(|e| ConfigError::Worker(e.to_string()))?,
            ),
        };

        Ok(Publisher {
            context: Arc::new(PipelineContext {
                config: self.config,
                codec: self.codec,
                cipher: self.cipher,
                compressor: self.compressor,
                sequence: self.sequence,
                transport,
                processing,
                callback: self.callback,
            }),
        })
    }
}
