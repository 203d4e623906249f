// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Publish Transform Chain
//!
//! encode → encrypt → merge push payloads → re-encode → assemble → compress.
//!
//! Shared by publishing and size estimation so both see the same request:
//! every stage is deterministic for a given request and sequence number.
//! The chain never touches the sequence counter: callers pass the number in.

use std::sync::Arc;

use serde_json::Value;

use crate::codec::MessageCodec;
use crate::compression::Compressor;
use crate::config::ClientConfig;
use crate::crypto::Cipher;
use crate::error::PipelineError;
use crate::executor::SharedExecutor;
use crate::options::PublishRequest;
use crate::push::merge_push_payloads;
use crate::request::{assemble, RequestParameters};
use crate::sequence::SequenceSource;
use crate::transport::Transport;

/// Immutable snapshot of everything a pipeline run needs.
///
/// Taken once when the publisher is built; retries hold on to it instead of
/// the publisher.
pub struct PipelineContext {
    pub config: ClientConfig,
    pub codec: Arc<dyn MessageCodec>,
    pub cipher: Arc<dyn Cipher>,
    pub compressor: Arc<dyn Compressor>,
    pub sequence: Arc<dyn SequenceSource>,
    pub transport: Arc<dyn Transport>,
    /// Context the transforms run on.
    pub processing: SharedExecutor,
    /// Context completions are delivered on.
    pub callback: SharedExecutor,
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("origin", &self.config.origin)
            .field("encrypted", &self.config.cipher_key().is_some())
            .field("constrained_host", &self.config.constrained_host)
            .finish_non_exhaustive()
    }
}

impl PipelineContext {
    /// Executor the transforms run on.
    ///
    /// Constrained hosts restrict background execution, so there the work
    /// stays on the callback context.
    pub fn worker(&self) -> &SharedExecutor {
        if self.config.constrained_host {
            &self.callback
        } else {
            &self.processing
        }
    }

    /// Runs the transform chain and returns the request to send or size.
    pub fn prepare(
        &self,
        request: &PublishRequest,
        seqn: u64,
    ) -> Result<RequestParameters, PipelineError> {
        let options = request.options.normalized();

        let encoded = self.codec.encode(&request.message).inspect_err(|e| {
            tracing::warn!(
                channel = %request.channel,
                seqn,
                error = %e,
                "message encoding failed"
            );
        })?;

        let (text, encrypted) = match self.config.cipher_key() {
            Some(key) => {
                let sealed = self.cipher.encrypt(&encoded, key).inspect_err(|e| {
                    tracing::warn!(
                        channel = %request.channel,
                        seqn,
                        error = %e,
                        "message encryption failed"
                    );
                })?;
                let changed = sealed != encoded;
                (sealed, changed)
            }
            None => (encoded, false),
        };

        let metadata = match &request.metadata {
            Some(meta) => {
                let encoded = self
                    .codec
                    .encode(&Value::Object(meta.clone()))
                    .inspect_err(|e| {
                        tracing::warn!(
                            channel = %request.channel,
                            seqn,
                            error = %e,
                            "metadata encoding failed"
                        );
                    })?;
                Some(encoded)
            }
            None => None,
        };

        let text = if request.payloads.is_empty() {
            text
        } else {
            // Encrypted text is merged as an opaque string so it ends up
            // under `pn_other`; plain objects merge field by field.
            let ciphertext;
            let base = if encrypted {
                ciphertext = self.codec.decode(&text)?;
                &ciphertext
            } else {
                &request.message
            };
            let merged = merge_push_payloads(Some(base), &request.payloads);
            self.codec.encode(&Value::Object(merged))?
        };

        let params = assemble(
            Some(text.as_str()),
            &request.channel,
            &options,
            metadata.as_deref(),
            seqn,
        );

        let params = if options.compress {
            params.with_body(self.compressor.compress(text.as_bytes()))
        } else {
            params
        };

        tracing::debug!(
            channel = %request.channel,
            seqn,
            encrypted,
            compressed = options.compress,
            push = !request.payloads.is_empty(),
            "publish request prepared"
        );

        Ok(params)
    }
}
