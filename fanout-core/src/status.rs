// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Publish Status and Retry

use std::sync::Arc;

use crate::client::{run_publish, Completion};
use crate::error::{PublishError, PublishResult};
use crate::options::PublishRequest;
use crate::pipeline::PipelineContext;
use crate::transport::PublishAck;

/// Outcome of one publish run, delivered to the completion handler.
#[derive(Debug, Clone)]
pub struct PublishStatus {
    outcome: PublishResult<PublishAck>,
    sequence: Option<u64>,
    retry: Option<RetryHandle>,
}

impl PublishStatus {
    pub(crate) fn succeeded(ack: PublishAck, sequence: u64) -> Self {
        PublishStatus {
            outcome: Ok(ack),
            sequence: Some(sequence),
            retry: None,
        }
    }

    pub(crate) fn failed(
        error: PublishError,
        sequence: Option<u64>,
        retry: Option<RetryHandle>,
    ) -> Self {
        PublishStatus {
            outcome: Err(error),
            sequence,
            retry,
        }
    }

    /// Returns true if the publish failed.
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// Server-assigned timetoken of a successful publish.
    pub fn timetoken(&self) -> Option<&str> {
        self.outcome.as_ref().ok().map(|ack| ack.timetoken.as_str())
    }

    pub fn error(&self) -> Option<&PublishError> {
        self.outcome.as_ref().err()
    }

    pub fn outcome(&self) -> &PublishResult<PublishAck> {
        &self.outcome
    }

    /// Sequence number this run used. `None` if the request was rejected
    /// before one was allocated.
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// Retry handle; present only for dispatch failures.
    pub fn retry_handle(&self) -> Option<&RetryHandle> {
        self.retry.as_ref()
    }

    /// Re-runs the publish if this status is retryable.
    ///
    /// Returns false when there is nothing to retry.
    pub fn retry(&self) -> bool {
        match &self.retry {
            Some(handle) => {
                handle.retry();
                true
            }
            None => false,
        }
    }
}

/// Re-runs a failed publish with its original arguments.
///
/// Each retry is a full pipeline run and allocates a new sequence number.
#[derive(Clone)]
pub struct RetryHandle {
    context: Arc<PipelineContext>,
    request: PublishRequest,
    completion: Completion,
}

impl std::fmt::Debug for RetryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryHandle")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl RetryHandle {
    pub(crate) fn new(
        context: Arc<PipelineContext>,
        request: PublishRequest,
        completion: Completion,
    ) -> Self {
        RetryHandle {
            context,
            request,
            completion,
        }
    }

    /// The request that will be re-submitted.
    pub fn request(&self) -> &PublishRequest {
        &self.request
    }

    /// Re-submits the request; the result goes to the original completion.
    pub fn retry(&self) {
        tracing::debug!(channel = %self.request.channel, "retrying publish");
        run_publish(
            Arc::clone(&self.context),
            self.request.clone(),
            Arc::clone(&self.completion),
        );
    }
}
