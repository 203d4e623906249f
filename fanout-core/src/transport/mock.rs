// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Transport
//!
//! In-memory transport for tests: records every request and replays
//! injected failures.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use super::{Operation, PublishAck, Transport, TransportConfig, TransportError, TransportResult};
use crate::request::RequestParameters;

/// Timetoken returned when none is configured.
const DEFAULT_TIMETOKEN: &str = "14613497208195952";

/// A request captured by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    pub operation: Operation,
    pub params: RequestParameters,
}

#[derive(Debug)]
struct MockState {
    sent: Vec<SentRequest>,
    errors: VecDeque<TransportError>,
    timetoken: String,
    size_queries: usize,
}

/// Mock transport for testing.
#[derive(Debug)]
pub struct MockTransport {
    config: TransportConfig,
    state: Mutex<MockState>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a mock transport with a default configuration.
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Creates a mock transport that sizes requests against `config`.
    pub fn with_config(config: TransportConfig) -> Self {
        MockTransport {
            config,
            state: Mutex::new(MockState {
                sent: Vec::new(),
                errors: VecDeque::new(),
                timetoken: DEFAULT_TIMETOKEN.to_string(),
                size_queries: 0,
            }),
        }
    }

    /// Makes the next `send` fail with `error`. Errors queue up in order.
    pub fn inject_error(&self, error: TransportError) {
        self.state().errors.push_back(error);
    }

    /// Sets the timetoken returned by successful sends.
    pub fn set_timetoken(&self, timetoken: impl Into<String>) {
        self.state().timetoken = timetoken.into();
    }

    /// Returns all requests passed to `send`, failed ones included.
    pub fn sent_requests(&self) -> Vec<SentRequest> {
        self.state().sent.clone()
    }

    /// Clears the sent request log.
    pub fn clear_sent(&self) {
        self.state().sent.clear();
    }

    /// Number of `estimate_size` calls so far.
    pub fn size_queries(&self) -> usize {
        self.state().size_queries
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the log from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        operation: Operation,
        params: &RequestParameters,
    ) -> TransportResult<PublishAck> {
        let mut state = self.state();
        state.sent.push(SentRequest {
            operation,
            params: params.clone(),
        });

        match state.errors.pop_front() {
            Some(error) => Err(error),
            None => Ok(PublishAck {
                timetoken: state.timetoken.clone(),
            }),
        }
    }

    fn estimate_size(&self, _operation: Operation, params: &RequestParameters) -> usize {
        self.state().size_queries += 1;
        params.packet_size(&self.config)
    }
}
