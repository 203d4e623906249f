// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Request Parameter Assembly
//!
//! Turns a transformed message plus its publish options into the path and
//! query fields of a publish request. Pure: no I/O, no shared state.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::options::PublishOptions;
use crate::transport::TransportConfig;

/// Everything except RFC 3986 unreserved characters is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Query field names.
pub mod query {
    pub const STORE: &str = "store";
    pub const TTL: &str = "ttl";
    pub const NO_REPLICATION: &str = "norep";
    pub const META: &str = "meta";
    pub const SEQUENCE: &str = "seqn";
}

/// Percent-escapes a path segment or query value.
pub fn escape(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Path and query fields of one publish request.
///
/// Exactly one of a non-empty `message` segment or a `body` is present once
/// the pipeline has finished with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters {
    /// Escaped channel segment.
    pub channel: Option<String>,
    /// Escaped message segment; empty when the body carries the message.
    pub message: Option<String>,
    /// Query fields in emission order.
    pub query: Vec<(&'static str, String)>,
    /// Compressed body, present only for compressed publishes.
    pub body: Option<Vec<u8>>,
}

impl RequestParameters {
    /// Returns the value of a query field.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if the message travels in the body.
    pub fn is_compressed(&self) -> bool {
        self.body.is_some()
    }

    /// Attaches a (possibly empty) compressed body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// HTTP method the request is sent with.
    pub fn method(&self) -> &'static str {
        if self.is_compressed() {
            "POST"
        } else {
            "GET"
        }
    }

    /// Renders the request path: `/publish/{pub}/{sub}/0/{channel}/0[/{message}]`.
    pub fn path(&self, config: &TransportConfig) -> String {
        let mut path = format!(
            "/publish/{}/{}/0",
            escape(&config.publish_key),
            escape(&config.subscribe_key)
        );
        if let Some(channel) = &self.channel {
            path.push('/');
            path.push_str(channel);
        }
        path.push_str("/0");
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            path.push('/');
            path.push_str(message);
        }
        path
    }

    /// Renders the query string, client identity fields included.
    pub fn query_string(&self, config: &TransportConfig) -> String {
        let mut fields: Vec<String> = self
            .query
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        fields.push(format!("uuid={}", escape(&config.user_id)));
        if let Some(auth) = config.auth_key.as_deref().filter(|a| !a.is_empty()) {
            fields.push(format!("auth={}", escape(auth)));
        }
        fields.join("&")
    }

    /// Size in bytes of the request as it would go on the wire.
    pub fn packet_size(&self, config: &TransportConfig) -> usize {
        let body_len = self.body.as_ref().map_or(0, Vec::len);
        let mut head = format!(
            "{} {}?{} HTTP/1.1\r\nHost: {}\r\n",
            self.method(),
            self.path(config),
            self.query_string(config),
            config.origin
        );
        if self.is_compressed() {
            head.push_str(&format!(
                "Content-Encoding: gzip\r\nContent-Length: {body_len}\r\n"
            ));
        }
        head.push_str("\r\n");
        head.len() + body_len
    }
}

/// Assembles request parameters.
///
/// Field order is fixed: channel, store, ttl, norep, message, meta, seqn.
/// An empty `channel` yields no channel segment; callers reject it earlier.
pub fn assemble(
    message: Option<&str>,
    channel: &str,
    options: &PublishOptions,
    metadata: Option<&str>,
    seqn: u64,
) -> RequestParameters {
    let mut params = RequestParameters::default();

    if !channel.is_empty() {
        params.channel = Some(escape(channel));
    }
    if !options.should_store {
        params.query.push((query::STORE, "0".to_string()));
    }
    if let Some(ttl) = options.ttl {
        params.query.push((query::TTL, ttl.to_string()));
    }
    if !options.replicate {
        params.query.push((query::NO_REPLICATION, "true".to_string()));
    }

    params.message = if options.compress {
        Some(String::new())
    } else {
        message.map(escape)
    };

    if let Some(meta) = metadata.filter(|m| !m.is_empty()) {
        params.query.push((query::META, escape(meta)));
    }
    params.query.push((query::SEQUENCE, seqn.to_string()));

    params
}
