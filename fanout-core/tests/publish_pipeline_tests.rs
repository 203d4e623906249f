// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! End-to-end tests for the publish pipeline.

mod common;

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use common::*;
use fanout_core::compression::decompress;
use fanout_core::executor::Job;
use fanout_core::request::query;
use fanout_core::{
    Cipher, ClientConfig, CryptoError, EncodeError, Executor, MessageCipher, MessageCodec,
    MockTransport, PublishError, PublishRequest, Publisher, TransportError,
};
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};

/// Decodes the message a mock transport received, from path or body.
fn sent_message(transport: &MockTransport, index: usize) -> Value {
    let params = &transport.sent_requests()[index].params;
    let text = match &params.body {
        Some(body) => String::from_utf8(decompress(body).unwrap()).unwrap(),
        None => percent_decode_str(params.message.as_deref().unwrap())
            .decode_utf8()
            .unwrap()
            .into_owned(),
    };
    serde_json::from_str(&text).unwrap()
}

fn scenario_request() -> PublishRequest {
    PublishRequest::builder("a", "test")
        .push_payload(
            "aps",
            json!({"alert": "You got your emails.@", "badge": 9, "sound": "bingbong.aiff"}),
        )
        .push_payload("acme 1", 42)
        .store(true)
        .compress(true)
        .meta("foo", "bar")
        .build()
}

struct FailingCodec;

impl MessageCodec for FailingCodec {
    fn encode(&self, _value: &Value) -> Result<String, EncodeError> {
        Err(EncodeError::Unrepresentable("unsupported value".into()))
    }

    fn decode(&self, _text: &str) -> Result<Value, EncodeError> {
        Err(EncodeError::Malformed("unsupported text".into()))
    }
}

/// Encodes everything except objects, so metadata fails while plain
/// string messages go through.
struct NoObjectsCodec;

impl MessageCodec for NoObjectsCodec {
    fn encode(&self, value: &Value) -> Result<String, EncodeError> {
        match value {
            Value::Object(_) => Err(EncodeError::Unrepresentable("object".into())),
            other => Ok(other.to_string()),
        }
    }

    fn decode(&self, text: &str) -> Result<Value, EncodeError> {
        serde_json::from_str(text).map_err(|e| EncodeError::Malformed(e.to_string()))
    }
}

/// Collects formatted log output.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct BrokenCipher;

impl Cipher for BrokenCipher {
    fn encrypt(&self, _text: &str, _cipher_key: &str) -> Result<String, CryptoError> {
        Err(CryptoError::EncryptionFailed)
    }
}

/// Runs jobs inline and counts them.
#[derive(Default)]
struct CountingExecutor {
    jobs: AtomicUsize,
}

impl Executor for CountingExecutor {
    fn execute(&self, job: Job) {
        self.jobs.fetch_add(1, Ordering::SeqCst);
        job();
    }
}

struct RejectingExecutor;

impl Executor for RejectingExecutor {
    fn execute(&self, _job: Job) {
        panic!("constrained hosts must not use the processing executor");
    }
}

// === Scenario ===

#[test]
fn test_push_scenario_compressed_with_metadata() {
    let (publisher, transport) = inline_publisher(test_config());
    let (completion, rx) = status_channel();

    publisher.publish(scenario_request(), completion);

    let status = recv(&rx);
    assert!(!status.is_error());
    assert_eq!(status.timetoken(), Some("14613497208195952"));
    assert_eq!(status.sequence(), Some(1));

    let sent = transport.sent_requests();
    assert_eq!(sent.len(), 1);
    let params = &sent[0].params;
    assert_eq!(params.channel.as_deref(), Some("a"));
    assert_eq!(params.message.as_deref(), Some(""));
    assert_eq!(params.query_value(query::STORE), None);
    assert_eq!(params.query_value(query::SEQUENCE), Some("1"));
    assert_eq!(
        params.query_value(query::META),
        Some("%7B%22foo%22%3A%22bar%22%7D")
    );

    assert_eq!(
        sent_message(&transport, 0),
        json!({
            "pn_other": "test",
            "pn_apns": {"aps": {"alert": "You got your emails.@", "badge": 9, "sound": "bingbong.aiff"}},
            "pn_acme 1": 42
        })
    );
}

#[test]
fn test_push_scenario_encrypted_merges_ciphertext_under_pn_other() {
    let (publisher, transport) = inline_publisher(encrypted_config());
    let (completion, rx) = status_channel();

    publisher.publish(scenario_request(), completion);
    assert!(!recv(&rx).is_error());

    let message = sent_message(&transport, 0);
    assert_eq!(message["pn_acme 1"], json!(42));
    assert_eq!(message["pn_apns"]["aps"]["badge"], json!(9));

    let ciphertext = serde_json::to_string(&message["pn_other"]).unwrap();
    assert!(message["pn_other"].is_string());
    assert_eq!(
        MessageCipher.decrypt(&ciphertext, CIPHER_KEY).unwrap(),
        "\"test\""
    );
}

// === Transform ordering ===

#[test]
fn test_object_message_merges_fields_when_unencrypted() {
    let (publisher, transport) = inline_publisher(test_config());
    let (completion, rx) = status_channel();

    let request = PublishRequest::builder("a", json!({"text": "hi"}))
        .push_payload("gcm", json!({"data": {"n": 1}}))
        .build();
    publisher.publish(request, completion);
    assert!(!recv(&rx).is_error());

    assert_eq!(
        sent_message(&transport, 0),
        json!({"text": "hi", "pn_gcm": {"data": {"n": 1}}})
    );
}

#[test]
fn test_no_push_keys_without_payloads() {
    let (publisher, transport) = inline_publisher(test_config());
    let (completion, rx) = status_channel();

    publisher.publish(PublishRequest::new("a", json!({"x": 1})), completion);
    assert!(!recv(&rx).is_error());

    let message = sent_message(&transport, 0);
    assert_eq!(message, json!({"x": 1}));
    assert!(message
        .as_object()
        .unwrap()
        .keys()
        .all(|key| !key.starts_with("pn_")));
}

#[test]
fn test_encrypted_message_without_payloads_is_ciphertext() {
    let (publisher, transport) = inline_publisher(encrypted_config());
    let (completion, rx) = status_channel();

    publisher.publish(PublishRequest::new("a", json!({"secret": true})), completion);
    assert!(!recv(&rx).is_error());

    let params = &transport.sent_requests()[0].params;
    let text = percent_decode_str(params.message.as_deref().unwrap())
        .decode_utf8()
        .unwrap()
        .into_owned();
    assert!(!text.contains("secret"));
    assert_eq!(
        MessageCipher.decrypt(&text, CIPHER_KEY).unwrap(),
        "{\"secret\":true}"
    );
}

#[test]
fn test_uncompressed_publish_has_no_body() {
    let (publisher, transport) = inline_publisher(test_config());
    let (completion, rx) = status_channel();

    publisher.publish(PublishRequest::new("a", "hello"), completion);
    assert!(!recv(&rx).is_error());

    let params = &transport.sent_requests()[0].params;
    assert!(params.body.is_none());
    assert_eq!(params.message.as_deref(), Some("%22hello%22"));
}

#[test]
fn test_unstored_publish_drops_ttl() {
    let (publisher, transport) = inline_publisher(test_config());
    let (completion, rx) = status_channel();

    let request = PublishRequest::builder("a", 1)
        .store(false)
        .ttl(24)
        .replicate(false)
        .build();
    publisher.publish(request, completion);
    assert!(!recv(&rx).is_error());

    let params = &transport.sent_requests()[0].params;
    assert_eq!(params.query_value(query::STORE), Some("0"));
    assert_eq!(params.query_value(query::TTL), None);
    assert_eq!(params.query_value(query::NO_REPLICATION), Some("true"));
}

// === Failures ===

#[test]
fn test_encode_failure_completes_without_dispatch_or_retry() {
    let transport = Arc::new(MockTransport::new());
    let publisher = inline_builder(test_config(), &transport)
        .codec(Arc::new(FailingCodec))
        .build()
        .unwrap();
    let (completion, rx) = status_channel();

    publisher.publish(PublishRequest::new("a", "x"), completion);

    let status = recv(&rx);
    assert!(matches!(status.error(), Some(PublishError::Encode(_))));
    assert!(!status.error().unwrap().is_retryable());
    assert!(status.retry_handle().is_none());
    assert!(!status.retry());
    // The failed run still consumed its sequence number
    assert_eq!(status.sequence(), Some(1));
    assert_eq!(publisher.next_sequence(), 2);
    assert!(transport.sent_requests().is_empty());
}

#[test]
fn test_metadata_encode_failure_is_logged_and_not_dispatched() {
    let transport = Arc::new(MockTransport::new());
    let publisher = inline_builder(test_config(), &transport)
        .codec(Arc::new(NoObjectsCodec))
        .build()
        .unwrap();
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .with_writer(move || writer.clone())
        .finish();
    let (completion, rx) = status_channel();

    tracing::subscriber::with_default(subscriber, || {
        let request = PublishRequest::builder("a", "x").meta("foo", "bar").build();
        publisher.publish(request, completion);
    });

    let status = recv(&rx);
    assert!(matches!(status.error(), Some(PublishError::Encode(_))));
    assert!(!status.error().unwrap().is_retryable());
    assert!(status.retry_handle().is_none());
    assert!(transport.sent_requests().is_empty());
    assert!(logs.contents().contains("metadata encoding failed"));
}

#[test]
fn test_cipher_failure_completes_without_dispatch_or_retry() {
    let transport = Arc::new(MockTransport::new());
    let publisher = inline_builder(encrypted_config(), &transport)
        .cipher(Arc::new(BrokenCipher))
        .build()
        .unwrap();
    let (completion, rx) = status_channel();

    publisher.publish(scenario_request(), completion);

    let status = recv(&rx);
    assert_eq!(
        status.error(),
        Some(&PublishError::Crypto(CryptoError::EncryptionFailed))
    );
    assert!(status.retry_handle().is_none());
    assert!(transport.sent_requests().is_empty());
}

#[test]
fn test_cipher_not_used_without_key() {
    let transport = Arc::new(MockTransport::new());
    let publisher = inline_builder(test_config(), &transport)
        .cipher(Arc::new(BrokenCipher))
        .build()
        .unwrap();
    let (completion, rx) = status_channel();

    publisher.publish(PublishRequest::new("a", "x"), completion);
    assert!(!recv(&rx).is_error());
}

#[test]
fn test_empty_channel_rejected_without_allocating() {
    let (publisher, transport) = inline_publisher(test_config());
    let (completion, rx) = status_channel();

    publisher.publish(PublishRequest::new("", "x"), completion);

    let status = recv(&rx);
    assert_eq!(status.error(), Some(&PublishError::InvalidChannel));
    assert_eq!(status.sequence(), None);
    assert_eq!(publisher.next_sequence(), 1);
    assert!(transport.sent_requests().is_empty());
}

#[test]
fn test_success_reports_transport_timetoken() {
    let (publisher, transport) = inline_publisher(test_config());
    transport.set_timetoken("15000000000000001");

    let (completion, rx) = status_channel();
    publisher.publish(PublishRequest::new("a", "first"), completion);
    assert_eq!(recv(&rx).timetoken(), Some("15000000000000001"));

    transport.clear_sent();
    transport.set_timetoken("15000000000000002");
    let (completion, rx) = status_channel();
    publisher.publish(PublishRequest::new("a", "second"), completion);

    let status = recv(&rx);
    assert_eq!(status.timetoken(), Some("15000000000000002"));
    assert_eq!(status.sequence(), Some(2));
    assert_eq!(transport.sent_requests().len(), 1);
    assert_eq!(sent_message(&transport, 0), json!("second"));
}

// === Retry ===

#[test]
fn test_dispatch_failure_retry_allocates_new_sequence() {
    let (publisher, transport) = inline_publisher(test_config());
    transport.inject_error(TransportError::Timeout);
    let (completion, rx) = status_channel();

    publisher.publish(PublishRequest::new("a", "retry me"), completion);

    let failed = recv(&rx);
    assert_eq!(
        failed.error(),
        Some(&PublishError::Dispatch(TransportError::Timeout))
    );
    assert!(failed.error().unwrap().is_retryable());
    assert_eq!(failed.sequence(), Some(1));
    assert_eq!(
        failed.retry_handle().unwrap().request(),
        &PublishRequest::new("a", "retry me")
    );

    assert!(failed.retry());

    let retried = recv(&rx);
    assert!(!retried.is_error());
    assert_eq!(retried.sequence(), Some(2));

    let sent = transport.sent_requests();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].params.query_value(query::SEQUENCE), Some("1"));
    assert_eq!(sent[1].params.query_value(query::SEQUENCE), Some("2"));
    assert_eq!(sent[0].params.message, sent[1].params.message);
}

#[test]
fn test_retry_of_retry_keeps_reporting_to_same_completion() {
    let (publisher, transport) = inline_publisher(test_config());
    transport.inject_error(TransportError::ConnectionFailed("offline".into()));
    transport.inject_error(TransportError::Timeout);

    let calls = Arc::new(AtomicUsize::new(0));
    let (completion, rx) = status_channel();
    let counted = {
        let calls = Arc::clone(&calls);
        move |status| {
            calls.fetch_add(1, Ordering::SeqCst);
            completion(status);
        }
    };

    publisher.publish(PublishRequest::new("a", 1), counted);
    let first = recv(&rx);
    assert!(first.retry());
    let second = recv(&rx);
    assert!(second.is_error());
    assert!(second.retry());
    let third = recv(&rx);

    assert!(!third.is_error());
    assert_eq!(third.sequence(), Some(3));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(rx.try_recv().is_err());
}

// === Execution contexts ===

#[test]
fn test_default_publisher_runs_on_background_worker() {
    let config = test_config();
    let transport = Arc::new(MockTransport::new());
    let publisher = Publisher::new(config, transport.clone()).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let tx = std::sync::Mutex::new(tx);
    publisher.publish(PublishRequest::new("a", "bg"), move |status| {
        let name = std::thread::current().name().map(str::to_string);
        let _ = tx.lock().unwrap().send((status, name));
    });

    let (status, thread_name) = rx
        .recv_timeout(std::time::Duration::from_secs(5))
        .unwrap();
    assert!(!status.is_error());
    assert_eq!(thread_name.as_deref(), Some("fanout-publish"));
    assert_eq!(transport.sent_requests().len(), 1);
}

#[test]
fn test_constrained_host_runs_on_callback_context() {
    let config = ClientConfig {
        constrained_host: true,
        ..test_config()
    };
    let transport = Arc::new(MockTransport::new());
    let callback = Arc::new(CountingExecutor::default());
    let publisher = inline_builder(config, &transport)
        .processing_executor(Arc::new(RejectingExecutor))
        .callback_executor(callback.clone())
        .build()
        .unwrap();
    let (completion, rx) = status_channel();

    publisher.publish(PublishRequest::new("a", "ext"), completion);

    assert!(!recv(&rx).is_error());
    // One hop for the transforms, one for delivery
    assert_eq!(callback.jobs.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_publishes_get_distinct_sequences() {
    let transport = Arc::new(MockTransport::new());
    let transport_dyn: Arc<dyn fanout_core::Transport> = transport.clone();
    let publisher = Publisher::builder(test_config())
        .transport(transport_dyn)
        .build()
        .unwrap();
    let (completion, rx) = status_channel();
    let completion = Arc::new(completion);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let publisher = publisher.clone();
            let completion = Arc::clone(&completion);
            std::thread::spawn(move || {
                for i in 0..25 {
                    let completion = Arc::clone(&completion);
                    publisher.publish(PublishRequest::new("a", json!([t, i])), move |s| {
                        completion(s)
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let sequences: HashSet<u64> = (0..100)
        .map(|_| recv(&rx).sequence().unwrap())
        .collect();
    assert_eq!(sequences, (1..=100).collect());
    assert_eq!(transport.sent_requests().len(), 100);
}
