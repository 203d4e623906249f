// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! Shared fixtures for publisher tests.

#![allow(dead_code)]

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Once};
use std::time::Duration;

use fanout_core::{
    ClientConfig, InlineExecutor, MockTransport, PublishStatus, Publisher, PublisherBuilder,
    Transport,
};

pub const CIPHER_KEY: &str = "enigma";

static TRACING: Once = Once::new();

/// Routes pipeline logs to the test harness. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn test_config() -> ClientConfig {
    ClientConfig::builder()
        .publish_key("demo-pub")
        .subscribe_key("demo-sub")
        .user_id("test-user")
        .build()
        .unwrap()
}

pub fn encrypted_config() -> ClientConfig {
    ClientConfig {
        cipher_key: Some(CIPHER_KEY.to_string()),
        ..test_config()
    }
}

/// Builder whose transforms and completions all run on the calling thread.
pub fn inline_builder(config: ClientConfig, transport: &Arc<MockTransport>) -> PublisherBuilder {
    init_tracing();
    let transport: Arc<dyn Transport> = transport.clone();
    Publisher::builder(config)
        .transport(transport)
        .processing_executor(Arc::new(InlineExecutor))
        .callback_executor(Arc::new(InlineExecutor))
}

pub fn inline_publisher(config: ClientConfig) -> (Publisher, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::with_config(config.transport_config()));
    let publisher = inline_builder(config, &transport).build().unwrap();
    (publisher, transport)
}

/// Completion that forwards every status into a channel.
pub fn status_channel() -> (
    impl Fn(PublishStatus) + Send + Sync + 'static,
    Receiver<PublishStatus>,
) {
    let (tx, rx) = mpsc::channel();
    let tx = std::sync::Mutex::new(tx);
    let completion = move |status: PublishStatus| {
        let _ = tx.lock().unwrap().send(status);
    };
    (completion, rx)
}

pub fn recv(rx: &Receiver<PublishStatus>) -> PublishStatus {
    rx.recv_timeout(Duration::from_secs(5))
        .expect("completion was not delivered")
}
