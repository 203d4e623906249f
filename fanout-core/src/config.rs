// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Client Configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::transport::TransportConfig;

/// Default network origin.
pub const DEFAULT_ORIGIN: &str = "ps.pndsn.com";

/// Configuration for a publishing client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub publish_key: String,
    pub subscribe_key: String,
    /// Network origin host.
    pub origin: String,
    /// Identifier of this client; a random UUID unless set.
    pub user_id: String,
    /// Access token sent with each request.
    pub auth_key: Option<String>,
    /// Message encryption key. `None` or empty disables encryption.
    pub cipher_key: Option<String>,
    /// Set when running inside a constrained host (an application extension
    /// sharing a resource group). Pipeline work then runs on the callback
    /// context instead of a background worker.
    pub constrained_host: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            publish_key: String::new(),
            subscribe_key: String::new(),
            origin: DEFAULT_ORIGIN.to_string(),
            user_id: uuid::Uuid::new_v4().to_string(),
            auth_key: None,
            cipher_key: None,
            constrained_host: false,
        }
    }
}

impl ClientConfig {
    /// Creates a builder with default values.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Checks required fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.publish_key.is_empty() {
            return Err(ConfigError::MissingPublishKey);
        }
        if self.subscribe_key.is_empty() {
            return Err(ConfigError::MissingSubscribeKey);
        }
        Ok(())
    }

    /// Returns the effective cipher key, treating an empty key as absent.
    pub fn cipher_key(&self) -> Option<&str> {
        self.cipher_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Derives the transport configuration.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            origin: self.origin.clone(),
            publish_key: self.publish_key.clone(),
            subscribe_key: self.subscribe_key.clone(),
            user_id: self.user_id.clone(),
            auth_key: self.auth_key.clone(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn publish_key(mut self, key: impl Into<String>) -> Self {
        self.config.publish_key = key.into();
        self
    }

    pub fn subscribe_key(mut self, key: impl Into<String>) -> Self {
        self.config.subscribe_key = key.into();
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.config.origin = origin.into();
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.config.user_id = user_id.into();
        self
    }

    pub fn auth_key(mut self, auth_key: impl Into<String>) -> Self {
        self.config.auth_key = Some(auth_key.into());
        self
    }

    pub fn cipher_key(mut self, cipher_key: impl Into<String>) -> Self {
        self.config.cipher_key = Some(cipher_key.into());
        self
    }

    pub fn constrained_host(mut self, constrained: bool) -> Self {
        self.config.constrained_host = constrained;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
