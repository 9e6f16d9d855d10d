// ABOUTME: Resolves the shared OAuth consumer key/secret once per client
// ABOUTME: Uses a configured preset or fetches the public bootstrap document, then caches the result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use garmin_core::errors::{GarminError, GarminResult, ProtocolFailure};
use garmin_core::models::ConsumerCredentials;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::ConsumerConfig;
use crate::transport::{HttpRequest, HttpTransport};

/// Source of consumer credentials, resolved at most once successfully
pub struct ConsumerSource {
    transport: Arc<dyn HttpTransport>,
    config: ConsumerConfig,
    resolved: OnceCell<ConsumerCredentials>,
}

impl ConsumerSource {
    /// Create a source; nothing is fetched until first use
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, config: ConsumerConfig) -> Self {
        Self {
            transport,
            config,
            resolved: OnceCell::new(),
        }
    }

    /// Consumer credentials, fetching the bootstrap document on first call
    ///
    /// A failed fetch is not cached; the next call tries again.
    ///
    /// # Errors
    ///
    /// - `Config` when a preset has an empty key or secret
    /// - `Protocol(NoOauth1Token)` when no source is configured or the
    ///   document lacks either value
    /// - `Transport` / `Api` when the fetch fails
    pub async fn get(&self) -> GarminResult<&ConsumerCredentials> {
        self.resolved.get_or_try_init(|| self.resolve()).await
    }

    async fn resolve(&self) -> GarminResult<ConsumerCredentials> {
        if let Some(preset) = &self.config.preset {
            if !preset.is_complete() {
                return Err(GarminError::config(
                    "OAuth consumer key and secret must not be empty",
                ));
            }
            debug!("Using configured OAuth consumer credentials");
            return Ok(preset.clone());
        }

        if self.config.bootstrap_url.trim().is_empty() {
            return Err(ProtocolFailure::NoOauth1Token {
                reason: "OAuth consumer credentials are not configured".to_owned(),
            }
            .into());
        }

        info!(url = %self.config.bootstrap_url, "Fetching OAuth consumer credentials");
        let response = self
            .transport
            .execute(HttpRequest::get(self.config.bootstrap_url.clone()))
            .await?
            .error_for_status()?;

        let consumer: ConsumerCredentials = response.json("oauth consumer").map_err(|_| {
            GarminError::from(ProtocolFailure::NoOauth1Token {
                reason: "consumer bootstrap document is not valid JSON".to_owned(),
            })
        })?;
        if !consumer.is_complete() {
            return Err(ProtocolFailure::NoOauth1Token {
                reason: "consumer bootstrap document lacks key or secret".to_owned(),
            }
            .into());
        }
        Ok(consumer)
    }
}
