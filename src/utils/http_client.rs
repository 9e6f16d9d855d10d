// ABOUTME: HTTP client construction with cookie store and timeout configuration
// ABOUTME: Each session owns its own client so SSO cookies never leak between accounts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use garmin_core::errors::{GarminError, GarminResult};
use reqwest::{Client, ClientBuilder};

use crate::config::HttpClientConfig;

/// Create an HTTP client for one Garmin session
///
/// The client keeps a cookie store (the SSO steps depend on cookies set by
/// earlier steps) and follows redirects.
///
/// # Errors
///
/// Returns a transport error if the TLS backend cannot be initialized.
pub fn create_session_client(config: &HttpClientConfig) -> GarminResult<Client> {
    create_custom_client(|builder| {
        builder
            .cookie_store(true)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
    })
}

/// Create an HTTP client with custom configuration
///
/// # Errors
///
/// Returns a transport error if the builder fails.
pub fn create_custom_client<F>(config_fn: F) -> GarminResult<Client>
where
    F: FnOnce(ClientBuilder) -> ClientBuilder,
{
    config_fn(ClientBuilder::new())
        .build()
        .map_err(|e| GarminError::transport(format!("Failed to build HTTP client: {e}")))
}
