// ABOUTME: Shared test utilities and mock Garmin endpoints for integration tests
// ABOUTME: Provides logging setup, client configuration, token builders, and wiremock mounts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `garmin_connect`
//!
//! Every suite runs against a `wiremock` server standing in for the SSO,
//! OAuth, and `connectapi` hosts at once (see `GarminUrls::single_origin`).

use std::sync::Once;
use std::time::Duration;

use chrono::Utc;
use garmin_connect::api::GarminConnect;
use garmin_connect::config::GarminConfig;
use garmin_connect::models::{
    ConsumerCredentials, Credentials, OAuth1Token, OAuth2Token, OAuth2TokenResponse,
};
use garmin_connect::urls::GarminUrls;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT_LOGGER: Once = Once::new();

pub const USERNAME: &str = "runner@example.com";
pub const PASSWORD: &str = "hunter2";
pub const CSRF_TOKEN: &str = "csrf-token-123";
pub const TICKET: &str = "ST-0123456-abcdef-cas";
pub const OAUTH1_TOKEN: &str = "oauth1-token";
pub const OAUTH1_SECRET: &str = "oauth1-secret";
pub const DISPLAY_NAME: &str = "runner-7f3a";

pub const PREAUTHORIZED_PATH: &str = "/oauth-service/oauth/preauthorized";
pub const EXCHANGE_PATH: &str = "/oauth-service/oauth/exchange/user/2.0";
pub const PROFILE_PATH: &str = "/userprofile-service/socialProfile";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration pointing every endpoint at the mock server
pub fn test_config(server: &MockServer) -> GarminConfig {
    GarminConfig::default()
        .with_urls(GarminUrls::single_origin(server.uri()))
        .with_consumer(ConsumerCredentials::new("consumer-key", "consumer-secret"))
        .with_credentials(Credentials::new(USERNAME, PASSWORD))
}

/// Client over a real reqwest transport aimed at the mock server
pub fn test_client(server: &MockServer) -> GarminConnect {
    init_test_logging();
    GarminConnect::new(test_config(server)).unwrap()
}

pub fn oauth1_token() -> OAuth1Token {
    OAuth1Token {
        oauth_token: OAUTH1_TOKEN.to_owned(),
        oauth_token_secret: OAUTH1_SECRET.to_owned(),
    }
}

/// OAuth2 token issued now with the given lifetimes
pub fn oauth2_token(access_token: &str, expires_in: i64, refresh_expires_in: i64) -> OAuth2Token {
    OAuth2Token::from_response(
        OAuth2TokenResponse {
            scope: "CONNECT_READ CONNECT_WRITE".to_owned(),
            jti: "jti-1".to_owned(),
            access_token: access_token.to_owned(),
            token_type: "Bearer".to_owned(),
            refresh_token: "refresh-token".to_owned(),
            expires_in,
            refresh_token_expires_in: refresh_expires_in,
        },
        Utc::now(),
    )
}

/// OAuth2 token whose access token expired a minute ago
pub fn expired_oauth2_token(access_token: &str) -> OAuth2Token {
    let mut token = oauth2_token(access_token, 3600, 7_776_000);
    token.expires_at = Utc::now().timestamp() - 60;
    token
}

/// Exchange endpoint response body
pub fn token_body(access_token: &str) -> serde_json::Value {
    json!({
        "scope": "CONNECT_READ CONNECT_WRITE",
        "jti": "jti-2",
        "access_token": access_token,
        "token_type": "Bearer",
        "refresh_token": "refresh-token-2",
        "expires_in": 3600,
        "refresh_token_expires_in": 7_776_000
    })
}

pub fn signin_page() -> String {
    format!(
        r#"<html><head><title>GARMIN Authentication Application</title></head>
        <body><form method="post" id="login-form">
        <input type="hidden" name="_csrf" value="{CSRF_TOKEN}" />
        </form></body></html>"#
    )
}

pub fn success_page(ticket: &str) -> String {
    format!(
        r#"<html><head><title>Success</title></head><body><script>
        var response_url = "https://connect.garmin.com/modern?ticket={ticket}";
        </script></body></html>"#
    )
}

/// Mount the two SSO GET steps
pub async fn mount_sso_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/sso/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sso/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(signin_page()))
        .mount(server)
        .await;
}

/// Mount the full SSO chain; the credential POST answers with `submit_body`
pub async fn mount_sso(server: &MockServer, submit_body: String) {
    mount_sso_pages(server).await;

    Mock::given(method("POST"))
        .and(path("/sso/signin"))
        .and(body_string_contains(format!("_csrf={CSRF_TOKEN}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(submit_body))
        .mount(server)
        .await;
}

/// Mount the preauthorized and exchange endpoints
pub async fn mount_oauth(server: &MockServer, access_token: &str) {
    Mock::given(method("GET"))
        .and(path(PREAUTHORIZED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "oauth_token={OAUTH1_TOKEN}&oauth_token_secret={OAUTH1_SECRET}&mfa_token=&mfa_expiration_timestamp="
        )))
        .mount(server)
        .await;

    mount_exchange(server, access_token, Duration::ZERO, None).await;
}

/// Mount the exchange endpoint with an optional delay and call-count expectation
pub async fn mount_exchange(
    server: &MockServer,
    access_token: &str,
    delay: Duration,
    expected_calls: Option<u64>,
) {
    let mock = Mock::given(method("POST")).and(path(EXCHANGE_PATH)).respond_with(
        ResponseTemplate::new(200)
            .set_body_json(token_body(access_token))
            .set_delay(delay),
    );
    let mock = match expected_calls {
        Some(calls) => mock.expect(calls),
        None => mock,
    };
    mock.mount(server).await;
}

/// Mount the social profile endpoint
pub async fn mount_profile(server: &MockServer, display_name: &str) {
    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "displayName": display_name,
            "fullName": "Test Runner"
        })))
        .mount(server)
        .await;
}

/// Client already holding a valid token pair with `access_token`
pub async fn authenticated_client(server: &MockServer, access_token: &str) -> GarminConnect {
    let client = test_client(server);
    client
        .load_tokens(oauth1_token(), oauth2_token(access_token, 3600, 7_776_000))
        .await
        .unwrap();
    client
}
