// ABOUTME: Ticket-to-OAuth1 and OAuth1-to-OAuth2 exchanges against the Garmin OAuth service
// ABOUTME: Both requests are OAuth1-signed and sent with the Connect mobile user agent
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use garmin_core::constants::{oauth, user_agents};
use garmin_core::errors::{GarminError, GarminResult, ProtocolFailure};
use garmin_core::models::{OAuth1Token, OAuth2Token, OAuth2TokenResponse};
use reqwest::Method;
use tracing::{debug, info, instrument};

use super::consumer::ConsumerSource;
use super::signer::OAuth1Signer;
use crate::transport::{HttpRequest, HttpTransport};
use crate::urls::GarminUrls;

/// Performs the two OAuth exchanges
#[derive(Clone)]
pub struct OAuthExchanger {
    transport: Arc<dyn HttpTransport>,
    urls: GarminUrls,
    consumer: Arc<ConsumerSource>,
}

impl OAuthExchanger {
    /// Create an exchanger
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        urls: GarminUrls,
        consumer: Arc<ConsumerSource>,
    ) -> Self {
        Self {
            transport,
            urls,
            consumer,
        }
    }

    async fn signer(&self) -> GarminResult<OAuth1Signer> {
        Ok(OAuth1Signer::new(self.consumer.get().await?.clone()))
    }

    /// Exchange an SSO ticket for an OAuth1 token
    ///
    /// # Errors
    ///
    /// - `Protocol(TicketNotFound)` for an empty ticket
    /// - `Protocol(NoOauth1Token)` when consumer credentials are unavailable
    ///   or the response lacks either token field
    /// - `Transport` / `Api` / `AuthExpired` for HTTP failures
    #[instrument(skip_all)]
    pub async fn preauthorize(&self, ticket: &str) -> GarminResult<OAuth1Token> {
        if ticket.is_empty() {
            return Err(ProtocolFailure::TicketNotFound.into());
        }

        let url = self.urls.oauth_endpoint(oauth::PREAUTHORIZED_PATH);
        let params = vec![
            ("ticket".to_owned(), ticket.to_owned()),
            ("login-url".to_owned(), self.urls.sso_embed()),
            ("accepts-mfa-tokens".to_owned(), "true".to_owned()),
        ];
        let signed = self.signer().await?.sign(&Method::GET, &url, &params, None)?;

        debug!("Requesting preauthorized OAuth1 token");
        let response = self
            .transport
            .execute(
                HttpRequest::get(url)
                    .queries(params)
                    .header("Authorization", signed.authorization_header())
                    .header("User-Agent", user_agents::CONNECT_MOBILE),
            )
            .await?
            .error_for_status()?;

        let token = parse_oauth1_body(&response.text())?;
        info!("OAuth1 token acquired");
        Ok(token)
    }

    /// Exchange an OAuth1 token for a fresh OAuth2 token
    ///
    /// # Errors
    ///
    /// - `Protocol(NoOauth1Token)` when consumer credentials are unavailable
    /// - `Serialization` when the response is not a token document
    /// - `Transport` / `Api` / `AuthExpired` for HTTP failures
    #[instrument(skip_all)]
    pub async fn exchange(&self, oauth1: &OAuth1Token) -> GarminResult<OAuth2Token> {
        let url = self.urls.oauth_endpoint(oauth::EXCHANGE_PATH);
        let signed = self
            .signer()
            .await?
            .sign(&Method::POST, &url, &[], Some(oauth1))?;

        debug!("Exchanging OAuth1 token for OAuth2 token");
        let response = self
            .transport
            .execute(
                HttpRequest::post(url)
                    .queries(signed.into_query())
                    .header("User-Agent", user_agents::CONNECT_MOBILE)
                    .header("Content-Type", "application/x-www-form-urlencoded"),
            )
            .await?
            .error_for_status()?;

        let body: OAuth2TokenResponse = response.json("oauth2 token")?;
        let token = OAuth2Token::from_response(body, Utc::now());
        info!(expires_at = token.expires_at, "OAuth2 token acquired");
        Ok(token)
    }
}

/// Parse `oauth_token=..&oauth_token_secret=..`; extra fields are ignored
fn parse_oauth1_body(body: &str) -> GarminResult<OAuth1Token> {
    let fields: HashMap<String, String> = serde_urlencoded::from_str(body.trim())
        .map_err(|e| GarminError::malformed("preauthorized", e.to_string()))?;

    let field = |name: &str| {
        fields
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
            .ok_or_else(|| {
                GarminError::from(ProtocolFailure::NoOauth1Token {
                    reason: format!("response is missing {name}"),
                })
            })
    };

    Ok(OAuth1Token {
        oauth_token: field("oauth_token")?,
        oauth_token_secret: field("oauth_token_secret")?,
    })
}
