// ABOUTME: Drives the SSO sign-in chain from credentials to a one-time service ticket
// ABOUTME: Cookie priming, CSRF scrape, credential POST, then locked/phone/MFA/ticket classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use async_trait::async_trait;
use garmin_core::constants::{sso, user_agents};
use garmin_core::errors::{AuthFailure, GarminError, GarminResult, ProtocolFailure};
use garmin_core::models::Credentials;
use tracing::{debug, info, instrument, warn};

use super::parser;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::urls::GarminUrls;

/// Hook invoked on the credential-submission response before the ticket scrape
///
/// Implementations can detect an MFA challenge and fail with a specific error.
/// The default does nothing, in which case an MFA page surfaces as
/// [`AuthFailure::InvalidCredentialsOrMfa`].
#[async_trait]
pub trait MfaHandler: Send + Sync {
    /// Inspect the sign-in response body
    ///
    /// # Errors
    ///
    /// Returns an error to abort the login.
    async fn inspect(&self, body: &str) -> GarminResult<()>;
}

/// Pass-through MFA handler
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMfaHandler;

#[async_trait]
impl MfaHandler for NoMfaHandler {
    async fn inspect(&self, _body: &str) -> GarminResult<()> {
        Ok(())
    }
}

/// Converts credentials into an SSO service ticket
#[derive(Clone)]
pub struct TicketAcquirer {
    transport: Arc<dyn HttpTransport>,
    urls: GarminUrls,
    mfa: Arc<dyn MfaHandler>,
}

impl TicketAcquirer {
    /// Create an acquirer with the pass-through MFA handler
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, urls: GarminUrls) -> Self {
        Self {
            transport,
            urls,
            mfa: Arc::new(NoMfaHandler),
        }
    }

    /// Replace the MFA handler
    #[must_use]
    pub fn with_mfa_handler(mut self, mfa: Arc<dyn MfaHandler>) -> Self {
        self.mfa = mfa;
        self
    }

    /// Run the sign-in chain and return the ticket
    ///
    /// # Errors
    ///
    /// - `Protocol(CsrfNotFound)` when the sign-in page has no CSRF input
    /// - `Auth(AccountLocked | PhoneNumberUpdateRequired | InvalidCredentialsOrMfa)`
    ///   when the service rejects the submission
    /// - `Transport` / `Api` for HTTP failures on any step
    #[instrument(skip_all, fields(username = %credentials.username))]
    pub async fn acquire(&self, credentials: &Credentials) -> GarminResult<String> {
        credentials.validate()?;

        self.prime_cookies().await?;
        let csrf = self.fetch_csrf().await?;
        let body = self.submit_credentials(credentials, &csrf).await?;
        let ticket = self.classify(&body).await?;

        info!("SSO ticket acquired");
        Ok(ticket)
    }

    async fn send(&self, request: HttpRequest) -> GarminResult<HttpResponse> {
        self.transport.execute(request).await?.error_for_status()
    }

    async fn prime_cookies(&self) -> GarminResult<()> {
        debug!("Priming SSO cookies");
        self.send(
            HttpRequest::get(self.urls.sso_embed())
                .query("clientId", sso::CLIENT_ID)
                .query("locale", sso::LOCALE)
                .query("service", self.urls.connect_modern()),
        )
        .await?;
        Ok(())
    }

    async fn fetch_csrf(&self) -> GarminResult<String> {
        let response = self
            .send(
                HttpRequest::get(self.urls.signin())
                    .query("id", sso::WIDGET_ID)
                    .query("embedWidget", "true")
                    .query("locale", sso::LOCALE)
                    .query("gauthHost", self.urls.sso_embed()),
            )
            .await?;

        parser::extract_csrf(&response.text()).ok_or_else(|| {
            warn!("Sign-in page did not contain a CSRF token");
            GarminError::from(ProtocolFailure::CsrfNotFound)
        })
    }

    async fn submit_credentials(
        &self,
        credentials: &Credentials,
        csrf: &str,
    ) -> GarminResult<String> {
        let embed = self.urls.sso_embed();
        let signin = self.urls.signin();

        let request = HttpRequest::post(signin.clone())
            .query("id", sso::WIDGET_ID)
            .query("embedWidget", "true")
            .query("clientId", sso::CLIENT_ID)
            .query("locale", sso::LOCALE)
            .queries([
                ("gauthHost", embed.as_str()),
                ("service", embed.as_str()),
                ("source", embed.as_str()),
                ("redirectAfterAccountLoginUrl", embed.as_str()),
                ("redirectAfterAccountCreationUrl", embed.as_str()),
            ])
            .header("User-Agent", user_agents::BROWSER)
            .header("Dnt", "1")
            .header("Origin", self.urls.sso_origin())
            .header("Referer", signin)
            .form([
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("embed", "true"),
                ("_csrf", csrf),
            ]);

        Ok(self.send(request).await?.text())
    }

    async fn classify(&self, body: &str) -> GarminResult<String> {
        if let Some(status) = parser::account_locked_status(body) {
            warn!(status = %status, "SSO reports account locked");
            return Err(AuthFailure::AccountLocked { status }.into());
        }

        if parser::requires_phone_update(body) {
            warn!("SSO requires a phone number update");
            return Err(AuthFailure::PhoneNumberUpdateRequired.into());
        }

        self.mfa.inspect(body).await?;

        parser::extract_ticket(body).ok_or_else(|| {
            warn!("No ticket in sign-in response");
            GarminError::from(AuthFailure::InvalidCredentialsOrMfa)
        })
    }
}
