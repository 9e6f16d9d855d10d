// ABOUTME: Session manager owning OAuth tokens, bearer injection, and refresh-on-401
// ABOUTME: Runs the login chain, single-flights refreshes, and broadcasts token changes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Session Manager
//!
//! Holds the current OAuth1/OAuth2 pair and exposes the authenticated
//! request primitives used by the API facade.
//!
//! ## Request flow
//!
//! 1. Fail fast with `AuthExpired` if a previous refresh failed.
//! 2. Refresh up front if the OAuth2 token is past `expires_at`.
//! 3. Send with `Authorization: Bearer <access_token>`.
//! 4. On 401, refresh through the [`RefreshGate`] (lead, wait, or notice
//!    the token is already stale) and retry exactly once.
//! 5. A second 401 is returned as `AuthExpired`.
//!
//! Any other non-success status is classified by
//! [`GarminError::from_status`] without touching the tokens.

use std::sync::Arc;

use chrono::Utc;
use garmin_core::constants::http;
use garmin_core::errors::{GarminError, GarminResult};
use garmin_core::models::{
    Credentials, GarminTokens, OAuth1Token, OAuth2Token, Session, SessionEvent, SessionState,
};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, instrument, warn};

use super::refresh::{RefreshGate, RefreshSlot};
use crate::config::GarminConfig;
use crate::oauth::{ConsumerSource, OAuthExchanger};
use crate::sso::{MfaHandler, TicketAcquirer};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, RequestBody};
use crate::urls::GarminUrls;

struct TokenState {
    oauth1: Option<OAuth1Token>,
    oauth2: Option<OAuth2Token>,
    state: SessionState,
    /// Incremented whenever the token pair is replaced or dropped
    epoch: u64,
}

impl TokenState {
    const fn empty() -> Self {
        Self {
            oauth1: None,
            oauth2: None,
            state: SessionState::Unauthenticated,
            epoch: 0,
        }
    }

    fn replace(&mut self, tokens: Option<GarminTokens>) {
        let (oauth1, oauth2) = tokens.map_or((None, None), |t| (Some(t.oauth1), Some(t.oauth2)));
        self.state = if oauth2.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        };
        self.oauth1 = oauth1;
        self.oauth2 = oauth2;
        self.epoch += 1;
    }
}

/// Owns the tokens for one Garmin account
pub struct SessionManager {
    transport: Arc<dyn HttpTransport>,
    urls: GarminUrls,
    acquirer: TicketAcquirer,
    exchanger: OAuthExchanger,
    credentials: RwLock<Option<Credentials>>,
    tokens: RwLock<TokenState>,
    refresh: RefreshGate,
    user_hash: RwLock<Option<String>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Create a manager; no network traffic happens until the first call
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, config: &GarminConfig) -> Self {
        let consumer = Arc::new(ConsumerSource::new(
            Arc::clone(&transport),
            config.consumer.clone(),
        ));
        let (events, _) = broadcast::channel(http::EVENT_CHANNEL_CAPACITY);

        Self {
            acquirer: TicketAcquirer::new(Arc::clone(&transport), config.urls.clone()),
            exchanger: OAuthExchanger::new(Arc::clone(&transport), config.urls.clone(), consumer),
            transport,
            urls: config.urls.clone(),
            credentials: RwLock::new(config.credentials.clone()),
            tokens: RwLock::new(TokenState::empty()),
            refresh: RefreshGate::new(),
            user_hash: RwLock::new(None),
            events,
        }
    }

    /// Install an MFA hook for the sign-in step
    #[must_use]
    pub fn with_mfa_handler(mut self, handler: Arc<dyn MfaHandler>) -> Self {
        self.acquirer = self.acquirer.with_mfa_handler(handler);
        self
    }

    /// Endpoint set used by this manager
    #[must_use]
    pub const fn urls(&self) -> &GarminUrls {
        &self.urls
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        self.tokens.read().await.state
    }

    /// Receive a notification every time the held tokens change
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }

    // ========================================================================
    // Login lifecycle
    // ========================================================================

    /// Log in with stored credentials; a supplied field replaces the stored one
    ///
    /// On failure the previous state is restored (unless a refresh moved it on
    /// meanwhile) and the error is returned unchanged. A running refresh is
    /// never cancelled by a login.
    ///
    /// # Errors
    ///
    /// - `Config` when no complete credentials are available
    /// - `Protocol` / `Auth` from the SSO and OAuth steps
    /// - `Transport` / `Api` for HTTP failures
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> GarminResult<GarminTokens> {
        let credentials = self.resolve_credentials(username, password).await?;

        // A visible refresh keeps its state; it settles on its own
        let previous = {
            let mut tokens = self.tokens.write().await;
            if tokens.state == SessionState::Refreshing {
                None
            } else {
                let previous = tokens.state;
                tokens.state = SessionState::Authenticating;
                Some(previous)
            }
        };
        info!(username = %credentials.username, "Logging in to Garmin Connect");

        match self.run_login_chain(&credentials).await {
            Ok(tokens) => {
                self.install(tokens.clone()).await;
                info!("Login succeeded");
                self.emit(SessionEvent::LoggedIn(tokens.clone()));
                Ok(tokens)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                if let Some(previous) = previous {
                    let mut tokens = self.tokens.write().await;
                    if tokens.state == SessionState::Authenticating {
                        tokens.state = previous;
                    }
                }
                Err(e)
            }
        }
    }

    async fn resolve_credentials(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> GarminResult<Credentials> {
        let mut stored = self.credentials.write().await;
        let credentials = match (username, password, stored.as_ref()) {
            (Some(username), Some(password), _) => Credentials::new(username, password),
            (None, None, Some(current)) => current.clone(),
            (Some(username), None, Some(current)) => {
                Credentials::new(username, current.password.clone())
            }
            (None, Some(password), Some(current)) => {
                Credentials::new(current.username.clone(), password)
            }
            (_, _, None) => {
                return Err(GarminError::config(
                    "Missing credentials: provide a username and password",
                ))
            }
        };
        *stored = Some(credentials.clone());
        Ok(credentials)
    }

    async fn run_login_chain(&self, credentials: &Credentials) -> GarminResult<GarminTokens> {
        let ticket = self.acquirer.acquire(credentials).await?;
        let oauth1 = self.exchanger.preauthorize(&ticket).await?;
        let oauth2 = self.exchanger.exchange(&oauth1).await?;
        Ok(GarminTokens { oauth1, oauth2 })
    }

    async fn install(&self, tokens: GarminTokens) {
        self.tokens.write().await.replace(Some(tokens));
        *self.user_hash.write().await = None;
        self.refresh.bump();
    }

    async fn clear(&self) {
        self.tokens.write().await.replace(None);
        *self.user_hash.write().await = None;
        self.refresh.bump();
    }

    /// Drop all tokens
    pub async fn logout(&self) {
        self.clear().await;
        info!("Logged out");
        self.emit(SessionEvent::LoggedOut);
    }

    // ========================================================================
    // Token import/export
    // ========================================================================

    /// Current token pair
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` when either token is absent.
    pub async fn export_tokens(&self) -> GarminResult<GarminTokens> {
        let state = self.tokens.read().await;
        match (&state.oauth1, &state.oauth2) {
            (Some(oauth1), Some(oauth2)) => Ok(GarminTokens {
                oauth1: oauth1.clone(),
                oauth2: oauth2.clone(),
            }),
            _ => Err(GarminError::AuthExpired(
                "no tokens to export; log in first".to_owned(),
            )),
        }
    }

    /// Install a previously exported token pair
    ///
    /// # Errors
    ///
    /// Returns `SessionRestore` when the OAuth2 refresh token has expired.
    pub async fn load_tokens(&self, oauth1: OAuth1Token, oauth2: OAuth2Token) -> GarminResult<()> {
        if oauth2.is_refresh_expired_at(Utc::now()) {
            return Err(GarminError::SessionRestore(
                "stored refresh token has expired; log in again".to_owned(),
            ));
        }

        let tokens = GarminTokens { oauth1, oauth2 };
        self.install(tokens.clone()).await;
        debug!(expires_at = tokens.oauth2.expires_at, "Tokens loaded");
        self.emit(SessionEvent::TokensLoaded(tokens));
        Ok(())
    }

    /// Verify a persisted session belongs to the expected user, then install it
    ///
    /// The social profile is fetched with the candidate tokens; its
    /// `displayName` must equal `session.user_hash`. An expired or rejected
    /// access token is re-derived once from the candidate OAuth1 token. Nothing
    /// is installed or emitted unless the check passes, so the current session
    /// is untouched on failure.
    ///
    /// # Errors
    ///
    /// Returns `SessionRestore` on identity mismatch or expired tokens,
    /// `AuthExpired` if the candidate tokens are rejected, or the profile fetch
    /// error.
    #[instrument(skip_all)]
    pub async fn restore_session(&self, session: Session) -> GarminResult<()> {
        let Session { tokens, user_hash } = session;
        if tokens.oauth2.is_refresh_expired_at(Utc::now()) {
            return Err(GarminError::SessionRestore(
                "stored refresh token has expired; log in again".to_owned(),
            ));
        }

        let (tokens, display_name) = self.verify_candidate(tokens).await.inspect_err(|e| {
            warn!(error = %e, "Could not verify restored session");
        })?;
        if display_name != user_hash {
            warn!(expected = %user_hash, actual = %display_name, "Session belongs to another user");
            return Err(GarminError::SessionRestore(
                "session user does not match the authenticated profile".to_owned(),
            ));
        }

        self.install(tokens.clone()).await;
        *self.user_hash.write().await = Some(display_name);
        info!("Session restored");
        self.emit(SessionEvent::TokensLoaded(tokens));
        Ok(())
    }

    /// Profile `displayName` fetched with tokens that are not installed yet
    async fn verify_candidate(
        &self,
        mut tokens: GarminTokens,
    ) -> GarminResult<(GarminTokens, String)> {
        let mut refreshed = false;
        if tokens.oauth2.is_expired() {
            tokens.oauth2 = self.exchanger.exchange(&tokens.oauth1).await?;
            refreshed = true;
        }

        loop {
            let request = HttpRequest::get(self.urls.user_profile());
            let response = self
                .send_with_token(request, Some(&tokens.oauth2.access_token))
                .await?;
            if !response.is_unauthorized() {
                let profile = response.error_for_status()?.json_or_text();
                return display_name(&profile).map(|name| (tokens, name));
            }
            if refreshed {
                return Err(GarminError::AuthExpired(
                    "stored session was rejected by the service".to_owned(),
                ));
            }
            debug!("Stored access token rejected, re-deriving before verification");
            tokens.oauth2 = self.exchanger.exchange(&tokens.oauth1).await?;
            refreshed = true;
        }
    }

    /// Persistable session: tokens plus the profile `displayName`
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` when not logged in, or the profile fetch error.
    pub async fn export_session(&self) -> GarminResult<Session> {
        let tokens = self.export_tokens().await?;
        let cached = self.user_hash.read().await.clone();
        let user_hash = match cached {
            Some(hash) => hash,
            None => {
                let hash = self.fetch_user_hash().await?;
                *self.user_hash.write().await = Some(hash.clone());
                hash
            }
        };
        Ok(Session { tokens, user_hash })
    }

    async fn fetch_user_hash(&self) -> GarminResult<String> {
        let profile = self.get(&self.urls.user_profile(), &[]).await?;
        display_name(&profile)
    }

    // ========================================================================
    // Request primitives
    // ========================================================================

    /// GET returning JSON (text bodies become a JSON string, empty bodies `null`)
    ///
    /// # Errors
    ///
    /// Returns the classified error for any non-success response.
    pub async fn get(&self, url: &str, params: &[(&str, &str)]) -> GarminResult<Value> {
        let request = HttpRequest::get(url).queries(params.iter().copied());
        Ok(self.execute(request).await?.json_or_text())
    }

    /// GET returning the raw response
    ///
    /// # Errors
    ///
    /// Returns the classified error for any non-success response.
    pub async fn get_bytes(&self, url: &str, params: &[(&str, &str)]) -> GarminResult<HttpResponse> {
        self.execute(HttpRequest::get(url).queries(params.iter().copied()))
            .await
    }

    /// POST with an optional JSON body and extra headers
    ///
    /// # Errors
    ///
    /// Returns the classified error for any non-success response.
    pub async fn post(
        &self,
        url: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> GarminResult<Value> {
        let mut request = HttpRequest::post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        Ok(self.execute(request).await?.json_or_text())
    }

    /// PUT with an optional JSON body
    ///
    /// # Errors
    ///
    /// Returns the classified error for any non-success response.
    pub async fn put(&self, url: &str, body: Option<Value>) -> GarminResult<Value> {
        let mut request = HttpRequest::put(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(self.execute(request).await?.json_or_text())
    }

    /// DELETE
    ///
    /// # Errors
    ///
    /// Returns the classified error for any non-success response.
    pub async fn delete(&self, url: &str) -> GarminResult<Value> {
        Ok(self
            .execute(HttpRequest::delete(url))
            .await?
            .json_or_text())
    }

    /// POST a single file as `multipart/form-data`
    ///
    /// # Errors
    ///
    /// Returns the classified error for any non-success response.
    pub async fn post_multipart(
        &self,
        url: &str,
        field: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> GarminResult<Value> {
        let mut request = HttpRequest::post(url);
        request.body = RequestBody::Multipart {
            field: field.to_owned(),
            file_name: file_name.to_owned(),
            bytes,
        };
        Ok(self.execute(request).await?.json_or_text())
    }

    /// Send an authenticated request with refresh-on-401 and one retry
    ///
    /// # Errors
    ///
    /// - `AuthExpired` when no token is held and the service answers 401, a
    ///   previous refresh failed, or the retry is rejected again
    /// - the refresh error itself when this call performed the refresh
    /// - `Transport` / `Api` for other failures
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn execute(&self, request: HttpRequest) -> GarminResult<HttpResponse> {
        let (generation, token) = self.current_token().await?;

        let response = self.send_with_token(request.clone(), token.as_deref()).await?;
        if !response.is_unauthorized() {
            return response.error_for_status();
        }

        if token.is_none() {
            return Err(GarminError::AuthExpired(
                "request unauthorized and no token is held; log in first".to_owned(),
            ));
        }

        debug!("Request unauthorized, refreshing token");
        let token = self.token_after_unauthorized(generation).await?;
        let retry = self.send_with_token(request, Some(&token)).await?;
        if retry.is_unauthorized() {
            warn!("Request unauthorized again after token refresh");
            return Err(GarminError::AuthExpired(
                "request unauthorized after token refresh".to_owned(),
            ));
        }
        retry.error_for_status()
    }

    async fn send_with_token(
        &self,
        mut request: HttpRequest,
        token: Option<&str>,
    ) -> GarminResult<HttpResponse> {
        if let Some(token) = token {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
        self.transport.execute(request).await
    }

    /// Generation observed before reading the token, and the access token
    async fn current_token(&self) -> GarminResult<(u64, Option<String>)> {
        let generation = self.refresh.generation();
        {
            let state = self.tokens.read().await;
            if state.state == SessionState::Failed {
                return Err(GarminError::AuthExpired(
                    "token refresh failed previously; log in again".to_owned(),
                ));
            }
            match &state.oauth2 {
                None => return Ok((generation, None)),
                Some(token) if !token.is_expired() => {
                    return Ok((generation, Some(token.access_token.clone())));
                }
                Some(_) => {}
            }
        }

        debug!("OAuth2 token expired, refreshing before request");
        let token = self.token_after_unauthorized(generation).await?;
        Ok((self.refresh.generation(), Some(token)))
    }

    /// Access token to retry with after a 401 seen at `observed_generation`
    async fn token_after_unauthorized(&self, observed_generation: u64) -> GarminResult<String> {
        match self.refresh.acquire_refresh_slot(observed_generation) {
            RefreshSlot::Stale => {
                debug!("Token already replaced, retrying with current token");
                let state = self.tokens.read().await;
                state
                    .oauth2
                    .as_ref()
                    .map(|token| token.access_token.clone())
                    .ok_or_else(|| {
                        GarminError::AuthExpired("no token held after refresh".to_owned())
                    })
            }
            RefreshSlot::Waiter(receiver) => match receiver.await {
                Ok(Ok(token)) => Ok(token),
                Ok(Err(reason)) => Err(GarminError::AuthExpired(format!(
                    "token refresh failed: {reason}"
                ))),
                Err(_) => Err(GarminError::AuthExpired(
                    "token refresh was abandoned".to_owned(),
                )),
            },
            RefreshSlot::Leader(lease) => match self.refresh_tokens().await {
                Ok(token) => {
                    lease.publish_and_release(&Ok(token.clone()));
                    Ok(token)
                }
                Err(e) => {
                    lease.publish_and_release(&Err(e.to_string()));
                    Err(e)
                }
            },
        }
    }

    /// Re-derive the OAuth2 token from the held OAuth1 token
    ///
    /// When the token pair is replaced while the exchange runs, the newer
    /// session wins: its access token is returned if it holds one, and the
    /// refresh result is discarded either way.
    async fn refresh_tokens(&self) -> GarminResult<String> {
        let (epoch, oauth1) = {
            let mut state = self.tokens.write().await;
            if state.state == SessionState::Failed {
                return Err(GarminError::AuthExpired(
                    "token refresh failed previously; log in again".to_owned(),
                ));
            }
            state.state = SessionState::Refreshing;
            (state.epoch, state.oauth1.clone())
        };

        let result = match oauth1 {
            Some(oauth1) => self
                .exchanger
                .exchange(&oauth1)
                .await
                .map(|oauth2| GarminTokens { oauth1, oauth2 }),
            None => Err(GarminError::AuthExpired(
                "no OAuth1 token held to refresh with".to_owned(),
            )),
        };

        let mut state = self.tokens.write().await;
        if state.epoch != epoch {
            let current = state.oauth2.as_ref().map(|token| token.access_token.clone());
            drop(state);
            debug!("Session changed during token refresh, keeping the newer tokens");
            return match (current, result) {
                (Some(token), _) => Ok(token),
                (None, Err(e)) => Err(e),
                (None, Ok(_)) => Err(GarminError::AuthExpired(
                    "session changed during token refresh".to_owned(),
                )),
            };
        }

        match result {
            Ok(tokens) => {
                state.oauth2 = Some(tokens.oauth2.clone());
                state.state = SessionState::Authenticated;
                drop(state);
                info!(expires_at = tokens.oauth2.expires_at, "OAuth2 token refreshed");
                let access_token = tokens.oauth2.access_token.clone();
                self.emit(SessionEvent::TokensRefreshed(tokens));
                Ok(access_token)
            }
            Err(e) => {
                state.oauth2 = None;
                state.state = SessionState::Failed;
                drop(state);
                warn!(error = %e, "OAuth2 token refresh failed; login required");
                self.emit(SessionEvent::RefreshFailed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

fn display_name(profile: &Value) -> GarminResult<String> {
    profile
        .get("displayName")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| GarminError::malformed("social profile", "missing displayName"))
}
