// ABOUTME: OAuth1/OAuth2 token models and the shared OAuth consumer credentials
// ABOUTME: OAuth2 tokens carry absolute expiry timestamps derived at exchange time

use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Shared consumer key/secret used to sign OAuth1 requests
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerCredentials {
    /// Consumer key
    #[serde(alias = "consumer_key")]
    pub key: String,
    /// Consumer secret
    #[serde(alias = "consumer_secret")]
    pub secret: String,
}

impl ConsumerCredentials {
    /// Create consumer credentials from a key/secret pair
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// Whether both halves are present
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.key.is_empty() && !self.secret.is_empty()
    }
}

impl fmt::Debug for ConsumerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerCredentials")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// OAuth1 token pair issued by the preauthorized endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth1Token {
    /// Token key
    pub oauth_token: String,
    /// Token secret
    pub oauth_token_secret: String,
}

impl fmt::Debug for OAuth1Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth1Token")
            .field("oauth_token", &self.oauth_token)
            .field("oauth_token_secret", &"[REDACTED]")
            .finish()
    }
}

/// OAuth2 token body as returned by the exchange endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2TokenResponse {
    /// Granted scopes
    #[serde(default)]
    pub scope: String,
    /// Token identifier
    #[serde(default)]
    pub jti: String,
    /// Bearer token
    pub access_token: String,
    /// Token type (Bearer)
    #[serde(default)]
    pub token_type: String,
    /// Refresh token
    #[serde(default)]
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Refresh token lifetime in seconds
    #[serde(default)]
    pub refresh_token_expires_in: i64,
}

/// OAuth2 bearer token with absolute expiry metadata
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Token {
    /// Granted scopes
    pub scope: String,
    /// Token identifier
    pub jti: String,
    /// Bearer token
    pub access_token: String,
    /// Token type (Bearer)
    pub token_type: String,
    /// Refresh token
    pub refresh_token: String,
    /// Access token lifetime in seconds, as issued
    pub expires_in: i64,
    /// Refresh token lifetime in seconds, as issued
    pub refresh_token_expires_in: i64,
    /// Epoch seconds after which the access token is expired
    #[serde(default)]
    pub expires_at: i64,
    /// Epoch seconds after which the refresh token is expired (0 when unknown)
    #[serde(default)]
    pub refresh_token_expires_at: i64,
    /// Local time of acquisition (RFC 3339)
    #[serde(default)]
    pub last_update_date: String,
    /// Local time of access token expiry (RFC 3339)
    #[serde(default)]
    pub expires_date: String,
}

impl OAuth2Token {
    /// Derive absolute expiry fields from an exchange response received at `now`
    ///
    /// Only the relative lifetimes are taken from the server.
    #[must_use]
    pub fn from_response(response: OAuth2TokenResponse, now: DateTime<Utc>) -> Self {
        let issued_at = now.timestamp();
        let expires_at = issued_at.saturating_add(response.expires_in);
        let refresh_token_expires_at = issued_at.saturating_add(response.refresh_token_expires_in);

        let local_now = now.with_timezone(&Local);
        let expires_date = Local
            .timestamp_opt(expires_at, 0)
            .single()
            .map_or_else(String::new, |date| date.to_rfc3339());

        Self {
            scope: response.scope,
            jti: response.jti,
            access_token: response.access_token,
            token_type: response.token_type,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            refresh_token_expires_in: response.refresh_token_expires_in,
            expires_at,
            refresh_token_expires_at,
            last_update_date: local_now.to_rfc3339(),
            expires_date,
        }
    }

    /// Whether the access token is expired at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now.timestamp()
    }

    /// Whether the access token is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the refresh token is known to be expired at `now`
    ///
    /// Tokens persisted without a refresh expiry (0) are treated as unexpired.
    #[must_use]
    pub fn is_refresh_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.refresh_token_expires_at > 0 && self.refresh_token_expires_at < now.timestamp()
    }
}

impl fmt::Debug for OAuth2Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Token")
            .field("scope", &self.scope)
            .field("jti", &self.jti)
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("refresh_token_expires_at", &self.refresh_token_expires_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(expires_in: i64, refresh_token_expires_in: i64) -> OAuth2TokenResponse {
        OAuth2TokenResponse {
            scope: "CONNECT_READ CONNECT_WRITE".to_owned(),
            jti: "jti-1".to_owned(),
            access_token: "access".to_owned(),
            token_type: "Bearer".to_owned(),
            refresh_token: "refresh".to_owned(),
            expires_in,
            refresh_token_expires_in,
        }
    }

    #[test]
    fn test_expiry_is_relative_to_exchange_time() {
        let exchanged_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = OAuth2Token::from_response(response(3600, 7200), exchanged_at);

        assert_eq!(token.expires_at, 1_700_000_000 + 3600);
        assert_eq!(token.refresh_token_expires_at, 1_700_000_000 + 7200);
        assert!(!token.is_expired_at(exchanged_at));

        let after = DateTime::from_timestamp(1_700_000_000 + 3601, 0).unwrap();
        assert!(token.is_expired_at(after));
    }

    #[test]
    fn test_unknown_refresh_expiry_is_not_expired() {
        let exchanged_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut token = OAuth2Token::from_response(response(3600, 0), exchanged_at);
        token.refresh_token_expires_at = 0;

        let much_later = DateTime::from_timestamp(1_900_000_000, 0).unwrap();
        assert!(!token.is_refresh_expired_at(much_later));
    }

    #[test]
    fn test_consumer_bootstrap_field_names() {
        let consumer: ConsumerCredentials =
            serde_json::from_str(r#"{"consumer_key": "K", "consumer_secret": "S"}"#).unwrap();
        assert_eq!(consumer, ConsumerCredentials::new("K", "S"));
        assert!(consumer.is_complete());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let token = OAuth1Token {
            oauth_token: "visible".to_owned(),
            oauth_token_secret: "hidden".to_owned(),
        };
        let debug = format!("{token:?}");
        assert!(debug.contains("visible"));
        assert!(!debug.contains("hidden"));
    }
}
