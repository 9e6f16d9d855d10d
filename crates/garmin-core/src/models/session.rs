// ABOUTME: Persisted session form, session lifecycle states, and session-change events
// ABOUTME: A restored session is trusted only when its user hash matches a fresh profile fetch

use serde::{Deserialize, Serialize};

use super::tokens::{OAuth1Token, OAuth2Token};

/// OAuth1 and OAuth2 tokens exported together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarminTokens {
    /// Token used to re-derive OAuth2 tokens without the password
    pub oauth1: OAuth1Token,
    /// Live bearer credential
    pub oauth2: OAuth2Token,
}

/// Persisted session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Exported tokens
    #[serde(flatten)]
    pub tokens: GarminTokens,
    /// Social profile `displayName` of the user the tokens belong to
    pub user_hash: String,
}

/// Lifecycle of a session manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No tokens held
    Unauthenticated,
    /// Login chain in progress
    Authenticating,
    /// OAuth2 token held
    Authenticated,
    /// A token refresh is in flight
    Refreshing,
    /// A refresh failed; a full login is required
    Failed,
}

/// Notification broadcast whenever the held tokens change
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Full credential login completed
    LoggedIn(GarminTokens),
    /// OAuth2 token re-derived from the held OAuth1 token
    TokensRefreshed(GarminTokens),
    /// Tokens imported from an external store
    TokensLoaded(GarminTokens),
    /// Tokens dropped on request
    LoggedOut,
    /// Refresh failed; tokens dropped
    RefreshFailed {
        /// Failure description
        reason: String,
    },
}

impl SessionEvent {
    /// Tokens carried by the event, when the event installs new ones
    #[must_use]
    pub const fn tokens(&self) -> Option<&GarminTokens> {
        match self {
            Self::LoggedIn(tokens) | Self::TokensRefreshed(tokens) | Self::TokensLoaded(tokens) => {
                Some(tokens)
            }
            Self::LoggedOut | Self::RefreshFailed { .. } => None,
        }
    }
}
