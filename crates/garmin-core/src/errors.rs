// ABOUTME: Error taxonomy for the Garmin Connect client
// ABOUTME: Separates config, protocol-scrape, remote-auth, expiry, transport, and API failures

//! # Error Handling
//!
//! Every fallible operation in the client returns [`GarminResult`]. The variants
//! map onto how a caller should react:
//!
//! | Variant | Meaning | Caller action |
//! |---------|---------|---------------|
//! | `Config` | credentials or consumer values missing | fix configuration |
//! | `Protocol` | an expected artifact was absent from a response | report, retry later |
//! | `Auth` | the service rejected the login explicitly | user must act |
//! | `AuthExpired` | a 401 survived one refresh-and-retry | log in again |
//! | `Transport` | network failure, timeout, or 5xx | caller-level retry policy |
//! | `Api` | any other non-success status | inspect `body` |

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the client
pub type GarminResult<T> = Result<T, GarminError>;

/// An expected pattern was not found in an SSO or OAuth response
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolFailure {
    /// The sign-in page did not contain a `_csrf` input
    #[error("login - csrf not found")]
    CsrfNotFound,

    /// The credential submission response did not contain a service ticket
    #[error("login - ticket not found")]
    TicketNotFound,

    /// No OAuth1 token could be produced (consumer credentials unset or response incomplete)
    #[error("No Oauth1Token: {reason}")]
    NoOauth1Token {
        /// Which part of the exchange was missing
        reason: String,
    },

    /// A response body could not be interpreted
    #[error("Malformed {context} response: {reason}")]
    MalformedResponse {
        /// Which response was being parsed
        context: &'static str,
        /// What was wrong with it
        reason: String,
    },
}

/// A login failure explicitly signaled by the remote service
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// The account is locked; the embedded status string is kept for diagnostics
    #[error(
        "login failed (AccountLocked: {status}), please open connect web page to unlock your account"
    )]
    AccountLocked {
        /// Value captured from the page's `var status = "..."` assignment
        status: String,
    },

    /// The service requires a phone number update before issuing a ticket
    #[error("login failed (Update Phone number), please update your phone number")]
    PhoneNumberUpdateRequired,

    /// No ticket was issued. Wrong credentials and an unhandled MFA challenge
    /// produce the same response, so the two are not distinguished.
    #[error("login failed (Ticket not found or MFA), please check username and password")]
    InvalidCredentialsOrMfa,
}

/// Unified error type for the Garmin Connect client
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GarminError {
    /// Missing or invalid configuration at time of use
    #[error("Configuration error: {0}")]
    Config(String),

    /// Expected artifact missing from an SSO/OAuth response
    #[error(transparent)]
    Protocol(#[from] ProtocolFailure),

    /// Login rejected by the service
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    /// A 401 that one refresh-and-retry could not resolve
    #[error("Authentication expired: {0}")]
    AuthExpired(String),

    /// Network failure, timeout, or server-side (5xx) error
    #[error("Transport error: {message}")]
    Transport {
        /// Human-readable description
        message: String,
        /// HTTP status when the failure was a 5xx response
        status: Option<u16>,
        /// Whether the request timed out
        timeout: bool,
    },

    /// Non-success response other than 401 and 5xx
    #[error("Garmin API returned status {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, passed through unparsed
        body: String,
    },

    /// A persisted session could not be restored
    #[error("Session restore failed: {0}")]
    SessionRestore(String),

    /// JSON encoding or decoding failed
    #[error("Serialization failed for {context}")]
    Serialization {
        /// What was being (de)serialized
        context: &'static str,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem access failed
    #[error("I/O error on {}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl GarminError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a transport error without status
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
            timeout: false,
        }
    }

    /// Create a transport error for a timed-out request
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
            timeout: true,
        }
    }

    /// Create a serialization error with context
    #[must_use]
    pub const fn serialization(context: &'static str, source: serde_json::Error) -> Self {
        Self::Serialization { context, source }
    }

    /// Create an I/O error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed-response protocol error
    pub fn malformed(context: &'static str, reason: impl Into<String>) -> Self {
        Self::Protocol(ProtocolFailure::MalformedResponse {
            context,
            reason: reason.into(),
        })
    }

    /// Classify a non-success HTTP status
    ///
    /// 401 maps to `AuthExpired`, 5xx to `Transport`, everything else to `Api`.
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Self::AuthExpired(format!("request unauthorized (401): {body}")),
            500..=599 => Self::Transport {
                message: format!("server error ({status}): {body}"),
                status: Some(status),
                timeout: false,
            },
            _ => Self::Api { status, body },
        }
    }

    /// Whether a caller-level retry policy may reasonably retry this error
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Whether this error requires the user to log in again
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::AuthExpired(_))
    }
}

#[cfg(feature = "transport-errors")]
impl From<reqwest::Error> for GarminError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport {
            message: error.to_string(),
            status: error.status().map(|status| status.as_u16()),
            timeout: error.is_timeout(),
        }
    }
}
