// ABOUTME: Main library entry point for the Garmin Connect client
// ABOUTME: SSO login, OAuth1/OAuth2 exchange, token-owning session manager, and API facade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Garmin Connect
//!
//! A client for Garmin Connect's private `connectapi` surface. Garmin has no
//! public OAuth flow for personal accounts, so the client signs in through the
//! same SSO widget the web app uses and trades the resulting ticket for
//! tokens:
//!
//! 1. **SSO**: prime cookies, scrape the CSRF token, post credentials, scrape
//!    the service ticket ([`sso`]).
//! 2. **OAuth1**: exchange the ticket for an OAuth1 token with an
//!    HMAC-SHA1 signed request ([`oauth`]).
//! 3. **OAuth2**: exchange the OAuth1 token for a bearer token with expiry
//!    metadata.
//!
//! The [`session::SessionManager`] owns the tokens, attaches the bearer
//! header, and on a 401 refreshes once (shared by all concurrent callers)
//! before retrying. [`api::GarminConnect`] wraps it with typed endpoint
//! methods.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use garmin_connect::api::GarminConnect;
//! use garmin_connect::config::GarminConfig;
//! use garmin_connect::GarminResult;
//!
//! #[tokio::main]
//! async fn main() -> GarminResult<()> {
//!     let client = GarminConnect::new(GarminConfig::from_env()?)?;
//!     client.login(Some("me@example.com"), Some("secret")).await?;
//!
//!     let settings = client.get_user_settings().await?;
//!     println!("{settings}");
//!     Ok(())
//! }
//! ```

/// `GarminConnect` facade
pub mod api;

/// Environment-driven configuration
pub mod config;

/// Structured logging setup for binaries
pub mod logging;

/// OAuth signing and token exchanges
pub mod oauth;

/// Token ownership, refresh, and persistence
pub mod session;

/// SSO sign-in flow
pub mod sso;

/// HTTP transport abstraction
pub mod transport;

/// Endpoint URLs per regional domain
pub mod urls;

/// Shared helpers
pub mod utils;

pub use garmin_core::constants;
pub use garmin_core::errors::{AuthFailure, GarminError, GarminResult, ProtocolFailure};
pub use garmin_core::models;
