// ABOUTME: OAuth layer turning an SSO ticket into OAuth1 and OAuth2 tokens
// ABOUTME: Request signing, consumer credential resolution, and the two token exchanges
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # OAuth
//!
//! Garmin's API accepts only OAuth2 bearer tokens, but those are minted from
//! an OAuth1 token that is in turn minted from an SSO ticket. The OAuth1
//! token outlives the OAuth2 token, so a refresh is just another
//! [`OAuthExchanger::exchange`] call.

/// Shared consumer key/secret
pub mod consumer;
/// Preauthorized and exchange requests
pub mod exchange;
/// HMAC-SHA1 request signing
pub mod signer;

pub use consumer::ConsumerSource;
pub use exchange::OAuthExchanger;
pub use signer::{OAuth1Signer, OAuthParameters, SigningNonce};
