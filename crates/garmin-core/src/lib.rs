// ABOUTME: Core types and constants for the Garmin Connect session client
// ABOUTME: Foundation crate with the error taxonomy, token models, and SSO protocol constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Garmin Core
//!
//! Foundation crate shared by the Garmin Connect client. It holds the pieces that
//! change rarely: the error taxonomy, the persisted token and session models, and
//! the literal protocol constants (URL paths, user agents, scrape patterns) the
//! SSO flow depends on.
//!
//! ## Modules
//!
//! - **errors**: `GarminError` and the protocol/auth failure classifications
//! - **models**: credentials, OAuth1/OAuth2 tokens, persisted sessions, session events
//! - **constants**: protocol constants organized by concern

/// Error taxonomy for the SSO, token exchange, and API call paths
pub mod errors;

/// Protocol constants organized by concern
pub mod constants;

/// Credential, token, and session models
pub mod models;

pub use errors::{AuthFailure, GarminError, GarminResult, ProtocolFailure};
