// ABOUTME: Garmin SSO sign-in flow
// ABOUTME: HTML scraping helpers and the ticket acquirer built on them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Pure scraping functions over SSO pages
pub mod parser;
/// Credential-to-ticket chain
pub mod ticket;

pub use ticket::{MfaHandler, NoMfaHandler, TicketAcquirer};
