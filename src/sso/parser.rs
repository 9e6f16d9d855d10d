// ABOUTME: Pure scraping functions over SSO HTML responses
// ABOUTME: Extracts CSRF token, service ticket, account-locked status, and page title
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! SSO page scraping
//!
//! The service exposes no structured login API, so every artifact of the
//! sign-in flow is pulled out of HTML with literal patterns. The patterns live
//! in `garmin_core::constants::patterns` and must track the live markup.

use std::sync::LazyLock;

use garmin_core::constants::patterns;
use regex::Regex;

/// Stored as Option so a bad pattern degrades to "not found" instead of panicking
static CSRF_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(patterns::CSRF).ok());

static TICKET_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(patterns::TICKET).ok());

static ACCOUNT_LOCKED_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(patterns::ACCOUNT_LOCKED).ok());

static TITLE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(patterns::PAGE_TITLE).ok());

fn first_capture(pattern: &LazyLock<Option<Regex>>, html: &str) -> Option<String> {
    pattern
        .as_ref()?
        .captures(html)?
        .get(1)
        .map(|capture| capture.as_str().to_owned())
}

/// CSRF token from the sign-in form
#[must_use]
pub fn extract_csrf(html: &str) -> Option<String> {
    first_capture(&CSRF_PATTERN, html)
}

/// Service ticket from the post-login redirect snippet
#[must_use]
pub fn extract_ticket(html: &str) -> Option<String> {
    first_capture(&TICKET_PATTERN, html)
}

/// Status string when the page carries the account-locked marker
///
/// Any match counts as locked, whatever the captured value.
#[must_use]
pub fn account_locked_status(html: &str) -> Option<String> {
    first_capture(&ACCOUNT_LOCKED_PATTERN, html)
}

/// Contents of the `<title>` element
#[must_use]
pub fn page_title(html: &str) -> Option<String> {
    first_capture(&TITLE_PATTERN, html)
}

/// Whether the page is the phone-number verification interstitial
#[must_use]
pub fn requires_phone_update(html: &str) -> bool {
    page_title(html).is_some_and(|title| title.contains(patterns::PHONE_UPDATE_TITLE))
}
