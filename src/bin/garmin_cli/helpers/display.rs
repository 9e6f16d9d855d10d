// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Output formatting helpers for garmin-cli
// ABOUTME: Prints token summaries without secrets and pretty JSON responses

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use garmin_core::models::GarminTokens;
use serde_json::Value;

fn format_epoch(epoch: i64) -> String {
    if epoch == 0 {
        return "unknown".to_owned();
    }
    DateTime::<Utc>::from_timestamp(epoch, 0).map_or_else(
        || format!("invalid ({epoch})"),
        |date| date.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

/// Summarize a completed login
pub fn display_login_success(tokens: &GarminTokens, dir: &Path) {
    println!("\nLogin successful");
    println!("{}", "=".repeat(60));
    println!("   Tokens saved to: {}", dir.display());
    println!(
        "   Access token expires: {}",
        format_epoch(tokens.oauth2.expires_at)
    );
    println!(
        "   Refresh token expires: {}",
        format_epoch(tokens.oauth2.refresh_token_expires_at)
    );
    println!("{}", "=".repeat(60));
}

/// Summarize stored tokens
pub fn display_tokens(tokens: &GarminTokens, dir: &Path) {
    let now = Utc::now();
    println!("Tokens in {}", dir.display());
    println!("   OAuth1 token: {}", tokens.oauth1.oauth_token);
    println!("   Scope: {}", tokens.oauth2.scope);
    println!(
        "   Access token expires: {}{}",
        format_epoch(tokens.oauth2.expires_at),
        if tokens.oauth2.is_expired_at(now) {
            " (expired)"
        } else {
            ""
        }
    );
    println!(
        "   Refresh token expires: {}{}",
        format_epoch(tokens.oauth2.refresh_token_expires_at),
        if tokens.oauth2.is_refresh_expired_at(now) {
            " (expired, login required)"
        } else {
            ""
        }
    );
}

/// Pretty-print a JSON response
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
