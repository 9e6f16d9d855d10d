// ABOUTME: Login and token inspection commands for garmin-cli
// ABOUTME: Runs the SSO login chain and reads or writes the token directory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::Result;
use garmin_connect::api::GarminConnect;
use garmin_connect::config::GarminConfig;
use garmin_connect::session::{FileTokenStore, TokenStore};
use tracing::info;

use crate::helpers::display::{display_login_success, display_tokens};

/// Log in and persist the tokens to the configured directory
pub async fn login(
    config: GarminConfig,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<()> {
    let client = GarminConnect::new(config)?;
    let tokens = client.login(username, password).await?;

    let dir = client.token_dir().to_path_buf();
    client.export_tokens_to_dir(&dir).await?;
    info!(dir = %dir.display(), "Tokens written");

    display_login_success(&tokens, &dir);
    Ok(())
}

/// Print the stored tokens' expiry
pub async fn show_tokens(config: &GarminConfig) -> Result<()> {
    let tokens = FileTokenStore::new(config.token_dir.clone()).load().await?;
    display_tokens(&tokens, &config.token_dir);
    Ok(())
}
