// ABOUTME: Read-only API commands for garmin-cli
// ABOUTME: Loads stored tokens, calls the API, and writes back tokens refreshed along the way
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::{Context, Result};
use garmin_connect::api::GarminConnect;
use garmin_connect::config::GarminConfig;
use serde_json::Value;

use crate::helpers::display::print_json;

async fn authenticated_client(config: GarminConfig) -> Result<GarminConnect> {
    let client = GarminConnect::new(config)?;
    let dir = client.token_dir().to_path_buf();
    client
        .load_tokens_from_dir(&dir)
        .await
        .with_context(|| format!("No usable tokens in {}; run `garmin-cli login`", dir.display()))?;
    Ok(client)
}

/// Save tokens again in case a refresh happened during the call
async fn finish(client: &GarminConnect, value: &Value) -> Result<()> {
    let dir = client.token_dir().to_path_buf();
    client.export_tokens_to_dir(&dir).await?;
    print_json(value)
}

/// Print user settings
pub async fn settings(config: GarminConfig) -> Result<()> {
    let client = authenticated_client(config).await?;
    let value = client.get_user_settings().await?;
    finish(&client, &value).await
}

/// Print one page of activities
pub async fn activities(config: GarminConfig, start: u32, limit: u32) -> Result<()> {
    let client = authenticated_client(config).await?;
    let value = client.get_activities(start, limit).await?;
    finish(&client, &value).await
}
