// ABOUTME: Token persistence behind a pluggable store trait
// ABOUTME: File store writes oauth1_token.json and oauth2_token.json; an event hook persists on change
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use garmin_core::constants::files;
use garmin_core::errors::{GarminError, GarminResult};
use garmin_core::models::{GarminTokens, OAuth1Token, OAuth2Token, SessionEvent};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Persists exported token pairs
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Write both tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the tokens cannot be written.
    async fn save(&self, tokens: &GarminTokens) -> GarminResult<()>;

    /// Read both tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the tokens are missing or unreadable.
    async fn load(&self) -> GarminResult<GarminTokens>;
}

/// Directory holding one JSON document per token
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    /// Store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Token directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn oauth1_path(&self) -> PathBuf {
        self.dir.join(files::OAUTH1_TOKEN)
    }

    fn oauth2_path(&self) -> PathBuf {
        self.dir.join(files::OAUTH2_TOKEN)
    }
}

async fn write_json<T: Serialize + Sync>(path: &Path, value: &T) -> GarminResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| GarminError::serialization("token file", e))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| GarminError::io(path, e))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> GarminResult<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| GarminError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| GarminError::serialization("token file", e))
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn save(&self, tokens: &GarminTokens) -> GarminResult<()> {
        if !tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            debug!(dir = %self.dir.display(), "Creating token directory");
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| GarminError::io(&self.dir, e))?;
        }

        write_json(&self.oauth1_path(), &tokens.oauth1).await?;
        write_json(&self.oauth2_path(), &tokens.oauth2).await?;
        info!(dir = %self.dir.display(), "Tokens saved");
        Ok(())
    }

    async fn load(&self) -> GarminResult<GarminTokens> {
        if !tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            return Err(GarminError::config(format!(
                "Token directory does not exist: {}",
                self.dir.display()
            )));
        }

        let oauth1: OAuth1Token = read_json(&self.oauth1_path()).await?;
        let oauth2: OAuth2Token = read_json(&self.oauth2_path()).await?;
        debug!(dir = %self.dir.display(), "Tokens loaded");
        Ok(GarminTokens { oauth1, oauth2 })
    }
}

/// Save tokens to `store` every time a session event carries new ones
///
/// The task ends when the sending manager is dropped. Save failures are
/// logged and do not stop the task.
pub fn persist_on_change(
    store: Arc<dyn TokenStore>,
    mut events: broadcast::Receiver<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(tokens) = event.tokens() {
                        if let Err(e) = store.save(tokens).await {
                            warn!(error = %e, "Failed to persist refreshed tokens");
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Token persistence lagged behind session events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
