// ABOUTME: Username/password credentials for the SSO login
// ABOUTME: Loaded from config files or the environment; password redacted from Debug output

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{GarminError, GarminResult};

/// Garmin Connect account credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email or username
    pub username: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create credentials from a username and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Load credentials from a JSON document `{ "username": ..., "password": ... }`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or holds
    /// empty values.
    pub fn from_file(path: &Path) -> GarminResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| GarminError::io(path, e))?;
        let credentials: Self = serde_json::from_str(&raw)
            .map_err(|e| GarminError::serialization("credentials config", e))?;
        credentials.validate()?;
        Ok(credentials)
    }

    /// Reject empty username or password
    ///
    /// # Errors
    ///
    /// Returns `GarminError::Config` naming the missing field.
    pub fn validate(&self) -> GarminResult<()> {
        if self.username.trim().is_empty() {
            return Err(GarminError::config("Missing credentials: username is empty"));
        }
        if self.password.is_empty() {
            return Err(GarminError::config("Missing credentials: password is empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
