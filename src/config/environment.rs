// ABOUTME: Environment configuration for the Garmin Connect client
// ABOUTME: Parses domain, credentials, token directory, HTTP timeouts, and OAuth consumer settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based client configuration

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use garmin_core::constants::{domains, files, http, oauth};
use garmin_core::errors::{GarminError, GarminResult};
use garmin_core::models::{ConsumerCredentials, Credentials};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::urls::GarminUrls;

/// Garmin Connect regional deployment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GarminDomain {
    /// `garmin.com`
    #[default]
    #[serde(rename = "garmin.com")]
    Global,
    /// `garmin.cn`
    #[serde(rename = "garmin.cn")]
    China,
}

impl GarminDomain {
    /// Host suffix for this deployment
    #[must_use]
    pub const fn host(self) -> &'static str {
        match self {
            Self::Global => domains::GARMIN_COM,
            Self::China => domains::GARMIN_CN,
        }
    }

    /// Parse from string with fallback to `garmin.com`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "garmin.cn" | "cn" | "china" => Self::China,
            _ => Self::Global,
        }
    }
}

impl fmt::Display for GarminDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host())
    }
}

/// HTTP client timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(http::DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(http::DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

/// Where OAuth consumer credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Bootstrap document URL, fetched once when no preset is configured
    pub bootstrap_url: String,
    /// Fixed consumer key/secret, skipping the bootstrap fetch
    pub preset: Option<ConsumerCredentials>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            bootstrap_url: oauth::CONSUMER_URL.to_owned(),
            preset: None,
        }
    }
}

/// Complete client configuration
#[derive(Debug, Clone)]
pub struct GarminConfig {
    /// Regional deployment
    pub domain: GarminDomain,
    /// Endpoint set; derived from `domain` unless overridden
    pub urls: GarminUrls,
    /// Login credentials, if known up front
    pub credentials: Option<Credentials>,
    /// Directory holding `oauth1_token.json` / `oauth2_token.json`
    pub token_dir: PathBuf,
    /// HTTP timeouts
    pub http: HttpClientConfig,
    /// OAuth consumer source
    pub consumer: ConsumerConfig,
}

impl Default for GarminConfig {
    fn default() -> Self {
        Self::for_domain(GarminDomain::default())
    }
}

impl GarminConfig {
    /// Configuration for a domain with default everything else
    #[must_use]
    pub fn for_domain(domain: GarminDomain) -> Self {
        Self {
            domain,
            urls: GarminUrls::for_domain(domain),
            credentials: None,
            token_dir: default_token_dir(),
            http: HttpClientConfig::default(),
            consumer: ConsumerConfig::default(),
        }
    }

    /// Set login credentials
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Switch regional deployment, re-deriving the endpoint set
    #[must_use]
    pub fn with_domain(mut self, domain: GarminDomain) -> Self {
        self.domain = domain;
        self.urls = GarminUrls::for_domain(domain);
        self
    }

    /// Override the endpoint set (tests, proxies)
    #[must_use]
    pub fn with_urls(mut self, urls: GarminUrls) -> Self {
        self.urls = urls;
        self
    }

    /// Use fixed consumer credentials instead of the bootstrap fetch
    #[must_use]
    pub fn with_consumer(mut self, consumer: ConsumerCredentials) -> Self {
        self.consumer.preset = Some(consumer);
        self
    }

    /// Load configuration from environment variables
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GARMIN_DOMAIN` | `garmin.com` |
    /// | `GARMIN_USERNAME` / `GARMIN_PASSWORD` | unset |
    /// | `GARMIN_CONFIG_FILE` | `garmin.config.json` when present |
    /// | `GARMIN_TOKEN_DIR` | `~/.garminconnect` |
    /// | `GARMIN_HTTP_TIMEOUT_SECS` | 30 |
    /// | `GARMIN_CONNECT_TIMEOUT_SECS` | 10 |
    /// | `GARMIN_OAUTH_CONSUMER_URL` | public bootstrap document |
    /// | `GARMIN_OAUTH_CONSUMER_KEY` / `GARMIN_OAUTH_CONSUMER_SECRET` | unset |
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse, only one half of
    /// the consumer pair is set, or a configured credentials file is unreadable.
    pub fn from_env() -> GarminResult<Self> {
        info!("Loading Garmin client configuration from environment variables");

        let domain = env::var("GARMIN_DOMAIN")
            .map(|value| GarminDomain::from_str_or_default(&value))
            .unwrap_or_default();

        let token_dir = env::var("GARMIN_TOKEN_DIR")
            .map_or_else(|_| default_token_dir(), PathBuf::from);

        let http = HttpClientConfig {
            timeout: Duration::from_secs(parse_secs(
                "GARMIN_HTTP_TIMEOUT_SECS",
                http::DEFAULT_TIMEOUT_SECS,
            )?),
            connect_timeout: Duration::from_secs(parse_secs(
                "GARMIN_CONNECT_TIMEOUT_SECS",
                http::DEFAULT_CONNECT_TIMEOUT_SECS,
            )?),
        };

        let consumer = ConsumerConfig {
            bootstrap_url: env::var("GARMIN_OAUTH_CONSUMER_URL")
                .unwrap_or_else(|_| oauth::CONSUMER_URL.to_owned()),
            preset: consumer_from_env()?,
        };

        let config = Self {
            domain,
            urls: GarminUrls::for_domain(domain),
            credentials: credentials_from_env()?,
            token_dir,
            http,
            consumer,
        };

        debug!(
            domain = %config.domain,
            token_dir = %config.token_dir.display(),
            has_credentials = config.credentials.is_some(),
            preset_consumer = config.consumer.preset.is_some(),
            "Garmin client configuration loaded"
        );
        Ok(config)
    }
}

/// Default token directory: `~/.garminconnect`, or relative when no home exists
#[must_use]
pub fn default_token_dir() -> PathBuf {
    dirs::home_dir().map_or_else(
        || PathBuf::from(files::DEFAULT_TOKEN_DIR),
        |home| home.join(files::DEFAULT_TOKEN_DIR),
    )
}

fn parse_secs(key: &str, default: u64) -> GarminResult<u64> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| GarminError::config(format!("Invalid {key} value: {value}"))),
        Err(_) => Ok(default),
    }
}

fn credentials_from_env() -> GarminResult<Option<Credentials>> {
    if let (Ok(username), Ok(password)) = (env::var("GARMIN_USERNAME"), env::var("GARMIN_PASSWORD"))
    {
        let credentials = Credentials::new(username, password);
        credentials.validate()?;
        return Ok(Some(credentials));
    }

    if let Ok(path) = env::var("GARMIN_CONFIG_FILE") {
        return Credentials::from_file(Path::new(&path)).map(Some);
    }

    let default_file = Path::new(files::CREDENTIALS_CONFIG);
    if default_file.is_file() {
        return Credentials::from_file(default_file).map(Some);
    }
    Ok(None)
}

fn consumer_from_env() -> GarminResult<Option<ConsumerCredentials>> {
    match (
        env::var("GARMIN_OAUTH_CONSUMER_KEY").ok(),
        env::var("GARMIN_OAUTH_CONSUMER_SECRET").ok(),
    ) {
        (Some(key), Some(secret)) => {
            let consumer = ConsumerCredentials::new(key, secret);
            if consumer.is_complete() {
                Ok(Some(consumer))
            } else {
                Err(GarminError::config(
                    "GARMIN_OAUTH_CONSUMER_KEY and GARMIN_OAUTH_CONSUMER_SECRET must not be empty",
                ))
            }
        }
        (None, None) => Ok(None),
        _ => Err(GarminError::config(
            "GARMIN_OAUTH_CONSUMER_KEY and GARMIN_OAUTH_CONSUMER_SECRET must be set together",
        )),
    }
}
