// ABOUTME: OAuth 1.0a HMAC-SHA1 request signing
// ABOUTME: Builds the signature base string, signs with ring, and renders header or query parameters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! OAuth 1.0a request signing (RFC 5849 §3.4)
//!
//! The signature base string is
//! `METHOD&enc(base_url)&enc(normalized_params)`, where the normalized
//! parameters are every query and `oauth_*` parameter, percent-encoded with
//! the RFC 3986 unreserved set, sorted by key then value, and joined with `&`.
//! The signing key is `enc(consumer_secret)&enc(token_secret)`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use garmin_core::constants::oauth;
use garmin_core::errors::{GarminError, GarminResult};
use garmin_core::models::{ConsumerCredentials, OAuth1Token};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Method;
use ring::hmac;
use url::Url;

/// Signed `oauth_*` parameters, including `oauth_signature`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthParameters {
    params: Vec<(String, String)>,
}

impl OAuthParameters {
    /// Value of one parameter
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// The computed signature
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.get("oauth_signature")
    }

    /// `Authorization` header value: `OAuth k="v", ...`
    #[must_use]
    pub fn authorization_header(&self) -> String {
        let fields: Vec<String> = self
            .params
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
            .collect();
        format!("OAuth {}", fields.join(", "))
    }

    /// Parameters as query pairs
    #[must_use]
    pub fn into_query(self) -> Vec<(String, String)> {
        self.params
    }
}

/// Per-request values that must differ between requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningNonce {
    /// Random nonce
    pub nonce: String,
    /// Epoch seconds
    pub timestamp: i64,
}

impl SigningNonce {
    /// Fresh alphanumeric nonce and the current time
    #[must_use]
    pub fn generate() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(oauth::NONCE_LENGTH)
            .map(char::from)
            .collect();
        Self {
            nonce,
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Fixed values, for reproducible signatures
    pub fn fixed(nonce: impl Into<String>, timestamp: i64) -> Self {
        Self {
            nonce: nonce.into(),
            timestamp,
        }
    }
}

/// Signs requests with a consumer key/secret and optional token
#[derive(Debug, Clone)]
pub struct OAuth1Signer {
    consumer: ConsumerCredentials,
}

impl OAuth1Signer {
    /// Create a signer for a consumer
    #[must_use]
    pub const fn new(consumer: ConsumerCredentials) -> Self {
        Self { consumer }
    }

    /// Sign with a fresh nonce and timestamp
    ///
    /// `token` is `None` for two-legged requests.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `url` is not absolute.
    pub fn sign(
        &self,
        method: &Method,
        url: &str,
        params: &[(String, String)],
        token: Option<&OAuth1Token>,
    ) -> GarminResult<OAuthParameters> {
        self.sign_with(method, url, params, token, &SigningNonce::generate())
    }

    /// Sign with caller-provided nonce and timestamp
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `url` is not absolute.
    pub fn sign_with(
        &self,
        method: &Method,
        url: &str,
        params: &[(String, String)],
        token: Option<&OAuth1Token>,
        nonce: &SigningNonce,
    ) -> GarminResult<OAuthParameters> {
        let (base_url, url_params) = split_url(url)?;

        let mut oauth_params = vec![
            ("oauth_consumer_key".to_owned(), self.consumer.key.clone()),
            ("oauth_nonce".to_owned(), nonce.nonce.clone()),
            (
                "oauth_signature_method".to_owned(),
                oauth::SIGNATURE_METHOD.to_owned(),
            ),
            ("oauth_timestamp".to_owned(), nonce.timestamp.to_string()),
        ];
        if let Some(token) = token {
            oauth_params.push(("oauth_token".to_owned(), token.oauth_token.clone()));
        }
        oauth_params.push(("oauth_version".to_owned(), oauth::VERSION.to_owned()));

        let all_params = url_params
            .iter()
            .chain(params.iter())
            .chain(oauth_params.iter());
        let base_string = signature_base_string(method, &base_url, all_params);

        let token_secret = token.map_or("", |token| token.oauth_token_secret.as_str());
        let signature = hmac_sha1(&self.consumer.secret, token_secret, &base_string);

        oauth_params.push(("oauth_signature".to_owned(), signature));
        Ok(OAuthParameters {
            params: oauth_params,
        })
    }
}

/// RFC 3986 percent-encoding (unreserved characters pass through)
#[must_use]
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// `METHOD&enc(base_url)&enc(sorted params)`
pub fn signature_base_string<'a, I>(method: &Method, base_url: &str, params: I) -> String
where
    I: IntoIterator<Item = &'a (String, String)>,
{
    let mut encoded: Vec<(String, String)> = params
        .into_iter()
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.as_str().to_uppercase(),
        percent_encode(base_url),
        percent_encode(&normalized)
    )
}

fn hmac_sha1(consumer_secret: &str, token_secret: &str, base_string: &str) -> String {
    let signing_key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, signing_key.as_bytes());
    let tag = hmac::sign(&key, base_string.as_bytes());
    STANDARD.encode(tag.as_ref())
}

/// Normalized base URL plus any parameters already in its query string
fn split_url(url: &str) -> GarminResult<(String, Vec<(String, String)>)> {
    let mut parsed =
        Url::parse(url).map_err(|e| GarminError::config(format!("Invalid URL {url}: {e}")))?;
    let query: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok((parsed.to_string(), query))
}
