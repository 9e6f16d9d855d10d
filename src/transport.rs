// ABOUTME: HTTP transport abstraction used by the SSO, OAuth, and session layers
// ABOUTME: Request/response value types plus the reqwest-backed implementation with cookie store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Transport
//!
//! Every HTTP exchange in the client goes through [`HttpTransport`]. The
//! production implementation, [`ReqwestTransport`], owns a cookie-storing
//! `reqwest::Client`; tests can substitute scripted transports.
//!
//! The transport never interprets status codes. Classification (401 handling,
//! 5xx as transport failures) belongs to the session layer.

use async_trait::async_trait;
use bytes::Bytes;
use garmin_core::errors::{GarminError, GarminResult};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::HttpClientConfig;
use crate::utils::http_client::create_session_client;

/// Request body variants
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
    /// JSON document
    Json(serde_json::Value),
    /// Single-file `multipart/form-data` upload
    Multipart {
        /// Form field name
        field: String,
        /// File name reported to the server
        file_name: String,
        /// File contents
        bytes: Vec<u8>,
    },
}

/// Outgoing HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// URL without query string
    pub url: String,
    /// Query parameters, in order
    pub query: Vec<(String, String)>,
    /// Extra headers, in order
    pub headers: Vec<(String, String)>,
    /// Body
    pub body: RequestBody,
}

impl HttpRequest {
    /// Create a request with no query, headers, or body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// PUT request
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// DELETE request
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters
    #[must_use]
    pub fn queries<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Append a header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a form body
    #[must_use]
    pub fn form<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set a JSON body
    #[must_use]
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    /// Value of the first header with this name (case-insensitive)
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Replace any existing header with this name
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value));
    }
}

/// Received HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Bytes,
}

impl HttpResponse {
    /// Build a response from parts
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Whether the status is 401
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self, context: &'static str) -> GarminResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| GarminError::serialization(context, e))
    }

    /// Body as JSON, falling back to a JSON string for non-JSON bodies and
    /// `null` for empty ones
    #[must_use]
    pub fn json_or_text(&self) -> serde_json::Value {
        if self.body.is_empty() {
            return serde_json::Value::Null;
        }
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|_| serde_json::Value::String(self.text()))
    }

    /// Header value as a string
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Turn a non-success response into a classified error
    ///
    /// # Errors
    ///
    /// Returns `GarminError::from_status` for any non-2xx status.
    pub fn error_for_status(self) -> GarminResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(GarminError::from_status(self.status, self.text()))
        }
    }
}

/// Executes HTTP requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return the response whatever its status
    ///
    /// # Errors
    ///
    /// Returns `GarminError::Transport` for network failures and timeouts.
    async fn execute(&self, request: HttpRequest) -> GarminResult<HttpResponse>;
}

/// `reqwest`-backed transport with a per-instance cookie store
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with its own cookie store
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new(config: &HttpClientConfig) -> GarminResult<Self> {
        Ok(Self {
            client: create_session_client(config)?,
        })
    }

    /// Wrap an existing client
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> GarminResult<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self.client.request(request.method.clone(), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(pairs) => {
                let encoded = serde_urlencoded::to_string(&pairs).map_err(|e| {
                    GarminError::transport(format!("Failed to encode form body: {e}"))
                })?;
                builder
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(encoded)
            }
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart {
                field,
                file_name,
                bytes,
            } => builder.multipart(Form::new().part(field, Part::bytes(bytes).file_name(file_name))),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!(status, url = %request.url, bytes = body.len(), "Received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
