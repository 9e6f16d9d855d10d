// ABOUTME: Utility module for shared helpers
// ABOUTME: HTTP client construction and small parsing helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// HTTP client construction
pub mod http_client;

/// Extract the filename from a `Content-Disposition` header value
#[must_use]
pub fn content_disposition_filename(value: &str) -> Option<String> {
    let (_, rest) = value.split_once("filename=")?;
    let name = rest
        .split(';')
        .next()
        .unwrap_or(rest)
        .trim()
        .trim_matches('"');
    // Reject path components
    let name = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(name);
    (!name.is_empty()).then(|| name.to_owned())
}
