// ABOUTME: Configuration module for the Garmin Connect client
// ABOUTME: Re-exports environment-driven client, HTTP, and consumer settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment and client configuration
pub mod environment;

pub use environment::{
    default_token_dir, ConsumerConfig, GarminConfig, GarminDomain, HttpClientConfig,
};
