// ABOUTME: Public API surface of the Garmin Connect client
// ABOUTME: Re-exports the GarminConnect facade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// `GarminConnect` facade
pub mod client;

pub use client::GarminConnect;
