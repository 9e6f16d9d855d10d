// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Re-exports command modules for garmin-cli
// ABOUTME: Provides access to login/token and data query commands

pub mod auth;
pub mod data;
