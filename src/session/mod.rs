// ABOUTME: Session layer: token ownership, single-flight refresh, and token persistence
// ABOUTME: The manager is the only component that reads or writes OAuth tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Token-owning session manager
pub mod manager;
/// Single-flight refresh coordination
pub mod refresh;
/// Token persistence
pub mod store;

pub use manager::SessionManager;
pub use refresh::{RefreshGate, RefreshLease, RefreshOutcome, RefreshSlot};
pub use store::{persist_on_change, FileTokenStore, TokenStore};
