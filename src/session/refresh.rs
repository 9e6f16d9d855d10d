// ABOUTME: Single-flight gate for OAuth2 token refresh
// ABOUTME: One leader refreshes; concurrent callers wait on one-shot channels released in FIFO order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Refresh Gate
//!
//! Concurrent requests that hit a 401 must not each run their own refresh.
//! The first caller through [`RefreshGate::acquire_refresh_slot`] becomes the
//! leader and receives a [`RefreshLease`]; everyone arriving while the lease
//! is held gets a one-shot receiver and waits for the leader's result.
//!
//! A generation counter advances every time new tokens are installed. Callers
//! pass the generation they observed when they read the token; a mismatch
//! means the token they used is already stale and they should retry with the
//! current one instead of refreshing again.
//!
//! The internal mutex is never held across an `.await`.

use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Result delivered to waiters: the new access token or a failure reason
pub type RefreshOutcome = Result<String, String>;

type Waiter = oneshot::Sender<RefreshOutcome>;

#[derive(Default)]
struct GateState {
    in_flight: bool,
    generation: u64,
    waiters: Vec<Waiter>,
}

/// Outcome of trying to start a refresh
pub enum RefreshSlot<'a> {
    /// Caller must perform the refresh and publish its result
    Leader(RefreshLease<'a>),
    /// A refresh is in flight; await its result
    Waiter(oneshot::Receiver<RefreshOutcome>),
    /// Tokens changed since the caller read them; retry with the current token
    Stale,
}

/// Per-manager single-flight refresh coordinator
#[derive(Default)]
pub struct RefreshGate {
    state: Mutex<GateState>,
}

impl RefreshGate {
    /// Create an idle gate at generation 0
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Refresh gate lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Current token generation
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Whether a refresh is in flight
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    /// Number of callers currently waiting
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Advance the generation after tokens were installed outside a refresh
    pub fn bump(&self) {
        self.lock().generation += 1;
    }

    /// Become the refresher, join the in-flight refresh, or learn the token is stale
    ///
    /// Staleness is checked first: a caller whose token was replaced while its
    /// request was in flight retries rather than waiting on or starting another
    /// refresh.
    pub fn acquire_refresh_slot(&self, observed_generation: u64) -> RefreshSlot<'_> {
        let mut state = self.lock();
        if state.generation != observed_generation {
            return RefreshSlot::Stale;
        }
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            debug!(waiters = state.waiters.len(), "Joining in-flight token refresh");
            return RefreshSlot::Waiter(rx);
        }
        state.in_flight = true;
        drop(state);

        debug!("Starting token refresh");
        RefreshSlot::Leader(RefreshLease {
            gate: self,
            published: false,
        })
    }

    fn release(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            if outcome.is_ok() {
                state.generation += 1;
            }
            std::mem::take(&mut state.waiters)
        };

        debug!(
            waiters = waiters.len(),
            success = outcome.is_ok(),
            "Releasing token refresh waiters"
        );
        for waiter in waiters {
            // A dropped receiver means that caller was cancelled
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Held by the refresh leader until it publishes a result
///
/// Dropping an unpublished lease releases every waiter with a failure, so a
/// cancelled leader cannot strand them.
pub struct RefreshLease<'a> {
    gate: &'a RefreshGate,
    published: bool,
}

impl RefreshLease<'_> {
    /// Clear the in-flight flag and deliver `outcome` to every waiter in arrival order
    pub fn publish_and_release(mut self, outcome: &RefreshOutcome) {
        self.published = true;
        self.gate.release(outcome);
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.published {
            warn!("Token refresh abandoned before completion");
            self.gate
                .release(&Err("token refresh was cancelled".to_owned()));
        }
    }
}
