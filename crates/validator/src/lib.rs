//! Interface boundary to the proof validator.
//!
//! The validator owns everything that talks to chain RPCs: event scanning,
//! dispute-game inspection, and the per-event risk determination itself.
//! This crate only defines what the bookkeeping core consumes from it
//! (chain heights at startup, lifetime connection totals each snapshot
//! cycle), plus an alloy-backed [`NodeClient`] that implements that surface.

mod node;

pub use node::{create_provider, ClientError, NodeClient};

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime connection totals across both network sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Total connection attempts.
    pub connections: u64,
    /// Total failed attempts.
    pub failures: u64,
}

/// Running connection accounting for one network side.
///
/// Counters only ever grow; consumers derive increments themselves.
#[derive(Debug, Default)]
pub struct ConnectionTally {
    connections: AtomicU64,
    failures: AtomicU64,
}

impl ConnectionTally {
    pub const fn new() -> Self {
        Self {
            connections: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn record_success(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            connections: self.connections.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl ConnectionStats {
    /// Combine totals from two network sides.
    pub const fn merged(self, other: Self) -> Self {
        Self {
            connections: self.connections + other.connections,
            failures: self.failures + other.failures,
        }
    }
}

/// What the bookkeeping core consumes from the validator collaborator.
#[async_trait]
pub trait ValidatorApi: Send + Sync {
    /// Current L1 chain height.
    async fn l1_block_number(&self) -> eyre::Result<u64>;

    /// Current L2 chain height.
    async fn l2_block_number(&self) -> eyre::Result<u64>;

    /// Lifetime connection totals, summed over both network sides.
    fn connection_stats(&self) -> ConnectionStats;
}
