//! Domain types for observed withdrawal-proof events.
//!
//! An event is a single `WithdrawalProven` sighting on L1, enriched by the
//! validator with the dispute game it references and a handful of
//! plausibility checks. The classification state machine in the `state`
//! crate moves these between risk buckets; nothing here performs I/O.

use alloy_primitives::{Address, B256, U256};
use std::fmt;

/// Classification key: the transaction hash of the proving transaction.
pub type EventKey = B256;

/// Resolution state of a dispute game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    DefenderWins,
    ChallengerWins,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InProgress => "IN_PROGRESS",
            Self::DefenderWins => "DEFENDER_WINS",
            Self::ChallengerWins => "CHALLENGER_WINS",
        };
        write!(f, "{s}")
    }
}

/// The raw proven-withdrawal event as observed on L1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalEvent {
    pub withdrawal_hash: B256,
    pub proof_submitter: Address,
    /// Hash of the L1 transaction that emitted the event.
    pub tx_hash: B256,
    /// L1 block the event was emitted in.
    pub block_number: u64,
}

/// Dispute game context the withdrawal proof points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeGame {
    pub proxy_address: Address,
    pub root_claim: B256,
    pub l2_block_number: U256,
    pub status: GameStatus,
}

/// A withdrawal-proof event enriched with dispute-game context.
///
/// Created and fully populated by the validator; the store only stamps
/// `processed_timestamp` when the event reaches a classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedWithdrawalEvent {
    pub event: WithdrawalEvent,
    pub dispute_game: DisputeGame,
    /// The game proxy is on the portal's blacklist.
    pub blacklisted: bool,
    /// The claimed withdrawal hash actually exists on L2.
    pub withdrawal_present_on_l2: bool,
    /// Enrichment completed (all lookups succeeded).
    pub enriched: bool,
    /// Unix seconds, stamped once at first classification.
    pub processed_timestamp: Option<u64>,
}

impl EnrichedWithdrawalEvent {
    /// Key under which this event is tracked across buckets.
    pub const fn key(&self) -> EventKey {
        self.event.tx_hash
    }
}
