//! Classification state for the faultproof-withdrawal monitor.
//!
//! The validator hands this crate one risk determination per observed
//! withdrawal-proof event; [`ClassificationStore`] keeps the authoritative
//! picture of which events are valid, confirmed forgeries, suspicious
//! failures, or forgeries still pending game resolution. The store never
//! performs I/O; the metrics layer reads it through [`StoreSnapshot`].

mod cache;
mod store;

pub use cache::RiskCache;
pub use store::{
    ClassificationStore, Determination, StoreSnapshot, SyncProgress,
    SUSPICIOUS_EVENT_CACHE_SIZE,
};

use thiserror::Error;

/// Construction-time failures. All of these are fatal to startup: the store
/// is never returned partially initialized.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to get {chain} block number: {source}")]
    HeightQuery {
        chain: &'static str,
        source: eyre::Report,
    },

    #[error("suspicious-event cache capacity must be non-zero")]
    ZeroCacheCapacity,
}
