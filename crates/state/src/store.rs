use crate::{cache::RiskCache, StoreError};
use event::{EnrichedWithdrawalEvent, EventKey};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use validator::ValidatorApi;

/// Capacity of the suspicious-event bucket. Failed attacks are low severity;
/// only the most recent sightings are kept resident.
pub const SUSPICIOUS_EVENT_CACHE_SIZE: usize = 1000;

/// The validator's per-event risk determination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Determination {
    /// Correctly proven withdrawal.
    Valid,
    /// Forgery on a game that resolved in the defender's favor.
    ConfirmedAttack,
    /// Forgery on a game that has not resolved yet.
    InProgressAttack,
    /// Forgery on a game that resolved against the submitter.
    SuspiciousOnChallengerWins,
}

/// How far event ingestion lags the L1 chain head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress {
    pub blocks_remaining: u64,
    pub percent_complete: u64,
}

impl SyncProgress {
    fn compute(next_l1_height: u64, latest_l1_height: u64) -> Self {
        if latest_l1_height == 0 {
            return Self {
                blocks_remaining: 0,
                percent_complete: 0,
            };
        }
        let blocks_remaining = latest_l1_height.saturating_sub(next_l1_height);
        // floor(100 - 100*remaining/latest) == 100 - ceil(100*remaining/latest)
        let scaled = 100u128 * u128::from(blocks_remaining);
        let ceil = scaled.div_ceil(u128::from(latest_l1_height)) as u64;
        Self {
            blocks_remaining,
            percent_complete: 100u64.saturating_sub(ceil),
        }
    }
}

#[derive(Debug)]
struct Inner {
    next_l1_height: u64,
    latest_l1_height: u64,
    initial_l1_height: u64,
    latest_l2_height: u64,

    /// Events classified, one per determination handed to the store.
    events_processed: u64,
    /// Events that reached a terminal classification. Never counts
    /// in-progress sightings, so `withdrawals_processed <= events_processed`.
    withdrawals_processed: u64,

    // Forgeries on games already resolved for the defender. Grows for the
    // process lifetime; entries are operator-actionable and expected to be
    // resolved out of band.
    confirmed_attacks: HashMap<EventKey, EnrichedWithdrawalEvent>,
    confirmed_attack_count: u64,

    // Forgeries on unresolved games; transient, the faultproof system
    // should invalidate them.
    in_progress_attacks: HashMap<EventKey, EnrichedWithdrawalEvent>,
    in_progress_attack_count: u64,

    // Forgeries on games the challenger already won: the attack failed.
    // Bounded residency; the count is lifetime occurrences, not residents.
    suspicious_events: RiskCache,
    suspicious_event_count: u64,
}

/// Authoritative classification state, guarded by a single lock.
///
/// Every operation and the snapshot read take the lock for the whole
/// transition, so a snapshot always observes counts that match bucket
/// contents. Nothing blocks on I/O while holding it.
#[derive(Debug)]
pub struct ClassificationStore {
    inner: Mutex<Inner>,
}

impl ClassificationStore {
    /// Build a store seeded with current chain heights from the validator.
    ///
    /// Any failed height query or cache-construction failure aborts
    /// construction; there is no degraded mode.
    pub async fn new<V>(validator: &V) -> Result<Self, StoreError>
    where
        V: ValidatorApi + ?Sized,
    {
        let next_l1_height =
            validator
                .l1_block_number()
                .await
                .map_err(|source| StoreError::HeightQuery {
                    chain: "l1",
                    source,
                })?;
        let latest_l1_height =
            validator
                .l1_block_number()
                .await
                .map_err(|source| StoreError::HeightQuery {
                    chain: "l1",
                    source,
                })?;
        let latest_l2_height =
            validator
                .l2_block_number()
                .await
                .map_err(|source| StoreError::HeightQuery {
                    chain: "l2",
                    source,
                })?;

        Self::from_heights(next_l1_height, latest_l1_height, latest_l2_height)
    }

    /// Build a store from already-known heights. `initial_l1_height` is
    /// fixed to `next_l1_height` and never changes afterwards.
    pub fn from_heights(
        next_l1_height: u64,
        latest_l1_height: u64,
        latest_l2_height: u64,
    ) -> Result<Self, StoreError> {
        let suspicious_events = RiskCache::new(SUSPICIOUS_EVENT_CACHE_SIZE)?;

        Ok(Self {
            inner: Mutex::new(Inner {
                next_l1_height,
                latest_l1_height,
                initial_l1_height: next_l1_height,
                latest_l2_height,
                events_processed: 0,
                withdrawals_processed: 0,
                confirmed_attacks: HashMap::new(),
                confirmed_attack_count: 0,
                in_progress_attacks: HashMap::new(),
                in_progress_attack_count: 0,
                suspicious_events,
                suspicious_event_count: 0,
            }),
        })
    }

    // Transitions never panic mid-update, so a guard recovered from a
    // poisoned lock still holds a consistent state.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Dispatch one determination to the matching transition.
    pub fn record(&self, determination: Determination, event: EnrichedWithdrawalEvent) {
        match determination {
            Determination::Valid => self.record_validated(event),
            Determination::ConfirmedAttack => self.record_confirmed_attack(event),
            Determination::InProgressAttack => self.record_in_progress_attack(event),
            Determination::SuspiciousOnChallengerWins => self.record_suspicious(event),
        }
    }

    /// A correctly proven withdrawal: counted, stamped, never retained.
    pub fn record_validated(&self, mut event: EnrichedWithdrawalEvent) {
        let mut inner = self.lock();
        inner.events_processed += 1;
        inner.withdrawals_processed += 1;
        stamp_processed(&mut event);
        info!(tx_hash = %event.key(), "Withdrawal proof is valid");
    }

    /// Forgery on a game resolved in the defender's favor. Supersedes any
    /// in-progress sighting of the same key.
    pub fn record_confirmed_attack(&self, mut event: EnrichedWithdrawalEvent) {
        let key = event.key();
        let mut inner = self.lock();
        inner.events_processed += 1;
        inner.withdrawals_processed += 1;
        stamp_processed(&mut event);
        error!(
            tx_hash = %key,
            game = %event.dispute_game.proxy_address,
            "Withdrawal proof is NOT valid, forgery detected on a resolved game"
        );
        inner.remove_in_progress(&key);
        if inner.confirmed_attacks.insert(key, event).is_none() {
            inner.confirmed_attack_count += 1;
        }
    }

    /// Forgery on a game still in progress. First sighting of a key counts
    /// and stamps; repeat sightings only refresh the stored payload.
    pub fn record_in_progress_attack(&self, mut event: EnrichedWithdrawalEvent) {
        let key = event.key();
        let mut inner = self.lock();
        inner.events_processed += 1;
        if inner.in_progress_attacks.contains_key(&key) {
            error!(
                tx_hash = %key,
                game = %event.dispute_game.proxy_address,
                "Withdrawal proof is NOT valid, game still in progress"
            );
        } else {
            error!(
                tx_hash = %key,
                game = %event.dispute_game.proxy_address,
                "Withdrawal proof is NOT valid, new in-progress game found"
            );
            inner.in_progress_attack_count += 1;
            stamp_processed(&mut event);
        }
        inner.in_progress_attacks.insert(key, event);
    }

    /// Forgery on a game the challenger already won: the attack failed.
    /// Supersedes any in-progress sighting of the same key.
    pub fn record_suspicious(&self, mut event: EnrichedWithdrawalEvent) {
        let key = event.key();
        let mut inner = self.lock();
        inner.events_processed += 1;
        inner.withdrawals_processed += 1;
        stamp_processed(&mut event);
        error!(
            tx_hash = %key,
            game = %event.dispute_game.proxy_address,
            "Withdrawal proof is NOT valid, but the game resolved against the submitter"
        );
        inner.remove_in_progress(&key);
        inner.suspicious_events.insert(key, event);
        // Lifetime occurrences: eviction never decrements this.
        inner.suspicious_event_count += 1;
    }

    /// Advance the height trackers. `initial_l1_height` stays fixed.
    pub fn update_heights(
        &self,
        next_l1_height: u64,
        latest_l1_height: u64,
        latest_l2_height: u64,
    ) {
        let mut inner = self.lock();
        inner.next_l1_height = next_l1_height;
        inner.latest_l1_height = latest_l1_height;
        inner.latest_l2_height = latest_l2_height;
    }

    pub fn sync_progress(&self) -> SyncProgress {
        let inner = self.lock();
        SyncProgress::compute(inner.next_l1_height, inner.latest_l1_height)
    }

    /// One consistent copy of heights, counters, and bucket contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.lock();
        StoreSnapshot {
            next_l1_height: inner.next_l1_height,
            latest_l1_height: inner.latest_l1_height,
            initial_l1_height: inner.initial_l1_height,
            latest_l2_height: inner.latest_l2_height,
            events_processed: inner.events_processed,
            withdrawals_processed: inner.withdrawals_processed,
            confirmed_attacks: inner.confirmed_attacks.values().cloned().collect(),
            confirmed_attack_count: inner.confirmed_attack_count,
            in_progress_attacks: inner.in_progress_attacks.values().cloned().collect(),
            in_progress_attack_count: inner.in_progress_attack_count,
            suspicious_events: inner
                .suspicious_events
                .iter()
                .map(|(_, event)| event.clone())
                .collect(),
            suspicious_event_count: inner.suspicious_event_count,
        }
    }

    /// Emit one structured log line with the full bookkeeping state.
    pub fn log_state(&self) {
        let inner = self.lock();
        let progress = SyncProgress::compute(inner.next_l1_height, inner.latest_l1_height);
        info!(
            initial_l1_height = inner.initial_l1_height,
            next_l1_height = inner.next_l1_height,
            latest_l1_height = inner.latest_l1_height,
            latest_l2_height = inner.latest_l2_height,
            blocks_remaining = progress.blocks_remaining,
            sync_percent = progress.percent_complete,
            events_processed = inner.events_processed,
            withdrawals_processed = inner.withdrawals_processed,
            confirmed_attacks = inner.confirmed_attack_count,
            in_progress_attacks = inner.in_progress_attack_count,
            suspicious_events = inner.suspicious_event_count,
            "STATE"
        );
    }
}

impl Inner {
    /// Promotion cleanup: drop an in-progress sighting once its key reaches
    /// a terminal bucket.
    fn remove_in_progress(&mut self, key: &EventKey) {
        if self.in_progress_attacks.remove(key).is_some() {
            self.in_progress_attack_count -= 1;
            error!(tx_hash = %key, "Promoting event out of the in-progress bucket");
        }
    }
}

/// Consistent read of the store, taken under its lock.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub next_l1_height: u64,
    pub latest_l1_height: u64,
    pub initial_l1_height: u64,
    pub latest_l2_height: u64,
    pub events_processed: u64,
    pub withdrawals_processed: u64,
    pub confirmed_attacks: Vec<EnrichedWithdrawalEvent>,
    pub confirmed_attack_count: u64,
    pub in_progress_attacks: Vec<EnrichedWithdrawalEvent>,
    pub in_progress_attack_count: u64,
    pub suspicious_events: Vec<EnrichedWithdrawalEvent>,
    pub suspicious_event_count: u64,
}

impl StoreSnapshot {
    pub fn sync_progress(&self) -> SyncProgress {
        SyncProgress::compute(self.next_l1_height, self.latest_l1_height)
    }
}

/// Unix-seconds stamp, set only on the first classification of an event.
fn stamp_processed(event: &mut EnrichedWithdrawalEvent) {
    if event.processed_timestamp.is_none() {
        event.processed_timestamp = Some(unix_now());
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
