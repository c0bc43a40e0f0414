//! Prometheus metrics for the monitor.
//!
//! The store is the source of truth; this module is a pure translation of a
//! [`StoreSnapshot`] (plus the validator's connection totals) into gauges,
//! monotonic counters, and per-event labeled series. Counters are derived by
//! delta against the last value added, and per-event label sets are rebuilt
//! from scratch every cycle so series for removed events never go stale.

use event::EnrichedWithdrawalEvent;
use prometheus::{
    register_gauge_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, GaugeVec, IntCounter, IntGauge, Registry,
};
use state::StoreSnapshot;
use validator::ConnectionStats;

const EVENT_LABELS: [&str; 13] = [
    "withdrawal_hash",
    "proof_submitter",
    "status",
    "tx_hash",
    "tx_block_number",
    "proxy_address",
    "l2_block_number",
    "root_claim",
    "blacklisted",
    "withdrawal_present_on_l2",
    "enriched",
    "event_block_number",
    "event_tx_hash",
];

/// Label values for one tracked event, in [`EVENT_LABELS`] order.
struct EventLabels {
    withdrawal_hash: String,
    proof_submitter: String,
    status: String,
    tx_hash: String,
    tx_block_number: String,
    proxy_address: String,
    l2_block_number: String,
    root_claim: String,
    blacklisted: String,
    withdrawal_present_on_l2: String,
    enriched: String,
    event_block_number: String,
    event_tx_hash: String,
}

impl EventLabels {
    fn from_event(event: &EnrichedWithdrawalEvent) -> Self {
        Self {
            withdrawal_hash: event.event.withdrawal_hash.to_string(),
            proof_submitter: event.event.proof_submitter.to_string(),
            status: event.dispute_game.status.to_string(),
            tx_hash: event.event.tx_hash.to_string(),
            tx_block_number: event.event.block_number.to_string(),
            proxy_address: event.dispute_game.proxy_address.to_string(),
            l2_block_number: event.dispute_game.l2_block_number.to_string(),
            root_claim: event.dispute_game.root_claim.to_string(),
            blacklisted: event.blacklisted.to_string(),
            withdrawal_present_on_l2: event.withdrawal_present_on_l2.to_string(),
            enriched: event.enriched.to_string(),
            event_block_number: event.event.block_number.to_string(),
            event_tx_hash: event.event.tx_hash.to_string(),
        }
    }

    fn values(&self) -> [&str; 13] {
        [
            &self.withdrawal_hash,
            &self.proof_submitter,
            &self.status,
            &self.tx_hash,
            &self.tx_block_number,
            &self.proxy_address,
            &self.l2_block_number,
            &self.root_claim,
            &self.blacklisted,
            &self.withdrawal_present_on_l2,
            &self.enriched,
            &self.event_block_number,
            &self.event_tx_hash,
        ]
    }
}

/// Last totals already added to each exported counter.
#[derive(Debug, Default)]
struct LastAdded {
    events_processed: u64,
    withdrawals_processed: u64,
    node_connections: u64,
    node_connection_failures: u64,
}

/// The externally observable metrics surface.
#[derive(Debug)]
pub struct Metrics {
    up: IntGauge,
    initial_l1_height: IntGauge,
    next_l1_height: IntGauge,
    latest_l1_height: IntGauge,
    latest_l2_height: IntGauge,
    sync_percent: IntGauge,

    events_processed: IntCounter,
    withdrawals_processed: IntCounter,
    node_connections: IntCounter,
    node_connection_failures: IntCounter,

    confirmed_attacks: IntGauge,
    in_progress_attacks: IntGauge,
    suspicious_events: IntGauge,

    confirmed_attack_events: GaugeVec,
    in_progress_attack_events: GaugeVec,
    suspicious_event_info: GaugeVec,

    last_added: LastAdded,
}

impl Metrics {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        Ok(Self {
            up: register_int_gauge_with_registry!(
                "faultproof_withdrawals_up",
                "1 if the service is up and running, 0 otherwise",
                registry,
            )?,
            initial_l1_height: register_int_gauge_with_registry!(
                "faultproof_withdrawals_initial_l1_height",
                "L1 height event ingestion started from",
                registry,
            )?,
            next_l1_height: register_int_gauge_with_registry!(
                "faultproof_withdrawals_next_l1_height",
                "Next L1 height to ingest",
                registry,
            )?,
            latest_l1_height: register_int_gauge_with_registry!(
                "faultproof_withdrawals_latest_l1_height",
                "Latest observed L1 height",
                registry,
            )?,
            latest_l2_height: register_int_gauge_with_registry!(
                "faultproof_withdrawals_latest_l2_height",
                "Latest observed L2 height",
                registry,
            )?,
            sync_percent: register_int_gauge_with_registry!(
                "faultproof_withdrawals_sync_percent",
                "Percentage of the observed L1 range already ingested",
                registry,
            )?,
            events_processed: register_int_counter_with_registry!(
                "faultproof_withdrawals_events_processed_total",
                "Total number of events processed",
                registry,
            )?,
            withdrawals_processed: register_int_counter_with_registry!(
                "faultproof_withdrawals_withdrawals_processed_total",
                "Total number of withdrawals processed",
                registry,
            )?,
            node_connections: register_int_counter_with_registry!(
                "faultproof_withdrawals_node_connections_total",
                "Total number of node connection attempts",
                registry,
            )?,
            node_connection_failures: register_int_counter_with_registry!(
                "faultproof_withdrawals_node_connection_failures_total",
                "Total number of node connection failures",
                registry,
            )?,
            confirmed_attacks: register_int_gauge_with_registry!(
                "faultproof_withdrawals_confirmed_attacks_count",
                "Number of confirmed attacks on games resolved for the defender",
                registry,
            )?,
            in_progress_attacks: register_int_gauge_with_registry!(
                "faultproof_withdrawals_in_progress_attacks_count",
                "Number of suspected attacks on games still in progress",
                registry,
            )?,
            suspicious_events: register_int_gauge_with_registry!(
                "faultproof_withdrawals_suspicious_events_count",
                "Lifetime number of suspicious events on challenger-wins games",
                registry,
            )?,
            confirmed_attack_events: register_gauge_vec_with_registry!(
                "faultproof_withdrawals_confirmed_attack_events",
                "Details of confirmed attacks on resolved games",
                &EVENT_LABELS,
                registry,
            )?,
            in_progress_attack_events: register_gauge_vec_with_registry!(
                "faultproof_withdrawals_in_progress_attack_events",
                "Details of suspected attacks on in-progress games",
                &EVENT_LABELS,
                registry,
            )?,
            suspicious_event_info: register_gauge_vec_with_registry!(
                "faultproof_withdrawals_suspicious_events_info",
                "Details of suspicious events on challenger-wins games",
                &EVENT_LABELS,
                registry,
            )?,
            last_added: LastAdded::default(),
        })
    }

    /// Run one snapshot cycle: set gauges, grow counters by positive deltas,
    /// and rebuild the per-event label sets from current bucket contents.
    pub fn update(&mut self, snapshot: &StoreSnapshot, connections: ConnectionStats) {
        self.up.set(1);

        self.initial_l1_height.set(snapshot.initial_l1_height as i64);
        self.next_l1_height.set(snapshot.next_l1_height as i64);
        self.latest_l1_height.set(snapshot.latest_l1_height as i64);
        self.latest_l2_height.set(snapshot.latest_l2_height as i64);
        self.sync_percent
            .set(snapshot.sync_progress().percent_complete as i64);

        self.confirmed_attacks
            .set(snapshot.confirmed_attack_count as i64);
        self.in_progress_attacks
            .set(snapshot.in_progress_attack_count as i64);
        self.suspicious_events
            .set(snapshot.suspicious_event_count as i64);

        bump_counter(
            &self.events_processed,
            &mut self.last_added.events_processed,
            snapshot.events_processed,
        );
        bump_counter(
            &self.withdrawals_processed,
            &mut self.last_added.withdrawals_processed,
            snapshot.withdrawals_processed,
        );
        bump_counter(
            &self.node_connections,
            &mut self.last_added.node_connections,
            connections.connections,
        );
        bump_counter(
            &self.node_connection_failures,
            &mut self.last_added.node_connection_failures,
            connections.failures,
        );

        rebuild_bucket(&self.confirmed_attack_events, &snapshot.confirmed_attacks);
        rebuild_bucket(
            &self.in_progress_attack_events,
            &snapshot.in_progress_attacks,
        );
        rebuild_bucket(&self.suspicious_event_info, &snapshot.suspicious_events);
    }
}

/// Add only what has not been added yet. A total lower than or equal to the
/// last added value means nothing new to report (the collaborator may have
/// restarted and reset its own totals); exported counters never decrease.
fn bump_counter(counter: &IntCounter, last_added: &mut u64, current_total: u64) {
    if current_total > *last_added {
        counter.inc_by(current_total - *last_added);
        *last_added = current_total;
    }
}

/// Clear every previously exported label combination for the bucket, then
/// re-emit one series per current resident, valued at its processed
/// timestamp. Removed events drop off the surface on the next scrape.
fn rebuild_bucket(vec: &GaugeVec, events: &[EnrichedWithdrawalEvent]) {
    vec.reset();
    for event in events {
        let labels = EventLabels::from_event(event);
        vec.with_label_values(&labels.values())
            .set(event.processed_timestamp.unwrap_or_default() as f64);
    }
}
