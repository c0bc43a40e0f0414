//! Metrics-translation tests: delta-derived counters and per-bucket label
//! rotation, asserted through the registry the exporter scrapes.

use alloy_primitives::{Address, B256, U256};
use event::{DisputeGame, EnrichedWithdrawalEvent, GameStatus, WithdrawalEvent};
use monitor::metrics::Metrics;
use prometheus::proto::MetricFamily;
use prometheus::Registry;
use state::{ClassificationStore, StoreSnapshot};
use validator::ConnectionStats;

fn sample_event(seed: u8, status: GameStatus) -> EnrichedWithdrawalEvent {
    EnrichedWithdrawalEvent {
        event: WithdrawalEvent {
            withdrawal_hash: B256::repeat_byte(seed),
            proof_submitter: Address::repeat_byte(seed),
            tx_hash: B256::repeat_byte(seed),
            block_number: 1_000 + u64::from(seed),
        },
        dispute_game: DisputeGame {
            proxy_address: Address::repeat_byte(seed),
            root_claim: B256::repeat_byte(seed),
            l2_block_number: U256::from(seed),
            status,
        },
        blacklisted: false,
        withdrawal_present_on_l2: true,
        enriched: true,
        processed_timestamp: Some(1_700_000_000 + u64::from(seed)),
    }
}

fn empty_snapshot() -> StoreSnapshot {
    ClassificationStore::from_heights(40, 100, 500)
        .unwrap()
        .snapshot()
}

fn family<'a>(families: &'a [MetricFamily], name: &str) -> &'a MetricFamily {
    families
        .iter()
        .find(|f| f.get_name() == name)
        .unwrap_or_else(|| panic!("metric family {name} not found"))
}

fn counter_value(families: &[MetricFamily], name: &str) -> u64 {
    family(families, name).get_metric()[0]
        .get_counter()
        .get_value() as u64
}

fn gauge_value(families: &[MetricFamily], name: &str) -> i64 {
    family(families, name).get_metric()[0]
        .get_gauge()
        .get_value() as i64
}

/// Label values of every series currently exported under a vec family.
fn label_sets(families: &[MetricFamily], name: &str, label: &str) -> Vec<String> {
    family(families, name)
        .get_metric()
        .iter()
        .map(|m| {
            m.get_label()
                .iter()
                .find(|l| l.get_name() == label)
                .expect("label present")
                .get_value()
                .to_string()
        })
        .collect()
}

#[test]
fn gauges_reflect_snapshot_values() {
    let registry = Registry::new();
    let mut metrics = Metrics::new(&registry).unwrap();

    let store = ClassificationStore::from_heights(40, 100, 500).unwrap();
    store.record_validated(sample_event(1, GameStatus::DefenderWins));
    store.record_confirmed_attack(sample_event(2, GameStatus::DefenderWins));
    store.record_in_progress_attack(sample_event(3, GameStatus::InProgress));
    store.record_suspicious(sample_event(4, GameStatus::ChallengerWins));

    metrics.update(&store.snapshot(), ConnectionStats::default());

    let families = registry.gather();
    assert_eq!(gauge_value(&families, "faultproof_withdrawals_up"), 1);
    assert_eq!(
        gauge_value(&families, "faultproof_withdrawals_initial_l1_height"),
        40
    );
    assert_eq!(
        gauge_value(&families, "faultproof_withdrawals_next_l1_height"),
        40
    );
    assert_eq!(
        gauge_value(&families, "faultproof_withdrawals_latest_l1_height"),
        100
    );
    assert_eq!(
        gauge_value(&families, "faultproof_withdrawals_latest_l2_height"),
        500
    );
    assert_eq!(
        gauge_value(&families, "faultproof_withdrawals_sync_percent"),
        40
    );
    assert_eq!(
        gauge_value(&families, "faultproof_withdrawals_confirmed_attacks_count"),
        1
    );
    assert_eq!(
        gauge_value(
            &families,
            "faultproof_withdrawals_in_progress_attacks_count"
        ),
        1
    );
    assert_eq!(
        gauge_value(&families, "faultproof_withdrawals_suspicious_events_count"),
        1
    );
    assert_eq!(
        counter_value(&families, "faultproof_withdrawals_events_processed_total"),
        4
    );
    assert_eq!(
        counter_value(
            &families,
            "faultproof_withdrawals_withdrawals_processed_total"
        ),
        3
    );
}

#[test]
fn counters_grow_by_positive_deltas_only() {
    let registry = Registry::new();
    let mut metrics = Metrics::new(&registry).unwrap();

    // Successive totals reported by the collaborator; the exported counter
    // must receive additions 10, 0, 15, 0.
    let totals = [10u64, 10, 25, 20];
    let expected = [10u64, 10, 25, 25];

    for (total, want) in totals.into_iter().zip(expected) {
        let snapshot = empty_snapshot();
        metrics.update(
            &snapshot,
            ConnectionStats {
                connections: total,
                failures: total,
            },
        );

        let families = registry.gather();
        assert_eq!(
            counter_value(&families, "faultproof_withdrawals_node_connections_total"),
            want
        );
        assert_eq!(
            counter_value(
                &families,
                "faultproof_withdrawals_node_connection_failures_total"
            ),
            want
        );
    }
}

#[test]
fn counter_resumes_after_source_reset_recovers() {
    let registry = Registry::new();
    let mut metrics = Metrics::new(&registry).unwrap();

    for total in [25u64, 20, 30] {
        metrics.update(
            &empty_snapshot(),
            ConnectionStats {
                connections: total,
                failures: 0,
            },
        );
    }

    // 25 added, the dip to 20 ignored, then only the 5 beyond the last
    // added total once the source passes it again.
    let families = registry.gather();
    assert_eq!(
        counter_value(&families, "faultproof_withdrawals_node_connections_total"),
        30
    );
}

#[test]
fn promotion_rotates_label_sets_out_of_the_in_progress_bucket() {
    let registry = Registry::new();
    let mut metrics = Metrics::new(&registry).unwrap();

    let store = ClassificationStore::from_heights(40, 100, 500).unwrap();
    store.record_in_progress_attack(sample_event(1, GameStatus::InProgress));
    store.record_in_progress_attack(sample_event(2, GameStatus::InProgress));
    metrics.update(&store.snapshot(), ConnectionStats::default());

    let in_progress = "faultproof_withdrawals_in_progress_attack_events";
    let confirmed = "faultproof_withdrawals_confirmed_attack_events";
    let tx_1 = B256::repeat_byte(1).to_string();
    let tx_2 = B256::repeat_byte(2).to_string();

    let families = registry.gather();
    let series = label_sets(&families, in_progress, "event_tx_hash");
    assert_eq!(series.len(), 2);
    assert!(series.contains(&tx_1));

    // Promote event 1; the next cycle must drop its in-progress series.
    store.record_confirmed_attack(sample_event(1, GameStatus::DefenderWins));
    metrics.update(&store.snapshot(), ConnectionStats::default());

    let families = registry.gather();
    let series = label_sets(&families, in_progress, "event_tx_hash");
    assert_eq!(series, vec![tx_2]);
    let series = label_sets(&families, confirmed, "event_tx_hash");
    assert_eq!(series, vec![tx_1]);
}

#[test]
fn label_series_value_is_the_processed_timestamp() {
    let registry = Registry::new();
    let mut metrics = Metrics::new(&registry).unwrap();

    let store = ClassificationStore::from_heights(40, 100, 500).unwrap();
    let mut event = sample_event(7, GameStatus::DefenderWins);
    event.processed_timestamp = Some(1_700_000_123);
    store.record_confirmed_attack(event);
    metrics.update(&store.snapshot(), ConnectionStats::default());

    let families = registry.gather();
    let fam = family(&families, "faultproof_withdrawals_confirmed_attack_events");
    assert_eq!(fam.get_metric().len(), 1);
    let metric = &fam.get_metric()[0];
    assert_eq!(metric.get_gauge().get_value(), 1_700_000_123.0);
    assert_eq!(metric.get_label().len(), 13);
}
