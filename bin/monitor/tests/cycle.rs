//! End-to-end snapshot cycle: classification calls on the shared store
//! handle, one `Monitor::cycle`, and the exporter text a scraper would see.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use event::{DisputeGame, EnrichedWithdrawalEvent, GameStatus, WithdrawalEvent};
use monitor::{metrics::Metrics, server, Monitor};
use prometheus::Registry;
use state::ClassificationStore;
use std::sync::Arc;
use std::time::Duration;
use validator::{ConnectionStats, ValidatorApi};

struct FixedValidator {
    l1: u64,
    l2: u64,
    stats: ConnectionStats,
}

#[async_trait]
impl ValidatorApi for FixedValidator {
    async fn l1_block_number(&self) -> eyre::Result<u64> {
        Ok(self.l1)
    }

    async fn l2_block_number(&self) -> eyre::Result<u64> {
        Ok(self.l2)
    }

    fn connection_stats(&self) -> ConnectionStats {
        self.stats
    }
}

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
        processed_timestamp: Some(1_700_000_000),
    }
}

#[tokio::test]
async fn cycle_publishes_store_state_to_the_registry() {
    let validator = Arc::new(FixedValidator {
        l1: 40,
        l2: 500,
        stats: ConnectionStats {
            connections: 7,
            failures: 2,
        },
    });

    let store = Arc::new(ClassificationStore::new(validator.as_ref()).await.unwrap());
    store.update_heights(40, 100, 500);

    let registry = Registry::new();
    let metrics = Metrics::new(&registry).unwrap();
    let mut monitor = Monitor::new(
        Arc::clone(&store),
        metrics,
        validator,
        Duration::from_secs(30),
    );

    // The validator side records through the shared handle.
    let handle = monitor.store();
    handle.record_confirmed_attack(sample_event(1, GameStatus::DefenderWins));
    handle.record_in_progress_attack(sample_event(2, GameStatus::InProgress));

    monitor.cycle();

    let text = server::gather_text(&registry);
    assert!(text.contains("faultproof_withdrawals_up 1"));
    assert!(text.contains("faultproof_withdrawals_latest_l1_height 100"));
    assert!(text.contains("faultproof_withdrawals_sync_percent 40"));
    assert!(text.contains("faultproof_withdrawals_confirmed_attacks_count 1"));
    assert!(text.contains("faultproof_withdrawals_in_progress_attacks_count 1"));
    assert!(text.contains("faultproof_withdrawals_node_connections_total 7"));
    assert!(text.contains("faultproof_withdrawals_node_connection_failures_total 2"));
    assert!(text.contains("faultproof_withdrawals_events_processed_total 2"));
    // Only the confirmed attack reached a terminal classification.
    assert!(text.contains("faultproof_withdrawals_withdrawals_processed_total 1"));
    // Both events are exported with their full label sets.
    assert!(text.contains(&B256::repeat_byte(1).to_string()));
    assert!(text.contains(&B256::repeat_byte(2).to_string()));
}
