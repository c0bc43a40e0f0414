use crate::{ConnectionStats, ConnectionTally, ValidatorApi};
use alloy_provider::{Provider, ProviderBuilder};
use async_trait::async_trait;
use thiserror::Error;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::warn;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),
}

/// Convenience function to create an ethereum rpc provider from url.
pub fn create_provider(rpc_url: &str) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider)
}

/// Height and connection accounting over a pair of chain RPC providers.
///
/// Every RPC round trip is tallied per network side, success or failure,
/// so the exported connection counters reflect real attempt totals.
pub struct NodeClient<P1, P2> {
    l1_provider: P1,
    l2_provider: P2,
    l1_tally: ConnectionTally,
    l2_tally: ConnectionTally,
}

impl<P1, P2> NodeClient<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    pub const fn new(l1_provider: P1, l2_provider: P2) -> Self {
        Self {
            l1_provider,
            l2_provider,
            l1_tally: ConnectionTally::new(),
            l2_tally: ConnectionTally::new(),
        }
    }

    /// Query a block number with retry and exponential backoff.
    async fn block_number_with_retry<P>(
        provider: &P,
        tally: &ConnectionTally,
        chain: &'static str,
    ) -> eyre::Result<u64>
    where
        P: Provider + Clone,
    {
        // Exponential backoff: 100ms, 200ms, 400ms, 800ms, 1.6s (max 5 attempts)
        let retry_strategy = ExponentialBackoff::from_millis(100).take(5);

        Retry::spawn(retry_strategy, || async {
            match provider.get_block_number().await {
                Ok(height) => {
                    tally.record_success();
                    Ok(height)
                }
                Err(e) => {
                    tally.record_failure();
                    warn!(chain, error = %e, "Block number query failed, will retry");
                    Err(eyre::Report::from(e))
                }
            }
        })
        .await
    }
}

#[async_trait]
impl<P1, P2> ValidatorApi for NodeClient<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    async fn l1_block_number(&self) -> eyre::Result<u64> {
        Self::block_number_with_retry(&self.l1_provider, &self.l1_tally, "l1").await
    }

    async fn l2_block_number(&self) -> eyre::Result<u64> {
        Self::block_number_with_retry(&self.l2_provider, &self.l2_tally, "l2").await
    }

    fn connection_stats(&self) -> ConnectionStats {
        self.l1_tally.stats().merged(self.l2_tally.stats())
    }
}
