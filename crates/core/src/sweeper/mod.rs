use derive_more::Constructor;
use mark_rebalance_storage::{EarmarkStoreReader, EarmarkStoreWriter, OperationStoreReader, OperationStoreWriter, StorageError};
use mark_rebalance_types::{EarmarkStatus, OperationStatus};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Outcome of one sweep, for the tick report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub earmarks_expired: u64,
    pub operations_orphaned: u64,
    pub standalone_operations_expired: u64,
}

/// Periodically expires stale earmarks and standalone operations.
///
/// Grounded on the same cancel-token-plus-interval background-job shape used elsewhere in this
/// codebase for long-running maintenance loops: a `tokio::select!` between cancellation and the
/// next sweep, with errors logged and retried on the next interval rather than aborting the
/// loop.
#[derive(Debug, Constructor)]
pub struct Sweeper<S> {
    store: S,
    cancel_token: CancellationToken,
    interval: Duration,
    ttl: Duration,
}

impl<S> Sweeper<S>
where
    S: EarmarkStoreReader + EarmarkStoreWriter + OperationStoreReader + OperationStoreWriter + Send + Sync,
{
    /// Runs one sweep pass immediately — intended to be called once at startup before the
    /// periodic loop begins, so operations orphaned by a crash are cleaned up before the first
    /// tick.
    pub async fn sweep_once(&self) -> Result<SweepReport, StorageError> {
        let older_than = chrono::Utc::now() - chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
        let mut report = SweepReport::default();

        for earmark in self.store.list_expirable_earmarks(older_than).await? {
            self.store.transition_earmark_status(earmark.id, EarmarkStatus::Expired, "earmark TTL exceeded").await?;
            let orphaned = self.store.mark_operations_orphaned(earmark.id).await?;
            report.earmarks_expired += 1;
            report.operations_orphaned += orphaned;
        }

        for operation in self.store.list_expirable_standalone_operations(older_than).await? {
            self.store
                .transition_operation_status(operation.id, OperationStatus::Expired, "standalone operation TTL exceeded", None)
                .await?;
            report.standalone_operations_expired += 1;
        }

        Ok(report)
    }

    /// Runs `sweep_once` on `interval` until cancelled.
    pub async fn run(self) {
        info!(target: "mark::sweeper", interval_secs = self.interval.as_secs(), "started recovery/expiry sweeper");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.reset_immediately();

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: "mark::sweeper", "stopped recovery/expiry sweeper");
                    break;
                }
                _ = ticker.tick() => {
                    match self.sweep_once().await {
                        Ok(report) if report == SweepReport::default() => {
                            debug!(target: "mark::sweeper", "sweep completed, nothing to expire");
                        }
                        Ok(report) => {
                            info!(
                                target: "mark::sweeper",
                                earmarks_expired = report.earmarks_expired,
                                operations_orphaned = report.operations_orphaned,
                                standalone_operations_expired = report.standalone_operations_expired,
                                "sweep completed"
                            );
                        }
                        Err(err) => {
                            error!(target: "mark::sweeper", %err, "sweep failed, retrying next interval");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, ChainId};
    use async_trait::async_trait;
    use mark_rebalance_storage::{EarmarkFilter, OperationFilter, Pagination};
    use mark_rebalance_types::{BridgeName, CanonicalAmount, Earmark, RebalanceOperation, TickerHash, TransactionReceipt};
    use mockall::mock;
    use std::collections::HashMap;
    use uuid::Uuid;

    mock! {
        #[derive(Debug)]
        pub Store {}

        #[async_trait]
        impl EarmarkStoreReader for Store {
            async fn get_earmark(&self, id: Uuid) -> Result<Earmark, StorageError>;
            async fn get_earmark_by_invoice_id(&self, invoice_id: &str) -> Result<Option<Earmark>, StorageError>;
            async fn list_earmarks(&self, filter: &EarmarkFilter, pagination: Pagination) -> Result<Vec<Earmark>, StorageError>;
            async fn list_expirable_earmarks(&self, older_than: chrono::DateTime<chrono::Utc>) -> Result<Vec<Earmark>, StorageError>;
        }

        #[async_trait]
        impl EarmarkStoreWriter for Store {
            async fn create_earmark(&self, invoice_id: String, designated_purchase_chain: ChainId, ticker_hash: TickerHash, min_amount: String) -> Result<Earmark, StorageError>;
            async fn transition_earmark_status(&self, id: Uuid, next: EarmarkStatus, reason: &str) -> Result<Earmark, StorageError>;
            async fn delete_earmark_cascade(&self, id: Uuid, reason: &str) -> Result<(), StorageError>;
        }

        #[async_trait]
        impl OperationStoreReader for Store {
            async fn get_operation(&self, id: Uuid) -> Result<RebalanceOperation, StorageError>;
            async fn list_operations(&self, filter: &OperationFilter, pagination: Pagination) -> Result<Vec<RebalanceOperation>, StorageError>;
            async fn list_active_operations(&self) -> Result<Vec<RebalanceOperation>, StorageError>;
            async fn list_expirable_standalone_operations(&self, older_than: chrono::DateTime<chrono::Utc>) -> Result<Vec<RebalanceOperation>, StorageError>;
            async fn list_operations_for_earmark(&self, earmark_id: Uuid) -> Result<Vec<RebalanceOperation>, StorageError>;
        }

        #[async_trait]
        impl OperationStoreWriter for Store {
            async fn create_operation(
                &self,
                earmark_id: Option<Uuid>,
                origin_chain_id: ChainId,
                destination_chain_id: ChainId,
                ticker_hash: TickerHash,
                amount: CanonicalAmount,
                slippage_bps: u32,
                bridge: BridgeName,
                recipient: Address,
                transactions: HashMap<ChainId, TransactionReceipt>,
            ) -> Result<RebalanceOperation, StorageError>;
            async fn transition_operation_status(
                &self,
                id: Uuid,
                next: OperationStatus,
                reason: &str,
                new_receipt: Option<(ChainId, TransactionReceipt)>,
            ) -> Result<RebalanceOperation, StorageError>;
            async fn mark_operations_orphaned(&self, earmark_id: Uuid) -> Result<u64, StorageError>;
        }
    }

    fn earmark(status: EarmarkStatus) -> Earmark {
        Earmark {
            id: Uuid::new_v4(),
            invoice_id: "inv-1".to_string(),
            designated_purchase_chain: 8453,
            ticker_hash: TickerHash::new(B256::repeat_byte(1)),
            min_amount: "1000000".to_string(),
            status,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn expires_a_stale_earmark_and_orphans_its_children() {
        let mut store = MockStore::new();
        store.expect_list_expirable_earmarks().returning(|_| Ok(vec![earmark(EarmarkStatus::Pending)]));
        store.expect_transition_earmark_status().withf(|_, next, _| *next == EarmarkStatus::Expired).returning(|id, _, _| {
            let mut e = earmark(EarmarkStatus::Expired);
            e.id = id;
            Ok(e)
        });
        store.expect_mark_operations_orphaned().returning(|_| Ok(2));
        store.expect_list_expirable_standalone_operations().returning(|_| Ok(vec![]));

        let sweeper = Sweeper::new(store, CancellationToken::new(), Duration::from_secs(60), Duration::from_secs(3600));
        let report = sweeper.sweep_once().await.unwrap();

        assert_eq!(report.earmarks_expired, 1);
        assert_eq!(report.operations_orphaned, 2);
        assert_eq!(report.standalone_operations_expired, 0);
    }

    #[tokio::test]
    async fn expires_a_stale_standalone_operation() {
        let mut store = MockStore::new();
        store.expect_list_expirable_earmarks().returning(|_| Ok(vec![]));
        store.expect_list_expirable_standalone_operations().returning(|_| {
            Ok(vec![RebalanceOperation {
                id: Uuid::new_v4(),
                earmark_id: None,
                origin_chain_id: 8453,
                destination_chain_id: 10,
                ticker_hash: TickerHash::new(B256::repeat_byte(9)),
                amount: CanonicalAmount::from_canonical(alloy_primitives::U256::from(1u64)),
                slippage_bps: 50,
                bridge: BridgeName::Across,
                recipient: Address::ZERO,
                transactions: HashMap::new(),
                status: OperationStatus::Pending,
                is_orphaned: false,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            }])
        });
        store
            .expect_transition_operation_status()
            .withf(|_, next, _, _| *next == OperationStatus::Expired)
            .returning(|id, _, _, _| {
                Ok(RebalanceOperation {
                    id,
                    earmark_id: None,
                    origin_chain_id: 8453,
                    destination_chain_id: 10,
                    ticker_hash: TickerHash::new(B256::repeat_byte(9)),
                    amount: CanonicalAmount::from_canonical(alloy_primitives::U256::from(1u64)),
                    slippage_bps: 50,
                    bridge: BridgeName::Across,
                    recipient: Address::ZERO,
                    transactions: HashMap::new(),
                    status: OperationStatus::Expired,
                    is_orphaned: false,
                    created_at: chrono::Utc::now(),
                    updated_at: chrono::Utc::now(),
                })
            });

        let sweeper = Sweeper::new(store, CancellationToken::new(), Duration::from_secs(60), Duration::from_secs(3600));
        let report = sweeper.sweep_once().await.unwrap();

        assert_eq!(report.standalone_operations_expired, 1);
    }
}
