use crate::bridge::{AdapterRoute, BridgeRegistry, ChainService, DestinationCall};
use crate::config::ChainRegistry;
use futures::stream::{self, StreamExt};
use mark_rebalance_storage::{OperationStoreReader, OperationStoreWriter};
use mark_rebalance_types::{OperationStatus, RebalanceOperation};
use tracing::{error, info, warn};

/// Upper bound on callback steps driven concurrently in one pass. Operations are independent
/// of each other, but each step makes several adapter/chain-service round trips, so fan-out is
/// bounded rather than unbounded to avoid overwhelming adapter connection pools.
const MAX_CONCURRENT_CALLBACKS: usize = 8;

/// Outcome of driving one operation through a single callback-engine pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStep {
    /// `readyOnDestination` returned false; nothing changed.
    NotReady,
    /// Promoted `PENDING -> AWAITING_CALLBACK`.
    PromotedToAwaitingCallback,
    /// Promoted to `COMPLETED`.
    Completed,
    /// The follow-up transaction failed; treated as transient, so the operation stays in
    /// `AWAITING_CALLBACK` for the next tick rather than moving to `FAILED`.
    CallbackSubmissionFailed,
}

/// Drives every operation in `{PENDING, AWAITING_CALLBACK}` one step through its destination
/// finalization, then promotes any newly-READY earmark.
#[derive(Debug)]
pub struct CallbackEngine<'a, S> {
    store: &'a S,
    bridges: &'a BridgeRegistry,
    chain_service: &'a dyn ChainService,
    chain_registry: &'a ChainRegistry,
}

impl<'a, S> CallbackEngine<'a, S>
where
    S: OperationStoreReader + OperationStoreWriter + Send + Sync,
{
    pub const fn new(
        store: &'a S,
        bridges: &'a BridgeRegistry,
        chain_service: &'a dyn ChainService,
        chain_registry: &'a ChainRegistry,
    ) -> Self {
        Self { store, bridges, chain_service, chain_registry }
    }

    /// Runs one pass over every active operation. Returns the number of operations that
    /// advanced to `COMPLETED` this pass, for the tick report.
    ///
    /// Operations are independent, so steps are fanned out concurrently (bounded by
    /// [`MAX_CONCURRENT_CALLBACKS`]) rather than driven one at a time.
    pub async fn run(&self) -> Result<usize, mark_rebalance_storage::StorageError> {
        let operations = self.store.list_active_operations().await?;

        let completed = stream::iter(operations)
            .map(|operation| async move {
                match self.drive_one(&operation).await {
                    Ok(CallbackStep::Completed) => {
                        self.promote_earmark_if_ready(&operation).await;
                        true
                    }
                    Ok(_) => false,
                    Err(err) => {
                        error!(
                            target: "mark::callback_engine",
                            operation_id = %operation.id,
                            %err,
                            "callback engine step failed, retrying next tick"
                        );
                        false
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_CALLBACKS)
            .filter(|completed| futures::future::ready(*completed))
            .count()
            .await;

        Ok(completed)
    }

    async fn drive_one(&self, operation: &RebalanceOperation) -> Result<CallbackStep, mark_rebalance_storage::StorageError> {
        // Replaying against an already-terminal operation must be a no-op: no adapter call,
        // no store write. `list_active_operations` already excludes terminal rows, but this
        // guard keeps the property true even if a caller passes a stale operation directly.
        if operation.status.is_terminal() {
            return Ok(CallbackStep::NotReady);
        }

        let adapter = match self.bridges.get(&operation.bridge) {
            Ok(adapter) => adapter,
            Err(err) => {
                warn!(target: "mark::callback_engine", operation_id = %operation.id, %err, "adapter unavailable");
                return Ok(CallbackStep::NotReady);
            }
        };

        let Some(origin_receipt) = operation.transactions.get(&operation.origin_chain_id) else {
            warn!(
                target: "mark::callback_engine",
                operation_id = %operation.id,
                "no origin receipt recorded yet, cannot poll readiness"
            );
            return Ok(CallbackStep::NotReady);
        };

        let Some(asset) = self.chain_registry.asset(operation.origin_chain_id, operation.ticker_hash) else {
            warn!(
                target: "mark::callback_engine",
                operation_id = %operation.id,
                "origin asset no longer in the chain registry, cannot poll readiness"
            );
            return Ok(CallbackStep::NotReady);
        };

        let route =
            AdapterRoute { origin: operation.origin_chain_id, destination: operation.destination_chain_id, asset: asset.address };

        let ready = match adapter.ready_on_destination(operation.amount.raw(), route, origin_receipt).await {
            Ok(ready) => ready,
            Err(err) => {
                warn!(target: "mark::callback_engine", operation_id = %operation.id, %err, "readyOnDestination call failed, treating as not ready");
                false
            }
        };

        if !ready {
            return Ok(CallbackStep::NotReady);
        }

        if operation.status == OperationStatus::Pending {
            self.store
                .transition_operation_status(
                    operation.id,
                    OperationStatus::AwaitingCallback,
                    "readyOnDestination returned true",
                    None,
                )
                .await?;
        }

        match adapter.destination_callback(route, origin_receipt).await {
            Ok(None) => {
                self.store
                    .transition_operation_status(operation.id, OperationStatus::Completed, "destinationCallback returned none", None)
                    .await?;
                Ok(CallbackStep::Completed)
            }
            Ok(Some(DestinationCall { chain_id, calldata })) => {
                match self.chain_service.submit_and_monitor(chain_id, operation.recipient, operation.recipient, calldata, alloy_primitives::U256::ZERO).await {
                    Ok(receipt) if receipt.status => {
                        self.store
                            .transition_operation_status(
                                operation.id,
                                OperationStatus::Completed,
                                "destinationCallback follow-up transaction succeeded",
                                Some((chain_id, receipt)),
                            )
                            .await?;
                        Ok(CallbackStep::Completed)
                    }
                    Ok(_) | Err(_) => {
                        info!(
                            target: "mark::callback_engine",
                            operation_id = %operation.id,
                            "destination follow-up transaction failed, leaving operation awaiting callback"
                        );
                        Ok(CallbackStep::CallbackSubmissionFailed)
                    }
                }
            }
            Err(err @ crate::bridge::BridgeError::PermanentCallbackFailure { .. }) => {
                self.store
                    .transition_operation_status(operation.id, OperationStatus::Failed, &err.to_string(), None)
                    .await?;
                Ok(CallbackStep::NotReady)
            }
            Err(err) => {
                warn!(target: "mark::callback_engine", operation_id = %operation.id, %err, "destinationCallback failed, retrying next tick");
                Ok(CallbackStep::NotReady)
            }
        }
    }

    async fn promote_earmark_if_ready(&self, operation: &RebalanceOperation) {
        // The store's `transition_operation_status` already performs the sibling-terminal
        // check and earmark promotion atomically with the COMPLETED write; this is logging
        // only, kept here so the tick report can attribute a promotion to the operation that
        // triggered it without a second round trip.
        if operation.earmark_id.is_some() {
            info!(
                target: "mark::callback_engine",
                operation_id = %operation.id,
                earmark_id = ?operation.earmark_id,
                "operation completed, earmark promotion (if eligible) applied by the store"
            );
        }
    }
}
