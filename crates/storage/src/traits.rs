use alloy_primitives::ChainId;
use async_trait::async_trait;
use mark_rebalance_types::{
    AuditLogEntry, Earmark, EarmarkStatus, OperationStatus, PauseKey, RebalanceOperation, TransactionReceipt,
};
use std::fmt::Debug;
use uuid::Uuid;

use crate::error::StorageError;
use crate::pagination::{EarmarkFilter, OperationFilter, Pagination};

/// Read access to durable earmarks.
///
/// Implementations are expected to be thread-safe and cheap to clone (a pooled connection
/// handle, not a single connection).
#[async_trait]
#[auto_impl::auto_impl(&, &mut, Arc, Box)]
pub trait EarmarkStoreReader: Debug + Send + Sync {
    /// Looks up a single earmark by its primary key.
    async fn get_earmark(&self, id: Uuid) -> Result<Earmark, StorageError>;

    /// Looks up a single earmark by its unique invoice id.
    async fn get_earmark_by_invoice_id(&self, invoice_id: &str) -> Result<Option<Earmark>, StorageError>;

    /// Lists earmarks matching `filter`, newest first, bounded by `pagination`.
    async fn list_earmarks(
        &self,
        filter: &EarmarkFilter,
        pagination: Pagination,
    ) -> Result<Vec<Earmark>, StorageError>;

    /// Lists earmarks in `{PENDING, READY}` whose `updated_at` is older than `older_than`,
    /// for the recovery/expiry sweeper.
    async fn list_expirable_earmarks(
        &self,
        older_than: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Earmark>, StorageError>;
}

/// Write access to durable earmarks.
///
/// Every mutating method appends an audit row in the same transaction as the row it touches.
#[async_trait]
#[auto_impl::auto_impl(&, &mut, Arc, Box)]
pub trait EarmarkStoreWriter: Debug + Send + Sync {
    /// Creates a new earmark in `PENDING`. Fails with [`StorageError::DuplicateInvoiceId`] if
    /// `invoice_id` is already in use; no partial rows are left on failure.
    async fn create_earmark(
        &self,
        invoice_id: String,
        designated_purchase_chain: ChainId,
        ticker_hash: mark_rebalance_types::TickerHash,
        min_amount: String,
    ) -> Result<Earmark, StorageError>;

    /// Transitions an earmark's status, validating the edge against
    /// [`EarmarkStatus::validate_transition`] and appending one audit row, all in one
    /// transaction.
    async fn transition_earmark_status(
        &self,
        id: Uuid,
        next: EarmarkStatus,
        reason: &str,
    ) -> Result<Earmark, StorageError>;

    /// Deletes an earmark and every child operation in one transaction, appending a single
    /// audit row describing the deletion.
    async fn delete_earmark_cascade(&self, id: Uuid, reason: &str) -> Result<(), StorageError>;
}

/// Read access to durable rebalance operations.
#[async_trait]
#[auto_impl::auto_impl(&, &mut, Arc, Box)]
pub trait OperationStoreReader: Debug + Send + Sync {
    /// Looks up a single operation by its primary key.
    async fn get_operation(&self, id: Uuid) -> Result<RebalanceOperation, StorageError>;

    /// Lists operations matching `filter`, newest first, bounded by `pagination`.
    async fn list_operations(
        &self,
        filter: &OperationFilter,
        pagination: Pagination,
    ) -> Result<Vec<RebalanceOperation>, StorageError>;

    /// Lists operations in `{PENDING, AWAITING_CALLBACK}`, for the callback engine to drive on
    /// this tick.
    async fn list_active_operations(&self) -> Result<Vec<RebalanceOperation>, StorageError>;

    /// Lists standalone (no `earmark_id`) non-terminal operations older than `older_than`, for
    /// the recovery/expiry sweeper.
    async fn list_expirable_standalone_operations(
        &self,
        older_than: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<RebalanceOperation>, StorageError>;

    /// Lists every operation linked to `earmark_id`, for the earmark-promotion check.
    async fn list_operations_for_earmark(&self, earmark_id: Uuid) -> Result<Vec<RebalanceOperation>, StorageError>;
}

/// Write access to durable rebalance operations.
#[async_trait]
#[auto_impl::auto_impl(&, &mut, Arc, Box)]
pub trait OperationStoreWriter: Debug + Send + Sync {
    /// Inserts a new operation row in `PENDING`, carrying the receipts already observed from the
    /// adapter's `send` call.
    #[allow(clippy::too_many_arguments)]
    async fn create_operation(
        &self,
        earmark_id: Option<Uuid>,
        origin_chain_id: ChainId,
        destination_chain_id: ChainId,
        ticker_hash: mark_rebalance_types::TickerHash,
        amount: mark_rebalance_types::CanonicalAmount,
        slippage_bps: u32,
        bridge: mark_rebalance_types::BridgeName,
        recipient: alloy_primitives::Address,
        transactions: std::collections::HashMap<ChainId, TransactionReceipt>,
    ) -> Result<RebalanceOperation, StorageError>;

    /// Transitions an operation's status, validating the edge against
    /// [`OperationStatus::validate_transition`], optionally appending a new receipt, and writing
    /// one audit row — all in one transaction.
    ///
    /// When `next` is [`OperationStatus::Completed`] and the operation has an `earmark_id`, the
    /// implementation additionally checks, in the same transaction, whether every sibling
    /// operation has reached a terminal status; if so the earmark is promoted
    /// `PENDING -> READY`.
    async fn transition_operation_status(
        &self,
        id: Uuid,
        next: OperationStatus,
        reason: &str,
        new_receipt: Option<(ChainId, TransactionReceipt)>,
    ) -> Result<RebalanceOperation, StorageError>;

    /// Marks every non-terminal operation linked to `earmark_id` as orphaned. Does not touch
    /// `status`.
    async fn mark_operations_orphaned(&self, earmark_id: Uuid) -> Result<u64, StorageError>;
}

/// The three fixed pause switches the orchestrator consults at the top of each tick.
#[async_trait]
#[auto_impl::auto_impl(&, &mut, Arc, Box)]
pub trait PauseRegistry: Debug + Send + Sync {
    /// Returns whether `key` is currently paused.
    async fn is_paused(&self, key: PauseKey) -> Result<bool, StorageError>;

    /// Sets `key`'s paused flag, returning the value it held immediately before the write.
    /// Setting a key to the value it already holds is a no-op write (idempotent).
    async fn set_paused(&self, key: PauseKey, paused: bool) -> Result<bool, StorageError>;
}

/// Read access to the append-only audit trail.
#[async_trait]
#[auto_impl::auto_impl(&, &mut, Arc, Box)]
pub trait AuditLogReader: Debug + Send + Sync {
    /// Lists audit rows for one entity (earmark or operation id), newest first.
    async fn list_for_entity(&self, entity_id: Uuid, pagination: Pagination) -> Result<Vec<AuditLogEntry>, StorageError>;
}
