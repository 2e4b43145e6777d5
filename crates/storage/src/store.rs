//! Postgres-backed implementation of the earmark/operation/audit/pause traits.

use alloy_primitives::{Address, ChainId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mark_rebalance_metrics::observe_metrics_for_result_async;
use mark_rebalance_types::{
    AuditAction, AuditLogEntry, BridgeName, CanonicalAmount, Earmark, EarmarkStatus, OperationStatus, PauseKey,
    RebalanceOperation, TickerHash, TransactionReceipt,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::error::StorageError;
use crate::metrics::Metrics;
use crate::models::{AuditLogRow, EarmarkRow, OperationRow, PauseRow};
use crate::models::operation_row::encode_transactions;
use crate::models::audit_row::action_column;
use crate::pagination::{EarmarkFilter, EarmarkLinkage, OperationFilter, Pagination};
use crate::traits::{AuditLogReader, EarmarkStoreReader, EarmarkStoreWriter, OperationStoreReader, OperationStoreWriter, PauseRegistry};

/// Owns a connection pool to the operation store's Postgres database.
///
/// Cloning is cheap: `sqlx::PgPool` is itself a handle around a connection pool.
#[derive(Debug, Clone)]
pub struct OperationDb {
    pool: PgPool,
    metrics_enabled: bool,
}

impl OperationDb {
    /// Connects to `database_url` and runs the embedded migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool, metrics_enabled: false })
    }

    /// Wraps an already-connected pool (e.g. one shared with another component, or a pool
    /// pointed at a throwaway test database).
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool, metrics_enabled: false }
    }

    /// Enables per-method success/error/duration metrics.
    pub fn with_metrics(mut self) -> Self {
        self.metrics_enabled = true;
        Metrics::describe();
        self
    }

    async fn observe<T, E, F>(&self, name: &'static str, fut: F) -> Result<T, E>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        if self.metrics_enabled {
            observe_metrics_for_result_async!(
                Metrics::STORAGE_REQUESTS_SUCCESS_TOTAL,
                Metrics::STORAGE_REQUESTS_ERROR_TOTAL,
                Metrics::STORAGE_REQUEST_DURATION_SECONDS,
                name,
                fut
            )
        } else {
            fut.await
        }
    }
}

async fn append_audit(
    tx: &mut Transaction<'_, Postgres>,
    entity_id: Uuid,
    action: AuditAction,
    prior_status: &str,
    reason: &str,
) -> Result<(), StorageError> {
    sqlx::query("INSERT INTO earmark_audit_log (id, entity_id, action, prior_status, reason) VALUES ($1, $2, $3, $4, $5)")
        .bind(Uuid::new_v4())
        .bind(entity_id)
        .bind(action_column(action))
        .bind(prior_status)
        .bind(reason)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl EarmarkStoreReader for OperationDb {
    async fn get_earmark(&self, id: Uuid) -> Result<Earmark, StorageError> {
        self.observe("get_earmark", async {
            let row: EarmarkRow = sqlx::query_as("SELECT * FROM earmarks WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StorageError::NotFound(id))?;
            row.into_domain()
        })
        .await
    }

    async fn get_earmark_by_invoice_id(&self, invoice_id: &str) -> Result<Option<Earmark>, StorageError> {
        self.observe("get_earmark_by_invoice_id", async {
            let row: Option<EarmarkRow> = sqlx::query_as("SELECT * FROM earmarks WHERE invoice_id = $1")
                .bind(invoice_id)
                .fetch_optional(&self.pool)
                .await?;
            row.map(EarmarkRow::into_domain).transpose()
        })
        .await
    }

    async fn list_earmarks(&self, filter: &EarmarkFilter, pagination: Pagination) -> Result<Vec<Earmark>, StorageError> {
        self.observe("list_earmarks", async {
            let rows: Vec<EarmarkRow> = match &filter.status {
                Some(status) => {
                    sqlx::query_as(
                        "SELECT * FROM earmarks WHERE status = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                    )
                    .bind(status.to_string())
                    .bind(pagination.limit)
                    .bind(pagination.offset)
                    .fetch_all(&self.pool)
                    .await?
                }
                None => {
                    sqlx::query_as("SELECT * FROM earmarks ORDER BY created_at DESC LIMIT $1 OFFSET $2")
                        .bind(pagination.limit)
                        .bind(pagination.offset)
                        .fetch_all(&self.pool)
                        .await?
                }
            };
            rows.into_iter().map(EarmarkRow::into_domain).collect()
        })
        .await
    }

    async fn list_expirable_earmarks(&self, older_than: DateTime<Utc>) -> Result<Vec<Earmark>, StorageError> {
        self.observe("list_expirable_earmarks", async {
            let rows: Vec<EarmarkRow> = sqlx::query_as(
                "SELECT * FROM earmarks WHERE status IN ('PENDING', 'READY') AND updated_at < $1",
            )
            .bind(older_than)
            .fetch_all(&self.pool)
            .await?;
            rows.into_iter().map(EarmarkRow::into_domain).collect()
        })
        .await
    }
}

#[async_trait]
impl EarmarkStoreWriter for OperationDb {
    async fn create_earmark(
        &self,
        invoice_id: String,
        designated_purchase_chain: ChainId,
        ticker_hash: TickerHash,
        min_amount: String,
    ) -> Result<Earmark, StorageError> {
        self.observe("create_earmark", async {
            let id = Uuid::new_v4();
            let row: EarmarkRow = sqlx::query_as(
                r"
                INSERT INTO earmarks (id, invoice_id, designated_purchase_chain, ticker_hash, min_amount, status)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                ",
            )
            .bind(id)
            .bind(&invoice_id)
            .bind(designated_purchase_chain as i64)
            .bind(ticker_hash.as_b256().as_slice())
            .bind(&min_amount)
            .bind(EarmarkStatus::Pending.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    StorageError::DuplicateInvoiceId(invoice_id.clone())
                }
                _ => StorageError::Database(err),
            })?;
            row.into_domain()
        })
        .await
    }

    async fn transition_earmark_status(&self, id: Uuid, next: EarmarkStatus, reason: &str) -> Result<Earmark, StorageError> {
        self.observe("transition_earmark_status", async {
            let mut tx = self.pool.begin().await?;
            let current: EarmarkRow = sqlx::query_as("SELECT * FROM earmarks WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StorageError::NotFound(id))?;
            let current_status = current.status.parse::<EarmarkStatus>().map_err(StorageError::InvalidStatus)?;
            current_status.validate_transition(next).map_err(|_| StorageError::IllegalTransition {
                entity_id: id,
                from: current_status.to_string(),
                to: next.to_string(),
            })?;

            let updated: EarmarkRow =
                sqlx::query_as("UPDATE earmarks SET status = $1, updated_at = now() WHERE id = $2 RETURNING *")
                    .bind(next.to_string())
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            append_audit(&mut tx, id, AuditAction::EarmarkStatusChanged, &current.status, reason).await?;
            tx.commit().await?;
            updated.into_domain()
        })
        .await
    }

    async fn delete_earmark_cascade(&self, id: Uuid, reason: &str) -> Result<(), StorageError> {
        self.observe("delete_earmark_cascade", async {
            let mut tx = self.pool.begin().await?;
            let existing: EarmarkRow = sqlx::query_as("SELECT * FROM earmarks WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StorageError::NotFound(id))?;
            sqlx::query("DELETE FROM rebalance_operations WHERE earmark_id = $1").bind(id).execute(&mut *tx).await?;
            sqlx::query("DELETE FROM earmarks WHERE id = $1").bind(id).execute(&mut *tx).await?;
            append_audit(&mut tx, id, AuditAction::EarmarkStatusChanged, &existing.status, reason).await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl OperationStoreReader for OperationDb {
    async fn get_operation(&self, id: Uuid) -> Result<RebalanceOperation, StorageError> {
        self.observe("get_operation", async {
            let row: OperationRow = sqlx::query_as("SELECT * FROM rebalance_operations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StorageError::NotFound(id))?;
            row.into_domain()
        })
        .await
    }

    async fn list_operations(
        &self,
        filter: &OperationFilter,
        pagination: Pagination,
    ) -> Result<Vec<RebalanceOperation>, StorageError> {
        self.observe("list_operations", async {
            let status = filter.status.map(|s| s.to_string());
            let chain_id = filter.chain_id.map(|c| c as i64);
            let (earmark_is_null, earmark_id): (Option<bool>, Option<Uuid>) = match filter.earmark {
                EarmarkLinkage::Any => (None, None),
                EarmarkLinkage::Standalone => (Some(true), None),
                EarmarkLinkage::LinkedTo(id) => (Some(false), Some(id)),
            };

            let rows: Vec<OperationRow> = sqlx::query_as(
                r"
                SELECT * FROM rebalance_operations
                WHERE ($1::text IS NULL OR status = $1)
                  AND ($2::bigint IS NULL OR origin_chain_id = $2 OR destination_chain_id = $2)
                  AND ($3::bool IS NULL OR (earmark_id IS NULL) = $3)
                  AND ($4::uuid IS NULL OR earmark_id = $4)
                ORDER BY created_at DESC
                LIMIT $5 OFFSET $6
                ",
            )
            .bind(status)
            .bind(chain_id)
            .bind(earmark_is_null)
            .bind(earmark_id)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;
            rows.into_iter().map(OperationRow::into_domain).collect()
        })
        .await
    }

    async fn list_active_operations(&self) -> Result<Vec<RebalanceOperation>, StorageError> {
        self.observe("list_active_operations", async {
            let rows: Vec<OperationRow> =
                sqlx::query_as("SELECT * FROM rebalance_operations WHERE status IN ('PENDING', 'AWAITING_CALLBACK')")
                    .fetch_all(&self.pool)
                    .await?;
            rows.into_iter().map(OperationRow::into_domain).collect()
        })
        .await
    }

    async fn list_expirable_standalone_operations(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<RebalanceOperation>, StorageError> {
        self.observe("list_expirable_standalone_operations", async {
            let rows: Vec<OperationRow> = sqlx::query_as(
                r"
                SELECT * FROM rebalance_operations
                WHERE earmark_id IS NULL
                  AND status NOT IN ('COMPLETED', 'CANCELLED', 'EXPIRED', 'FAILED')
                  AND updated_at < $1
                ",
            )
            .bind(older_than)
            .fetch_all(&self.pool)
            .await?;
            rows.into_iter().map(OperationRow::into_domain).collect()
        })
        .await
    }

    async fn list_operations_for_earmark(&self, earmark_id: Uuid) -> Result<Vec<RebalanceOperation>, StorageError> {
        self.observe("list_operations_for_earmark", async {
            let rows: Vec<OperationRow> = sqlx::query_as("SELECT * FROM rebalance_operations WHERE earmark_id = $1")
                .bind(earmark_id)
                .fetch_all(&self.pool)
                .await?;
            rows.into_iter().map(OperationRow::into_domain).collect()
        })
        .await
    }
}

#[async_trait]
impl OperationStoreWriter for OperationDb {
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
    ) -> Result<RebalanceOperation, StorageError> {
        self.observe("create_operation", async {
            let id = Uuid::new_v4();
            let row: OperationRow = sqlx::query_as(
                r"
                INSERT INTO rebalance_operations (
                    id, earmark_id, origin_chain_id, destination_chain_id, ticker_hash, amount,
                    slippage, status, bridge, recipient, transactions
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING *
                ",
            )
            .bind(id)
            .bind(earmark_id)
            .bind(origin_chain_id as i64)
            .bind(destination_chain_id as i64)
            .bind(ticker_hash.as_b256().as_slice())
            .bind(amount.raw().to_string())
            .bind(slippage_bps as i32)
            .bind(OperationStatus::Pending.to_string())
            .bind(bridge.to_string())
            .bind(format!("{recipient:#x}"))
            .bind(encode_transactions(&transactions))
            .fetch_one(&self.pool)
            .await?;
            row.into_domain()
        })
        .await
    }

    async fn transition_operation_status(
        &self,
        id: Uuid,
        next: OperationStatus,
        reason: &str,
        new_receipt: Option<(ChainId, TransactionReceipt)>,
    ) -> Result<RebalanceOperation, StorageError> {
        self.observe("transition_operation_status", async {
            let mut tx = self.pool.begin().await?;
            let current: OperationRow = sqlx::query_as("SELECT * FROM rebalance_operations WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StorageError::NotFound(id))?;
            let current_status = current.status.parse::<OperationStatus>().map_err(StorageError::InvalidStatus)?;
            current_status.validate_transition(next).map_err(|_| StorageError::IllegalTransition {
                entity_id: id,
                from: current_status.to_string(),
                to: next.to_string(),
            })?;

            let updated: OperationRow = if let Some((chain_id, receipt)) = new_receipt {
                let mut receipts: HashMap<ChainId, TransactionReceipt> =
                    serde_json::from_value(current.transactions.clone())
                        .map(|by_string: HashMap<String, TransactionReceipt>| {
                            by_string.into_iter().filter_map(|(k, v)| k.parse().ok().map(|c| (c, v))).collect()
                        })
                        .unwrap_or_default();
                receipts.insert(chain_id, receipt);
                sqlx::query_as(
                    "UPDATE rebalance_operations SET status = $1, transactions = $2, updated_at = now() WHERE id = $3 RETURNING *",
                )
                .bind(next.to_string())
                .bind(encode_transactions(&receipts))
                .bind(id)
                .fetch_one(&mut *tx)
                .await?
            } else {
                sqlx::query_as("UPDATE rebalance_operations SET status = $1, updated_at = now() WHERE id = $2 RETURNING *")
                    .bind(next.to_string())
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?
            };

            append_audit(&mut tx, id, AuditAction::OperationStatusChanged, &current.status, reason).await?;

            if next == OperationStatus::Completed {
                if let Some(earmark_id) = current.earmark_id {
                    let siblings: Vec<OperationRow> =
                        sqlx::query_as("SELECT * FROM rebalance_operations WHERE earmark_id = $1 FOR UPDATE")
                            .bind(earmark_id)
                            .fetch_all(&mut *tx)
                            .await?;
                    let all_terminal = siblings.iter().all(|s| {
                        s.status.parse::<OperationStatus>().map(|status| status.is_terminal()).unwrap_or(false)
                    });
                    if all_terminal {
                        let earmark: Option<EarmarkRow> = sqlx::query_as(
                            "SELECT * FROM earmarks WHERE id = $1 AND status = 'PENDING' FOR UPDATE",
                        )
                        .bind(earmark_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                        if let Some(earmark) = earmark {
                            sqlx::query("UPDATE earmarks SET status = 'READY', updated_at = now() WHERE id = $1")
                                .bind(earmark_id)
                                .execute(&mut *tx)
                                .await?;
                            append_audit(
                                &mut tx,
                                earmark_id,
                                AuditAction::EarmarkStatusChanged,
                                &earmark.status,
                                "all sibling operations reached a terminal status",
                            )
                            .await?;
                        }
                    }
                }
            }

            tx.commit().await?;
            updated.into_domain()
        })
        .await
    }

    async fn mark_operations_orphaned(&self, earmark_id: Uuid) -> Result<u64, StorageError> {
        self.observe("mark_operations_orphaned", async {
            let result = sqlx::query(
                r"
                UPDATE rebalance_operations
                SET is_orphaned = true, updated_at = now()
                WHERE earmark_id = $1 AND status NOT IN ('COMPLETED', 'CANCELLED', 'EXPIRED', 'FAILED')
                ",
            )
            .bind(earmark_id)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected())
        })
        .await
    }
}

#[async_trait]
impl PauseRegistry for OperationDb {
    async fn is_paused(&self, key: PauseKey) -> Result<bool, StorageError> {
        self.observe("is_paused", async {
            let row: PauseRow = sqlx::query_as("SELECT * FROM pauses WHERE key = $1")
                .bind(key.as_str())
                .fetch_one(&self.pool)
                .await?;
            Ok(row.paused)
        })
        .await
    }

    async fn set_paused(&self, key: PauseKey, paused: bool) -> Result<bool, StorageError> {
        self.observe("set_paused", async {
            let mut tx = self.pool.begin().await?;
            let before: PauseRow = sqlx::query_as("SELECT * FROM pauses WHERE key = $1 FOR UPDATE")
                .bind(key.as_str())
                .fetch_one(&mut *tx)
                .await?;

            if before.paused == paused {
                tx.rollback().await?;
                return Ok(before.paused);
            }

            sqlx::query("UPDATE pauses SET paused = $1, updated_at = now() WHERE key = $2")
                .bind(paused)
                .bind(key.as_str())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(before.paused)
        })
        .await
    }
}

#[async_trait]
impl AuditLogReader for OperationDb {
    async fn list_for_entity(&self, entity_id: Uuid, pagination: Pagination) -> Result<Vec<AuditLogEntry>, StorageError> {
        self.observe("list_for_entity", async {
            let rows: Vec<AuditLogRow> = sqlx::query_as(
                "SELECT * FROM earmark_audit_log WHERE entity_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            )
            .bind(entity_id)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;
            rows.into_iter().map(AuditLogRow::into_domain).collect()
        })
        .await
    }
}
