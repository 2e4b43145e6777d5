use alloy_primitives::B256;
use chrono::{DateTime, Utc};
use mark_rebalance_types::{Earmark, EarmarkStatus, TickerHash};
use uuid::Uuid;

use crate::error::StorageError;

/// Raw shape of a row in the `earmarks` table.
#[derive(Debug, sqlx::FromRow)]
pub struct EarmarkRow {
    pub id: Uuid,
    pub invoice_id: String,
    pub designated_purchase_chain: i64,
    pub ticker_hash: Vec<u8>,
    pub min_amount: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EarmarkRow {
    pub fn into_domain(self) -> Result<Earmark, StorageError> {
        let status = self.status.parse::<EarmarkStatus>().map_err(StorageError::InvalidStatus)?;
        if self.ticker_hash.len() != 32 {
            return Err(StorageError::InvalidStatus(format!(
                "malformed ticker hash for earmark {}",
                self.id
            )));
        }
        let hash = B256::from_slice(&self.ticker_hash);
        Ok(Earmark {
            id: self.id,
            invoice_id: self.invoice_id,
            designated_purchase_chain: self.designated_purchase_chain as u64,
            ticker_hash: TickerHash::new(hash),
            min_amount: self.min_amount,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
