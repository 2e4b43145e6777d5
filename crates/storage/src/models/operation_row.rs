use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use mark_rebalance_types::{
    BridgeName, CanonicalAmount, OperationStatus, RebalanceOperation, TickerHash, TransactionReceipt,
};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StorageError;

/// Raw shape of a row in the `rebalance_operations` table.
///
/// `transactions` is stored as `jsonb` keyed by the decimal chain id, since `jsonb` object keys
/// must be strings; [`RebalanceOperation::transactions`] keys by the numeric [`ChainId`] itself.
#[derive(Debug, sqlx::FromRow)]
pub struct OperationRow {
    pub id: Uuid,
    pub earmark_id: Option<Uuid>,
    pub origin_chain_id: i64,
    pub destination_chain_id: i64,
    pub ticker_hash: Vec<u8>,
    pub amount: String,
    pub slippage: i32,
    pub status: String,
    pub bridge: String,
    pub recipient: String,
    pub transactions: serde_json::Value,
    pub is_orphaned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OperationRow {
    pub fn into_domain(self) -> Result<RebalanceOperation, StorageError> {
        let status = self.status.parse::<OperationStatus>().map_err(StorageError::InvalidStatus)?;
        if self.ticker_hash.len() != 32 {
            return Err(StorageError::InvalidStatus(format!("malformed ticker hash for operation {}", self.id)));
        }
        let ticker_hash = TickerHash::new(B256::from_slice(&self.ticker_hash));
        let amount = CanonicalAmount::from_canonical(
            U256::from_str(&self.amount)
                .map_err(|_| StorageError::InvalidStatus(format!("malformed amount for operation {}", self.id)))?,
        );
        let recipient = Address::from_str(&self.recipient)
            .map_err(|_| StorageError::InvalidStatus(format!("malformed recipient for operation {}", self.id)))?;
        let bridge = self.bridge.parse::<BridgeName>().expect("BridgeName::from_str is infallible");
        let transactions = decode_transactions(&self.transactions)
            .map_err(|_| StorageError::InvalidStatus(format!("malformed transactions for operation {}", self.id)))?;

        Ok(RebalanceOperation {
            id: self.id,
            earmark_id: self.earmark_id,
            origin_chain_id: self.origin_chain_id as u64,
            destination_chain_id: self.destination_chain_id as u64,
            ticker_hash,
            amount,
            slippage_bps: self.slippage as u32,
            bridge,
            recipient,
            transactions,
            status,
            is_orphaned: self.is_orphaned,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn decode_transactions(value: &serde_json::Value) -> Result<HashMap<u64, TransactionReceipt>, serde_json::Error> {
    let by_string: HashMap<String, TransactionReceipt> = serde_json::from_value(value.clone())?;
    Ok(by_string
        .into_iter()
        .filter_map(|(k, v)| k.parse::<u64>().ok().map(|chain_id| (chain_id, v)))
        .collect())
}

/// Encodes a receipts map into the `jsonb` shape [`decode_transactions`] reads back.
pub fn encode_transactions(transactions: &HashMap<u64, TransactionReceipt>) -> serde_json::Value {
    let by_string: HashMap<String, &TransactionReceipt> =
        transactions.iter().map(|(chain_id, receipt)| (chain_id.to_string(), receipt)).collect();
    serde_json::to_value(by_string).expect("TransactionReceipt is always serializable")
}
