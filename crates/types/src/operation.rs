use alloy_primitives::{Address, B256, ChainId, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::CanonicalAmount;

/// Name of a bridge adapter, used as the key into the bridge adapter registry.
///
/// Adapter internals live outside this crate; this enum exists only so the registry can
/// dispatch by name without stringly-typed lookups. `Custom` covers any adapter the registry
/// is configured with that isn't one of the well-known names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BridgeName {
    Across,
    Stargate,
    Ccip,
    Linea,
    ZkSync,
    Pendle,
    CowSwap,
    Kraken,
    Tac,
    /// Any adapter name not covered by the well-known variants above.
    Custom(String),
}

impl std::fmt::Display for BridgeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Across => write!(f, "across"),
            Self::Stargate => write!(f, "stargate"),
            Self::Ccip => write!(f, "ccip"),
            Self::Linea => write!(f, "linea"),
            Self::ZkSync => write!(f, "zksync"),
            Self::Pendle => write!(f, "pendle"),
            Self::CowSwap => write!(f, "cowswap"),
            Self::Kraken => write!(f, "kraken"),
            Self::Tac => write!(f, "tac"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

impl BridgeName {
    const WELL_KNOWN: &'static [(&'static str, fn() -> BridgeName)] = &[
        ("across", || BridgeName::Across),
        ("stargate", || BridgeName::Stargate),
        ("ccip", || BridgeName::Ccip),
        ("linea", || BridgeName::Linea),
        ("zksync", || BridgeName::ZkSync),
        ("pendle", || BridgeName::Pendle),
        ("cowswap", || BridgeName::CowSwap),
        ("kraken", || BridgeName::Kraken),
        ("tac", || BridgeName::Tac),
    ];
}

impl std::str::FromStr for BridgeName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        for (name, ctor) in Self::WELL_KNOWN {
            if *name == lower {
                return Ok(ctor());
            }
        }
        Ok(Self::Custom(s.to_owned()))
    }
}

impl Serialize for BridgeName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string().to_ascii_lowercase())
    }
}

impl<'de> Deserialize<'de> for BridgeName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().expect("BridgeName::from_str is infallible"))
    }
}

/// The purpose of one leg of a [`crate::operation::SendLeg`] list returned by
/// `BridgeAdapter::send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Memo {
    /// A token approval required ahead of the transfer. Never the principal receipt.
    Approval,
    /// The transfer itself. Exactly one per `send` call; its receipt's transaction hash is the
    /// operation's principal transaction hash.
    Rebalance,
    /// Wraps the native asset before transfer. Never the principal receipt.
    Wrap,
    /// Unwraps a wrapped asset after transfer. Never the principal receipt.
    Unwrap,
    /// Mints a representation of the asset. Never the principal receipt.
    Mint,
}

impl Memo {
    /// `true` for the single entry per `send` call that is the operation's principal transfer.
    pub const fn is_principal(self) -> bool {
        matches!(self, Self::Rebalance)
    }
}

/// One entry in the ordered list `BridgeAdapter::send` returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendLeg {
    /// Chain this leg's transaction targets; may be origin, destination, or a third chain —
    /// the memo and the chain implied by the receipt are authoritative, not any assumption the
    /// orchestrator makes about topology.
    pub chain_id: ChainId,
    /// Contract address this leg's transaction calls.
    pub to: Address,
    /// Native value (wei-equivalent) to attach to the call; zero for a plain contract call.
    pub value: U256,
    /// Opaque call data the orchestrator hands to `ChainService::submit_and_monitor`.
    pub calldata: Vec<u8>,
    /// Purpose of this leg.
    pub memo: Memo,
    /// When set on the `Rebalance` leg, overrides the stored operation's `amount` with this
    /// value rather than the originally requested amount.
    pub effective_amount: Option<CanonicalAmount>,
}

/// A confirmed on-chain receipt, as returned by `ChainService::submit_and_monitor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub status: bool,
    pub cumulative_gas_used: u128,
    pub effective_gas_price: u128,
}

/// Lifecycle state of a [`RebalanceOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    AwaitingCallback,
    Completed,
    Cancelled,
    Expired,
    Failed,
}

impl OperationStatus {
    /// `true` once no further transition is permitted.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired | Self::Failed)
    }

    /// Validates a transition against the operation lifecycle diagram.
    pub fn validate_transition(self, next: Self) -> Result<(), OperationStatusError> {
        if self.is_terminal() {
            return Err(OperationStatusError::TransitionFromTerminal { from: self, to: next });
        }
        let allowed = matches!(
            (self, next),
            (Self::Pending, Self::AwaitingCallback)
                | (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Failed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Pending, Self::Expired)
                | (Self::AwaitingCallback, Self::Completed)
                | (Self::AwaitingCallback, Self::Failed)
                | (Self::AwaitingCallback, Self::Cancelled)
                | (Self::AwaitingCallback, Self::Expired)
        );
        if allowed {
            Ok(())
        } else {
            Err(OperationStatusError::IllegalTransition { from: self, to: next })
        }
    }
}

/// An operation state transition the lifecycle diagram does not permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OperationStatusError {
    #[error("cannot transition operation out of terminal status {from:?} (requested {to:?})")]
    TransitionFromTerminal { from: OperationStatus, to: OperationStatus },

    #[error("illegal operation transition {from:?} -> {to:?}")]
    IllegalTransition { from: OperationStatus, to: OperationStatus },
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::AwaitingCallback => "AWAITING_CALLBACK",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for OperationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "AWAITING_CALLBACK" => Ok(Self::AwaitingCallback),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            "FAILED" => Ok(Self::Failed),
            other => Err(other.to_owned()),
        }
    }
}

/// A durable, multi-phase cross-chain transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceOperation {
    pub id: Uuid,
    /// `None` for a standalone/threshold-driven operation.
    pub earmark_id: Option<Uuid>,
    pub origin_chain_id: ChainId,
    pub destination_chain_id: ChainId,
    pub ticker_hash: crate::TickerHash,
    pub amount: CanonicalAmount,
    pub slippage_bps: u32,
    pub bridge: BridgeName,
    pub recipient: alloy_primitives::Address,
    /// Receipts keyed by the chain id the transaction landed on.
    pub transactions: HashMap<ChainId, TransactionReceipt>,
    pub status: OperationStatus,
    /// Set when the parent earmark was cancelled; does not change `status`.
    pub is_orphaned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
