use alloy_primitives::ChainId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TickerHash;

/// Lifecycle state of an [`Earmark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EarmarkStatus {
    /// Created when the invoice policy demands an inventory top-up.
    Pending,
    /// All child operations have reached a terminal state with at least one `COMPLETED`.
    Ready,
    /// The associated invoice has been filled.
    Completed,
    /// Cancelled by admin.
    Cancelled,
    /// Expired by the sweeper after its TTL.
    Expired,
}

impl EarmarkStatus {
    /// `true` once no further transition is permitted.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }

    /// Validates a transition against the earmark lifecycle diagram.
    pub fn validate_transition(self, next: Self) -> Result<(), EarmarkStatusError> {
        if self.is_terminal() {
            return Err(EarmarkStatusError::TransitionFromTerminal { from: self, to: next });
        }
        let allowed = matches!(
            (self, next),
            (Self::Pending, Self::Ready)
                | (Self::Pending, Self::Cancelled)
                | (Self::Pending, Self::Expired)
                | (Self::Ready, Self::Completed)
                | (Self::Ready, Self::Cancelled)
                | (Self::Ready, Self::Expired)
        );
        if allowed {
            Ok(())
        } else {
            Err(EarmarkStatusError::IllegalTransition { from: self, to: next })
        }
    }
}

/// An earmark state transition the lifecycle diagram does not permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EarmarkStatusError {
    /// Attempted to transition out of a terminal status.
    #[error("cannot transition earmark out of terminal status {from:?} (requested {to:?})")]
    TransitionFromTerminal { from: EarmarkStatus, to: EarmarkStatus },

    /// The transition is not one of the edges drawn in the state machine.
    #[error("illegal earmark transition {from:?} -> {to:?}")]
    IllegalTransition { from: EarmarkStatus, to: EarmarkStatus },
}

impl std::fmt::Display for EarmarkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Ready => "READY",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for EarmarkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "READY" => Ok(Self::Ready),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(other.to_owned()),
        }
    }
}

/// A durable reservation of an upcoming fill against a specific invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Earmark {
    /// Primary key.
    pub id: Uuid,
    /// Unique index; the invoice this earmark reserves inventory for.
    pub invoice_id: String,
    /// Chain the reservation is designated to purchase on.
    pub designated_purchase_chain: ChainId,
    /// Cross-chain identity of the reserved asset.
    pub ticker_hash: TickerHash,
    /// Minimum amount required, in native units of `designated_purchase_chain`.
    pub min_amount: String,
    /// Current lifecycle status.
    pub status: EarmarkStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status-mutation timestamp.
    pub updated_at: DateTime<Utc>,
}
