//! Shared data model for the Mark rebalance orchestrator.
//!
//! This crate defines the types that cross component boundaries: route policies, asset
//! descriptors, the canonical 18-decimal amount representation, earmarks, rebalance
//! operations, and the bridge/chain-service wire types. None of these types own any I/O;
//! they are pure data plus the small amount of validation logic that is cheap to keep next
//! to the type it validates.

mod amount;
pub use amount::{AmountConversionError, CanonicalAmount};

mod asset;
pub use asset::{AssetDescriptor, TickerHash};

mod route;
pub use route::{RoutePolicy, RoutePolicyError};

pub mod balance;
pub use balance::BalanceMap;

mod earmark;
pub use earmark::{Earmark, EarmarkStatus, EarmarkStatusError};

mod operation;
pub use operation::{
    BridgeName, Memo, OperationStatus, OperationStatusError, RebalanceOperation, SendLeg,
    TransactionReceipt,
};

mod audit;
pub use audit::{AuditAction, AuditLogEntry};

mod pause;
pub use pause::PauseKey;
