use mark_rebalance_types::BridgeName;

/// A bridge adapter or chain-service call failed.
///
/// Every variant here is recoverable by the adapter-selection loop (try the next preference)
/// except [`BridgeError::SubmissionFailed`], which means a transaction was sent and did not
/// succeed — there is no further fallback for that leg, the whole route attempt aborts for
/// this tick.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("adapter {bridge} not registered")]
    UnknownAdapter { bridge: BridgeName },

    #[error("adapter {bridge} quote failed: {reason}")]
    QuoteFailed { bridge: BridgeName, reason: String },

    #[error("adapter {bridge} send failed: {reason}")]
    SendFailed { bridge: BridgeName, reason: String },

    #[error("on-chain submission on chain {chain_id} failed: {reason}")]
    SubmissionFailed { chain_id: alloy_primitives::ChainId, reason: String },

    #[error("adapter {bridge} call timed out")]
    Timeout { bridge: BridgeName },

    /// The adapter signaled that the destination-side finalization can never succeed (e.g. the
    /// origin transaction reverted in a way the bridge cannot recover from). Distinct from a
    /// transient transport error: this promotes the operation to `FAILED` rather than retrying
    /// the callback on the next tick.
    #[error("adapter {bridge} reported a permanent destination-callback failure: {reason}")]
    PermanentCallbackFailure { bridge: BridgeName, reason: String },
}
