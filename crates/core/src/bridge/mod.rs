mod error;
mod registry;
mod selection;

pub use error::BridgeError;
pub use registry::BridgeRegistry;
pub use selection::{select_and_submit, AdapterSelectionOutcome};

use alloy_primitives::{Address, ChainId, U256};
use async_trait::async_trait;
use mark_rebalance_types::{BridgeName, SendLeg, TransactionReceipt};

/// One route, as presented to a [`BridgeAdapter`]. Intentionally narrower than
/// [`mark_rebalance_types::RoutePolicy`] — adapters never see `maximum`/`reserve`/bridge
/// preferences, only the (origin, destination, asset) triple they were asked to quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterRoute {
    pub origin: ChainId,
    pub destination: ChainId,
    pub asset: Address,
}

/// The external collaborator contract every bridge integration implements.
///
/// The core treats every adapter as a black box: internals, connection pools, and quote
/// caches are owned by the adapter and never reached into by the orchestrator.
#[async_trait]
#[auto_impl::auto_impl(&, &mut, Arc, Box)]
pub trait BridgeAdapter: std::fmt::Debug + Send + Sync {
    /// This adapter's name, used as the registry key.
    fn name(&self) -> BridgeName;

    /// Pure quote in destination native units. Fails when the amount is below the bridge's
    /// minimum or the route is unsupported.
    async fn get_received_amount(&self, amount: U256, route: AdapterRoute) -> Result<U256, BridgeError>;

    /// Optional floor in origin native units; `None` means no floor.
    async fn get_minimum_amount(&self, route: AdapterRoute) -> Result<Option<U256>, BridgeError>;

    /// Prepares the ordered list of transactions required to move `amount` from `sender` to
    /// `recipient`. Exactly one entry has `memo = Rebalance`.
    async fn send(
        &self,
        sender: Address,
        recipient: Address,
        amount: U256,
        route: AdapterRoute,
    ) -> Result<Vec<SendLeg>, BridgeError>;

    /// Non-blocking poll for destination readiness. Returning `true` is a latch: the
    /// orchestrator will not call this again for the same operation.
    async fn ready_on_destination(
        &self,
        amount: U256,
        route: AdapterRoute,
        origin_receipt: &TransactionReceipt,
    ) -> Result<bool, BridgeError>;

    /// Called at most once per operation, after `ready_on_destination` first returns `true`.
    /// May return `None` (no further action needed) or a single follow-up transaction.
    async fn destination_callback(
        &self,
        route: AdapterRoute,
        origin_receipt: &TransactionReceipt,
    ) -> Result<Option<DestinationCall>, BridgeError>;
}

/// A follow-up transaction `BridgeAdapter::destination_callback` asks the orchestrator to
/// submit on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationCall {
    pub chain_id: ChainId,
    pub calldata: Vec<u8>,
}

/// The signer/submission collaborator: submits a prepared call and blocks until its receipt
/// is observed.
#[async_trait]
#[auto_impl::auto_impl(&, &mut, Arc, Box)]
pub trait ChainService: std::fmt::Debug + Send + Sync {
    /// Submits `calldata` on `chain_id` from `from` and returns only once a receipt has been
    /// observed (by polling or subscription, at the implementation's discretion).
    async fn submit_and_monitor(
        &self,
        chain_id: ChainId,
        from: Address,
        to: Address,
        calldata: Vec<u8>,
        value: U256,
    ) -> Result<TransactionReceipt, BridgeError>;
}
