//! Placeholder collaborator implementations for the external boundaries this engine does not
//! own: on-chain balance reads and bridge adapters are integration-specific and are registered
//! by whoever deploys this binary, not implemented here.

use alloy_primitives::{Address, ChainId, U256};
use async_trait::async_trait;
use mark_rebalance_core::{BalanceReadError, BridgeError, ChainBalanceProvider, ChainService};
use mark_rebalance_types::{AssetDescriptor, TransactionReceipt};

/// A [`ChainBalanceProvider`] with no RPC client wired in.
///
/// Every read fails, which the balance oracle already treats as "no data for this asset" rather
/// than a crash — so the engine starts up and runs ticks (skipping every route) even before a
/// real EVM RPC client is registered in its place.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredBalanceProvider;

#[async_trait]
impl ChainBalanceProvider for UnconfiguredBalanceProvider {
    async fn read_balance(&self, _owner: Address, asset: &AssetDescriptor) -> Result<U256, BalanceReadError> {
        Err(BalanceReadError { chain_id: asset.chain_id, source: "no balance provider registered for this deployment".into() })
    }
}

/// A [`ChainService`] with no signer/submission client wired in.
///
/// The adapter-selection loop and callback engine already treat a submission failure as
/// non-fatal to the tick (they fall back or retry next tick), so this lets the rest of the
/// engine run end-to-end before a real submission client is registered in its place.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredChainService;

#[async_trait]
impl ChainService for UnconfiguredChainService {
    async fn submit_and_monitor(
        &self,
        chain_id: ChainId,
        _from: Address,
        _to: Address,
        _calldata: Vec<u8>,
        _value: U256,
    ) -> Result<TransactionReceipt, BridgeError> {
        Err(BridgeError::SubmissionFailed { chain_id, reason: "no chain service registered for this deployment".to_string() })
    }
}
