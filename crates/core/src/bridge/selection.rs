use super::{AdapterRoute, BridgeError, BridgeRegistry, ChainService};
use alloy_primitives::{Address, ChainId, U256};
use mark_rebalance_types::{BridgeName, CanonicalAmount, Memo, TransactionReceipt};
use std::collections::HashMap;
use tracing::{error, warn};

/// Result of running the adapter-selection loop for one route.
#[derive(Debug)]
pub enum AdapterSelectionOutcome {
    /// An adapter succeeded end-to-end. Everything needed to persist a new `PENDING`
    /// operation row.
    Submitted {
        bridge: BridgeName,
        slippage_bps: u32,
        transactions: HashMap<ChainId, TransactionReceipt>,
        /// Overrides the requested amount when the `Rebalance` leg set `effective_amount`.
        effective_amount: Option<CanonicalAmount>,
    },
    /// Every configured preference was exhausted without a success. The route is skipped
    /// this tick; the next tick re-evaluates it from current balances.
    Exhausted,
    /// A non-principal leg (`Approval`/`Wrap`/`Unwrap`/`Mint`) was submitted and its receipt
    /// was not a success. No operation row is created; further preferences are not tried —
    /// the whole route attempt aborts for this tick.
    Aborted { bridge: BridgeName, failed_memo: Memo },
}

/// Runs the adapter-selection loop: tries each `(preference, slippage)` pair in order,
/// stopping at the first adapter that quotes within tolerance and submits successfully.
#[allow(clippy::too_many_arguments)]
pub async fn select_and_submit(
    route: AdapterRoute,
    sender: Address,
    recipient: Address,
    native_amount: U256,
    preferences: &[BridgeName],
    slippages: &[u32],
    registry: &BridgeRegistry,
    chain_service: &dyn ChainService,
) -> AdapterSelectionOutcome {
    for (preference, slippage_bps) in preferences.iter().zip(slippages.iter().copied()) {
        let adapter = match registry.get(preference) {
            Ok(adapter) => adapter,
            Err(err) => {
                warn!(target: "mark::bridge", bridge = %preference, %err, "adapter not registered, trying next preference");
                continue;
            }
        };

        let received = match adapter.get_received_amount(native_amount, route).await {
            Ok(received) => received,
            Err(err) => {
                error!(target: "mark::bridge", bridge = %preference, %err, "quote failed, trying next preference");
                continue;
            }
        };

        let min_acceptable = native_amount - (native_amount * U256::from(slippage_bps)) / U256::from(10_000u64);
        if received < min_acceptable {
            warn!(
                target: "mark::bridge",
                bridge = %preference,
                %received,
                %min_acceptable,
                "quote below slippage tolerance, trying next preference"
            );
            continue;
        }

        let legs = match adapter.send(sender, recipient, native_amount, route).await {
            Ok(legs) => legs,
            Err(err) => {
                error!(target: "mark::bridge", bridge = %preference, %err, "send failed, trying next preference");
                continue;
            }
        };

        match execute_legs(sender, &legs, chain_service).await {
            Ok((transactions, effective_amount)) => {
                return AdapterSelectionOutcome::Submitted {
                    bridge: adapter.name(),
                    slippage_bps,
                    transactions,
                    effective_amount,
                };
            }
            Err(failed_memo) => {
                // A failed non-principal leg (Approval/Wrap/Unwrap/Mint/Rebalance) aborts the
                // whole route this tick rather than falling back to the next adapter.
                return AdapterSelectionOutcome::Aborted { bridge: adapter.name(), failed_memo };
            }
        }
    }

    AdapterSelectionOutcome::Exhausted
}

/// Executes `legs` in order, waiting for each receipt before the next. Returns the failed
/// leg's memo if any leg's receipt was not a success.
async fn execute_legs(
    sender: Address,
    legs: &[mark_rebalance_types::SendLeg],
    chain_service: &dyn ChainService,
) -> Result<(HashMap<ChainId, TransactionReceipt>, Option<CanonicalAmount>), Memo> {
    let mut transactions = HashMap::new();
    let mut effective_amount = None;

    for leg in legs {
        let receipt = match chain_service.submit_and_monitor(leg.chain_id, sender, leg.to, leg.calldata.clone(), leg.value).await {
            Ok(receipt) => receipt,
            Err(_) => return Err(leg.memo),
        };

        if !receipt.status {
            return Err(leg.memo);
        }

        if leg.memo == Memo::Rebalance {
            effective_amount = leg.effective_amount;
        }

        transactions.insert(leg.chain_id, receipt);
    }

    Ok((transactions, effective_amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeAdapter;
    use crate::bridge::DestinationCall;
    use alloy_primitives::B256;
    use async_trait::async_trait;
    use mark_rebalance_types::SendLeg;
    use mockall::mock;
    use std::sync::Arc;

    mock! {
        #[derive(Debug)]
        pub Adapter {}

        #[async_trait]
        impl BridgeAdapter for Adapter {
            fn name(&self) -> BridgeName;
            async fn get_received_amount(&self, amount: U256, route: AdapterRoute) -> Result<U256, BridgeError>;
            async fn get_minimum_amount(&self, route: AdapterRoute) -> Result<Option<U256>, BridgeError>;
            async fn send(&self, sender: Address, recipient: Address, amount: U256, route: AdapterRoute) -> Result<Vec<SendLeg>, BridgeError>;
            async fn ready_on_destination(&self, amount: U256, route: AdapterRoute, origin_receipt: &TransactionReceipt) -> Result<bool, BridgeError>;
            async fn destination_callback(&self, route: AdapterRoute, origin_receipt: &TransactionReceipt) -> Result<Option<DestinationCall>, BridgeError>;
        }
    }

    mock! {
        #[derive(Debug)]
        pub Chain {}

        #[async_trait]
        impl ChainService for Chain {
            async fn submit_and_monitor(&self, chain_id: ChainId, from: Address, to: Address, calldata: Vec<u8>, value: U256) -> Result<TransactionReceipt, BridgeError>;
        }
    }

    fn route() -> AdapterRoute {
        AdapterRoute { origin: 8453, destination: 10, asset: Address::ZERO }
    }

    fn receipt(success: bool) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: B256::repeat_byte(7),
            block_number: 1,
            status: success,
            cumulative_gas_used: 0,
            effective_gas_price: 0,
        }
    }

    #[tokio::test]
    async fn falls_back_to_second_preference_on_quote_error() {
        let mut first = MockAdapter::new();
        first.expect_get_received_amount().returning(|_, _| Err(BridgeError::QuoteFailed { bridge: BridgeName::Across, reason: "down".into() }));

        let mut second = MockAdapter::new();
        second.expect_name().return_const(BridgeName::Stargate);
        second.expect_get_received_amount().returning(|amount, _| Ok(amount));
        second.expect_send().returning(|_, _, _, _| {
            Ok(vec![SendLeg {
                chain_id: 8453,
                to: Address::ZERO,
                value: U256::ZERO,
                calldata: vec![],
                memo: Memo::Rebalance,
                effective_amount: None,
            }])
        });

        let mut registry = BridgeRegistry::new();
        registry.register(Arc::new(first));
        registry.register(Arc::new(second));

        let mut chain = MockChain::new();
        chain.expect_submit_and_monitor().returning(|_, _, _, _, _| Ok(receipt(true)));

        let outcome = select_and_submit(
            route(),
            Address::ZERO,
            Address::ZERO,
            U256::from(1_000u64),
            &[BridgeName::Across, BridgeName::Stargate],
            &[50, 50],
            &registry,
            &chain,
        )
        .await;

        assert!(matches!(outcome, AdapterSelectionOutcome::Submitted { .. }));
    }

    #[tokio::test]
    async fn exhausts_when_every_preference_fails() {
        let mut adapter = MockAdapter::new();
        adapter.expect_get_received_amount().returning(|_, _| Err(BridgeError::QuoteFailed { bridge: BridgeName::Across, reason: "down".into() }));

        let mut registry = BridgeRegistry::new();
        registry.register(Arc::new(adapter));

        let chain = MockChain::new();
        let outcome = select_and_submit(
            route(),
            Address::ZERO,
            Address::ZERO,
            U256::from(1_000u64),
            &[BridgeName::Across],
            &[50],
            &registry,
            &chain,
        )
        .await;

        assert!(matches!(outcome, AdapterSelectionOutcome::Exhausted));
    }

    #[tokio::test]
    async fn aborts_route_when_approval_leg_fails() {
        let mut adapter = MockAdapter::new();
        adapter.expect_name().return_const(BridgeName::Across);
        adapter.expect_get_received_amount().returning(|amount, _| Ok(amount));
        adapter.expect_send().returning(|_, _, _, _| {
            Ok(vec![
                SendLeg { chain_id: 8453, to: Address::ZERO, value: U256::ZERO, calldata: vec![], memo: Memo::Approval, effective_amount: None },
                SendLeg { chain_id: 8453, to: Address::ZERO, value: U256::ZERO, calldata: vec![], memo: Memo::Rebalance, effective_amount: None },
            ])
        });

        let mut registry = BridgeRegistry::new();
        registry.register(Arc::new(adapter));

        let mut chain = MockChain::new();
        chain.expect_submit_and_monitor().returning(|_, _, _, _, _| Ok(receipt(false)));

        let outcome = select_and_submit(
            route(),
            Address::ZERO,
            Address::ZERO,
            U256::from(1_000u64),
            &[BridgeName::Across],
            &[50],
            &registry,
            &chain,
        )
        .await;

        assert!(matches!(outcome, AdapterSelectionOutcome::Aborted { failed_memo: Memo::Approval, .. }));
    }
}
