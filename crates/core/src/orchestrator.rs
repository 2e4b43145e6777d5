use crate::balance::{BalanceOracle, ChainBalanceProvider};
use crate::bridge::{select_and_submit, AdapterRoute, AdapterSelectionOutcome, BridgeRegistry, ChainService};
use crate::callback_engine::CallbackEngine;
use crate::config::Config;
use crate::error::OrchestratorError;
use crate::metrics::Metrics;
use crate::pause::PauseGate;
use crate::route::evaluate_route;
use alloy_primitives::ChainId;
use mark_rebalance_metrics::observe_metrics_for_result_async;
use mark_rebalance_storage::{OperationStoreReader, OperationStoreWriter, PauseRegistry};
use mark_rebalance_types::RoutePolicy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Summary of everything one tick did, returned to the scheduler for logging/metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub operations_created: u64,
    pub callbacks_completed: u64,
    pub routes_skipped: u64,
}

/// Runs one logical tick: callback engine, then (unless paused) route evaluation and adapter
/// selection for every configured route.
///
/// Generic over the operation store, the balance provider, and the pause registry so the
/// binary can wire concrete Postgres/RPC implementations while tests wire mocks. The bridge
/// registry and chain service are held as trait objects: a process registers a fixed,
/// heterogeneous set of adapters at startup, so there is no benefit to threading them through
/// as type parameters.
#[derive(Debug)]
pub struct Orchestrator<S, P, R> {
    store: S,
    balance_oracle: BalanceOracle<P>,
    pause_registry: R,
    bridges: BridgeRegistry,
    chain_service: Arc<dyn ChainService>,
    config: Arc<Config>,
}

impl<S, P, R> Orchestrator<S, P, R>
where
    S: OperationStoreReader + OperationStoreWriter + Send + Sync,
    P: ChainBalanceProvider,
    R: PauseRegistry,
{
    pub fn new(
        store: S,
        balance_oracle: BalanceOracle<P>,
        pause_registry: R,
        bridges: BridgeRegistry,
        chain_service: Arc<dyn ChainService>,
        config: Arc<Config>,
    ) -> Self {
        Metrics::describe();
        Self { store, balance_oracle, pause_registry, bridges, chain_service, config }
    }

    /// Runs one tick, recording success/error counters and a duration histogram, plus the
    /// per-phase counts from the resulting [`TickReport`].
    pub async fn tick(&self) -> Result<TickReport, OrchestratorError> {
        let report = observe_metrics_for_result_async!(
            Metrics::TICKS_TOTAL,
            Metrics::TICKS_FAILED_TOTAL,
            Metrics::TICK_DURATION_SECONDS,
            "tick",
            self.tick_inner()
        )?;

        metrics::counter!(Metrics::OPERATIONS_CREATED_TOTAL).increment(report.operations_created);
        metrics::counter!(Metrics::CALLBACKS_COMPLETED_TOTAL).increment(report.callbacks_completed);
        metrics::counter!(Metrics::ROUTES_SKIPPED_TOTAL).increment(report.routes_skipped);

        Ok(report)
    }

    async fn tick_inner(&self) -> Result<TickReport, OrchestratorError> {
        let mut report = TickReport::default();

        let callback_engine = CallbackEngine::new(&self.store, &self.bridges, self.chain_service.as_ref(), &self.config.chain_registry);
        report.callbacks_completed = callback_engine.run().await? as u64;

        let pause_gate = PauseGate::new(&self.pause_registry);
        if !pause_gate.route_evaluation_allowed().await? {
            info!(target: "mark::orchestrator", "rebalance paused, skipping route evaluation this tick");
            return Ok(report);
        }

        let balances = self.balance_oracle.snapshot(&self.config.chain_registry).await;

        let mut by_origin: HashMap<ChainId, Vec<&RoutePolicy>> = HashMap::new();
        for route in &self.config.routes {
            by_origin.entry(route.origin).or_default().push(route);
        }

        let outcomes = futures::future::join_all(
            by_origin.into_values().map(|routes| self.evaluate_origin_chain(routes, &balances)),
        )
        .await;

        for (created, skipped) in outcomes {
            report.operations_created += created;
            report.routes_skipped += skipped;
        }

        Ok(report)
    }

    /// Evaluates every route sharing one origin chain, strictly in order — keeps balance
    /// accounting consistent with the order transactions are actually submitted in. Different
    /// origin chains run concurrently via `tick`'s `join_all`.
    async fn evaluate_origin_chain(&self, routes: Vec<&RoutePolicy>, balances: &mark_rebalance_types::BalanceMap) -> (u64, u64) {
        let mut created = 0;
        let mut skipped = 0;

        for route in routes {
            let Some(asset) = self.config.chain_registry.asset(route.origin, route.ticker_hash) else {
                warn!(target: "mark::orchestrator", origin = route.origin, destination = route.destination, "origin asset not in chain registry, skipping route");
                skipped += 1;
                continue;
            };

            let decision = match evaluate_route(route, balances, asset.decimals) {
                Ok(decision) => decision,
                Err(reason) => {
                    info!(target: "mark::orchestrator", origin = route.origin, destination = route.destination, ?reason, "route skipped this tick");
                    skipped += 1;
                    continue;
                }
            };

            let adapter_route = AdapterRoute { origin: decision.origin, destination: decision.destination, asset: route.asset };
            let operator = self.config.operator_address;

            let outcome = select_and_submit(
                adapter_route,
                operator,
                operator,
                decision.native_amount,
                &decision.preferences,
                &decision.slippages,
                &self.bridges,
                self.chain_service.as_ref(),
            )
            .await;

            match outcome {
                AdapterSelectionOutcome::Submitted { bridge, slippage_bps, transactions, effective_amount } => {
                    let amount = effective_amount.unwrap_or(decision.canonical_amount);
                    match self
                        .store
                        .create_operation(
                            None,
                            decision.origin,
                            decision.destination,
                            decision.ticker_hash,
                            amount,
                            slippage_bps,
                            bridge,
                            operator,
                            transactions,
                        )
                        .await
                    {
                        Ok(_) => created += 1,
                        Err(err) => {
                            error!(target: "mark::orchestrator", origin = route.origin, destination = route.destination, %err, "failed to persist a submitted operation");
                        }
                    }
                }
                AdapterSelectionOutcome::Exhausted => {
                    info!(target: "mark::orchestrator", origin = route.origin, destination = route.destination, "every bridge preference exhausted, skipping route this tick");
                    skipped += 1;
                }
                AdapterSelectionOutcome::Aborted { bridge, failed_memo } => {
                    warn!(
                        target: "mark::orchestrator",
                        origin = route.origin,
                        destination = route.destination,
                        %bridge,
                        ?failed_memo,
                        "a non-principal leg failed after submission, aborting route this tick"
                    );
                    skipped += 1;
                }
            }
        }

        (created, skipped)
    }
}
