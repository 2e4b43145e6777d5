use anyhow::Result;
use mark_rebalance_core::{BridgeRegistry, Config, Orchestrator};
use mark_rebalance_storage::OperationDb;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::collaborators::{UnconfiguredBalanceProvider, UnconfiguredChainService};

/// Owns the running orchestrator and sweeper loops and their shared cancellation token.
#[derive(Debug)]
pub struct Service {
    config: Arc<Config>,
    store: OperationDb,
    cancel_token: CancellationToken,
}

impl Service {
    pub async fn connect(config: Config) -> Result<Self> {
        let store = OperationDb::connect(&config.database_url, config.max_connections).await?;
        Ok(Self { config: Arc::new(config), store, cancel_token: CancellationToken::new() })
    }

    /// Runs the tick scheduler and the recovery/expiry sweeper concurrently until `cancel_token`
    /// fires.
    pub async fn run(self) -> Result<()> {
        let orchestrator = Orchestrator::new(
            self.store.clone(),
            mark_rebalance_core::BalanceOracle::new(UnconfiguredBalanceProvider, self.config.operator_address),
            self.store.clone(),
            BridgeRegistry::new(),
            Arc::new(UnconfiguredChainService),
            self.config.clone(),
        );

        let sweeper = mark_rebalance_core::Sweeper::new(
            self.store.clone(),
            self.cancel_token.clone(),
            self.config.tick_interval,
            self.config.expiry_ttl,
        );

        sweeper.sweep_once().await?;

        let mut ticker = tokio::time::interval(self.config.tick_interval);
        let sweeper_handle = tokio::spawn(sweeper.run());

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: "mark::service", "shutdown requested, stopping tick scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    match orchestrator.tick().await {
                        Ok(report) => {
                            info!(
                                target: "mark::service",
                                operations_created = report.operations_created,
                                callbacks_completed = report.callbacks_completed,
                                routes_skipped = report.routes_skipped,
                                "tick completed"
                            );
                        }
                        Err(err) => {
                            error!(target: "mark::service", %err, "tick failed, retrying next interval");
                        }
                    }
                }
            }
        }

        sweeper_handle.abort();
        Ok(())
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}
