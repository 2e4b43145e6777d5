use anyhow::{Context, Result};
use clap::Parser;
use mark_rebalance_core::FileConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cross-chain inventory rebalancing engine for Mark.
#[derive(Debug, Parser)]
#[command(name = "mark-rebalancer", about = "Cross-chain inventory rebalancing engine")]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "MARK_CONFIG", default_value = "mark.toml")]
    pub config: PathBuf,

    /// Address the Prometheus exporter listens on.
    #[arg(long, env = "MARK_METRICS_ADDR", default_value = "0.0.0.0:9090")]
    pub metrics_addr: std::net::SocketAddr,
}

impl Cli {
    /// Runs the CLI: loads and validates configuration, initializes logging and metrics, then
    /// drives the service until `Ctrl-C`.
    pub async fn run(self) -> Result<()> {
        self.init_tracing()?;
        self.init_metrics()?;

        let raw = std::fs::read_to_string(&self.config)
            .with_context(|| format!("reading configuration file at {}", self.config.display()))?;
        let config = FileConfig::from_toml_str(&raw)
            .context("parsing configuration file")?
            .into_config()
            .context("validating configuration")?;

        let service = crate::service::Service::connect(config).await.context("connecting to the operation store")?;
        let cancel_token = service.cancel_token();
        let handle = tokio::spawn(service.run());

        tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
        tracing::info!(target: "mark::cli", "Ctrl-C received, shutting down");
        cancel_token.cancel();

        handle.await.context("service task panicked")??;
        Ok(())
    }

    fn init_tracing(&self) -> Result<()> {
        tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).try_init().map_err(anyhow::Error::msg)
    }

    fn init_metrics(&self) -> Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(self.metrics_addr)
            .install()
            .context("installing the Prometheus metrics exporter")
    }
}
