//! Core rebalancing engine: balance oracle, route evaluator, bridge adapter selection,
//! callback engine, recovery/expiry sweeper, and the orchestrator that ties them into one
//! tick.
//!
//! Everything here is pure logic and trait-mediated I/O; concrete storage, RPC, and adapter
//! implementations are wired by the binary crate.

pub mod balance;
pub mod bridge;
pub mod callback_engine;
pub mod config;
pub mod error;
mod metrics;
pub mod orchestrator;
pub mod pause;
pub mod route;
pub mod sweeper;

pub use balance::{BalanceOracle, BalanceReadError, ChainBalanceProvider};
pub use bridge::{AdapterRoute, AdapterSelectionOutcome, BridgeAdapter, BridgeError, BridgeRegistry, ChainService, DestinationCall};
pub use callback_engine::{CallbackEngine, CallbackStep};
pub use config::{ChainConfig, ChainRegistry, Config, FileConfig, ProviderConfig};
pub use error::{ConfigError, OrchestratorError};
pub use orchestrator::{Orchestrator, TickReport};
pub use pause::PauseGate;
pub use route::{evaluate_route, RouteDecision, SkipReason};
pub use sweeper::{SweepReport, Sweeper};
