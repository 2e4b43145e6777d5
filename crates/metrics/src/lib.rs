//! Metrics scaffolding shared by the storage and core crates.
//!
//! A small reporter trait plus macros that wrap a store/engine call with success/error
//! counters and a duration histogram. This crate does not wire a push gateway or exporter;
//! that transport lives outside this workspace.

mod reporter;
pub use reporter::MetricsReporter;

pub mod macros;
