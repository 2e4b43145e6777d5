/// Metric name constants for the orchestrator tick loop and its sub-components.
#[derive(Debug, Clone)]
pub(crate) struct Metrics;

impl Metrics {
    pub(crate) const TICKS_TOTAL: &'static str = "mark_rebalance_core_ticks_total";
    pub(crate) const TICKS_FAILED_TOTAL: &'static str = "mark_rebalance_core_ticks_failed_total";
    pub(crate) const OPERATIONS_CREATED_TOTAL: &'static str = "mark_rebalance_core_operations_created_total";
    pub(crate) const CALLBACKS_COMPLETED_TOTAL: &'static str = "mark_rebalance_core_callbacks_completed_total";
    pub(crate) const ROUTES_SKIPPED_TOTAL: &'static str = "mark_rebalance_core_routes_skipped_total";
    pub(crate) const TICK_DURATION_SECONDS: &'static str = "mark_rebalance_core_tick_duration_seconds";

    pub(crate) fn describe() {
        metrics::describe_counter!(Self::TICKS_TOTAL, metrics::Unit::Count, "Total number of orchestrator ticks completed");
        metrics::describe_counter!(Self::TICKS_FAILED_TOTAL, metrics::Unit::Count, "Total number of orchestrator ticks that errored");
        metrics::describe_counter!(
            Self::OPERATIONS_CREATED_TOTAL,
            metrics::Unit::Count,
            "Total number of rebalance operations created"
        );
        metrics::describe_counter!(
            Self::CALLBACKS_COMPLETED_TOTAL,
            metrics::Unit::Count,
            "Total number of operations driven to COMPLETED by the callback engine"
        );
        metrics::describe_counter!(
            Self::ROUTES_SKIPPED_TOTAL,
            metrics::Unit::Count,
            "Total number of route evaluations skipped this tick"
        );
        metrics::describe_histogram!(Self::TICK_DURATION_SECONDS, metrics::Unit::Seconds, "Duration of one orchestrator tick");
    }
}
