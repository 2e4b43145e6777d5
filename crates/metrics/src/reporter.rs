/// Defines a contract for types that can report metrics.
///
/// Intended to be called periodically (e.g. from a background worker) to collect and report
/// gauges that aren't naturally emitted at the point of a single operation, such as queue
/// depths or table row counts.
pub trait MetricsReporter {
    /// Gathers and reports this type's metrics to the configured backend.
    fn report_metrics(&self);
}
