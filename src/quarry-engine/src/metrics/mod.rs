//! Metrics collection for plan conversion.

use std::fmt::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use quarry_logical::OperatorKind;

/// Metrics for the conversion of a single plan node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorMetrics {
    /// Kind of the converted node.
    pub operator: OperatorKind,
    /// Number of output rows produced.
    pub rows_out: u64,
    /// Number of output partitions.
    pub partitions: usize,
    /// Time spent converting the node, inputs included.
    pub elapsed: Duration,
}

impl OperatorMetrics {
    /// Create new metrics.
    #[must_use]
    pub const fn new(operator: OperatorKind) -> Self {
        Self {
            operator,
            rows_out: 0,
            partitions: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Set rows and partitions produced.
    #[must_use]
    pub const fn with_output(mut self, rows: usize, partitions: usize) -> Self {
        self.rows_out = rows as u64;
        self.partitions = partitions;
        self
    }

    /// Set elapsed time.
    #[must_use]
    pub const fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }
}

impl std::fmt::Display for OperatorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: rows_out={}, partitions={}, time={:?}",
            self.operator, self.rows_out, self.partitions, self.elapsed
        )
    }
}

/// Sink for collecting per-node metrics in conversion (post-) order.
///
/// Clones share the same underlying storage.
#[derive(Debug, Clone, Default)]
pub struct MetricsSink {
    entries: Arc<Mutex<Vec<OperatorMetrics>>>,
}

impl MetricsSink {
    /// Create a new metrics sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<OperatorMetrics>> {
        // A panicking handler cannot leave a half-written entry behind.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record metrics for a converted node.
    pub fn record(&self, metrics: OperatorMetrics) {
        self.lock().push(metrics);
    }

    /// All recorded entries, in recording order.
    pub fn all(&self) -> Vec<OperatorMetrics> {
        self.lock().clone()
    }

    /// Operator kinds in recording order.
    pub fn operators(&self) -> Vec<OperatorKind> {
        self.lock().iter().map(|m| m.operator.clone()).collect()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clear all metrics.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Format metrics for EXPLAIN ANALYZE style output.
    pub fn format_analyze(&self) -> String {
        let entries = self.lock();
        let mut output = String::new();

        for m in entries.iter() {
            let _ = writeln!(output, "{m}");
        }

        if output.is_empty() {
            output.push_str("No metrics collected.\n");
        }

        output
    }
}

/// Timer for measuring conversion time.
#[derive(Debug)]
pub struct ExecutionTimer {
    start: Instant,
}

impl ExecutionTimer {
    /// Start a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time without stopping.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop and return elapsed time.
    #[must_use]
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for ExecutionTimer {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_sink_keeps_order() {
        let sink = MetricsSink::new();
        sink.record(OperatorMetrics::new(OperatorKind::TableScan).with_output(10, 2));
        sink.record(OperatorMetrics::new(OperatorKind::Filter).with_output(4, 2));

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.operators(),
            vec![OperatorKind::TableScan, OperatorKind::Filter]
        );
        assert_eq!(sink.all()[1].rows_out, 4);
    }

    #[test]
    fn test_clones_share_storage() {
        let sink = MetricsSink::new();
        let clone = sink.clone();
        clone.record(OperatorMetrics::new(OperatorKind::Limit));
        assert_eq!(sink.len(), 1);

        sink.clear();
        assert!(clone.is_empty());
        assert_eq!(clone.format_analyze(), "No metrics collected.\n");
    }

    #[test]
    fn test_execution_timer() {
        let timer = ExecutionTimer::start();
        std::thread::sleep(Duration::from_millis(5));
        let elapsed = timer.stop();
        assert!(elapsed >= Duration::from_millis(5));
    }
}
