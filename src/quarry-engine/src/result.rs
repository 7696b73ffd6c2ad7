//! Result of executing a plan.

use std::fmt::Write;
use std::time::Duration;

use arrow::record_batch::RecordBatch;

use crate::metrics::MetricsSink;

/// Materialized output of [`SessionContext::execute`](crate::SessionContext::execute).
#[derive(Debug)]
pub struct ExecutionResult {
    /// All output rows, named by the plan's row type.
    pub batch: RecordBatch,
    /// Per-node metrics, when collection is enabled.
    pub metrics: Option<MetricsSink>,
    /// Total conversion time.
    pub elapsed: Duration,
}

impl ExecutionResult {
    /// Create a new execution result.
    pub const fn new(batch: RecordBatch, metrics: Option<MetricsSink>, elapsed: Duration) -> Self {
        Self {
            batch,
            metrics,
            elapsed,
        }
    }

    /// Number of output rows.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Output column names.
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Consume the result, keeping only the rows.
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    /// Format as EXPLAIN ANALYZE output.
    pub fn explain_analyze(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Execution Time: {:?}", self.elapsed);
        let _ = writeln!(output, "Total Rows: {}", self.num_rows());
        if let Some(metrics) = &self.metrics {
            output.push_str("\nOperator Metrics:\n");
            output.push_str(&metrics.format_analyze());
        }
        output
    }
}
