//! Recursive plan conversion.

use log::debug;

use common_error::{QuarryError, QuarryResult};
use quarry_logical::LogicalPlan;

use crate::context::SessionContext;
use crate::metrics::{ExecutionTimer, MetricsSink, OperatorMetrics};
use crate::table::ResultTable;

/// Dispatches plan nodes to the handlers registered for their kind.
///
/// The converter does not walk inputs itself: each handler asks for its
/// inputs through [`convert_inputs`](Self::convert_inputs), which makes the
/// traversal post-order. Plans are trees, so a subtree referenced twice would
/// be converted twice.
#[derive(Debug, Clone, Default)]
pub struct PlanConverter {
    metrics: Option<MetricsSink>,
}

impl PlanConverter {
    /// Create a converter without metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record per-node metrics into `sink`.
    #[must_use]
    pub fn with_metrics(mut self, sink: MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// The metrics sink, if enabled.
    pub fn metrics(&self) -> Option<&MetricsSink> {
        self.metrics.as_ref()
    }

    /// Convert `node` with the handler registered for its kind.
    pub fn convert(&self, node: &LogicalPlan, ctx: &SessionContext) -> QuarryResult<ResultTable> {
        let kind = node.kind();
        let handler = ctx
            .handlers()
            .lookup(&kind)
            .map_err(|_| QuarryError::unsupported_operator(kind.to_string()))?;

        debug!("converting {kind} node with {} input(s)", node.inputs().len());
        let timer = ExecutionTimer::start();
        let result = handler.convert(node, self, ctx)?;
        let elapsed = timer.elapsed();
        debug!(
            "converted {kind} node: {} row(s) in {} partition(s), {elapsed:?}",
            result.num_rows(),
            result.num_partitions()
        );

        if let Some(sink) = &self.metrics {
            sink.record(
                OperatorMetrics::new(kind)
                    .with_output(result.num_rows(), result.num_partitions())
                    .with_elapsed(elapsed),
            );
        }
        Ok(result)
    }

    /// Convert the inputs of `node`, which must have exactly `expected` of them.
    pub fn convert_inputs(
        &self,
        node: &LogicalPlan,
        expected: usize,
        ctx: &SessionContext,
    ) -> QuarryResult<Vec<ResultTable>> {
        let actual = node.inputs().len();
        if actual != expected {
            return Err(QuarryError::input_arity(node.kind().name(), expected, actual));
        }
        self.convert_all_inputs(node, ctx)
    }

    /// Convert the single input of `node`.
    pub fn convert_input(
        &self,
        node: &LogicalPlan,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable> {
        let mut inputs = self.convert_inputs(node, 1, ctx)?;
        inputs
            .pop()
            .ok_or_else(|| QuarryError::internal("converted input missing"))
    }

    /// Convert every input of `node`, in order.
    pub fn convert_all_inputs(
        &self,
        node: &LogicalPlan,
        ctx: &SessionContext,
    ) -> QuarryResult<Vec<ResultTable>> {
        node.inputs()
            .iter()
            .map(|input| self.convert(input, ctx))
            .collect()
    }
}
