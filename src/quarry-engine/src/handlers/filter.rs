//! Filter handler.

use common_error::QuarryResult;
use quarry_logical::{LogicalOp, LogicalPlan};

use super::unexpected_op;
use crate::context::SessionContext;
use crate::converter::PlanConverter;
use crate::expr::ExprEvaluator;
use crate::reconcile::SchemaReconciler;
use crate::registry::RelHandler;
use crate::table::ResultTable;

/// Keeps the rows for which the predicate is true. Partitioning and column
/// naming of the input are preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterHandler;

impl RelHandler for FilterHandler {
    fn convert(
        &self,
        node: &LogicalPlan,
        converter: &PlanConverter,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable> {
        let LogicalOp::Filter(filter) = node.op() else {
            return Err(unexpected_op("Filter", node));
        };
        let input = converter.convert_input(node, ctx)?;

        let evaluator = ExprEvaluator::new(ctx.functions());
        let masks = input
            .frontend_batches()?
            .iter()
            .map(|batch| evaluator.evaluate_predicate(&filter.predicate, batch))
            .collect::<QuarryResult<Vec<_>>>()?;

        let frame = input.frame().filter(&masks)?;
        let result = ResultTable::new(frame, input.columns().clone())?;
        SchemaReconciler::reconcile(&result, node.row_type())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{AsArray, Int64Array};
    use arrow::datatypes::{DataType as ArrowDataType, Field, Int64Type, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;

    use common_config::{ExecutionConfig, QuarryConfig};
    use quarry_core::{DataType, Schema};
    use quarry_logical::expr::{col, lit};
    use quarry_logical::{PlanBuilder, ScanOp};

    use crate::context::SessionContext;

    #[test]
    fn test_filter_across_partitions() {
        let config = QuarryConfig {
            execution: ExecutionConfig::default().with_partition_rows(2),
            ..QuarryConfig::default()
        };
        let mut ctx = SessionContext::with_config(config);
        let batch = RecordBatch::try_new(
            Arc::new(ArrowSchema::new(vec![Field::new(
                "v",
                ArrowDataType::Int64,
                true,
            )])),
            vec![Arc::new(Int64Array::from(vec![
                Some(1),
                None,
                Some(3),
                Some(4),
                Some(5),
            ]))],
        )
        .unwrap();
        ctx.register_batch("t", batch).unwrap();

        let table = Schema::from_pairs([("v", DataType::Int64)]);
        let plan = PlanBuilder::scan(ScanOp::new("t"), &table)
            .unwrap()
            .filter(col("v").gt(lit(2i64)))
            .unwrap()
            .build();

        let result = ctx.convert(&plan).unwrap();
        assert_eq!(result.num_partitions(), 3);
        let out = result.to_record_batch().unwrap();
        let values: Vec<i64> = out.column(0).as_primitive::<Int64Type>().values().to_vec();
        assert_eq!(values, vec![3, 4, 5]);
    }
}
