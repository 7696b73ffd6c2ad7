//! Sort handler.

use arrow::array::UInt32Array;
use arrow::compute::{lexsort_to_indices, SortColumn, SortOptions};

use common_error::QuarryResult;
use quarry_logical::{LogicalOp, LogicalPlan};

use super::unexpected_op;
use crate::context::SessionContext;
use crate::converter::PlanConverter;
use crate::expr::ExprEvaluator;
use crate::reconcile::SchemaReconciler;
use crate::registry::RelHandler;
use crate::table::ResultTable;

/// Orders all rows by the sort keys, then keeps the first `fetch` if set.
///
/// The output is a single partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortHandler;

impl RelHandler for SortHandler {
    fn convert(
        &self,
        node: &LogicalPlan,
        converter: &PlanConverter,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable> {
        let LogicalOp::Sort(sort) = node.op() else {
            return Err(unexpected_op("Sort", node));
        };
        let input = converter.convert_input(node, ctx)?;
        let (frame, columns) = input.into_parts();
        let coalesced = ResultTable::new(frame.coalesce()?, columns)?;

        let frame = if sort.keys.is_empty() {
            coalesced.frame().slice(0, sort.fetch)?
        } else {
            let batch = coalesced.frontend_batch(0)?;
            let evaluator = ExprEvaluator::new(ctx.functions());
            let sort_columns = sort
                .keys
                .iter()
                .map(|key| {
                    Ok(SortColumn {
                        values: evaluator.evaluate(&key.expr, &batch)?,
                        options: Some(SortOptions {
                            descending: !key.ascending,
                            nulls_first: key.nulls_first,
                        }),
                    })
                })
                .collect::<QuarryResult<Vec<_>>>()?;
            let indices: UInt32Array = lexsort_to_indices(&sort_columns, sort.fetch)?;
            coalesced.frame().take(&indices)?
        };

        let result = ResultTable::new(frame, coalesced.columns().clone())?;
        SchemaReconciler::reconcile(&result, node.row_type())
    }
}
