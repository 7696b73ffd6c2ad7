//! Limit handler.

use common_error::QuarryResult;
use quarry_logical::{LogicalOp, LogicalPlan};

use super::unexpected_op;
use crate::context::SessionContext;
use crate::converter::PlanConverter;
use crate::reconcile::SchemaReconciler;
use crate::registry::RelHandler;
use crate::table::ResultTable;

/// Skips `skip` rows, then keeps at most `fetch` rows, in partition order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitHandler;

impl RelHandler for LimitHandler {
    fn convert(
        &self,
        node: &LogicalPlan,
        converter: &PlanConverter,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable> {
        let LogicalOp::Limit(limit) = node.op() else {
            return Err(unexpected_op("Limit", node));
        };
        let input = converter.convert_input(node, ctx)?;
        let frame = input.frame().slice(limit.skip, limit.fetch)?;
        let result = ResultTable::new(frame, input.columns().clone())?;
        SchemaReconciler::reconcile(&result, node.row_type())
    }
}
