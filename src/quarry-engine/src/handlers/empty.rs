//! Empty relation handler.

use arrow::array::new_null_array;
use arrow::datatypes::Field;

use common_error::QuarryResult;
use quarry_logical::{LogicalOp, LogicalPlan};

use super::unexpected_op;
use crate::context::SessionContext;
use crate::converter::PlanConverter;
use crate::reconcile::SchemaReconciler;
use crate::registry::RelHandler;
use crate::table::{Frame, ResultTable};

/// Produces no rows, or a single row when `produce_one_row` is set.
///
/// The single row has no columns unless the node's row type declares some,
/// in which case every column is null.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyHandler;

impl RelHandler for EmptyHandler {
    fn convert(
        &self,
        node: &LogicalPlan,
        converter: &PlanConverter,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable> {
        let LogicalOp::EmptyRelation(empty) = node.op() else {
            return Err(unexpected_op("EmptyRelation", node));
        };
        converter.convert_inputs(node, 0, ctx)?;

        let rows = usize::from(empty.produce_one_row);
        let fields: Vec<Field> = node
            .row_type()
            .columns
            .iter()
            .map(|c| Field::new(&c.name, c.data_type.to_arrow(), true))
            .collect();
        let columns = fields
            .iter()
            .map(|f| new_null_array(f.data_type(), rows))
            .collect();

        let frame = Frame::from_columns(fields, vec![columns], &[rows])?;
        SchemaReconciler::reconcile(&ResultTable::from_frame(frame)?, node.row_type())
    }
}
