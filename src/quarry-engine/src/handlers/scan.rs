//! Table scan handler.

use common_error::QuarryResult;
use quarry_logical::{LogicalOp, LogicalPlan};

use super::unexpected_op;
use crate::context::SessionContext;
use crate::converter::PlanConverter;
use crate::reconcile::SchemaReconciler;
use crate::registry::RelHandler;
use crate::table::{Frame, ResultTable};

/// Reads a catalog table, optionally keeping only some of its columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanHandler;

impl RelHandler for ScanHandler {
    fn convert(
        &self,
        node: &LogicalPlan,
        converter: &PlanConverter,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable> {
        let LogicalOp::TableScan(scan) = node.op() else {
            return Err(unexpected_op("TableScan", node));
        };
        converter.convert_inputs(node, 0, ctx)?;

        let table = ctx.catalog().table(&scan.table)?;
        let frame = Frame::try_new(table.schema().clone(), table.partitions().to_vec())?;
        let frame = match &scan.projection {
            Some(indices) => frame.select_indices(indices)?,
            None => frame,
        };

        SchemaReconciler::reconcile(&ResultTable::from_frame(frame)?, node.row_type())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Int32Array, StringArray};
    use arrow::datatypes::{DataType as ArrowDataType, Field, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;

    use common_error::QuarryError;
    use quarry_core::{DataType, Schema};
    use quarry_logical::{PlanBuilder, ScanOp};

    use crate::context::SessionContext;

    fn context() -> SessionContext {
        let batch = RecordBatch::try_new(
            Arc::new(ArrowSchema::new(vec![
                Field::new("id", ArrowDataType::Int32, false),
                Field::new("name", ArrowDataType::Utf8, true),
            ])),
            vec![
                Arc::new(Int32Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec!["a", "b", "c"])),
            ],
        )
        .unwrap();
        let mut ctx = SessionContext::new();
        ctx.register_batch("people", batch).unwrap();
        ctx
    }

    #[test]
    fn test_scan_projection_and_rename() {
        let ctx = context();
        let table = Schema::from_pairs([("id", DataType::Int64), ("name", DataType::Utf8)]);
        let plan = PlanBuilder::scan(ScanOp::new("people").with_projection(vec![1]), &table)
            .unwrap()
            .build();
        let result = ctx.convert(&plan).unwrap();
        assert_eq!(result.frontend_names(), vec!["name"]);
        assert_eq!(result.num_rows(), 3);
    }

    #[test]
    fn test_scan_keeps_same_category_types() {
        let ctx = context();
        let table = Schema::from_pairs([("id", DataType::Int64), ("name", DataType::Utf8)]);
        let plan = PlanBuilder::scan(ScanOp::new("people"), &table).unwrap().build();
        let result = ctx.convert(&plan).unwrap();
        assert_eq!(
            result.frame().field("id").unwrap().data_type(),
            &ArrowDataType::Int32
        );
    }

    #[test]
    fn test_scan_unknown_table() {
        let ctx = context();
        let plan = PlanBuilder::scan(ScanOp::new("missing"), &Schema::new())
            .unwrap()
            .build();
        assert!(matches!(
            ctx.convert(&plan),
            Err(QuarryError::TableNotFound(name)) if name == "missing"
        ));
    }
}
