//! Projection handler.

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType as ArrowDataType, Field};
use arrow::record_batch::RecordBatch;

use common_error::QuarryResult;
use quarry_logical::{LogicalExpr, LogicalOp, LogicalPlan};

use super::unexpected_op;
use crate::context::SessionContext;
use crate::converter::PlanConverter;
use crate::expr::ExprEvaluator;
use crate::reconcile::SchemaReconciler;
use crate::registry::RelHandler;
use crate::table::{ColumnContainer, ResultTable};

/// Computes the output columns of a projection.
///
/// Output columns take their names from the node's row type by position. A
/// bare (possibly aliased) column reference maps to the input's backend
/// column, so renames and duplicates copy no data. Every other expression is
/// evaluated per partition into a new backend column.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectHandler;

impl RelHandler for ProjectHandler {
    fn convert(
        &self,
        node: &LogicalPlan,
        converter: &PlanConverter,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable> {
        let LogicalOp::Projection(project) = node.op() else {
            return Err(unexpected_op("Projection", node));
        };
        let input = converter.convert_input(node, ctx)?;
        let evaluator = ExprEvaluator::new(ctx.functions());
        let batches = input.frontend_batches()?;

        let row_names = node.row_type().field_names();
        let frontend = |i: usize| {
            row_names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("__col{i}"))
        };

        let mut pairs = Vec::with_capacity(project.exprs.len());
        let mut fields = Vec::new();
        let mut computed: Vec<Vec<ArrayRef>> = vec![Vec::new(); batches.len()];

        for (i, expr) in project.exprs.iter().enumerate() {
            if let LogicalExpr::Column(name) = expr.unalias() {
                let backend = input.columns().backend(name)?;
                pairs.push((frontend(i), backend.to_string()));
                continue;
            }

            let arrays = evaluate_all(&evaluator, expr, &batches)?;
            let backend = input.frame().fresh_name(&format!("__expr{i}"));
            let data_type = arrays
                .first()
                .map_or(ArrowDataType::Null, |a| a.data_type().clone());
            fields.push(Field::new(&backend, data_type, true));
            for (partition, array) in computed.iter_mut().zip(arrays) {
                partition.push(array);
            }
            pairs.push((frontend(i), backend));
        }

        let frame = if fields.is_empty() {
            input.frame().clone()
        } else {
            input.frame().append_columns(fields, computed)?
        };
        let columns = ColumnContainer::from_pairs(pairs)?;
        let result = ResultTable::new(frame, columns)?;
        SchemaReconciler::reconcile(&result, node.row_type())
    }
}

fn evaluate_all(
    evaluator: &ExprEvaluator<'_>,
    expr: &LogicalExpr,
    batches: &[RecordBatch],
) -> QuarryResult<Vec<ArrayRef>> {
    batches
        .iter()
        .map(|batch| evaluator.evaluate(expr, batch))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{AsArray, Int64Array};
    use arrow::datatypes::{DataType as ArrowDataType, Int64Type, Schema as ArrowSchema};

    use quarry_core::{DataType, Schema};
    use quarry_logical::expr::{col, lit};
    use quarry_logical::{PlanBuilder, ProjectOp, ScanOp};

    use super::*;

    fn context() -> SessionContext {
        let batch = RecordBatch::try_new(
            Arc::new(ArrowSchema::new(vec![
                Field::new("a", ArrowDataType::Int64, false),
                Field::new("b", ArrowDataType::Int64, false),
            ])),
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(Int64Array::from(vec![10, 20, 30])),
            ],
        )
        .unwrap();
        let mut ctx = SessionContext::new();
        ctx.register_batch("t", batch).unwrap();
        ctx
    }

    fn table() -> Schema {
        Schema::from_pairs([("a", DataType::Int64), ("b", DataType::Int64)])
    }

    #[test]
    fn test_bare_columns_share_backend() {
        let ctx = context();
        let plan = PlanBuilder::scan(ScanOp::new("t"), &table())
            .unwrap()
            .project(vec![col("a"), col("a").alias("a2"), col("b")])
            .unwrap()
            .build();
        let result = ctx.convert(&plan).unwrap();
        assert_eq!(result.frontend_names(), vec!["a", "a2", "b"]);
        assert_eq!(result.columns().references("a"), 2);
        assert_eq!(result.frame().column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_computed_column() {
        let ctx = context();
        let plan = PlanBuilder::scan(ScanOp::new("t"), &table())
            .unwrap()
            .project(vec![col("a").add_expr(col("b")).alias("s"), col("a")])
            .unwrap()
            .build();
        let out = ctx.collect(&plan).unwrap();
        assert_eq!(out.schema().field(0).name(), "s");
        let s: Vec<i64> = out.column(0).as_primitive::<Int64Type>().values().to_vec();
        assert_eq!(s, vec![11, 22, 33]);
    }

    #[test]
    fn test_literal_column() {
        let ctx = context();
        let plan = PlanBuilder::scan(ScanOp::new("t"), &table())
            .unwrap()
            .project(vec![lit(7i64).alias("seven")])
            .unwrap()
            .build();
        let out = ctx.collect(&plan).unwrap();
        assert_eq!(out.num_rows(), 3);
        let v = out.column(0).as_primitive::<Int64Type>();
        assert!(v.values().iter().all(|&x| x == 7));
    }

    #[test]
    fn test_output_names_follow_row_type() {
        let ctx = context();
        let scan = PlanBuilder::scan(ScanOp::new("t"), &table()).unwrap().build();
        let plan = LogicalPlan::new(
            LogicalOp::Projection(ProjectOp::new(vec![col("b").alias("a"), col("a")])),
            vec![scan],
            Schema::from_pairs([("a", DataType::Int64), ("a0", DataType::Int64)]),
        );
        let out = ctx.collect(&plan).unwrap();
        assert_eq!(out.schema().field(0).name(), "a");
        assert_eq!(out.schema().field(1).name(), "a0");
        let a: Vec<i64> = out.column(0).as_primitive::<Int64Type>().values().to_vec();
        let a0: Vec<i64> = out.column(1).as_primitive::<Int64Type>().values().to_vec();
        assert_eq!(a, vec![10, 20, 30]);
        assert_eq!(a0, vec![1, 2, 3]);
    }
}
