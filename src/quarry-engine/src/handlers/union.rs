//! Union handler.

use std::collections::HashSet;

use arrow::array::UInt32Array;
use arrow::compute::cast;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::row::{RowConverter, SortField};

use common_error::{QuarryError, QuarryResult};
use quarry_logical::{LogicalOp, LogicalPlan};

use super::unexpected_op;
use crate::context::SessionContext;
use crate::converter::PlanConverter;
use crate::reconcile::SchemaReconciler;
use crate::registry::RelHandler;
use crate::table::{Frame, ResultTable};

/// Concatenates any number of inputs in order.
///
/// Each input is aligned to the node's row type and every column cast to the
/// exact row-type type, so partitions from different inputs share a schema.
/// With `distinct`, only the first occurrence of each row is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionHandler;

impl RelHandler for UnionHandler {
    fn convert(
        &self,
        node: &LogicalPlan,
        converter: &PlanConverter,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable> {
        let LogicalOp::Union(union) = node.op() else {
            return Err(unexpected_op("Union", node));
        };
        if node.inputs().is_empty() {
            return Err(QuarryError::input_arity(node.kind().name(), 1, 0));
        }
        let inputs = converter.convert_all_inputs(node, ctx)?;

        let schema = node.row_type().to_arrow();
        let mut partitions = Vec::new();
        for input in &inputs {
            let aligned = SchemaReconciler::align_columns(input, &node.row_type().field_names())?;
            for batch in aligned.frontend_batches()? {
                partitions.push(conform(&batch, &schema)?);
            }
        }

        let mut frame = Frame::try_new(schema, partitions)?;
        if union.distinct {
            frame = distinct(&frame)?;
        }
        SchemaReconciler::reconcile(&ResultTable::from_frame(frame)?, node.row_type())
    }
}

/// Cast `batch` column by column to `schema`'s types and names.
fn conform(batch: &RecordBatch, schema: &SchemaRef) -> QuarryResult<RecordBatch> {
    let columns = batch
        .columns()
        .iter()
        .zip(schema.fields())
        .map(|(column, field)| {
            if column.data_type() == field.data_type() {
                Ok(column.clone())
            } else {
                Ok(cast(column, field.data_type())?)
            }
        })
        .collect::<QuarryResult<Vec<_>>>()?;
    Ok(RecordBatch::try_new_with_options(
        schema.clone(),
        columns,
        &RecordBatchOptions::new().with_row_count(Some(batch.num_rows())),
    )?)
}

/// Keep the first occurrence of every distinct row.
fn distinct(frame: &Frame) -> QuarryResult<Frame> {
    let batch = frame.concat()?;
    if batch.num_columns() == 0 {
        return frame.slice(0, Some(batch.num_rows().min(1)));
    }

    let fields = batch
        .schema()
        .fields()
        .iter()
        .map(|f| SortField::new(f.data_type().clone()))
        .collect();
    let converter = RowConverter::new(fields)?;
    let rows = converter.convert_columns(batch.columns())?;

    let mut seen = HashSet::with_capacity(rows.num_rows());
    let mut keep = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if seen.insert(row) {
            keep.push(i as u32);
        }
    }
    frame.take(&UInt32Array::from(keep))
}
