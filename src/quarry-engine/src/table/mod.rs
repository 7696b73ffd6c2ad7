//! Computed results of plan conversion.
//!
//! A [`ResultTable`] pairs a [`Frame`] of partitioned Arrow data with a
//! [`ColumnContainer`] naming its columns the way the planner does.

mod container;
mod frame;

pub use container::ColumnContainer;
pub use frame::Frame;

use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::datatypes::{Field, Schema as ArrowSchema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use common_error::{QuarryError, QuarryResult};

/// The output of converting one plan node.
#[derive(Debug, Clone)]
pub struct ResultTable {
    frame: Frame,
    columns: ColumnContainer,
}

impl ResultTable {
    /// Create a result table. Every backend name in `columns` must exist in
    /// `frame`.
    pub fn new(frame: Frame, columns: ColumnContainer) -> QuarryResult<Self> {
        for (frontend, backend) in columns.iter() {
            if !frame.contains(backend) {
                return Err(QuarryError::internal(format!(
                    "column '{frontend}' refers to missing backend column '{backend}'"
                )));
            }
        }
        Ok(Self { frame, columns })
    }

    /// Expose every backend column under its own name.
    pub fn from_frame(frame: Frame) -> QuarryResult<Self> {
        let columns = ColumnContainer::identity(frame.column_names())?;
        Ok(Self { frame, columns })
    }

    /// A single-partition result with identity naming.
    pub fn from_batch(batch: RecordBatch) -> QuarryResult<Self> {
        Self::from_frame(Frame::from_batch(batch)?)
    }

    /// The backing data.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// The frontend-to-backend mapping.
    pub fn columns(&self) -> &ColumnContainer {
        &self.columns
    }

    /// Split into data and naming.
    pub fn into_parts(self) -> (Frame, ColumnContainer) {
        (self.frame, self.columns)
    }

    /// Frontend names in order.
    pub fn frontend_names(&self) -> Vec<String> {
        self.columns.frontend_names()
    }

    /// Total number of rows.
    pub fn num_rows(&self) -> usize {
        self.frame.num_rows()
    }

    /// Number of partitions.
    pub fn num_partitions(&self) -> usize {
        self.frame.num_partitions()
    }

    /// Arrow schema of the frontend view.
    pub fn frontend_schema(&self) -> QuarryResult<SchemaRef> {
        let fields = self
            .columns
            .iter()
            .map(|(frontend, backend)| {
                let field = self.frame.field(backend)?;
                Ok(Field::new(
                    frontend,
                    field.data_type().clone(),
                    field.is_nullable(),
                ))
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(Arc::new(ArrowSchema::new(fields)))
    }

    /// Partition `index` with columns named and ordered by frontend names.
    pub fn frontend_batch(&self, index: usize) -> QuarryResult<RecordBatch> {
        let schema = self.frontend_schema()?;
        self.view(&schema, index)
    }

    /// Every partition as a frontend view.
    pub fn frontend_batches(&self) -> QuarryResult<Vec<RecordBatch>> {
        let schema = self.frontend_schema()?;
        (0..self.frame.num_partitions())
            .map(|i| self.view(&schema, i))
            .collect()
    }

    fn view(&self, schema: &SchemaRef, index: usize) -> QuarryResult<RecordBatch> {
        let batch = self.frame.partitions().get(index).ok_or_else(|| {
            QuarryError::internal(format!(
                "partition {index} out of range for {} partitions",
                self.frame.num_partitions()
            ))
        })?;
        let columns = self
            .columns
            .iter()
            .map(|(_, backend)| Ok(batch.column(self.frame.index_of(backend)?).clone()))
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(RecordBatch::try_new_with_options(
            schema.clone(),
            columns,
            &RecordBatchOptions::new().with_row_count(Some(batch.num_rows())),
        )?)
    }

    /// Materialize all rows as one batch named by frontend names.
    pub fn to_record_batch(&self) -> QuarryResult<RecordBatch> {
        let schema = self.frontend_schema()?;
        let mut batches = (0..self.frame.num_partitions())
            .map(|i| self.view(&schema, i))
            .collect::<QuarryResult<Vec<_>>>()?;
        if batches.len() == 1 {
            return Ok(batches.remove(0));
        }
        Ok(concat_batches(&schema, &batches)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{AsArray, Int64Array, StringArray};
    use arrow::datatypes::{DataType as ArrowDataType, Int64Type};

    fn frame() -> Frame {
        let schema = Arc::new(ArrowSchema::new(vec![
            Field::new("c0", ArrowDataType::Int64, false),
            Field::new("c1", ArrowDataType::Utf8, true),
        ]));
        let p0 = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec!["a", "b"])),
            ],
        )
        .unwrap();
        let p1 = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![3])),
                Arc::new(StringArray::from(vec!["c"])),
            ],
        )
        .unwrap();
        Frame::try_new(schema, vec![p0, p1]).unwrap()
    }

    #[test]
    fn test_missing_backend_rejected() {
        let columns = ColumnContainer::from_pairs([("x", "nope")]).unwrap();
        assert!(ResultTable::new(frame(), columns).is_err());
    }

    #[test]
    fn test_frontend_view_reorders_and_shares() {
        let columns =
            ColumnContainer::from_pairs([("name", "c1"), ("id", "c0"), ("id2", "c0")]).unwrap();
        let table = ResultTable::new(frame(), columns).unwrap();

        let batch = table.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.schema().field(0).name(), "name");
        assert_eq!(batch.schema().field(2).name(), "id2");
        let ids = batch.column(2).as_primitive::<Int64Type>();
        assert_eq!(ids.values().to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_column_view_keeps_row_count() {
        let table = ResultTable::new(frame(), ColumnContainer::new()).unwrap();
        let batch = table.frontend_batch(0).unwrap();
        assert_eq!(batch.num_columns(), 0);
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(table.to_record_batch().unwrap().num_rows(), 3);
    }
}
