//! Partitioned Arrow data behind a result table.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, UInt32Array};
use arrow::compute::{cast, concat_batches, filter_record_batch, take};
use arrow::datatypes::{DataType as ArrowDataType, Field, Schema as ArrowSchema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use common_error::{QuarryError, QuarryResult};

/// Record batches sharing one schema whose field names are backend names.
///
/// A frame always holds at least one partition; an empty frame holds a single
/// zero-row batch so that column types stay known.
#[derive(Debug, Clone)]
pub struct Frame {
    schema: SchemaRef,
    partitions: Vec<RecordBatch>,
}

impl Frame {
    /// Create a frame, checking that every partition matches `schema`.
    pub fn try_new(schema: SchemaRef, partitions: Vec<RecordBatch>) -> QuarryResult<Self> {
        let mut seen = HashSet::new();
        for field in schema.fields() {
            if !seen.insert(field.name().as_str()) {
                return Err(QuarryError::DuplicateColumn(field.name().clone()));
            }
        }
        for (i, batch) in partitions.iter().enumerate() {
            if batch.schema().fields() != schema.fields() {
                return Err(QuarryError::schema_error(format!(
                    "partition {i} does not match the frame schema"
                )));
            }
        }
        if partitions.is_empty() {
            return Ok(Self::empty(schema));
        }
        Ok(Self { schema, partitions })
    }

    /// A frame with no rows.
    pub fn empty(schema: SchemaRef) -> Self {
        let batch = RecordBatch::new_empty(schema.clone());
        Self {
            schema,
            partitions: vec![batch],
        }
    }

    /// A single-partition frame.
    pub fn from_batch(batch: RecordBatch) -> QuarryResult<Self> {
        Self::try_new(batch.schema(), vec![batch])
    }

    /// Build a frame from per-partition columns, in field order.
    ///
    /// `num_rows` supplies the row count of each partition, which matters
    /// only when there are no columns.
    pub fn from_columns(
        fields: Vec<Field>,
        columns: Vec<Vec<ArrayRef>>,
        num_rows: &[usize],
    ) -> QuarryResult<Self> {
        let schema = Arc::new(ArrowSchema::new(fields));
        let partitions = columns
            .into_iter()
            .zip(num_rows)
            .map(|(cols, &rows)| {
                RecordBatch::try_new_with_options(
                    schema.clone(),
                    cols,
                    &RecordBatchOptions::new().with_row_count(Some(rows)),
                )
                .map_err(QuarryError::from)
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        Self::try_new(schema, partitions)
    }

    /// The backend schema.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// All partitions.
    pub fn partitions(&self) -> &[RecordBatch] {
        &self.partitions
    }

    /// Number of partitions.
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Total number of rows.
    pub fn num_rows(&self) -> usize {
        self.partitions.iter().map(RecordBatch::num_rows).sum()
    }

    /// Row count of every partition.
    pub fn partition_rows(&self) -> Vec<usize> {
        self.partitions.iter().map(RecordBatch::num_rows).collect()
    }

    /// Position of a backend column.
    pub fn index_of(&self, name: &str) -> QuarryResult<usize> {
        self.schema
            .index_of(name)
            .map_err(|_| QuarryError::ColumnNotFound(name.to_string()))
    }

    /// Field of a backend column.
    pub fn field(&self, name: &str) -> QuarryResult<&Field> {
        Ok(self.schema.field(self.index_of(name)?))
    }

    /// Whether a backend column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.schema.index_of(name).is_ok()
    }

    /// Backend names currently in use.
    pub fn column_names(&self) -> Vec<String> {
        self.schema.fields().iter().map(|f| f.name().clone()).collect()
    }

    /// A backend name not used by this frame, derived from `base`.
    pub fn fresh_name(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|name| !self.contains(name))
            .unwrap_or_else(|| base.to_string())
    }

    /// Keep only the named backend columns, in the given order.
    pub fn select(&self, names: &[&str]) -> QuarryResult<Self> {
        let indices = names
            .iter()
            .map(|name| self.index_of(name))
            .collect::<QuarryResult<Vec<_>>>()?;
        self.select_indices(&indices)
    }

    /// Keep only the columns at `indices`, in the given order.
    pub fn select_indices(&self, indices: &[usize]) -> QuarryResult<Self> {
        let schema = Arc::new(self.schema.project(indices)?);
        let partitions = self
            .partitions
            .iter()
            .map(|batch| batch.project(indices).map_err(QuarryError::from))
            .collect::<QuarryResult<Vec<_>>>()?;
        Self::try_new(schema, partitions)
    }

    /// Append new backend columns; `columns` holds one array per new field
    /// for every partition.
    pub fn append_columns(
        &self,
        fields: Vec<Field>,
        columns: Vec<Vec<ArrayRef>>,
    ) -> QuarryResult<Self> {
        if columns.len() != self.partitions.len() {
            return Err(QuarryError::internal(format!(
                "{} column sets for {} partitions",
                columns.len(),
                self.partitions.len()
            )));
        }
        let mut all_fields: Vec<_> = self.schema.fields().iter().cloned().collect();
        all_fields.extend(fields.into_iter().map(Arc::new));
        let schema = Arc::new(ArrowSchema::new(all_fields));

        let partitions = self
            .partitions
            .iter()
            .zip(columns)
            .map(|(batch, extra)| {
                let mut arrays = batch.columns().to_vec();
                arrays.extend(extra);
                RecordBatch::try_new_with_options(
                    schema.clone(),
                    arrays,
                    &RecordBatchOptions::new().with_row_count(Some(batch.num_rows())),
                )
                .map_err(QuarryError::from)
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        Self::try_new(schema, partitions)
    }

    /// Cast backend column `name` to `to` in every partition.
    ///
    /// The result is stored under `as_name`; when that differs from `name`
    /// the cast column is appended and the original is kept.
    pub fn cast_column(
        &self,
        name: &str,
        to: &ArrowDataType,
        as_name: &str,
    ) -> QuarryResult<Self> {
        let index = self.index_of(name)?;
        // Failed casts turn into nulls, so the cast column is always nullable.
        let new_field = Arc::new(Field::new(as_name, to.clone(), true));

        let mut fields: Vec<_> = self.schema.fields().iter().cloned().collect();
        let replace = name == as_name;
        if replace {
            fields[index] = new_field;
        } else {
            fields.push(new_field);
        }
        let schema = Arc::new(ArrowSchema::new(fields));

        let partitions = self
            .partitions
            .iter()
            .map(|batch| {
                let casted = cast(batch.column(index), to)?;
                let mut columns = batch.columns().to_vec();
                if replace {
                    columns[index] = casted;
                } else {
                    columns.push(casted);
                }
                RecordBatch::try_new_with_options(
                    schema.clone(),
                    columns,
                    &RecordBatchOptions::new().with_row_count(Some(batch.num_rows())),
                )
                .map_err(QuarryError::from)
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        Self::try_new(schema, partitions)
    }

    /// Keep the rows selected by one mask per partition.
    pub fn filter(&self, masks: &[BooleanArray]) -> QuarryResult<Self> {
        if masks.len() != self.partitions.len() {
            return Err(QuarryError::internal(format!(
                "{} filter masks for {} partitions",
                masks.len(),
                self.partitions.len()
            )));
        }
        let partitions = self
            .partitions
            .iter()
            .zip(masks)
            .map(|(batch, mask)| filter_record_batch(batch, mask).map_err(QuarryError::from))
            .collect::<QuarryResult<Vec<_>>>()?;
        Self::try_new(self.schema.clone(), partitions)
    }

    /// Skip `skip` rows, then keep at most `fetch` rows, across partitions.
    pub fn slice(&self, skip: usize, fetch: Option<usize>) -> QuarryResult<Self> {
        let mut to_skip = skip;
        let mut remaining = fetch.unwrap_or(usize::MAX);
        let mut partitions = Vec::new();

        for batch in &self.partitions {
            if remaining == 0 {
                break;
            }
            let rows = batch.num_rows();
            if to_skip >= rows {
                to_skip -= rows;
                continue;
            }
            let len = (rows - to_skip).min(remaining);
            partitions.push(batch.slice(to_skip, len));
            remaining -= len;
            to_skip = 0;
        }
        Self::try_new(self.schema.clone(), partitions)
    }

    /// Gather rows by position in partition order into a single partition.
    pub fn take(&self, indices: &UInt32Array) -> QuarryResult<Self> {
        let batch = self.concat()?;
        let columns = batch
            .columns()
            .iter()
            .map(|column| take(column.as_ref(), indices, None))
            .collect::<Result<Vec<_>, _>>()?;
        let taken = RecordBatch::try_new_with_options(
            self.schema.clone(),
            columns,
            &RecordBatchOptions::new().with_row_count(Some(indices.len())),
        )?;
        Self::from_batch(taken)
    }

    /// All rows in one batch.
    pub fn concat(&self) -> QuarryResult<RecordBatch> {
        if let [single] = self.partitions.as_slice() {
            return Ok(single.clone());
        }
        Ok(concat_batches(&self.schema, &self.partitions)?)
    }

    /// The same rows in a single partition.
    pub fn coalesce(&self) -> QuarryResult<Self> {
        Self::from_batch(self.concat()?)
    }
}
