//! In-memory table catalog.

use std::collections::{HashMap, HashSet};

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use log::debug;

use common_error::{QuarryError, QuarryResult};

/// A named in-memory table: one Arrow schema, any number of partitions.
#[derive(Debug, Clone)]
pub struct MemTable {
    schema: SchemaRef,
    partitions: Vec<RecordBatch>,
}

impl MemTable {
    /// Create a table. Field names must be unique and every partition must
    /// match `schema`.
    pub fn try_new(schema: SchemaRef, partitions: Vec<RecordBatch>) -> QuarryResult<Self> {
        let mut seen = HashSet::new();
        for field in schema.fields() {
            if !seen.insert(field.name()) {
                return Err(QuarryError::DuplicateColumn(field.name().clone()));
            }
        }
        if let Some(i) = partitions
            .iter()
            .position(|batch| batch.schema().fields() != schema.fields())
        {
            return Err(QuarryError::schema_error(format!(
                "partition {i} does not match the table schema"
            )));
        }
        Ok(Self { schema, partitions })
    }

    /// Split `batch` into partitions of at most `partition_rows` rows.
    pub fn from_batch(batch: RecordBatch, partition_rows: usize) -> QuarryResult<Self> {
        if partition_rows == 0 {
            return Err(QuarryError::invalid_parameter(
                "partition_rows must be greater than zero",
            ));
        }
        let rows = batch.num_rows();
        let partitions = (0..rows)
            .step_by(partition_rows)
            .map(|offset| batch.slice(offset, partition_rows.min(rows - offset)))
            .collect();
        Self::try_new(batch.schema(), partitions)
    }

    /// The table schema.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The table's partitions.
    pub fn partitions(&self) -> &[RecordBatch] {
        &self.partitions
    }

    /// Total number of rows.
    pub fn num_rows(&self) -> usize {
        self.partitions.iter().map(RecordBatch::num_rows).sum()
    }
}

/// Tables visible to a session, by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: HashMap<String, MemTable>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a table. Returns the replaced table, if any.
    pub fn register_table(&mut self, name: impl Into<String>, table: MemTable) -> Option<MemTable> {
        let name = name.into();
        debug!(
            "registering table '{name}' ({} rows, {} partitions)",
            table.num_rows(),
            table.partitions().len()
        );
        self.tables.insert(name, table)
    }

    /// Register a single batch, split into partitions of `partition_rows`.
    pub fn register_batch(
        &mut self,
        name: impl Into<String>,
        batch: RecordBatch,
        partition_rows: usize,
    ) -> QuarryResult<Option<MemTable>> {
        let table = MemTable::from_batch(batch, partition_rows)?;
        Ok(self.register_table(name, table))
    }

    /// Remove a table.
    pub fn deregister(&mut self, name: &str) -> Option<MemTable> {
        self.tables.remove(name)
    }

    /// Look a table up.
    pub fn table(&self, name: &str) -> QuarryResult<&MemTable> {
        self.tables
            .get(name)
            .ok_or_else(|| QuarryError::TableNotFound(name.to_string()))
    }

    /// Registered table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }
}
