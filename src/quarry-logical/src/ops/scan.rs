//! Table scan operator.

use serde::{Deserialize, Serialize};

/// Scan of a table registered in the session catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOp {
    /// Table name.
    pub table: String,
    /// Indices of the table columns to read, in output order.
    pub projection: Option<Vec<usize>>,
}

impl ScanOp {
    /// Scan every column of a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            projection: None,
        }
    }

    /// Read only the columns at `indices`.
    #[must_use]
    pub fn with_projection(mut self, indices: Vec<usize>) -> Self {
        self.projection = Some(indices);
        self
    }
}
