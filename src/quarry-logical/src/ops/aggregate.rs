//! Aggregate operator for grouping and aggregation.

use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;

/// Aggregate operator. Output columns are the grouping keys followed by the
/// aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOp {
    /// Grouping expressions.
    pub group_by: Vec<LogicalExpr>,
    /// Aggregate expressions, each an aggregate call, optionally aliased.
    pub aggs: Vec<LogicalExpr>,
}

impl AggregateOp {
    /// Create a grouped aggregation.
    pub const fn new(group_by: Vec<LogicalExpr>, aggs: Vec<LogicalExpr>) -> Self {
        Self { group_by, aggs }
    }

    /// Aggregate the whole input into a single row.
    pub const fn ungrouped(aggs: Vec<LogicalExpr>) -> Self {
        Self::new(Vec::new(), aggs)
    }
}
