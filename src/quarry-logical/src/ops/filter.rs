//! Filter operator for predicate-based filtering.

use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;

/// Filter operator - predicate-based row filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOp {
    /// Filter predicate (must evaluate to bool). Null counts as false.
    pub predicate: LogicalExpr,
}

impl FilterOp {
    /// Create a new filter operation.
    pub const fn new(predicate: LogicalExpr) -> Self {
        Self { predicate }
    }
}
