//! Projection operator.

use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;

/// Projection operator - computes one output column per expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectOp {
    /// Output expressions, in output order.
    pub exprs: Vec<LogicalExpr>,
}

impl ProjectOp {
    /// Create a new projection.
    pub const fn new(exprs: Vec<LogicalExpr>) -> Self {
        Self { exprs }
    }

    /// Project bare column references.
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(LogicalExpr::column).collect())
    }
}
