//! User-defined operator kinds.

use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;

/// A node kind the engine knows nothing about; a handler registered for
/// `OperatorKind::Extension(name)` gives it meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionOp {
    /// Kind name, the dispatch key.
    pub name: String,
    /// Expressions the handler may interpret.
    pub exprs: Vec<LogicalExpr>,
}

impl ExtensionOp {
    /// Create an extension payload without expressions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exprs: Vec::new(),
        }
    }

    /// Attach expressions.
    #[must_use]
    pub fn with_exprs(mut self, exprs: Vec<LogicalExpr>) -> Self {
        self.exprs = exprs;
        self
    }
}
