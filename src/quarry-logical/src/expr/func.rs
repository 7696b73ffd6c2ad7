//! Function call expressions.

use quarry_core::DataType;
use serde::{Deserialize, Serialize};

use super::LogicalExpr;

/// Call of a scalar function from the session's function registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncExpr {
    /// Function name, matched case-insensitively.
    pub name: String,
    /// Function arguments.
    pub args: Vec<LogicalExpr>,
    /// Return type, if the planner knows it.
    pub return_type: Option<DataType>,
}

impl FuncExpr {
    /// Create a new function expression.
    pub fn new(name: impl Into<String>, args: Vec<LogicalExpr>) -> Self {
        Self {
            name: name.into(),
            args,
            return_type: None,
        }
    }

    /// Set the return type.
    #[must_use]
    pub const fn with_return_type(mut self, return_type: DataType) -> Self {
        self.return_type = Some(return_type);
        self
    }
}

impl std::fmt::Display for FuncExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}
