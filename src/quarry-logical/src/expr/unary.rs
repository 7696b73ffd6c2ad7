//! Unary operators for logical expressions.

use quarry_core::{DataType, TypeCategory};
use serde::{Deserialize, Serialize};

/// Unary operators for logical expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical NOT
    Not,
    /// Arithmetic negation (-)
    Neg,
    /// NULL check (IS NULL)
    IsNull,
    /// NOT NULL check (IS NOT NULL)
    IsNotNull,
}

impl UnaryOp {
    /// Get the result type of this operator given the input type.
    ///
    /// Returns `None` if the operation is not valid for the given type.
    pub fn result_type(&self, input: &DataType) -> Option<DataType> {
        match self {
            Self::Not => matches!(
                input.category(),
                TypeCategory::Boolean | TypeCategory::Null
            )
            .then_some(DataType::Boolean),
            Self::Neg => input.is_numeric().then_some(*input),
            Self::IsNull | Self::IsNotNull => Some(DataType::Boolean),
        }
    }

    /// Get the operator name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Not => "NOT",
            Self::Neg => "-",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    /// Whether the operator is written after its operand.
    pub const fn is_postfix(&self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
