//! Binary operators for logical expressions.

use quarry_core::{DataType, TypeCategory};
use serde::{Deserialize, Serialize};

/// Binary operators for logical expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic operators
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Subtract,
    /// Multiplication (*)
    Multiply,
    /// Division (/)
    Divide,
    /// Modulo (%)
    Modulo,

    // Comparison operators
    /// Equality (=)
    Eq,
    /// Inequality (<>)
    NotEq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtEq,

    // Logical operators
    /// Logical AND
    And,
    /// Logical OR
    Or,
}

impl BinaryOp {
    /// Check if this is an arithmetic operator.
    pub const fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide | Self::Modulo
        )
    }

    /// Check if this is a comparison operator.
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }

    /// Check if this is a logical operator.
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Get the result type of this operator given input types.
    ///
    /// Arithmetic widens to `Int64` or `Float64`. Returns `None` if the
    /// operation is not valid for the given types.
    pub fn result_type(&self, left: &DataType, right: &DataType) -> Option<DataType> {
        let (lc, rc) = (left.category(), right.category());
        if self.is_arithmetic() {
            return match (lc, rc) {
                (TypeCategory::Integer, TypeCategory::Integer | TypeCategory::Null)
                | (TypeCategory::Null, TypeCategory::Integer) => Some(DataType::Int64),
                (
                    TypeCategory::Float,
                    TypeCategory::Integer | TypeCategory::Float | TypeCategory::Null,
                )
                | (TypeCategory::Integer | TypeCategory::Null, TypeCategory::Float) => {
                    Some(DataType::Float64)
                }
                _ => None,
            };
        }
        if self.is_comparison() {
            let comparable = lc == rc
                || lc == TypeCategory::Null
                || rc == TypeCategory::Null
                || (left.is_numeric() && right.is_numeric());
            return comparable.then_some(DataType::Boolean);
        }
        let boolish = |c: TypeCategory| matches!(c, TypeCategory::Boolean | TypeCategory::Null);
        (boolish(lc) && boolish(rc)).then_some(DataType::Boolean)
    }

    /// Get the operator symbol.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_widening() {
        assert_eq!(
            BinaryOp::Add.result_type(&DataType::Int32, &DataType::Int16),
            Some(DataType::Int64)
        );
        assert_eq!(
            BinaryOp::Multiply.result_type(&DataType::Int64, &DataType::Float32),
            Some(DataType::Float64)
        );
        assert_eq!(
            BinaryOp::Add.result_type(&DataType::Utf8, &DataType::Int64),
            None
        );
    }

    #[test]
    fn test_comparison_types() {
        assert_eq!(
            BinaryOp::Lt.result_type(&DataType::Int64, &DataType::Float64),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOp::Eq.result_type(&DataType::Utf8, &DataType::Utf8),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOp::Eq.result_type(&DataType::Utf8, &DataType::Int64),
            None
        );
    }

    #[test]
    fn test_logical_requires_boolean() {
        assert_eq!(
            BinaryOp::And.result_type(&DataType::Boolean, &DataType::Null),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOp::Or.result_type(&DataType::Boolean, &DataType::Int64),
            None
        );
    }
}
