//! Aggregate functions for logical expressions.

use quarry_core::{DataType, TypeCategory};
use serde::{Deserialize, Serialize};

use super::LogicalExpr;

/// Aggregate function types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggFunc {
    /// Count rows (no arguments) or non-null values.
    Count,
    /// Sum of values
    Sum,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Average value
    Avg,
    /// User-defined aggregate resolved through the function registry.
    Udf(String),
}

impl AggFunc {
    /// Get the result type of this built-in aggregate given its input type.
    ///
    /// Returns `None` for user-defined aggregates and for inputs the function
    /// does not accept.
    pub fn result_type(&self, input: &DataType) -> Option<DataType> {
        match self {
            Self::Count => Some(DataType::Int64),
            Self::Sum => match input.category() {
                TypeCategory::Integer => Some(DataType::Int64),
                TypeCategory::Float => Some(DataType::Float64),
                _ => None,
            },
            Self::Min | Self::Max => match input.category() {
                TypeCategory::Integer
                | TypeCategory::Float
                | TypeCategory::String
                | TypeCategory::Temporal
                | TypeCategory::Boolean => Some(*input),
                _ => None,
            },
            Self::Avg => input.is_numeric().then_some(DataType::Float64),
            Self::Udf(_) => None,
        }
    }

    /// Get the function name for display.
    pub fn name(&self) -> &str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Avg => "AVG",
            Self::Udf(name) => name,
        }
    }
}

impl std::fmt::Display for AggFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An aggregate call: function, arguments and modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggExpr {
    /// The aggregate function.
    pub func: AggFunc,
    /// Argument expressions. Empty for `COUNT(*)`.
    pub args: Vec<LogicalExpr>,
    /// Whether DISTINCT is applied to the argument values.
    pub distinct: bool,
    /// Declared result type. Required for user-defined aggregates.
    pub return_type: Option<DataType>,
}

impl AggExpr {
    /// Create a new single-argument aggregate expression.
    pub fn new(func: AggFunc, expr: LogicalExpr) -> Self {
        Self {
            func,
            args: vec![expr],
            distinct: false,
            return_type: None,
        }
    }

    /// `COUNT(*)`.
    pub fn count_star() -> Self {
        Self {
            func: AggFunc::Count,
            args: Vec::new(),
            distinct: false,
            return_type: None,
        }
    }

    /// Call of a user-defined aggregate.
    pub fn udf(name: impl Into<String>, args: Vec<LogicalExpr>) -> Self {
        Self {
            func: AggFunc::Udf(name.into()),
            args,
            distinct: false,
            return_type: None,
        }
    }

    /// Set DISTINCT flag.
    #[must_use]
    pub const fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Set the declared result type.
    #[must_use]
    pub const fn with_return_type(mut self, return_type: DataType) -> Self {
        self.return_type = Some(return_type);
        self
    }

    /// Get the output column name for this aggregate.
    pub fn output_name(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for AggExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.func)?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        if self.args.is_empty() {
            write!(f, "*")?;
        } else {
            let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
            write!(f, "{}", args.join(", "))?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agg_result_types() {
        assert_eq!(
            AggFunc::Sum.result_type(&DataType::Int32),
            Some(DataType::Int64)
        );
        assert_eq!(
            AggFunc::Avg.result_type(&DataType::Int64),
            Some(DataType::Float64)
        );
        assert_eq!(AggFunc::Sum.result_type(&DataType::Utf8), None);
        assert_eq!(
            AggFunc::Max.result_type(&DataType::Utf8),
            Some(DataType::Utf8)
        );
        assert_eq!(AggFunc::Udf("median".into()).result_type(&DataType::Int64), None);
    }

    #[test]
    fn test_agg_output_name() {
        assert_eq!(AggExpr::count_star().output_name(), "COUNT(*)");
        let agg = AggExpr::new(AggFunc::Count, LogicalExpr::column("x")).with_distinct(true);
        assert_eq!(agg.output_name(), "COUNT(DISTINCT x)");
    }
}
