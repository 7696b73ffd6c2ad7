//! Logical expression tree.
//!
//! Expressions appear in predicates, projections, grouping keys, sort keys and
//! aggregate calls. Column references always use frontend (logical) names.

use std::collections::BTreeSet;

use common_error::{QuarryError, QuarryResult};
use quarry_core::{ColumnInfo, DataType, Schema, Value};
use serde::{Deserialize, Serialize};

use super::{AggExpr, AggFunc, BinaryOp, FuncExpr, UnaryOp};

/// A logical expression in a plan node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalExpr {
    /// A column reference by frontend name.
    Column(String),

    /// A literal constant value.
    Literal(Value),

    /// A binary operation.
    Binary {
        /// Left operand.
        left: Box<Self>,
        /// Binary operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Self>,
    },

    /// A unary operation.
    Unary {
        /// Unary operator.
        op: UnaryOp,
        /// Operand.
        expr: Box<Self>,
    },

    /// A type cast.
    Cast {
        /// Expression to cast.
        expr: Box<Self>,
        /// Target type.
        data_type: DataType,
    },

    /// A scalar function call.
    Function(FuncExpr),

    /// An aggregate call (only valid in an Aggregate node).
    Aggregate(AggExpr),

    /// An aliased expression.
    Alias {
        /// Original expression.
        expr: Box<Self>,
        /// Alias name.
        alias: String,
    },
}

impl LogicalExpr {
    // ========== Constructors ==========

    /// Create a column reference.
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    /// Create a literal expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a binary expression.
    pub fn binary(left: Self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a unary expression.
    pub fn unary(op: UnaryOp, expr: Self) -> Self {
        Self::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    /// Create an aliased expression.
    #[must_use]
    pub fn alias(self, alias: impl Into<String>) -> Self {
        Self::Alias {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }

    /// Create a cast expression.
    #[must_use]
    pub fn cast(self, data_type: DataType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            data_type,
        }
    }

    // ========== Convenience builders ==========

    /// Create an AND expression.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::And, other)
    }

    /// Create an OR expression.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Or, other)
    }

    /// Create a NOT expression.
    #[must_use]
    pub fn logical_not(self) -> Self {
        Self::unary(UnaryOp::Not, self)
    }

    /// Create a negation expression.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::unary(UnaryOp::Neg, self)
    }

    /// Create an equality expression.
    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Eq, other)
    }

    /// Create an inequality expression.
    #[must_use]
    pub fn not_eq(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::NotEq, other)
    }

    /// Create a less than expression.
    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Lt, other)
    }

    /// Create a less than or equal expression.
    #[must_use]
    pub fn lt_eq(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::LtEq, other)
    }

    /// Create a greater than expression.
    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Gt, other)
    }

    /// Create a greater than or equal expression.
    #[must_use]
    pub fn gt_eq(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::GtEq, other)
    }

    /// Create an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::unary(UnaryOp::IsNull, self)
    }

    /// Create an IS NOT NULL expression.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::unary(UnaryOp::IsNotNull, self)
    }

    /// Create an addition expression.
    #[must_use]
    pub fn add_expr(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Add, other)
    }

    /// Create a subtraction expression.
    #[must_use]
    pub fn sub_expr(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Subtract, other)
    }

    /// Create a multiplication expression.
    #[must_use]
    pub fn mul_expr(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Multiply, other)
    }

    /// Create a division expression.
    #[must_use]
    pub fn div_expr(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Divide, other)
    }

    /// Create a modulo expression.
    #[must_use]
    pub fn mod_expr(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Modulo, other)
    }

    // ========== Analysis methods ==========

    /// Get all column references in this expression, sorted.
    pub fn column_refs(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        self.collect_column_refs(&mut refs);
        refs
    }

    fn collect_column_refs(&self, refs: &mut BTreeSet<String>) {
        match self {
            Self::Column(name) => {
                refs.insert(name.clone());
            }
            Self::Binary { left, right, .. } => {
                left.collect_column_refs(refs);
                right.collect_column_refs(refs);
            }
            Self::Unary { expr, .. } | Self::Cast { expr, .. } | Self::Alias { expr, .. } => {
                expr.collect_column_refs(refs);
            }
            Self::Function(FuncExpr { args, .. }) | Self::Aggregate(AggExpr { args, .. }) => {
                for arg in args {
                    arg.collect_column_refs(refs);
                }
            }
            Self::Literal(_) => {}
        }
    }

    /// Check if this expression contains any aggregate calls.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Self::Aggregate(_) => true,
            Self::Binary { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Self::Unary { expr, .. } | Self::Cast { expr, .. } | Self::Alias { expr, .. } => {
                expr.contains_aggregate()
            }
            Self::Function(func) => func.args.iter().any(Self::contains_aggregate),
            Self::Column(_) | Self::Literal(_) => false,
        }
    }

    /// Check if this expression is a simple column reference.
    pub const fn is_column(&self) -> bool {
        matches!(self, Self::Column(_))
    }

    /// Strip any aliases.
    pub fn unalias(&self) -> &Self {
        match self {
            Self::Alias { expr, .. } => expr.unalias(),
            other => other,
        }
    }

    /// Get the output name for this expression.
    pub fn output_name(&self) -> String {
        match self {
            Self::Column(name) => name.clone(),
            Self::Alias { alias, .. } => alias.clone(),
            other => other.to_string(),
        }
    }

    /// Resolve the result type of this expression against an input schema.
    pub fn resolve_type(&self, schema: &Schema) -> QuarryResult<DataType> {
        match self {
            Self::Column(name) => schema
                .column(name)
                .map(|c| c.data_type)
                .ok_or_else(|| QuarryError::ColumnNotFound(name.clone())),
            Self::Literal(v) => Ok(v.data_type()),
            Self::Binary { left, op, right } => {
                let left_type = left.resolve_type(schema)?;
                let right_type = right.resolve_type(schema)?;
                op.result_type(&left_type, &right_type).ok_or_else(|| {
                    QuarryError::type_error(format!(
                        "cannot apply {op} to {left_type} and {right_type}"
                    ))
                })
            }
            Self::Unary { op, expr } => {
                let input_type = expr.resolve_type(schema)?;
                op.result_type(&input_type).ok_or_else(|| {
                    QuarryError::type_error(format!("cannot apply {op} to {input_type}"))
                })
            }
            Self::Cast { data_type, .. } => Ok(*data_type),
            Self::Alias { expr, .. } => expr.resolve_type(schema),
            Self::Function(func) => func.return_type.ok_or_else(|| {
                QuarryError::type_error(format!(
                    "result type of {func} is unknown; declare a return type"
                ))
            }),
            Self::Aggregate(agg) => {
                if let Some(ty) = agg.return_type {
                    return Ok(ty);
                }
                let input_type = match agg.args.first() {
                    Some(arg) => arg.resolve_type(schema)?,
                    None if agg.func == AggFunc::Count => return Ok(DataType::Int64),
                    None => {
                        return Err(QuarryError::type_error(format!(
                            "{} requires an argument",
                            agg.func
                        )))
                    }
                };
                agg.func.result_type(&input_type).ok_or_else(|| {
                    QuarryError::type_error(format!("cannot apply {} to {input_type}", agg.func))
                })
            }
        }
    }

    /// Output column this expression produces over an input schema.
    ///
    /// Bare column references keep the input's nullability.
    pub fn to_column_info(&self, schema: &Schema) -> QuarryResult<ColumnInfo> {
        let data_type = self.resolve_type(schema)?;
        let nullable = match self.unalias() {
            Self::Column(name) => schema.column(name).map_or(true, |c| c.nullable),
            Self::Aggregate(AggExpr {
                func: AggFunc::Count,
                ..
            }) => false,
            _ => true,
        };
        Ok(ColumnInfo::new(self.output_name(), data_type).with_nullable(nullable))
    }
}

impl std::fmt::Display for LogicalExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Column(name) => write!(f, "{name}"),
            Self::Literal(v) => write!(f, "{v}"),
            Self::Binary { left, op, right } => write!(f, "({left} {op} {right})"),
            Self::Unary { op, expr } => {
                if op.is_postfix() {
                    write!(f, "{expr} {op}")
                } else {
                    write!(f, "{op} {expr}")
                }
            }
            Self::Cast { expr, data_type } => write!(f, "CAST({expr} AS {data_type})"),
            Self::Function(func) => write!(f, "{func}"),
            Self::Aggregate(agg) => write!(f, "{agg}"),
            Self::Alias { expr, alias } => write!(f, "{expr} AS {alias}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{call, col, count_star, lit, sum};

    fn schema() -> Schema {
        let mut schema = Schema::from_pairs([
            ("a", DataType::Int32),
            ("b", DataType::Float64),
            ("s", DataType::Utf8),
        ]);
        schema.columns[0].nullable = false;
        schema
    }

    #[test]
    fn test_expression_building() {
        let expr = col("a").gt(lit(1i64)).and(col("s").is_not_null());
        assert_eq!(expr.to_string(), "((a > 1) AND s IS NOT NULL)");
        assert_eq!(
            expr.column_refs().into_iter().collect::<Vec<_>>(),
            vec!["a", "s"]
        );
    }

    #[test]
    fn test_resolve_types() {
        let schema = schema();
        assert_eq!(
            col("a").add_expr(col("b")).resolve_type(&schema).unwrap(),
            DataType::Float64
        );
        assert_eq!(
            col("a").mul_expr(lit(2i64)).resolve_type(&schema).unwrap(),
            DataType::Int64
        );
        assert!(matches!(
            col("zzz").resolve_type(&schema),
            Err(QuarryError::ColumnNotFound(_))
        ));
        assert!(matches!(
            col("s").add_expr(lit(1i64)).resolve_type(&schema),
            Err(QuarryError::TypeError(_))
        ));
    }

    #[test]
    fn test_untyped_function_call_needs_return_type() {
        let err = call("f", vec![col("a")]).resolve_type(&schema()).unwrap_err();
        assert!(err.to_string().contains("f(a)"));
    }

    #[test]
    fn test_output_columns() {
        let schema = schema();
        let info = col("a").to_column_info(&schema).unwrap();
        assert!(!info.nullable);

        let info = sum(col("a")).alias("total").to_column_info(&schema).unwrap();
        assert_eq!(info.name, "total");
        assert_eq!(info.data_type, DataType::Int64);

        let info = count_star().to_column_info(&schema).unwrap();
        assert_eq!(info.name, "COUNT(*)");
        assert!(!info.nullable);
    }

    #[test]
    fn test_contains_aggregate() {
        assert!(sum(col("a")).alias("x").contains_aggregate());
        assert!(!col("a").add_expr(lit(1i64)).contains_aggregate());
    }
}
