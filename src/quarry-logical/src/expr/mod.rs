//! Expression trees for logical plans.

mod agg;
mod binary;
mod expression;
mod func;
mod unary;

pub use agg::{AggExpr, AggFunc};
pub use binary::BinaryOp;
pub use expression::LogicalExpr;
pub use func::FuncExpr;
pub use unary::UnaryOp;

use quarry_core::{DataType, Value};

/// Column reference.
pub fn col(name: impl Into<String>) -> LogicalExpr {
    LogicalExpr::column(name)
}

/// Literal value.
pub fn lit(value: impl Into<Value>) -> LogicalExpr {
    LogicalExpr::literal(value)
}

/// Call of a registered function.
pub fn call(name: impl Into<String>, args: Vec<LogicalExpr>) -> LogicalExpr {
    LogicalExpr::Function(FuncExpr::new(name, args))
}

/// Call of a registered function whose result type the planner already knows.
pub fn call_typed(
    name: impl Into<String>,
    args: Vec<LogicalExpr>,
    return_type: DataType,
) -> LogicalExpr {
    LogicalExpr::Function(FuncExpr::new(name, args).with_return_type(return_type))
}

/// `COUNT(*)`.
pub fn count_star() -> LogicalExpr {
    LogicalExpr::Aggregate(AggExpr::count_star())
}

/// `COUNT(expr)`.
pub fn count(expr: LogicalExpr) -> LogicalExpr {
    LogicalExpr::Aggregate(AggExpr::new(AggFunc::Count, expr))
}

/// `SUM(expr)`.
pub fn sum(expr: LogicalExpr) -> LogicalExpr {
    LogicalExpr::Aggregate(AggExpr::new(AggFunc::Sum, expr))
}

/// `MIN(expr)`.
pub fn min(expr: LogicalExpr) -> LogicalExpr {
    LogicalExpr::Aggregate(AggExpr::new(AggFunc::Min, expr))
}

/// `MAX(expr)`.
pub fn max(expr: LogicalExpr) -> LogicalExpr {
    LogicalExpr::Aggregate(AggExpr::new(AggFunc::Max, expr))
}

/// `AVG(expr)`.
pub fn avg(expr: LogicalExpr) -> LogicalExpr {
    LogicalExpr::Aggregate(AggExpr::new(AggFunc::Avg, expr))
}

/// Call of a registered aggregate function.
pub fn agg_call(
    name: impl Into<String>,
    args: Vec<LogicalExpr>,
    return_type: DataType,
) -> LogicalExpr {
    LogicalExpr::Aggregate(AggExpr::udf(name, args).with_return_type(return_type))
}
