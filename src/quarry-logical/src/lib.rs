//! Logical plan IR for Quarry.
//!
//! `quarry-logical` is the contract between a query planner and the engine:
//!
//! - **Expressions**: column references, literals, operators, casts, scalar
//!   and aggregate function calls
//! - **Operators**: the payload of each plan node, tagged by `OperatorKind`
//! - **Plans**: trees of nodes, each with ordered inputs and a row type
//! - **Plan building**: a fluent builder that infers row types
//!
//! # Example
//!
//! ```rust
//! use quarry_core::{DataType, Schema};
//! use quarry_logical::expr::{col, lit};
//! use quarry_logical::{PlanBuilder, ScanOp};
//!
//! let table = Schema::from_pairs([("name", DataType::Utf8), ("age", DataType::Int64)]);
//! let plan = PlanBuilder::scan(ScanOp::new("people"), &table)?
//!     .filter(col("age").gt(lit(18i64)))?
//!     .project(vec![col("name")])?
//!     .limit(0, Some(10))?
//!     .build();
//!
//! assert_eq!(plan.row_type().column_names(), vec!["name"]);
//! # Ok::<(), common_error::QuarryError>(())
//! ```

pub mod expr;
pub mod ops;
mod plan;
mod schema_inference;

pub use plan::{LogicalPlan, PlanBuilder};
pub use schema_inference::SchemaInference;

pub use ops::{
    AggregateOp, EmptyOp, ExtensionOp, FilterOp, LimitOp, LogicalOp, OperatorKind, ProjectOp,
    ScanOp, SortKey, SortOp, UnionOp,
};

pub use expr::{AggExpr, AggFunc, BinaryOp, FuncExpr, LogicalExpr, UnaryOp};
