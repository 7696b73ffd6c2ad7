//! Plan interpretation engine for Quarry.
//!
//! This crate turns a `LogicalPlan` tree into computed Arrow data by
//! dispatching every node to a handler registered for its operator kind.

#![allow(clippy::missing_const_for_fn)] // Builder patterns often can't be const
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)] // Row indices fit in u32
#![allow(clippy::module_name_repetitions)]
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  LogicalPlan    │ ──▶ │  PlanConverter   │ ──▶ │   ResultTable    │
//! │ (quarry-logical)│     │ (post-order)     │     │ Frame + columns  │
//! └─────────────────┘     └──────────────────┘     └──────────────────┘
//!                                │
//!                                ▼
//!                  HandlerRegistry ── RelHandler per OperatorKind
//! ```
//!
//! # Key Components
//!
//! - [`HandlerRegistry`]: operator kind to [`RelHandler`] storage
//! - [`PlanConverter`]: recursive dispatch; handlers convert their own inputs
//! - [`SchemaReconciler`]: `align_columns`, `assert_schema`, `coerce_types`
//! - [`FunctionRegistry`]: overloaded scalar, row-mode and aggregate UDFs
//! - [`SessionContext`]: owns the registries, the catalog and configuration
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use arrow::array::Int64Array;
//! use arrow::datatypes::{DataType as ArrowDataType, Field, Schema as ArrowSchema};
//! use arrow::record_batch::RecordBatch;
//! use quarry_core::{DataType, Schema};
//! use quarry_engine::SessionContext;
//! use quarry_logical::expr::{col, lit};
//! use quarry_logical::{PlanBuilder, ScanOp};
//!
//! let batch = RecordBatch::try_new(
//!     Arc::new(ArrowSchema::new(vec![Field::new("v", ArrowDataType::Int64, false)])),
//!     vec![Arc::new(Int64Array::from(vec![1, 2, 3]))],
//! )?;
//! let mut ctx = SessionContext::new();
//! ctx.register_batch("t", batch)?;
//!
//! let table = Schema::from_pairs([("v", DataType::Int64)]);
//! let plan = PlanBuilder::scan(ScanOp::new("t"), &table)?
//!     .filter(col("v").gt(lit(1i64)))?
//!     .build();
//! assert_eq!(ctx.collect(&plan)?.num_rows(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod context;
pub mod converter;
pub mod expr;
pub mod functions;
pub mod handlers;
pub mod metrics;
pub mod reconcile;
pub mod registry;
pub mod result;
pub mod table;

pub use catalog::{Catalog, MemTable};
pub use context::SessionContext;
pub use converter::PlanConverter;
pub use expr::ExprEvaluator;
pub use functions::{
    AggregateUdf, FunctionEntry, FunctionId, FunctionKind, FunctionRegistry, Row, ScalarUdf,
    Signature,
};
pub use metrics::{ExecutionTimer, MetricsSink, OperatorMetrics};
pub use reconcile::SchemaReconciler;
pub use registry::{HandlerRegistry, RelHandler};
pub use result::ExecutionResult;
pub use table::{ColumnContainer, Frame, ResultTable};
