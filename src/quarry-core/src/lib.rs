//! Core data model for Quarry.
//!
//! This crate provides the fundamental types shared by the planner-facing IR
//! and the engine:
//! - `DataType` and `TypeCategory` for the semantic type system
//! - `Value` for scalar runtime values
//! - `Schema` for the ordered row type a plan node produces

pub mod schema;
pub mod types;

// Re-export commonly used types
pub use schema::{ColumnInfo, Schema};
pub use types::{DataType, TypeCategory, Value};
