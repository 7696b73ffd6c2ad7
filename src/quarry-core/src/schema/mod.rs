//! Row types for plan nodes.

mod schema_impl;

pub use schema_impl::{ColumnInfo, Schema};
