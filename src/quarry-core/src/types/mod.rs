//! Type system for Quarry values.
//!
//! `DataType` is the planner's semantic type; every variant maps to exactly
//! one native Arrow type. `TypeCategory` groups types into the broad families
//! used to decide whether a column needs a cast.

mod data_type;
mod value;

pub use data_type::{DataType, TypeCategory};
pub use value::Value;
