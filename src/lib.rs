//! Quarry - logical-plan interpretation engine
//!
//! Quarry converts logical plan trees into Arrow data through pluggable
//! per-operator handlers, reconciles result columns with each node's row
//! type, and resolves calls to overloaded user-defined functions.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_config as config;
pub use common_error as error;
pub use quarry_core as core;
pub use quarry_engine as engine;
pub use quarry_logical as logical;

pub use common_error::{QuarryError, QuarryResult};
pub use quarry_engine::SessionContext;

/// Quarry version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
