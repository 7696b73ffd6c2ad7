//! Error types and result aliases for Quarry.
//!
//! Every failure raised while converting a plan or registering a function is a
//! [`QuarryError`]. None of them are recovered locally: an error aborts the
//! conversion that raised it.

mod error;

pub use error::{QuarryError, QuarryResult};
