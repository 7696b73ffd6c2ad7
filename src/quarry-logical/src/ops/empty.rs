//! Empty relation operator.

use serde::{Deserialize, Serialize};

/// A relation with no input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyOp {
    /// Produce one row with no columns instead of zero rows.
    pub produce_one_row: bool,
}
