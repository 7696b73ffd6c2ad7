//! Union operator.

use serde::{Deserialize, Serialize};

/// N-ary union of inputs with positionally compatible columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionOp {
    /// Remove duplicate rows.
    pub distinct: bool,
}

impl UnionOp {
    /// `UNION ALL`.
    pub const fn all() -> Self {
        Self { distinct: false }
    }

    /// `UNION` with duplicate elimination.
    pub const fn distinct() -> Self {
        Self { distinct: true }
    }
}
