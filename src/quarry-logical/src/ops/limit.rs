//! Limit operator for row limiting.

use serde::{Deserialize, Serialize};

/// Limit operator - skips then limits rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOp {
    /// Rows to skip first.
    pub skip: usize,
    /// Maximum number of rows after skipping; `None` keeps the rest.
    pub fetch: Option<usize>,
}

impl LimitOp {
    /// Keep at most `fetch` rows.
    pub const fn new(fetch: usize) -> Self {
        Self {
            skip: 0,
            fetch: Some(fetch),
        }
    }

    /// Add an offset.
    #[must_use]
    pub const fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }
}
