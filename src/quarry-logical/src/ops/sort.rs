//! Sort operator.

use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;

/// Sort key specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    /// Expression to sort by.
    pub expr: LogicalExpr,

    /// Sort direction (ascending if true).
    pub ascending: bool,

    /// Nulls first (if true, NULLs come before non-NULLs).
    pub nulls_first: bool,
}

impl SortKey {
    /// Create a new ascending sort key with nulls last.
    pub const fn asc(expr: LogicalExpr) -> Self {
        Self {
            expr,
            ascending: true,
            nulls_first: false,
        }
    }

    /// Create a new descending sort key with nulls first.
    pub const fn desc(expr: LogicalExpr) -> Self {
        Self {
            expr,
            ascending: false,
            nulls_first: true,
        }
    }

    /// Order NULLs before every value.
    #[must_use]
    pub const fn nulls_first(mut self) -> Self {
        self.nulls_first = true;
        self
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dir = if self.ascending { "ASC" } else { "DESC" };
        let nulls = if self.nulls_first {
            "NULLS FIRST"
        } else {
            "NULLS LAST"
        };
        write!(f, "{} {dir} {nulls}", self.expr)
    }
}

/// Sort operator - lexicographic row ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortOp {
    /// Sort keys in order of precedence.
    pub keys: Vec<SortKey>,
    /// Keep only the first `fetch` rows of the ordering.
    pub fetch: Option<usize>,
}

impl SortOp {
    /// Create a new sort operation.
    pub const fn new(keys: Vec<SortKey>) -> Self {
        Self { keys, fetch: None }
    }

    /// Create a single-key ascending sort.
    pub fn asc(expr: LogicalExpr) -> Self {
        Self::new(vec![SortKey::asc(expr)])
    }

    /// Create a single-key descending sort.
    pub fn desc(expr: LogicalExpr) -> Self {
        Self::new(vec![SortKey::desc(expr)])
    }

    /// Add an ascending sort key.
    #[must_use]
    pub fn then_asc(mut self, expr: LogicalExpr) -> Self {
        self.keys.push(SortKey::asc(expr));
        self
    }

    /// Add a descending sort key.
    #[must_use]
    pub fn then_desc(mut self, expr: LogicalExpr) -> Self {
        self.keys.push(SortKey::desc(expr));
        self
    }

    /// Stop after the first `fetch` rows.
    #[must_use]
    pub const fn with_fetch(mut self, fetch: usize) -> Self {
        self.fetch = Some(fetch);
        self
    }
}

impl std::fmt::Display for SortOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self
            .keys
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "Sort({keys})")?;
        if let Some(fetch) = self.fetch {
            write!(f, " fetch={fetch}")?;
        }
        Ok(())
    }
}
