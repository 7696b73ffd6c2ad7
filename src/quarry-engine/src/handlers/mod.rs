//! Built-in conversion handlers, one per relational operator.
//!
//! | Kind | Arity | Notes |
//! |------|-------|-------|
//! | `TableScan` | 0 | catalog lookup, optional column projection |
//! | `Filter` | 1 | predicate per partition |
//! | `Projection` | 1 | bare columns share their backend |
//! | `Aggregate` | 1 | hash grouping, built-in and user aggregates |
//! | `Sort` | 1 | coalesces to one partition |
//! | `Limit` | 1 | skip/fetch across partitions |
//! | `Union` | n | inputs cast to the node's row type |
//! | `EmptyRelation` | 0 | zero rows or one zero-column row |
//!
//! Every handler finishes by reconciling its output with the node's row type.

mod aggregate;
mod empty;
mod filter;
mod limit;
mod project;
mod scan;
mod sort;
mod union;

use std::sync::Arc;

use common_error::QuarryError;
use quarry_logical::{LogicalPlan, OperatorKind};

use crate::registry::{HandlerRegistry, RelHandler};

pub use aggregate::AggregateHandler;
pub use empty::EmptyHandler;
pub use filter::FilterHandler;
pub use limit::LimitHandler;
pub use project::ProjectHandler;
pub use scan::ScanHandler;
pub use sort::SortHandler;
pub use union::UnionHandler;

/// Install a handler for every built-in operator kind, replacing any already
/// present.
pub fn register_builtin_handlers(registry: &mut HandlerRegistry) {
    let builtins: [(OperatorKind, Arc<dyn RelHandler>); 8] = [
        (OperatorKind::TableScan, Arc::new(ScanHandler)),
        (OperatorKind::Filter, Arc::new(FilterHandler)),
        (OperatorKind::Projection, Arc::new(ProjectHandler)),
        (OperatorKind::Aggregate, Arc::new(AggregateHandler)),
        (OperatorKind::Sort, Arc::new(SortHandler)),
        (OperatorKind::Limit, Arc::new(LimitHandler)),
        (OperatorKind::Union, Arc::new(UnionHandler)),
        (OperatorKind::EmptyRelation, Arc::new(EmptyHandler)),
    ];
    for (kind, handler) in builtins {
        // Replacing never fails.
        let _ = registry.register(kind, handler, true);
    }
}

/// The payload a handler was dispatched for did not match its kind.
fn unexpected_op(expected: &str, node: &LogicalPlan) -> QuarryError {
    QuarryError::internal(format!(
        "{expected} handler received a {} node",
        node.kind()
    ))
}
