//! Logical operators for query plans.

mod aggregate;
mod empty;
mod extension;
mod filter;
mod limit;
mod project;
mod scan;
mod sort;
mod union;

pub use aggregate::AggregateOp;
pub use empty::EmptyOp;
pub use extension::ExtensionOp;
pub use filter::FilterOp;
pub use limit::LimitOp;
pub use project::ProjectOp;
pub use scan::ScanOp;
pub use sort::{SortKey, SortOp};
pub use union::UnionOp;

use serde::{Deserialize, Serialize};

/// Operator-kind tag: the dispatch key for plan conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperatorKind {
    TableScan,
    Filter,
    Projection,
    Aggregate,
    Sort,
    Limit,
    Union,
    EmptyRelation,
    /// A user-defined node kind, identified by name.
    Extension(String),
}

impl OperatorKind {
    /// Get the name of this kind.
    pub fn name(&self) -> &str {
        match self {
            Self::TableScan => "TableScan",
            Self::Filter => "Filter",
            Self::Projection => "Projection",
            Self::Aggregate => "Aggregate",
            Self::Sort => "Sort",
            Self::Limit => "Limit",
            Self::Union => "Union",
            Self::EmptyRelation => "EmptyRelation",
            Self::Extension(name) => name,
        }
    }

    /// All built-in kinds.
    pub fn builtins() -> [Self; 8] {
        [
            Self::TableScan,
            Self::Filter,
            Self::Projection,
            Self::Aggregate,
            Self::Sort,
            Self::Limit,
            Self::Union,
            Self::EmptyRelation,
        ]
    }
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Operator payload of a plan node. Inputs live on the node itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalOp {
    /// Scan a catalog table.
    TableScan(ScanOp),
    /// Filter rows based on a predicate.
    Filter(FilterOp),
    /// Compute output columns.
    Projection(ProjectOp),
    /// Group and aggregate rows.
    Aggregate(AggregateOp),
    /// Order rows.
    Sort(SortOp),
    /// Skip and limit rows.
    Limit(LimitOp),
    /// Concatenate inputs.
    Union(UnionOp),
    /// Relation with no input.
    EmptyRelation(EmptyOp),
    /// User-defined node kind.
    Extension(ExtensionOp),
}

impl LogicalOp {
    /// The dispatch tag of this operator.
    pub fn kind(&self) -> OperatorKind {
        match self {
            Self::TableScan(_) => OperatorKind::TableScan,
            Self::Filter(_) => OperatorKind::Filter,
            Self::Projection(_) => OperatorKind::Projection,
            Self::Aggregate(_) => OperatorKind::Aggregate,
            Self::Sort(_) => OperatorKind::Sort,
            Self::Limit(_) => OperatorKind::Limit,
            Self::Union(_) => OperatorKind::Union,
            Self::EmptyRelation(_) => OperatorKind::EmptyRelation,
            Self::Extension(ext) => OperatorKind::Extension(ext.name.clone()),
        }
    }

    /// One-line description used by `LogicalPlan::explain`.
    pub fn explain_self(&self) -> String {
        fn join<T: std::fmt::Display>(items: &[T]) -> String {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            Self::TableScan(op) => match &op.projection {
                Some(indices) => format!("TableScan({}, projection={indices:?})", op.table),
                None => format!("TableScan({})", op.table),
            },
            Self::Filter(op) => format!("Filter({})", op.predicate),
            Self::Projection(op) => format!("Projection({})", join(&op.exprs)),
            Self::Aggregate(op) => format!(
                "Aggregate(group_by=[{}], aggs=[{}])",
                join(&op.group_by),
                join(&op.aggs)
            ),
            Self::Sort(op) => op.to_string(),
            Self::Limit(op) => match op.fetch {
                Some(fetch) => format!("Limit(skip={}, fetch={fetch})", op.skip),
                None => format!("Limit(skip={})", op.skip),
            },
            Self::Union(op) => {
                if op.distinct {
                    "Union(distinct)".to_string()
                } else {
                    "Union(all)".to_string()
                }
            }
            Self::EmptyRelation(op) => {
                format!("EmptyRelation(produce_one_row={})", op.produce_one_row)
            }
            Self::Extension(op) => format!("{}({})", op.name, join(&op.exprs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(OperatorKind::TableScan.to_string(), "TableScan");
        assert_eq!(OperatorKind::Extension("Sample".into()).name(), "Sample");
        assert_eq!(
            LogicalOp::Extension(ExtensionOp::new("Sample")).kind(),
            OperatorKind::Extension("Sample".into())
        );
    }

    #[test]
    fn test_builtin_kinds_are_distinct() {
        let kinds = OperatorKind::builtins();
        let unique: std::collections::BTreeSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }
}
