//! Row-type inference for logical operators.
//!
//! The planner normally supplies every node's row type. `PlanBuilder` uses
//! these rules to play that role.

use std::collections::HashSet;

use common_error::{QuarryError, QuarryResult};
use quarry_core::{ColumnInfo, DataType, Schema, TypeCategory};

use crate::expr::LogicalExpr;
use crate::ops::{AggregateOp, LogicalOp, ProjectOp, SortOp};

/// Schema inference for logical operators.
pub struct SchemaInference;

impl SchemaInference {
    /// Infer the row type of `op` given the row types of its inputs.
    pub fn infer_node(op: &LogicalOp, inputs: &[&Schema]) -> QuarryResult<Schema> {
        match op {
            LogicalOp::TableScan(scan) => Err(QuarryError::schema_error(format!(
                "row type of a scan of '{}' comes from the catalog",
                scan.table
            ))),
            LogicalOp::EmptyRelation(_) => {
                Self::expect_inputs(op, inputs, 0)?;
                Ok(Schema::new())
            }
            LogicalOp::Filter(filter) => {
                let input = Self::single_input(op, inputs)?;
                let ty = filter.predicate.resolve_type(input)?;
                if !matches!(ty.category(), TypeCategory::Boolean | TypeCategory::Null) {
                    return Err(QuarryError::type_error(format!(
                        "filter predicate {} has type {ty}, expected Boolean",
                        filter.predicate
                    )));
                }
                Ok(input.clone())
            }
            LogicalOp::Projection(project) => {
                Self::infer_project(Self::single_input(op, inputs)?, project)
            }
            LogicalOp::Aggregate(aggregate) => {
                Self::infer_aggregate(Self::single_input(op, inputs)?, aggregate)
            }
            LogicalOp::Sort(sort) => {
                let input = Self::single_input(op, inputs)?;
                Self::check_sort(input, sort)?;
                Ok(input.clone())
            }
            LogicalOp::Limit(_) => Ok(Self::single_input(op, inputs)?.clone()),
            LogicalOp::Union(_) => Self::infer_union(inputs),
            LogicalOp::Extension(ext) => Err(QuarryError::not_implemented(format!(
                "row type of extension node '{}' must be supplied",
                ext.name
            ))),
        }
    }

    fn expect_inputs(op: &LogicalOp, inputs: &[&Schema], expected: usize) -> QuarryResult<()> {
        if inputs.len() == expected {
            Ok(())
        } else {
            Err(QuarryError::input_arity(
                op.kind().name(),
                expected,
                inputs.len(),
            ))
        }
    }

    fn single_input<'a>(op: &LogicalOp, inputs: &[&'a Schema]) -> QuarryResult<&'a Schema> {
        Self::expect_inputs(op, inputs, 1)?;
        Ok(inputs[0])
    }

    fn infer_project(input: &Schema, project: &ProjectOp) -> QuarryResult<Schema> {
        if let Some(expr) = project.exprs.iter().find(|e| e.contains_aggregate()) {
            return Err(QuarryError::type_error(format!(
                "aggregate {expr} is only valid in an Aggregate node"
            )));
        }
        Self::output_columns(input, project.exprs.iter())
    }

    fn infer_aggregate(input: &Schema, aggregate: &AggregateOp) -> QuarryResult<Schema> {
        for agg in &aggregate.aggs {
            if !matches!(agg.unalias(), LogicalExpr::Aggregate(_)) {
                return Err(QuarryError::type_error(format!(
                    "{agg} is not an aggregate call"
                )));
            }
        }
        if let Some(key) = aggregate.group_by.iter().find(|e| e.contains_aggregate()) {
            return Err(QuarryError::type_error(format!(
                "grouping key {key} contains an aggregate"
            )));
        }
        Self::output_columns(input, aggregate.group_by.iter().chain(&aggregate.aggs))
    }

    fn output_columns<'a>(
        input: &Schema,
        exprs: impl Iterator<Item = &'a LogicalExpr>,
    ) -> QuarryResult<Schema> {
        let mut seen = HashSet::new();
        let mut schema = Schema::new();
        for expr in exprs {
            let column = expr.to_column_info(input)?;
            if !seen.insert(column.name.clone()) {
                return Err(QuarryError::DuplicateColumn(column.name));
            }
            schema.add_column(column);
        }
        Ok(schema)
    }

    fn check_sort(input: &Schema, sort: &SortOp) -> QuarryResult<()> {
        for key in &sort.keys {
            key.expr.resolve_type(input)?;
        }
        Ok(())
    }

    /// Column names of the first input; per-position types must share a
    /// category, numeric mixes widen to `Float64`.
    fn infer_union(inputs: &[&Schema]) -> QuarryResult<Schema> {
        let Some((first, rest)) = inputs.split_first() else {
            return Err(QuarryError::input_arity("Union", 1, 0));
        };
        let mut columns: Vec<ColumnInfo> = first.columns.clone();
        for other in rest {
            if other.len() != columns.len() {
                return Err(QuarryError::schema_error(format!(
                    "union inputs have {} and {} columns",
                    columns.len(),
                    other.len()
                )));
            }
            for (column, theirs) in columns.iter_mut().zip(&other.columns) {
                column.data_type = Self::union_type(column, theirs.data_type)?;
                column.nullable |= theirs.nullable;
            }
        }
        Ok(Schema::with_columns(columns))
    }

    fn union_type(column: &ColumnInfo, other: DataType) -> QuarryResult<DataType> {
        let ours = column.data_type;
        if ours == other || other == DataType::Null {
            return Ok(ours);
        }
        if ours == DataType::Null {
            return Ok(other);
        }
        match (ours.category(), other.category()) {
            (a, b) if a == b => Ok(ours),
            (
                TypeCategory::Integer | TypeCategory::Float,
                TypeCategory::Integer | TypeCategory::Float,
            ) => Ok(DataType::Float64),
            _ => Err(QuarryError::type_error(format!(
                "union column '{}' mixes {ours} and {other}",
                column.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{call, col, count_star, lit};
    use crate::ops::{FilterOp, UnionOp};

    fn input() -> Schema {
        Schema::from_pairs([("a", DataType::Int32), ("b", DataType::Utf8)])
    }

    #[test]
    fn test_filter_requires_boolean() {
        let schema = input();
        let op = LogicalOp::Filter(FilterOp::new(col("a")));
        assert!(matches!(
            SchemaInference::infer_node(&op, &[&schema]),
            Err(QuarryError::TypeError(_))
        ));
    }

    #[test]
    fn test_arity_mismatch() {
        let schema = input();
        let op = LogicalOp::Filter(FilterOp::new(col("a").gt(lit(0i64))));
        let err = SchemaInference::infer_node(&op, &[&schema, &schema]).unwrap_err();
        assert!(matches!(
            err,
            QuarryError::InputArity {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_projection_rejects_duplicates_and_aggregates() {
        let schema = input();
        let op = LogicalOp::Projection(ProjectOp::new(vec![col("a"), col("b").alias("a")]));
        assert!(matches!(
            SchemaInference::infer_node(&op, &[&schema]),
            Err(QuarryError::DuplicateColumn(name)) if name == "a"
        ));

        let op = LogicalOp::Projection(ProjectOp::new(vec![count_star()]));
        assert!(SchemaInference::infer_node(&op, &[&schema]).is_err());
    }

    #[test]
    fn test_aggregate_requires_aggregate_calls() {
        let schema = input();
        let op = LogicalOp::Aggregate(AggregateOp::new(vec![col("b")], vec![col("a")]));
        assert!(SchemaInference::infer_node(&op, &[&schema]).is_err());

        let op = LogicalOp::Aggregate(AggregateOp::ungrouped(vec![count_star()]));
        let out = SchemaInference::infer_node(&op, &[&schema]).unwrap();
        assert_eq!(out.field_names(), vec!["COUNT(*)"]);
    }

    #[test]
    fn test_projection_with_typed_call() {
        let schema = input();
        let op = LogicalOp::Projection(ProjectOp::new(vec![crate::expr::call_typed(
            "f",
            vec![col("a")],
            DataType::Float64,
        )
        .alias("y")]));
        let out = SchemaInference::infer_node(&op, &[&schema]).unwrap();
        assert_eq!(out.columns[0].data_type, DataType::Float64);

        let op = LogicalOp::Projection(ProjectOp::new(vec![call("f", vec![col("a")])]));
        assert!(SchemaInference::infer_node(&op, &[&schema]).is_err());
    }

    #[test]
    fn test_union_widening() {
        let left = Schema::from_pairs([("x", DataType::Int64)]);
        let right = Schema::from_pairs([("y", DataType::Float32)]);
        let op = LogicalOp::Union(UnionOp::all());
        let out = SchemaInference::infer_node(&op, &[&left, &right]).unwrap();
        assert_eq!(out.field_names(), vec!["x"]);
        assert_eq!(out.columns[0].data_type, DataType::Float64);

        let bad = Schema::from_pairs([("y", DataType::Utf8)]);
        assert!(SchemaInference::infer_node(&op, &[&left, &bad]).is_err());
    }
}
