//! Logical plan structure for Quarry.
//!
//! A `LogicalPlan` is a tree of operator nodes as handed over by the planner.
//! Every node carries its operator payload, its ordered inputs and its row
//! type. The tree is immutable once built and borrowed during conversion.

use common_error::QuarryResult;
use quarry_core::Schema;
use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;
use crate::ops::{
    AggregateOp, EmptyOp, ExtensionOp, FilterOp, LimitOp, LogicalOp, OperatorKind, ProjectOp,
    ScanOp, SortKey, SortOp, UnionOp,
};
use crate::schema_inference::SchemaInference;

/// A node in a logical plan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalPlan {
    op: LogicalOp,
    inputs: Vec<LogicalPlan>,
    row_type: Schema,
}

impl LogicalPlan {
    /// Create a node from its parts. The row type is taken as given.
    pub fn new(op: LogicalOp, inputs: Vec<Self>, row_type: Schema) -> Self {
        Self {
            op,
            inputs,
            row_type,
        }
    }

    /// Create a node and infer its row type from its inputs.
    pub fn try_new(op: LogicalOp, inputs: Vec<Self>) -> QuarryResult<Self> {
        let input_schemas: Vec<&Schema> = inputs.iter().map(Self::row_type).collect();
        let row_type = SchemaInference::infer_node(&op, &input_schemas)?;
        Ok(Self::new(op, inputs, row_type))
    }

    /// The dispatch tag of this node.
    pub fn kind(&self) -> OperatorKind {
        self.op.kind()
    }

    /// The operator payload.
    pub const fn op(&self) -> &LogicalOp {
        &self.op
    }

    /// Ordered input nodes.
    pub fn inputs(&self) -> &[Self] {
        &self.inputs
    }

    /// Ordered output columns of this node.
    pub const fn row_type(&self) -> &Schema {
        &self.row_type
    }

    /// Replace the row type, as a planner does when it renames output columns.
    #[must_use]
    pub fn with_row_type(mut self, row_type: Schema) -> Self {
        self.row_type = row_type;
        self
    }

    /// Generate a tree-formatted explanation of the plan.
    pub fn explain(&self) -> String {
        let mut output = String::new();
        self.explain_into(&mut output, 0);
        output
    }

    fn explain_into(&self, output: &mut String, indent: usize) {
        if indent > 0 {
            output.push('\n');
        }
        output.push_str(&"  ".repeat(indent));
        output.push_str(&self.op.explain_self());
        output.push_str(" -> [");
        output.push_str(&self.row_type.column_names().join(", "));
        output.push(']');
        for input in &self.inputs {
            input.explain_into(output, indent + 1);
        }
    }

    /// Count the number of operators in the plan.
    pub fn operator_count(&self) -> usize {
        1 + self.inputs.iter().map(Self::operator_count).sum::<usize>()
    }

    /// Get the maximum depth of the plan tree.
    pub fn depth(&self) -> usize {
        1 + self.inputs.iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Operator kinds in post-order (inputs before their consumer).
    pub fn post_order_kinds(&self) -> Vec<OperatorKind> {
        let mut kinds = Vec::with_capacity(self.operator_count());
        self.collect_post_order(&mut kinds);
        kinds
    }

    fn collect_post_order(&self, kinds: &mut Vec<OperatorKind>) {
        for input in &self.inputs {
            input.collect_post_order(kinds);
        }
        kinds.push(self.kind());
    }
}

impl std::fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.explain())
    }
}

/// Builder for constructing logical plans fluently, inferring each node's
/// row type the way a planner would.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    plan: LogicalPlan,
}

impl PlanBuilder {
    /// Start from an existing plan.
    pub const fn from_plan(plan: LogicalPlan) -> Self {
        Self { plan }
    }

    /// Start building from a table scan. `table_schema` is the catalog's
    /// description of the table.
    pub fn scan(scan: ScanOp, table_schema: &Schema) -> QuarryResult<Self> {
        let row_type = match &scan.projection {
            Some(indices) => table_schema.project(indices)?,
            None => table_schema.clone(),
        };
        Ok(Self::from_plan(LogicalPlan::new(
            LogicalOp::TableScan(scan),
            Vec::new(),
            row_type,
        )))
    }

    /// Start from an empty relation.
    pub fn empty(produce_one_row: bool) -> Self {
        Self::from_plan(LogicalPlan::new(
            LogicalOp::EmptyRelation(EmptyOp { produce_one_row }),
            Vec::new(),
            Schema::new(),
        ))
    }

    fn wrap(self, op: LogicalOp) -> QuarryResult<Self> {
        Ok(Self::from_plan(LogicalPlan::try_new(op, vec![self.plan])?))
    }

    /// Add a filter.
    pub fn filter(self, predicate: LogicalExpr) -> QuarryResult<Self> {
        self.wrap(LogicalOp::Filter(FilterOp::new(predicate)))
    }

    /// Add a projection.
    pub fn project(self, exprs: Vec<LogicalExpr>) -> QuarryResult<Self> {
        self.wrap(LogicalOp::Projection(ProjectOp::new(exprs)))
    }

    /// Add an aggregation.
    pub fn aggregate(
        self,
        group_by: Vec<LogicalExpr>,
        aggs: Vec<LogicalExpr>,
    ) -> QuarryResult<Self> {
        self.wrap(LogicalOp::Aggregate(AggregateOp::new(group_by, aggs)))
    }

    /// Add a sort.
    pub fn sort(self, keys: Vec<SortKey>) -> QuarryResult<Self> {
        self.wrap(LogicalOp::Sort(SortOp::new(keys)))
    }

    /// Add a sort with a complete operator (keys and fetch).
    pub fn sort_op(self, sort: SortOp) -> QuarryResult<Self> {
        self.wrap(LogicalOp::Sort(sort))
    }

    /// Add a limit.
    pub fn limit(self, skip: usize, fetch: Option<usize>) -> QuarryResult<Self> {
        self.wrap(LogicalOp::Limit(LimitOp { skip, fetch }))
    }

    /// Union the current plan with `others`, in order.
    pub fn union(self, others: Vec<LogicalPlan>, distinct: bool) -> QuarryResult<Self> {
        let mut inputs = Vec::with_capacity(others.len() + 1);
        inputs.push(self.plan);
        inputs.extend(others);
        Ok(Self::from_plan(LogicalPlan::try_new(
            LogicalOp::Union(UnionOp { distinct }),
            inputs,
        )?))
    }

    /// Wrap the current plan in a user-defined node with a known row type.
    #[must_use]
    pub fn extension(self, op: ExtensionOp, row_type: Schema) -> Self {
        Self::from_plan(LogicalPlan::new(
            LogicalOp::Extension(op),
            vec![self.plan],
            row_type,
        ))
    }

    /// Override the row type of the current node.
    #[must_use]
    pub fn with_row_type(self, row_type: Schema) -> Self {
        Self::from_plan(self.plan.with_row_type(row_type))
    }

    /// Row type of the current node.
    pub const fn row_type(&self) -> &Schema {
        self.plan.row_type()
    }

    /// Finish building.
    pub fn build(self) -> LogicalPlan {
        self.plan
    }
}
