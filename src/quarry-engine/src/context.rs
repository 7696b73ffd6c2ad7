//! Session context: configuration, catalog and the two registries.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use log::debug;

use common_config::QuarryConfig;
use common_error::{QuarryError, QuarryResult};
use quarry_core::DataType;
use quarry_logical::{LogicalPlan, OperatorKind};

use crate::catalog::{Catalog, MemTable};
use crate::converter::PlanConverter;
use crate::functions::{AggregateUdf, FunctionRegistry, ScalarUdf, Signature};
use crate::handlers::register_builtin_handlers;
use crate::metrics::{ExecutionTimer, MetricsSink};
use crate::reconcile::SchemaReconciler;
use crate::registry::{HandlerRegistry, RelHandler};
use crate::result::ExecutionResult;
use crate::table::ResultTable;

/// Everything plan conversion needs, owned by one session.
///
/// Handlers see the context read-only; registration goes through `&mut self`.
#[derive(Debug, Clone)]
pub struct SessionContext {
    config: QuarryConfig,
    catalog: Catalog,
    handlers: HandlerRegistry,
    functions: FunctionRegistry,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// A session with default configuration and the built-in handlers.
    pub fn new() -> Self {
        Self::with_config(QuarryConfig::default())
    }

    /// A session with the given configuration and the built-in handlers.
    pub fn with_config(config: QuarryConfig) -> Self {
        let mut handlers = HandlerRegistry::new();
        register_builtin_handlers(&mut handlers);
        Self {
            config,
            catalog: Catalog::new(),
            handlers,
            functions: FunctionRegistry::new(),
        }
    }

    /// A session with no handlers at all.
    pub fn bare(config: QuarryConfig) -> Self {
        Self {
            config,
            catalog: Catalog::new(),
            handlers: HandlerRegistry::new(),
            functions: FunctionRegistry::new(),
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &QuarryConfig {
        &self.config
    }

    /// Registered tables.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Conversion handlers, one per operator kind.
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Registered user-defined functions.
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Register an in-memory table, replacing any table of the same name.
    pub fn register_table(&mut self, name: impl Into<String>, table: MemTable) {
        self.catalog.register_table(name, table);
    }

    /// Register a batch as a table split by `execution.partition_rows`.
    pub fn register_batch(
        &mut self,
        name: impl Into<String>,
        batch: RecordBatch,
    ) -> QuarryResult<()> {
        self.catalog
            .register_batch(name, batch, self.config.execution.partition_rows)?;
        Ok(())
    }

    /// Register pre-partitioned batches as a table.
    pub fn register_batches(
        &mut self,
        name: impl Into<String>,
        batches: Vec<RecordBatch>,
    ) -> QuarryResult<()> {
        let Some(first) = batches.first() else {
            return Err(QuarryError::invalid_parameter(
                "register_batches needs at least one batch",
            ));
        };
        let table = MemTable::try_new(first.schema(), batches)?;
        self.catalog.register_table(name, table);
        Ok(())
    }

    /// Remove a table, returning whether it existed.
    pub fn deregister_table(&mut self, name: &str) -> bool {
        self.catalog.deregister(name).is_some()
    }

    /// Register a scalar function overload.
    pub fn register_function(
        &mut self,
        udf: ScalarUdf,
        name: &str,
        signature: impl Into<Signature>,
        return_type: Option<DataType>,
        replace: bool,
    ) -> QuarryResult<()> {
        self.functions
            .register_scalar(name, signature.into(), udf, return_type, replace)
    }

    /// Register an aggregate function overload.
    pub fn register_aggregation(
        &mut self,
        udaf: AggregateUdf,
        name: &str,
        signature: impl Into<Signature>,
        return_type: DataType,
        replace: bool,
    ) -> QuarryResult<()> {
        self.functions
            .register_aggregate(name, signature.into(), udaf, return_type, replace)
    }

    /// Register a conversion handler for an operator kind.
    pub fn register_handler(
        &mut self,
        kind: OperatorKind,
        handler: impl RelHandler + 'static,
        replace: bool,
    ) -> QuarryResult<()> {
        self.handlers.register(kind, Arc::new(handler), replace)
    }

    fn converter(&self) -> PlanConverter {
        if self.config.conversion.collect_metrics {
            PlanConverter::new().with_metrics(MetricsSink::new())
        } else {
            PlanConverter::new()
        }
    }

    /// Convert `plan` into a computed result without materializing it.
    pub fn convert(&self, plan: &LogicalPlan) -> QuarryResult<ResultTable> {
        self.converter().convert(plan, self)
    }

    /// Convert `plan`, check the root against its row type and materialize
    /// the rows.
    pub fn execute(&self, plan: &LogicalPlan) -> QuarryResult<ExecutionResult> {
        let converter = self.converter();
        let timer = ExecutionTimer::start();
        let result = converter.convert(plan, self)?;
        if self.config.conversion.check_terminal_schema {
            SchemaReconciler::assert_schema(&result, plan.row_type())?;
        }
        let batch = result.to_record_batch()?;
        let elapsed = timer.stop();
        debug!("executed plan: {} row(s) in {elapsed:?}", batch.num_rows());
        Ok(ExecutionResult::new(
            batch,
            converter.metrics().cloned(),
            elapsed,
        ))
    }

    /// Execute `plan` and return only its rows.
    pub fn collect(&self, plan: &LogicalPlan) -> QuarryResult<RecordBatch> {
        Ok(self.execute(plan)?.into_batch())
    }
}
