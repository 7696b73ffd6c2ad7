//! Integration tests for the quarry-engine crate.
//!
//! These tests drive whole plans through `SessionContext`:
//! - Function registration, overload dispatch and replacement
//! - Aggregate UDFs split into chunk and combine phases
//! - Custom operator kinds and post-order conversion
//! - Conversion failures surfaced to the caller

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use arrow::compute;
use arrow::datatypes::{
    DataType as ArrowDataType, Field, Float64Type, Int64Type, Schema as ArrowSchema,
};
use arrow::record_batch::RecordBatch;

use common_config::{ConversionConfig, ExecutionConfig, QuarryConfig};
use common_error::{QuarryError, QuarryResult};
use quarry_core::{DataType, Schema, Value};
use quarry_engine::{
    AggregateUdf, PlanConverter, RelHandler, ResultTable, ScalarUdf, SessionContext,
};
use quarry_logical::expr::{agg_call, call_typed, col, count, lit, max, min, sum};
use quarry_logical::{
    AggExpr, AggFunc, ExtensionOp, LogicalExpr, LogicalOp, LogicalPlan, OperatorKind,
    PlanBuilder, ProjectOp, ScanOp,
};

/// Five rows over groups "x" and "y", with a float column `a` and an integer
/// column `b`, split into partitions of two rows.
fn setup_context() -> SessionContext {
    let config = QuarryConfig {
        execution: ExecutionConfig::default().with_partition_rows(2),
        conversion: ConversionConfig {
            check_terminal_schema: true,
            collect_metrics: true,
        },
    };
    let mut ctx = SessionContext::with_config(config);
    let batch = RecordBatch::try_new(
        Arc::new(ArrowSchema::new(vec![
            Field::new("g", ArrowDataType::Utf8, false),
            Field::new("a", ArrowDataType::Float64, false),
            Field::new("b", ArrowDataType::Int64, false),
        ])),
        vec![
            Arc::new(StringArray::from(vec!["x", "y", "x", "y", "x"])),
            Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0, 4.0, 5.0])),
            Arc::new(Int64Array::from(vec![10, 20, 30, 40, 50])),
        ],
    )
    .unwrap();
    ctx.register_batch("t", batch).unwrap();
    ctx
}

fn table_schema() -> Schema {
    Schema::from_pairs([
        ("g", DataType::Utf8),
        ("a", DataType::Float64),
        ("b", DataType::Int64),
    ])
}

fn scan() -> PlanBuilder {
    PlanBuilder::scan(ScanOp::new("t"), &table_schema()).unwrap()
}

fn float_values(array: &ArrayRef) -> Vec<f64> {
    array.as_primitive::<Float64Type>().values().to_vec()
}

fn int_values(array: &ArrayRef) -> Vec<i64> {
    array.as_primitive::<Int64Type>().values().to_vec()
}

fn square_float() -> ScalarUdf {
    ScalarUdf::vectorized(|args: &[ArrayRef]| {
        let x = args[0].as_primitive::<Float64Type>();
        let out: Float64Array = x.iter().map(|v| v.map(|v| v * v)).collect();
        Ok(Arc::new(out) as ArrayRef)
    })
}

fn negate_int() -> ScalarUdf {
    ScalarUdf::vectorized(|args: &[ArrayRef]| {
        let x = args[0].as_primitive::<Int64Type>();
        let out: Int64Array = x.iter().map(|v| v.map(|v| -v)).collect();
        Ok(Arc::new(out) as ArrayRef)
    })
}

/// Sums an Int64 column per chunk, then sums the partials.
fn int_sum_udaf() -> AggregateUdf {
    AggregateUdf::new(
        |args: &[ArrayRef]| {
            let total = compute::sum(args[0].as_primitive::<Int64Type>()).unwrap_or(0);
            Ok(Value::Int64(total))
        },
        |partials: &[Value]| {
            let total = partials.iter().filter_map(Value::as_int64).sum();
            Ok(Value::Int64(total))
        },
    )
}

// ============================================================================
// Scalar functions
// ============================================================================

#[test]
fn test_vectorized_scalar_function() {
    let mut ctx = setup_context();
    ctx.register_function(
        square_float(),
        "F",
        vec![DataType::Float64],
        Some(DataType::Float64),
        false,
    )
    .unwrap();

    let plan = scan()
        .project(vec![
            call_typed("F", vec![col("a")], DataType::Float64).alias("sq")
        ])
        .unwrap()
        .build();
    let out = ctx.collect(&plan).unwrap();

    assert_eq!(out.schema().field(0).name(), "sq");
    assert_eq!(
        float_values(out.column(0)),
        vec![1.0, 4.0, 9.0, 16.0, 25.0]
    );
}

#[test]
fn test_overloads_dispatch_by_argument_type() {
    let mut ctx = setup_context();
    ctx.register_function(
        square_float(),
        "F",
        vec![DataType::Float64],
        Some(DataType::Float64),
        false,
    )
    .unwrap();
    ctx.register_function(
        negate_int(),
        "F",
        vec![DataType::Int64],
        Some(DataType::Int64),
        false,
    )
    .unwrap();
    assert_eq!(ctx.functions().overloads("F").len(), 2);

    let plan = scan()
        .project(vec![
            call_typed("F", vec![col("a")], DataType::Float64).alias("fa"),
            call_typed("F", vec![col("b")], DataType::Int64).alias("fb"),
        ])
        .unwrap()
        .build();
    let out = ctx.collect(&plan).unwrap();

    assert_eq!(
        float_values(out.column(0)),
        vec![1.0, 4.0, 9.0, 16.0, 25.0]
    );
    assert_eq!(int_values(out.column(1)), vec![-10, -20, -30, -40, -50]);
}

#[test]
fn test_conflicting_registration_keeps_old_body() {
    let mut ctx = setup_context();
    ctx.register_function(
        square_float(),
        "F",
        vec![DataType::Float64],
        Some(DataType::Float64),
        false,
    )
    .unwrap();

    let doubled = || {
        ScalarUdf::vectorized(|args: &[ArrayRef]| {
            let x = args[0].as_primitive::<Float64Type>();
            let out: Float64Array = x.iter().map(|v| v.map(|v| v * 2.0)).collect();
            Ok(Arc::new(out) as ArrayRef)
        })
    };
    let plan = scan()
        .project(vec![
            call_typed("F", vec![col("a")], DataType::Float64).alias("r")
        ])
        .unwrap()
        .build();

    let err = ctx
        .register_function(
            doubled(),
            "F",
            vec![DataType::Float64],
            Some(DataType::Float64),
            false,
        )
        .unwrap_err();
    assert!(matches!(err, QuarryError::SignatureConflict { .. }));
    let out = ctx.collect(&plan).unwrap();
    assert_eq!(
        float_values(out.column(0)),
        vec![1.0, 4.0, 9.0, 16.0, 25.0]
    );

    ctx.register_function(
        doubled(),
        "F",
        vec![DataType::Float64],
        Some(DataType::Float64),
        true,
    )
    .unwrap();
    let out = ctx.collect(&plan).unwrap();
    assert_eq!(float_values(out.column(0)), vec![2.0, 4.0, 6.0, 8.0, 10.0]);
}

#[test]
fn test_row_mode_function() {
    let mut ctx = setup_context();
    ctx.register_function(
        ScalarUdf::row(|row| {
            let scaled = match (row.get(0), row.get(1)) {
                (Value::Float64(a), Value::Int64(b)) => Value::Float64(a * *b as f64),
                _ => Value::Null,
            };
            Ok(scaled)
        }),
        "scale",
        vec![DataType::Float64, DataType::Int64],
        Some(DataType::Float64),
        false,
    )
    .unwrap();

    let plan = scan()
        .project(vec![call_typed(
            "scale",
            vec![col("a"), col("b")],
            DataType::Float64,
        )
        .alias("s")])
        .unwrap()
        .build();
    let out = ctx.collect(&plan).unwrap();
    assert_eq!(
        float_values(out.column(0)),
        vec![10.0, 40.0, 90.0, 160.0, 250.0]
    );
}

#[test]
fn test_row_mode_without_return_type_fails_at_registration() {
    let mut ctx = setup_context();
    let err = ctx
        .register_function(
            ScalarUdf::row(|row| Ok(row.get(0).clone())),
            "echo",
            vec![DataType::Int64],
            None,
            false,
        )
        .unwrap_err();
    assert!(matches!(err, QuarryError::MissingReturnType(ref name) if name == "echo"));
    assert!(!ctx.functions().contains("echo"));
}

#[test]
fn test_unknown_overload_fails_conversion() {
    let mut ctx = setup_context();
    ctx.register_function(
        square_float(),
        "F",
        vec![DataType::Float64],
        Some(DataType::Float64),
        false,
    )
    .unwrap();

    let plan = scan()
        .project(vec![
            call_typed("F", vec![col("g")], DataType::Float64).alias("r")
        ])
        .unwrap()
        .build();
    assert!(matches!(
        ctx.collect(&plan),
        Err(QuarryError::NoMatchingSignature { .. })
    ));
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_aggregate_udf_matches_builtin_sum() {
    let mut ctx = setup_context();
    ctx.register_aggregation(
        int_sum_udaf(),
        "FAGG",
        vec![DataType::Int64],
        DataType::Int64,
        false,
    )
    .unwrap();

    let ungrouped = scan()
        .aggregate(
            vec![],
            vec![
                agg_call("FAGG", vec![col("b")], DataType::Int64).alias("f"),
                sum(col("b")).alias("s"),
            ],
        )
        .unwrap()
        .build();
    let out = ctx.collect(&ungrouped).unwrap();
    assert_eq!(out.num_rows(), 1);
    assert_eq!(int_values(out.column(0)), vec![150]);
    assert_eq!(int_values(out.column(1)), vec![150]);

    let grouped = scan()
        .aggregate(
            vec![col("g")],
            vec![
                agg_call("FAGG", vec![col("b")], DataType::Int64).alias("f"),
                sum(col("b")).alias("s"),
            ],
        )
        .unwrap()
        .build();
    let out = ctx.collect(&grouped).unwrap();
    let groups: Vec<&str> = out.column(0).as_string::<i32>().iter().flatten().collect();
    assert_eq!(groups, vec!["x", "y"]);
    assert_eq!(int_values(out.column(1)), vec![90, 60]);
    assert_eq!(int_values(out.column(1)), int_values(out.column(2)));
}

/// Sums a Float64 column per chunk, then sums the partials.
fn float_sum_udaf() -> AggregateUdf {
    AggregateUdf::new(
        |args: &[ArrayRef]| {
            let total = compute::sum(args[0].as_primitive::<Float64Type>()).unwrap_or(0.0);
            Ok(Value::Float64(total))
        },
        |partials: &[Value]| {
            let total = partials.iter().filter_map(Value::as_float64).sum();
            Ok(Value::Float64(total))
        },
    )
}

#[test]
fn test_float_aggregate_udf_matches_builtin_sum() {
    let mut ctx = setup_context();
    ctx.register_aggregation(
        float_sum_udaf(),
        "FAGG",
        vec![DataType::Float64],
        DataType::Float64,
        false,
    )
    .unwrap();

    let ungrouped = scan()
        .aggregate(
            vec![],
            vec![
                agg_call("FAGG", vec![col("a")], DataType::Float64).alias("f"),
                sum(col("a")).alias("s"),
            ],
        )
        .unwrap()
        .build();
    let out = ctx.collect(&ungrouped).unwrap();
    assert_eq!(float_values(out.column(0)), vec![15.0]);
    assert_eq!(float_values(out.column(1)), vec![15.0]);

    let grouped = scan()
        .aggregate(
            vec![col("g")],
            vec![
                agg_call("FAGG", vec![col("a")], DataType::Float64).alias("f"),
                sum(col("a")).alias("s"),
            ],
        )
        .unwrap()
        .build();
    let out = ctx.collect(&grouped).unwrap();
    assert_eq!(float_values(out.column(1)), vec![9.0, 6.0]);
    assert_eq!(float_values(out.column(1)), float_values(out.column(2)));
}

#[test]
fn test_aggregate_udf_over_empty_input() {
    let mut ctx = setup_context();
    ctx.register_aggregation(
        int_sum_udaf(),
        "FAGG",
        vec![DataType::Int64],
        DataType::Int64,
        false,
    )
    .unwrap();

    let plan = scan()
        .filter(col("b").gt(lit(1000i64)))
        .unwrap()
        .aggregate(
            vec![],
            vec![agg_call("FAGG", vec![col("b")], DataType::Int64).alias("f")],
        )
        .unwrap()
        .build();
    let out = ctx.collect(&plan).unwrap();
    assert_eq!(out.num_rows(), 1);
    assert_eq!(int_values(out.column(0)), vec![0]);
}

#[test]
fn test_count_distinct_and_string_extrema() {
    let ctx = setup_context();
    let plan = scan()
        .aggregate(
            vec![],
            vec![
                LogicalExpr::Aggregate(
                    AggExpr::new(AggFunc::Count, col("g")).with_distinct(true),
                )
                .alias("groups"),
                count(col("g")).alias("rows"),
                min(col("g")).alias("lo"),
                max(col("g")).alias("hi"),
            ],
        )
        .unwrap()
        .build();
    let out = ctx.collect(&plan).unwrap();

    assert_eq!(int_values(out.column(0)), vec![2]);
    assert_eq!(int_values(out.column(1)), vec![5]);
    assert_eq!(out.column(2).as_string::<i32>().value(0), "x");
    assert_eq!(out.column(3).as_string::<i32>().value(0), "y");
}

// ============================================================================
// Custom operators and conversion order
// ============================================================================

/// Passes its single input through unchanged.
struct Passthrough;

impl RelHandler for Passthrough {
    fn convert(
        &self,
        node: &LogicalPlan,
        converter: &PlanConverter,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable> {
        converter.convert_input(node, ctx)
    }
}

#[test]
fn test_custom_handler_runs_in_post_order() {
    let mut ctx = setup_context();
    let kind = OperatorKind::Extension("Passthrough".to_string());
    ctx.register_handler(kind.clone(), Passthrough, false).unwrap();

    let filtered = scan().filter(col("b").gt(lit(20i64))).unwrap();
    let row_type = filtered.row_type().clone();
    let plan = filtered
        .extension(ExtensionOp::new("Passthrough"), row_type)
        .limit(0, Some(2))
        .unwrap()
        .build();

    let result = ctx.execute(&plan).unwrap();
    assert_eq!(int_values(result.batch.column(2)), vec![30, 40]);

    let metrics = result.metrics.unwrap();
    assert_eq!(
        metrics.operators(),
        vec![
            OperatorKind::TableScan,
            OperatorKind::Filter,
            kind,
            OperatorKind::Limit,
        ]
    );
    assert_eq!(metrics.operators(), plan.post_order_kinds());
}

#[test]
fn test_replacing_a_builtin_handler() {
    let mut ctx = setup_context();
    let err = ctx
        .register_handler(OperatorKind::Filter, Passthrough, false)
        .unwrap_err();
    assert!(matches!(err, QuarryError::HandlerConflict(_)));

    ctx.register_handler(OperatorKind::Filter, Passthrough, true)
        .unwrap();
    let plan = scan().filter(col("b").gt(lit(20i64))).unwrap().build();
    assert_eq!(ctx.collect(&plan).unwrap().num_rows(), 5);
}

#[test]
fn test_unregistered_kind_is_unsupported() {
    let ctx = setup_context();
    let row_type = table_schema();
    let plan = scan()
        .extension(ExtensionOp::new("Sample"), row_type)
        .build();
    assert!(matches!(
        ctx.collect(&plan),
        Err(QuarryError::UnsupportedOperator(ref kind)) if kind == "Sample"
    ));
}

#[test]
fn test_input_arity_is_checked() {
    let ctx = setup_context();
    let input = scan().build();
    let node = LogicalPlan::new(
        LogicalOp::Filter(quarry_logical::FilterOp::new(lit(true))),
        vec![input.clone(), input],
        table_schema(),
    );
    assert!(matches!(
        ctx.collect(&node),
        Err(QuarryError::InputArity { expected: 1, actual: 2, .. })
    ));
}

#[test]
fn test_terminal_schema_mismatch() {
    let mut ctx = setup_context();
    ctx.register_handler(
        OperatorKind::Extension("DropLast".to_string()),
        |node: &LogicalPlan,
         converter: &PlanConverter,
         ctx: &SessionContext|
         -> QuarryResult<ResultTable> {
            let input = converter.convert_input(node, ctx)?;
            let mut names = input.frontend_names();
            names.pop();
            quarry_engine::SchemaReconciler::align_columns(&input, &names)
        },
        false,
    )
    .unwrap();

    let plan = scan()
        .extension(ExtensionOp::new("DropLast"), table_schema())
        .build();
    assert!(matches!(
        ctx.collect(&plan),
        Err(QuarryError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_partitions_survive_filter() {
    let ctx = setup_context();
    let plan = scan().filter(col("a").gt(lit(1.5f64))).unwrap().build();
    let result = ctx.convert(&plan).unwrap();
    assert_eq!(result.num_rows(), 4);
    assert_eq!(result.num_partitions(), 3);
    let b = result.to_record_batch().unwrap();
    assert_eq!(b.column(2).len(), 4);
}

#[test]
fn test_projection_repeating_a_column() {
    let ctx = setup_context();
    let plan = LogicalPlan::new(
        LogicalOp::Projection(ProjectOp::new(vec![col("a"), col("a")])),
        vec![scan().build()],
        Schema::from_pairs([("a", DataType::Float64), ("a0", DataType::Float64)]),
    );
    let out = ctx.collect(&plan).unwrap();

    assert_eq!(out.num_columns(), 2);
    assert_eq!(out.schema().field(0).name(), "a");
    assert_eq!(out.schema().field(1).name(), "a0");
    assert_eq!(float_values(out.column(0)), float_values(out.column(1)));
}
