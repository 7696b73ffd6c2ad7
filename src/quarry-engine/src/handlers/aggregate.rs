//! Aggregate handler.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use arrow::array::{new_empty_array, Array, ArrayRef, AsArray, UInt32Array};
use arrow::compute::{cast, take};
use arrow::datatypes::{DataType as ArrowDataType, Field, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use arrow::row::{OwnedRow, RowConverter, SortField};

use common_error::{QuarryError, QuarryResult};
use quarry_core::{TypeCategory, Value};
use quarry_logical::{AggExpr, AggFunc, AggregateOp, LogicalExpr, LogicalOp, LogicalPlan};

use super::unexpected_op;
use crate::context::SessionContext;
use crate::converter::PlanConverter;
use crate::expr::ExprEvaluator;
use crate::functions::{array_value, values_to_array, AggregateUdf, FunctionRegistry, Signature};
use crate::reconcile::SchemaReconciler;
use crate::registry::RelHandler;
use crate::table::{Frame, ResultTable};

/// Groups rows by the grouping keys and evaluates every aggregate per group.
///
/// Output columns are the keys followed by the aggregates. Without grouping
/// keys the whole input forms one group and exactly one row is produced, even
/// for empty input. User aggregates run `chunk` once per group and partition
/// and `combine` once per group.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateHandler;

impl RelHandler for AggregateHandler {
    fn convert(
        &self,
        node: &LogicalPlan,
        converter: &PlanConverter,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable> {
        let LogicalOp::Aggregate(aggregate) = node.op() else {
            return Err(unexpected_op("Aggregate", node));
        };
        let input = converter.convert_input(node, ctx)?;

        let row_type = node.row_type();
        let expected = aggregate.group_by.len() + aggregate.aggs.len();
        if row_type.len() != expected {
            return Err(QuarryError::schema_error(format!(
                "aggregate produces {expected} columns, row type has {}",
                row_type.len()
            )));
        }

        let batches = input.frontend_batches()?;
        let state = aggregate_partitions(aggregate, &batches, ctx.functions())?;
        let num_groups = state.num_groups();

        let mut columns = match state.groups.key_columns()? {
            Some(keys) => keys,
            None => row_type.columns[..aggregate.group_by.len()]
                .iter()
                .map(|c| new_empty_array(&c.data_type.to_arrow()))
                .collect(),
        };
        for (j, column) in row_type.columns[aggregate.group_by.len()..].iter().enumerate() {
            let values = state
                .accumulators
                .iter()
                .map(|group| group[j].finalize())
                .collect::<QuarryResult<Vec<_>>>()?;
            columns.push(values_to_array(&values, &column.data_type.to_arrow())?);
        }

        let fields = row_type
            .columns
            .iter()
            .zip(&columns)
            .map(|(c, array)| Field::new(&c.name, array.data_type().clone(), true))
            .collect();
        let frame = Frame::from_columns(fields, vec![columns], &[num_groups])?;
        SchemaReconciler::reconcile(&ResultTable::from_frame(frame)?, row_type)
    }
}

/// Groups and accumulator states after consuming every partition.
struct AggregateState {
    groups: GroupTable,
    accumulators: Vec<Vec<Box<dyn Accumulator>>>,
}

impl AggregateState {
    fn num_groups(&self) -> usize {
        self.accumulators.len()
    }
}

fn aggregate_partitions(
    aggregate: &AggregateOp,
    batches: &[RecordBatch],
    functions: &FunctionRegistry,
) -> QuarryResult<AggregateState> {
    let evaluator = ExprEvaluator::new(functions);
    let mut specs = aggregate
        .aggs
        .iter()
        .map(AggSpec::try_new)
        .collect::<QuarryResult<Vec<_>>>()?;
    let grouped = !aggregate.group_by.is_empty();

    let mut groups = GroupTable::default();
    let mut accumulators: Vec<Vec<Box<dyn Accumulator>>> = Vec::new();

    for batch in batches {
        let args = specs
            .iter_mut()
            .map(|spec| spec.evaluate_args(&evaluator, batch, functions))
            .collect::<QuarryResult<Vec<_>>>()?;

        if !grouped {
            if accumulators.is_empty() {
                accumulators.push(new_accumulators(&specs)?);
            }
            if batch.num_rows() > 0 {
                for (acc, spec_args) in accumulators[0].iter_mut().zip(&args) {
                    acc.update(spec_args, batch.num_rows())?;
                }
            }
            continue;
        }

        let keys = aggregate
            .group_by
            .iter()
            .map(|expr| evaluator.evaluate(expr, batch))
            .collect::<QuarryResult<Vec<_>>>()?;
        let group_ids = groups.intern(&keys)?;
        while accumulators.len() < groups.len() {
            accumulators.push(new_accumulators(&specs)?);
        }

        let mut members: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
        for (row, group) in group_ids.into_iter().enumerate() {
            members.entry(group).or_default().push(row as u32);
        }
        for (group, rows) in members {
            let indices = UInt32Array::from(rows);
            for (acc, spec_args) in accumulators[group].iter_mut().zip(&args) {
                acc.update(&take_all(spec_args, &indices)?, indices.len())?;
            }
        }
    }

    Ok(AggregateState {
        groups,
        accumulators,
    })
}

fn new_accumulators(specs: &[AggSpec<'_>]) -> QuarryResult<Vec<Box<dyn Accumulator>>> {
    specs.iter().map(AggSpec::accumulator).collect()
}

fn take_all(arrays: &[ArrayRef], indices: &UInt32Array) -> QuarryResult<Vec<ArrayRef>> {
    arrays
        .iter()
        .map(|array| Ok(take(array.as_ref(), indices, None)?))
        .collect()
}

/// Grouping keys interned by their row-format encoding.
#[derive(Default)]
struct GroupTable {
    converter: Option<RowConverter>,
    index: HashMap<OwnedRow, usize>,
    keys: Vec<OwnedRow>,
}

impl GroupTable {
    fn len(&self) -> usize {
        self.keys.len()
    }

    /// Group id of every row, registering unseen keys in order of appearance.
    fn intern(&mut self, keys: &[ArrayRef]) -> QuarryResult<Vec<usize>> {
        if self.converter.is_none() {
            let fields = keys
                .iter()
                .map(|k| SortField::new(k.data_type().clone()))
                .collect();
            self.converter = Some(RowConverter::new(fields)?);
        }
        let Some(converter) = self.converter.as_ref() else {
            return Err(QuarryError::internal("group key encoder missing"));
        };
        let rows = converter.convert_columns(keys)?;

        let mut ids = Vec::with_capacity(rows.num_rows());
        for row in rows.iter() {
            let next = self.keys.len();
            let id = *self.index.entry(row.owned()).or_insert(next);
            if id == next {
                self.keys.push(row.owned());
            }
            ids.push(id);
        }
        Ok(ids)
    }

    /// Key columns, one value per group, or `None` if no keys were seen.
    fn key_columns(&self) -> QuarryResult<Option<Vec<ArrayRef>>> {
        match &self.converter {
            Some(converter) => Ok(Some(
                converter.convert_rows(self.keys.iter().map(OwnedRow::row))?,
            )),
            None => Ok(None),
        }
    }
}

/// One aggregate call, with its user aggregate once resolved.
struct AggSpec<'a> {
    call: &'a AggExpr,
    udaf: Option<AggregateUdf>,
}

impl<'a> AggSpec<'a> {
    fn try_new(expr: &'a LogicalExpr) -> QuarryResult<Self> {
        let LogicalExpr::Aggregate(call) = expr.unalias() else {
            return Err(QuarryError::type_error(format!(
                "{expr} is not an aggregate call"
            )));
        };
        let arity_ok = match &call.func {
            AggFunc::Count => call.args.len() <= 1,
            AggFunc::Sum | AggFunc::Min | AggFunc::Max | AggFunc::Avg => call.args.len() == 1,
            AggFunc::Udf(_) => true,
        };
        if !arity_ok {
            return Err(QuarryError::invalid_parameter(format!(
                "{call}: {} takes one argument",
                call.func
            )));
        }
        Ok(Self { call, udaf: None })
    }

    /// Evaluate the arguments over `batch`, resolving a user aggregate from
    /// the argument types the first time.
    fn evaluate_args(
        &mut self,
        evaluator: &ExprEvaluator<'_>,
        batch: &RecordBatch,
        functions: &FunctionRegistry,
    ) -> QuarryResult<Vec<ArrayRef>> {
        let args = self
            .call
            .args
            .iter()
            .map(|arg| evaluator.evaluate(arg, batch))
            .collect::<QuarryResult<Vec<_>>>()?;

        let call = self.call;
        if let (AggFunc::Udf(name), true) = (&call.func, self.udaf.is_none()) {
            let types: Vec<&ArrowDataType> = args.iter().map(|a| a.data_type()).collect();
            let signature = Signature::from_arrow(&types)?;
            let (_, udaf) = functions.resolve_aggregate(name, signature.types())?;
            self.udaf = Some(udaf.clone());
        }
        Ok(args)
    }

    fn accumulator(&self) -> QuarryResult<Box<dyn Accumulator>> {
        let inner: Box<dyn Accumulator> = match (&self.call.func, &self.udaf) {
            (AggFunc::Count, _) => Box::<CountAccumulator>::default(),
            (AggFunc::Sum, _) => Box::<SumAccumulator>::default(),
            (AggFunc::Avg, _) => Box::<AvgAccumulator>::default(),
            (AggFunc::Min, _) => Box::new(ExtremumAccumulator::new(Ordering::Less)),
            (AggFunc::Max, _) => Box::new(ExtremumAccumulator::new(Ordering::Greater)),
            (AggFunc::Udf(_), Some(udaf)) => Box::new(UdafAccumulator::new(udaf.clone())),
            (AggFunc::Udf(name), None) => {
                return Err(QuarryError::internal(format!(
                    "aggregate {name} has not been resolved"
                )))
            }
        };
        if self.call.distinct {
            Ok(Box::new(DistinctAccumulator::new(inner)))
        } else {
            Ok(inner)
        }
    }
}

/// Per-group aggregate state.
trait Accumulator {
    /// Consume one chunk of a group's argument values.
    fn update(&mut self, args: &[ArrayRef], num_rows: usize) -> QuarryResult<()>;

    /// The aggregate value of everything consumed.
    fn finalize(&self) -> QuarryResult<Value>;
}

fn non_null_count(array: &dyn Array) -> usize {
    array.len() - array.logical_nulls().map_or(0, |nulls| nulls.null_count())
}

/// `COUNT(*)` counts rows, `COUNT(x)` non-null values.
#[derive(Debug, Default)]
struct CountAccumulator {
    count: i64,
}

impl Accumulator for CountAccumulator {
    fn update(&mut self, args: &[ArrayRef], num_rows: usize) -> QuarryResult<()> {
        let counted = match args.first() {
            Some(values) => non_null_count(values.as_ref()),
            None => num_rows,
        };
        self.count += counted as i64;
        Ok(())
    }

    fn finalize(&self) -> QuarryResult<Value> {
        Ok(Value::Int64(self.count))
    }
}

/// Integer sums stay integral until a float is added.
#[derive(Debug, Default)]
enum SumAccumulator {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
}

impl SumAccumulator {
    fn add_int(&mut self, v: i64) -> QuarryResult<()> {
        *self = match *self {
            Self::Empty => Self::Int(v),
            Self::Int(sum) => Self::Int(
                sum.checked_add(v)
                    .ok_or_else(|| QuarryError::execution("SUM overflowed Int64"))?,
            ),
            Self::Float(sum) => Self::Float(sum + v as f64),
        };
        Ok(())
    }

    fn add_float(&mut self, v: f64) {
        *self = match *self {
            Self::Empty => Self::Float(v),
            Self::Int(sum) => Self::Float(sum as f64 + v),
            Self::Float(sum) => Self::Float(sum + v),
        };
    }
}

impl Accumulator for SumAccumulator {
    fn update(&mut self, args: &[ArrayRef], _num_rows: usize) -> QuarryResult<()> {
        let values = &args[0];
        match TypeCategory::of_arrow(values.data_type()) {
            TypeCategory::Integer => {
                let ints = cast(values, &ArrowDataType::Int64)?;
                for v in ints.as_primitive::<Int64Type>().iter().flatten() {
                    self.add_int(v)?;
                }
            }
            TypeCategory::Float => {
                let floats = cast(values, &ArrowDataType::Float64)?;
                for v in floats.as_primitive::<Float64Type>().iter().flatten() {
                    self.add_float(v);
                }
            }
            TypeCategory::Null => {}
            _ => {
                return Err(QuarryError::type_error(format!(
                    "SUM requires numeric input, got {}",
                    values.data_type()
                )))
            }
        }
        Ok(())
    }

    fn finalize(&self) -> QuarryResult<Value> {
        Ok(match *self {
            Self::Empty => Value::Null,
            Self::Int(sum) => Value::Int64(sum),
            Self::Float(sum) => Value::Float64(sum),
        })
    }
}

#[derive(Debug, Default)]
struct AvgAccumulator {
    sum: f64,
    count: i64,
}

impl Accumulator for AvgAccumulator {
    fn update(&mut self, args: &[ArrayRef], _num_rows: usize) -> QuarryResult<()> {
        let values = &args[0];
        match TypeCategory::of_arrow(values.data_type()) {
            TypeCategory::Integer | TypeCategory::Float => {
                let floats = cast(values, &ArrowDataType::Float64)?;
                for v in floats.as_primitive::<Float64Type>().iter().flatten() {
                    self.sum += v;
                    self.count += 1;
                }
                Ok(())
            }
            TypeCategory::Null => Ok(()),
            _ => Err(QuarryError::type_error(format!(
                "AVG requires numeric input, got {}",
                values.data_type()
            ))),
        }
    }

    fn finalize(&self) -> QuarryResult<Value> {
        if self.count == 0 {
            Ok(Value::Null)
        } else {
            Ok(Value::Float64(self.sum / self.count as f64))
        }
    }
}

/// `MIN` keeps values ordering `Less` than the current one, `MAX` `Greater`.
#[derive(Debug)]
struct ExtremumAccumulator {
    keep: Ordering,
    best: Option<Value>,
}

impl ExtremumAccumulator {
    fn new(keep: Ordering) -> Self {
        Self { keep, best: None }
    }
}

impl Accumulator for ExtremumAccumulator {
    fn update(&mut self, args: &[ArrayRef], _num_rows: usize) -> QuarryResult<()> {
        let values = args[0].as_ref();
        for i in 0..values.len() {
            let value = array_value(values, i)?;
            if value.is_null() {
                continue;
            }
            let replace = match &self.best {
                None => true,
                Some(best) => compare_values(&value, best)? == self.keep,
            };
            if replace {
                self.best = Some(value);
            }
        }
        Ok(())
    }

    fn finalize(&self) -> QuarryResult<Value> {
        Ok(self.best.clone().unwrap_or(Value::Null))
    }
}

fn compare_values(a: &Value, b: &Value) -> QuarryResult<Ordering> {
    let ordering = match (a, b) {
        (Value::Int64(x), Value::Int64(y)) => Some(x.cmp(y)),
        (Value::Float64(x), Value::Float64(y)) => x.partial_cmp(y),
        (Value::Int64(x), Value::Float64(y)) => (*x as f64).partial_cmp(y),
        (Value::Float64(x), Value::Int64(y)) => x.partial_cmp(&(*y as f64)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    };
    let numeric = |v: &Value| matches!(v, Value::Int64(_) | Value::Float64(_));
    match ordering {
        Some(ordering) => Ok(ordering),
        // NaN never displaces a value.
        None if numeric(a) && numeric(b) => Ok(Ordering::Equal),
        None => Err(QuarryError::type_error(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// Runs a user aggregate's chunk reduction per update and its combine
/// reduction at the end.
struct UdafAccumulator {
    udaf: AggregateUdf,
    partials: Vec<Value>,
}

impl UdafAccumulator {
    fn new(udaf: AggregateUdf) -> Self {
        Self {
            udaf,
            partials: Vec::new(),
        }
    }
}

impl Accumulator for UdafAccumulator {
    fn update(&mut self, args: &[ArrayRef], _num_rows: usize) -> QuarryResult<()> {
        self.partials.push(self.udaf.chunk(args)?);
        Ok(())
    }

    fn finalize(&self) -> QuarryResult<Value> {
        self.udaf.combine(&self.partials)
    }
}

/// Forwards only argument tuples not seen before in this group.
struct DistinctAccumulator {
    inner: Box<dyn Accumulator>,
    converter: Option<RowConverter>,
    seen: HashSet<OwnedRow>,
}

impl DistinctAccumulator {
    fn new(inner: Box<dyn Accumulator>) -> Self {
        Self {
            inner,
            converter: None,
            seen: HashSet::new(),
        }
    }
}

impl Accumulator for DistinctAccumulator {
    fn update(&mut self, args: &[ArrayRef], num_rows: usize) -> QuarryResult<()> {
        if args.is_empty() {
            return self.inner.update(args, num_rows);
        }
        let converter = match self.converter.take() {
            Some(converter) => converter,
            None => RowConverter::new(
                args.iter()
                    .map(|a| SortField::new(a.data_type().clone()))
                    .collect(),
            )?,
        };
        let rows = converter.convert_columns(args)?;
        let mut fresh = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            if self.seen.insert(row.owned()) {
                fresh.push(i as u32);
            }
        }
        self.converter = Some(converter);

        let indices = UInt32Array::from(fresh);
        self.inner.update(&take_all(args, &indices)?, indices.len())
    }

    fn finalize(&self) -> QuarryResult<Value> {
        self.inner.finalize()
    }
}
