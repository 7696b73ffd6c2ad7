//! Expression evaluator implementation.

use std::sync::Arc;

use arrow::array::{
    new_null_array, Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray,
};
use arrow::compute::kernels::{boolean, cmp, numeric};
use arrow::compute::{self, cast};
use arrow::datatypes::DataType as ArrowDataType;
use arrow::record_batch::RecordBatch;

use common_error::{QuarryError, QuarryResult};
use quarry_core::{DataType, TypeCategory, Value};
use quarry_logical::{BinaryOp, FuncExpr, LogicalExpr, UnaryOp};

use crate::functions::FunctionRegistry;

/// Evaluates logical expressions against record batches.
///
/// Batches are frontend views: column references are resolved by the names
/// the planner uses. User-defined calls resolve through `functions`.
#[derive(Debug, Clone, Copy)]
pub struct ExprEvaluator<'a> {
    functions: &'a FunctionRegistry,
}

impl<'a> ExprEvaluator<'a> {
    /// Create an evaluator resolving calls against `functions`.
    pub const fn new(functions: &'a FunctionRegistry) -> Self {
        Self { functions }
    }

    /// Evaluate an expression against a record batch.
    ///
    /// Returns one value per row of `batch`.
    pub fn evaluate(&self, expr: &LogicalExpr, batch: &RecordBatch) -> QuarryResult<ArrayRef> {
        match expr {
            LogicalExpr::Literal(value) => self.eval_literal(value, batch.num_rows()),
            LogicalExpr::Column(name) => self.eval_column(name, batch),
            LogicalExpr::Binary { left, op, right } => self.eval_binary(left, *op, right, batch),
            LogicalExpr::Unary { op, expr } => self.eval_unary(*op, expr, batch),
            LogicalExpr::Cast { expr, data_type } => {
                let array = self.evaluate(expr, batch)?;
                Ok(cast(&array, &data_type.to_arrow())?)
            }
            LogicalExpr::Function(func) => self.eval_function(func, batch),
            LogicalExpr::Alias { expr, .. } => self.evaluate(expr, batch),
            LogicalExpr::Aggregate(agg) => Err(QuarryError::execution(format!(
                "aggregate {agg} must be evaluated by an Aggregate node"
            ))),
        }
    }

    /// Evaluate a predicate expression, returning a `BooleanArray`.
    ///
    /// A null-typed result (e.g. `NULL` literal) selects no rows.
    pub fn evaluate_predicate(
        &self,
        expr: &LogicalExpr,
        batch: &RecordBatch,
    ) -> QuarryResult<BooleanArray> {
        let mut result = self.evaluate(expr, batch)?;
        if result.data_type() == &ArrowDataType::Null {
            result = cast(&result, &ArrowDataType::Boolean)?;
        }
        result
            .as_any()
            .downcast_ref::<BooleanArray>()
            .cloned()
            .ok_or_else(|| {
                QuarryError::type_error(format!(
                    "predicate {expr} must evaluate to Boolean, got {}",
                    result.data_type()
                ))
            })
    }

    fn eval_literal(&self, value: &Value, num_rows: usize) -> QuarryResult<ArrayRef> {
        Ok(match value {
            Value::Null => new_null_array(&ArrowDataType::Null, num_rows),
            Value::Bool(b) => Arc::new(BooleanArray::from(vec![*b; num_rows])),
            Value::Int64(i) => Arc::new(Int64Array::from(vec![*i; num_rows])),
            Value::Float64(f) => Arc::new(Float64Array::from(vec![*f; num_rows])),
            Value::String(s) => Arc::new(StringArray::from(vec![s.as_str(); num_rows])),
        })
    }

    fn eval_column(&self, name: &str, batch: &RecordBatch) -> QuarryResult<ArrayRef> {
        batch
            .column_by_name(name)
            .cloned()
            .ok_or_else(|| QuarryError::ColumnNotFound(name.to_string()))
    }

    fn eval_binary(
        &self,
        left: &LogicalExpr,
        op: BinaryOp,
        right: &LogicalExpr,
        batch: &RecordBatch,
    ) -> QuarryResult<ArrayRef> {
        let left_arr = self.evaluate(left, batch)?;
        let right_arr = self.evaluate(right, batch)?;

        if op.is_arithmetic() {
            let (l, r) = Self::arithmetic_operands(op, &left_arr, &right_arr)?;
            let result = match op {
                BinaryOp::Add => numeric::add(&l, &r),
                BinaryOp::Subtract => numeric::sub(&l, &r),
                BinaryOp::Multiply => numeric::mul(&l, &r),
                BinaryOp::Divide => numeric::div(&l, &r),
                _ => numeric::rem(&l, &r),
            };
            return result.map_err(|e| QuarryError::execution(e.to_string()));
        }

        if op.is_comparison() {
            let (l, r) = Self::comparison_operands(op, &left_arr, &right_arr)?;
            let result = match op {
                BinaryOp::Eq => cmp::eq(&l, &r),
                BinaryOp::NotEq => cmp::neq(&l, &r),
                BinaryOp::Lt => cmp::lt(&l, &r),
                BinaryOp::LtEq => cmp::lt_eq(&l, &r),
                BinaryOp::Gt => cmp::gt(&l, &r),
                _ => cmp::gt_eq(&l, &r),
            };
            let result = result.map_err(|e| QuarryError::execution(e.to_string()))?;
            return Ok(Arc::new(result));
        }

        let l = Self::boolean_operand(op.symbol(), &left_arr)?;
        let r = Self::boolean_operand(op.symbol(), &right_arr)?;
        let result = match op {
            BinaryOp::And => boolean::and_kleene(&l, &r),
            _ => boolean::or_kleene(&l, &r),
        };
        let result = result.map_err(|e| QuarryError::execution(e.to_string()))?;
        Ok(Arc::new(result))
    }

    /// Widen both sides to `Int64`, or to `Float64` when either is a float.
    fn arithmetic_operands(
        op: BinaryOp,
        left: &ArrayRef,
        right: &ArrayRef,
    ) -> QuarryResult<(ArrayRef, ArrayRef)> {
        let lc = TypeCategory::of_arrow(left.data_type());
        let rc = TypeCategory::of_arrow(right.data_type());
        let numeric_or_null = |c: TypeCategory| {
            matches!(
                c,
                TypeCategory::Integer | TypeCategory::Float | TypeCategory::Null
            )
        };
        let target = match (lc, rc) {
            _ if !numeric_or_null(lc) || !numeric_or_null(rc) => {
                return Err(QuarryError::type_error(format!(
                    "cannot apply {op} to {} and {}",
                    left.data_type(),
                    right.data_type()
                )))
            }
            (TypeCategory::Float, _) | (_, TypeCategory::Float) => ArrowDataType::Float64,
            _ => ArrowDataType::Int64,
        };
        Ok((cast(left, &target)?, cast(right, &target)?))
    }

    /// Bring both sides to one type so the comparison kernels accept them.
    fn comparison_operands(
        op: BinaryOp,
        left: &ArrayRef,
        right: &ArrayRef,
    ) -> QuarryResult<(ArrayRef, ArrayRef)> {
        let (lt, rt) = (left.data_type(), right.data_type());
        if lt == rt {
            return Ok((left.clone(), right.clone()));
        }
        let lc = TypeCategory::of_arrow(lt);
        let rc = TypeCategory::of_arrow(rt);
        let target = match (lc, rc) {
            (TypeCategory::Null, _) => rt.clone(),
            (_, TypeCategory::Null) => lt.clone(),
            (TypeCategory::Integer, TypeCategory::Integer) => ArrowDataType::Int64,
            (
                TypeCategory::Integer | TypeCategory::Float,
                TypeCategory::Integer | TypeCategory::Float,
            ) => ArrowDataType::Float64,
            (TypeCategory::String, TypeCategory::String) => ArrowDataType::Utf8,
            // Literals compared with temporal columns take the column's type.
            (TypeCategory::Temporal, _) => lt.clone(),
            (_, TypeCategory::Temporal) => rt.clone(),
            _ => {
                return Err(QuarryError::type_error(format!(
                    "cannot apply {op} to {lt} and {rt}"
                )))
            }
        };
        Ok((cast(left, &target)?, cast(right, &target)?))
    }

    fn boolean_operand(op: &str, array: &ArrayRef) -> QuarryResult<BooleanArray> {
        let array = match array.data_type() {
            ArrowDataType::Boolean => array.clone(),
            ArrowDataType::Null => cast(array, &ArrowDataType::Boolean)?,
            other => {
                return Err(QuarryError::type_error(format!(
                    "{op} requires boolean operands, got {other}"
                )))
            }
        };
        array
            .as_any()
            .downcast_ref::<BooleanArray>()
            .cloned()
            .ok_or_else(|| QuarryError::internal("boolean array expected"))
    }

    fn eval_unary(
        &self,
        op: UnaryOp,
        expr: &LogicalExpr,
        batch: &RecordBatch,
    ) -> QuarryResult<ArrayRef> {
        let arr = self.evaluate(expr, batch)?;

        match op {
            UnaryOp::Not => {
                let bool_arr = Self::boolean_operand(op.name(), &arr)?;
                let result =
                    boolean::not(&bool_arr).map_err(|e| QuarryError::execution(e.to_string()))?;
                Ok(Arc::new(result))
            }
            UnaryOp::Neg => {
                if !matches!(
                    TypeCategory::of_arrow(arr.data_type()),
                    TypeCategory::Integer | TypeCategory::Float
                ) {
                    return Err(QuarryError::type_error(format!(
                        "cannot negate {}",
                        arr.data_type()
                    )));
                }
                numeric::neg(&arr).map_err(|e| QuarryError::execution(e.to_string()))
            }
            UnaryOp::IsNull => {
                let result =
                    compute::is_null(&arr).map_err(|e| QuarryError::execution(e.to_string()))?;
                Ok(Arc::new(result))
            }
            UnaryOp::IsNotNull => {
                let result = compute::is_not_null(&arr)
                    .map_err(|e| QuarryError::execution(e.to_string()))?;
                Ok(Arc::new(result))
            }
        }
    }

    fn eval_function(&self, func: &FuncExpr, batch: &RecordBatch) -> QuarryResult<ArrayRef> {
        let args = func
            .args
            .iter()
            .map(|arg| self.evaluate(arg, batch))
            .collect::<QuarryResult<Vec<_>>>()?;
        let arg_types = args
            .iter()
            .map(|arg| {
                DataType::from_arrow(arg.data_type()).ok_or_else(|| {
                    QuarryError::type_error(format!(
                        "argument of {func} has unsupported type {}",
                        arg.data_type()
                    ))
                })
            })
            .collect::<QuarryResult<Vec<_>>>()?;

        let entry = self.functions.resolve_scalar(&func.name, &arg_types)?;
        let result = entry.invoke_scalar(&args, batch.num_rows())?;
        match func.return_type.map(|ty| ty.to_arrow()) {
            Some(ty) if result.data_type() != &ty => Ok(cast(&result, &ty)?),
            _ => Ok(result),
        }
    }
}
