//! Overloaded user-defined function registry.

use std::collections::HashMap;

use arrow::array::{Array, ArrayRef};
use arrow::compute::cast;
use indexmap::IndexMap;
use log::debug;

use common_error::{QuarryError, QuarryResult};
use quarry_core::{DataType, Value};

use super::signature::Signature;
use super::udf::{AggregateUdf, FunctionId, Row, ScalarImpl, ScalarUdf};
use super::values::{array_value, values_to_array};

/// Execution mode of a registered overload.
#[derive(Debug, Clone)]
pub enum FunctionKind {
    Scalar(ScalarUdf),
    Aggregate(AggregateUdf),
}

impl FunctionKind {
    /// Registration token of the callable.
    pub fn id(&self) -> FunctionId {
        match self {
            Self::Scalar(udf) => udf.id(),
            Self::Aggregate(udaf) => udaf.id(),
        }
    }

    /// Mode name for messages.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Scalar(udf) if udf.is_row_mode() => "row",
            Self::Scalar(_) => "vectorized",
            Self::Aggregate(_) => "aggregate",
        }
    }
}

/// One registered overload.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    /// Name as registered.
    pub name: String,
    /// Parameter types.
    pub signature: Signature,
    /// Callable and mode.
    pub kind: FunctionKind,
    /// Declared return type.
    pub return_type: Option<DataType>,
}

impl FunctionEntry {
    /// Whether this overload is an aggregate.
    pub fn is_aggregate(&self) -> bool {
        matches!(self.kind, FunctionKind::Aggregate(_))
    }

    /// Invoke a scalar overload over one partition.
    ///
    /// `args` are the evaluated argument columns, each `num_rows` long.
    pub fn invoke_scalar(&self, args: &[ArrayRef], num_rows: usize) -> QuarryResult<ArrayRef> {
        let FunctionKind::Scalar(udf) = &self.kind else {
            return Err(QuarryError::execution(format!(
                "aggregate function {}{} used as a scalar",
                self.name, self.signature
            )));
        };
        match udf.imp() {
            ScalarImpl::Vectorized(f) => {
                let out = f(args)?;
                if out.len() != num_rows {
                    return Err(QuarryError::execution(format!(
                        "function {}{} returned {} values for {num_rows} rows",
                        self.name,
                        self.signature,
                        out.len()
                    )));
                }
                match self.return_type.map(|ty| ty.to_arrow()) {
                    Some(ty) if out.data_type() != &ty => Ok(cast(&out, &ty)?),
                    _ => Ok(out),
                }
            }
            ScalarImpl::Row(f) => {
                let return_type = self
                    .return_type
                    .ok_or_else(|| QuarryError::MissingReturnType(self.name.clone()))?;
                let names = self.signature.param_names();
                let mut values = vec![Value::Null; args.len()];
                let mut out = Vec::with_capacity(num_rows);
                for row in 0..num_rows {
                    for (slot, arg) in values.iter_mut().zip(args) {
                        *slot = array_value(arg.as_ref(), row)?;
                    }
                    out.push(f(&Row::new(&names, &values))?);
                }
                values_to_array(&out, &return_type.to_arrow())
            }
        }
    }
}

/// Registry of user-defined functions keyed by case-insensitive name, then
/// by exact signature.
///
/// Scalar and aggregate functions share one name space.
#[derive(Debug, Default, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, IndexMap<Signature, FunctionEntry>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Register a scalar overload.
    ///
    /// Row-mode functions need a return type. Re-registering the same
    /// callable is a no-op; a different callable for an existing signature
    /// needs `replace`.
    pub fn register_scalar(
        &mut self,
        name: &str,
        signature: Signature,
        udf: ScalarUdf,
        return_type: Option<DataType>,
        replace: bool,
    ) -> QuarryResult<()> {
        if udf.is_row_mode() && return_type.is_none() {
            return Err(QuarryError::MissingReturnType(name.to_string()));
        }
        self.insert(
            FunctionEntry {
                name: name.to_string(),
                signature,
                kind: FunctionKind::Scalar(udf),
                return_type,
            },
            replace,
        )
    }

    /// Register an aggregate overload. Same conflict rules as scalars.
    pub fn register_aggregate(
        &mut self,
        name: &str,
        signature: Signature,
        udaf: AggregateUdf,
        return_type: DataType,
        replace: bool,
    ) -> QuarryResult<()> {
        self.insert(
            FunctionEntry {
                name: name.to_string(),
                signature,
                kind: FunctionKind::Aggregate(udaf),
                return_type: Some(return_type),
            },
            replace,
        )
    }

    fn insert(&mut self, entry: FunctionEntry, replace: bool) -> QuarryResult<()> {
        let overloads = self.functions.entry(Self::key(&entry.name)).or_default();
        if let Some(existing) = overloads.get(&entry.signature) {
            if existing.kind.id() == entry.kind.id() {
                debug!(
                    "function {}{} already registered with the same callable",
                    entry.name, entry.signature
                );
                return Ok(());
            }
            if !replace {
                return Err(QuarryError::signature_conflict(
                    entry.name,
                    entry.signature.to_string(),
                ));
            }
            debug!(
                "replacing {} function {}{}",
                entry.kind.mode(),
                entry.name,
                entry.signature
            );
        } else {
            debug!(
                "registering {} function {}{}",
                entry.kind.mode(),
                entry.name,
                entry.signature
            );
        }
        overloads.insert(entry.signature.clone(), entry);
        Ok(())
    }

    /// The overload of `name` whose signature equals `arg_types` exactly.
    pub fn resolve(&self, name: &str, arg_types: &[DataType]) -> QuarryResult<&FunctionEntry> {
        let signature = Signature::new(arg_types.to_vec());
        self.functions
            .get(&Self::key(name))
            .and_then(|overloads| overloads.get(&signature))
            .ok_or_else(|| QuarryError::no_matching_signature(name, signature.to_string()))
    }

    /// Like [`resolve`](Self::resolve), but the overload must be scalar.
    pub fn resolve_scalar(
        &self,
        name: &str,
        arg_types: &[DataType],
    ) -> QuarryResult<&FunctionEntry> {
        let entry = self.resolve(name, arg_types)?;
        if entry.is_aggregate() {
            return Err(QuarryError::execution(format!(
                "aggregate function {}{} is only valid in an Aggregate node",
                entry.name, entry.signature
            )));
        }
        Ok(entry)
    }

    /// Like [`resolve`](Self::resolve), but the overload must be an aggregate.
    pub fn resolve_aggregate(
        &self,
        name: &str,
        arg_types: &[DataType],
    ) -> QuarryResult<(&FunctionEntry, &AggregateUdf)> {
        let entry = self.resolve(name, arg_types)?;
        match &entry.kind {
            FunctionKind::Aggregate(udaf) => Ok((entry, udaf)),
            FunctionKind::Scalar(_) => Err(QuarryError::type_error(format!(
                "{}{} is a scalar function, not an aggregate",
                entry.name, entry.signature
            ))),
        }
    }

    /// Whether any overload of `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions
            .get(&Self::key(name))
            .is_some_and(|overloads| !overloads.is_empty())
    }

    /// Signatures registered under `name`, in registration order.
    pub fn overloads(&self, name: &str) -> Vec<&Signature> {
        self.functions
            .get(&Self::key(name))
            .map(|overloads| overloads.keys().collect())
            .unwrap_or_default()
    }

    /// Remove every overload of `name`. Returns how many were removed.
    pub fn deregister(&mut self, name: &str) -> usize {
        let removed = self
            .functions
            .remove(&Self::key(name))
            .map_or(0, |overloads| overloads.len());
        if removed > 0 {
            debug!("deregistered {removed} overload(s) of {name}");
        }
        removed
    }

    /// Registered function names, sorted.
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .functions
            .values()
            .filter_map(|overloads| overloads.values().next().map(|e| e.name.clone()))
            .collect();
        names.sort();
        names
    }

    /// Total number of overloads.
    pub fn len(&self) -> usize {
        self.functions.values().map(IndexMap::len).sum()
    }

    /// Whether no function is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
