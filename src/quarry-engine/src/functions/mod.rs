//! User-defined functions: overload keys, callables and the registry that
//! resolves calls against them.

mod registry;
mod signature;
mod udf;
mod values;

pub use registry::{FunctionEntry, FunctionKind, FunctionRegistry};
pub use signature::Signature;
pub use udf::{
    AggregateUdf, ChunkFn, CombineFn, FunctionId, Row, RowFn, ScalarUdf, VectorizedFn,
};
pub use values::{array_value, array_values, values_to_array};
