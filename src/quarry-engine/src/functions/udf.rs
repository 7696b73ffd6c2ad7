//! User-defined function callables.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arrow::array::ArrayRef;

use common_error::QuarryResult;
use quarry_core::Value;

/// Registration token identifying one callable.
///
/// Minted when a UDF is constructed and shared by its clones; two UDFs are
/// the same function iff their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(u64);

impl FunctionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Vectorized body: aligned argument arrays in, one array out.
pub type VectorizedFn = Arc<dyn Fn(&[ArrayRef]) -> QuarryResult<ArrayRef> + Send + Sync>;

/// Row body: one record in, one value out.
pub type RowFn = Arc<dyn Fn(&Row<'_>) -> QuarryResult<Value> + Send + Sync>;

/// Chunk reduction: the argument arrays of one group within one partition.
pub type ChunkFn = Arc<dyn Fn(&[ArrayRef]) -> QuarryResult<Value> + Send + Sync>;

/// Combine reduction over partial results.
pub type CombineFn = Arc<dyn Fn(&[Value]) -> QuarryResult<Value> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum ScalarImpl {
    Vectorized(VectorizedFn),
    Row(RowFn),
}

/// A scalar user-defined function in vectorized or row mode.
#[derive(Clone)]
pub struct ScalarUdf {
    id: FunctionId,
    imp: ScalarImpl,
}

impl ScalarUdf {
    /// A function invoked once per partition with whole argument columns.
    pub fn vectorized<F>(f: F) -> Self
    where
        F: Fn(&[ArrayRef]) -> QuarryResult<ArrayRef> + Send + Sync + 'static,
    {
        Self {
            id: FunctionId::next(),
            imp: ScalarImpl::Vectorized(Arc::new(f)),
        }
    }

    /// A function invoked once per record.
    pub fn row<F>(f: F) -> Self
    where
        F: Fn(&Row<'_>) -> QuarryResult<Value> + Send + Sync + 'static,
    {
        Self {
            id: FunctionId::next(),
            imp: ScalarImpl::Row(Arc::new(f)),
        }
    }

    /// Registration token of this callable.
    pub fn id(&self) -> FunctionId {
        self.id
    }

    /// Whether this function runs per record.
    pub fn is_row_mode(&self) -> bool {
        matches!(self.imp, ScalarImpl::Row(_))
    }

    pub(crate) fn imp(&self) -> &ScalarImpl {
        &self.imp
    }
}

impl fmt::Debug for ScalarUdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.is_row_mode() { "row" } else { "vectorized" };
        f.debug_struct("ScalarUdf")
            .field("id", &self.id)
            .field("mode", &mode)
            .finish()
    }
}

/// A two-phase user-defined aggregate.
///
/// `chunk` reduces the values of one group within one partition; `combine`
/// reduces the partial results of a group across partitions and must be
/// associative over `chunk`'s outputs.
#[derive(Clone)]
pub struct AggregateUdf {
    id: FunctionId,
    chunk: ChunkFn,
    combine: CombineFn,
}

impl AggregateUdf {
    /// Create an aggregate from its chunk and combine reductions.
    pub fn new<C, M>(chunk: C, combine: M) -> Self
    where
        C: Fn(&[ArrayRef]) -> QuarryResult<Value> + Send + Sync + 'static,
        M: Fn(&[Value]) -> QuarryResult<Value> + Send + Sync + 'static,
    {
        Self {
            id: FunctionId::next(),
            chunk: Arc::new(chunk),
            combine: Arc::new(combine),
        }
    }

    /// Registration token of this aggregate.
    pub fn id(&self) -> FunctionId {
        self.id
    }

    /// Reduce one chunk.
    pub fn chunk(&self, args: &[ArrayRef]) -> QuarryResult<Value> {
        (self.chunk)(args)
    }

    /// Reduce partial results.
    pub fn combine(&self, partials: &[Value]) -> QuarryResult<Value> {
        (self.combine)(partials)
    }
}

impl fmt::Debug for AggregateUdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateUdf").field("id", &self.id).finish()
    }
}

/// A view of one record's argument values, as seen by a row-mode function.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    names: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Create a row view. `names` and `values` are parallel.
    pub fn new(names: &'a [String], values: &'a [Value]) -> Self {
        Self { names, values }
    }

    /// Argument at `index`; `Null` when out of range.
    pub fn get(&self, index: usize) -> &'a Value {
        static NULL: Value = Value::Null;
        self.values.get(index).unwrap_or(&NULL)
    }

    /// Argument by parameter name.
    pub fn get_by_name(&self, name: &str) -> Option<&'a Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values.get(i))
    }

    /// All argument values.
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Parameter names.
    pub fn names(&self) -> &'a [String] {
        self.names
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the function takes no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
