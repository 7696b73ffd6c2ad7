//! Handler registry: one conversion handler per operator kind.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use common_error::{QuarryError, QuarryResult};
use quarry_logical::{LogicalPlan, OperatorKind};

use crate::context::SessionContext;
use crate::converter::PlanConverter;
use crate::table::ResultTable;

/// Converts one kind of plan node into a computed result.
///
/// Handlers convert their own inputs by calling back into `converter`, so a
/// handler's logic runs only after its inputs are converted.
pub trait RelHandler: Send + Sync {
    /// Convert `node`.
    fn convert(
        &self,
        node: &LogicalPlan,
        converter: &PlanConverter,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable>;
}

impl<F> RelHandler for F
where
    F: Fn(&LogicalPlan, &PlanConverter, &SessionContext) -> QuarryResult<ResultTable>
        + Send
        + Sync,
{
    fn convert(
        &self,
        node: &LogicalPlan,
        converter: &PlanConverter,
        ctx: &SessionContext,
    ) -> QuarryResult<ResultTable> {
        self(node, converter, ctx)
    }
}

/// Mapping from operator kind to its handler.
///
/// Pure storage: the registry never invokes the handlers it holds.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<OperatorKind, Arc<dyn RelHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handler` under `kind`.
    ///
    /// Fails with `HandlerConflict` if `kind` already has a handler and
    /// `replace` is false.
    pub fn register(
        &mut self,
        kind: OperatorKind,
        handler: Arc<dyn RelHandler>,
        replace: bool,
    ) -> QuarryResult<()> {
        if self.handlers.contains_key(&kind) {
            if !replace {
                return Err(QuarryError::HandlerConflict(kind.to_string()));
            }
            debug!("replacing handler for {kind}");
        } else {
            debug!("registering handler for {kind}");
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// The handler for `kind`.
    pub fn lookup(&self, kind: &OperatorKind) -> QuarryResult<Arc<dyn RelHandler>> {
        self.handlers
            .get(kind)
            .cloned()
            .ok_or_else(|| QuarryError::HandlerNotFound(kind.to_string()))
    }

    /// Whether `kind` has a handler.
    pub fn contains(&self, kind: &OperatorKind) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Remove the handler for `kind`, returning whether one was present.
    pub fn deregister(&mut self, kind: &OperatorKind) -> bool {
        self.handlers.remove(kind).is_some()
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&OperatorKind> {
        self.handlers.keys().collect()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
