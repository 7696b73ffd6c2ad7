//! Core error types for Quarry.

use thiserror::Error;

/// Result type alias using `QuarryError`.
pub type QuarryResult<T> = std::result::Result<T, QuarryError>;

/// Core error type for Quarry operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuarryError {
    /// No handler is registered for an operator kind.
    #[error("UnsupportedOperator: no conversion for operator {0} available")]
    UnsupportedOperator(String),

    /// A handler received a different number of inputs than it requires.
    #[error("InputArity: operator {operator} expects {expected} input(s), got {actual}")]
    InputArity {
        operator: String,
        expected: usize,
        actual: usize,
    },

    /// Result columns do not match the required schema.
    #[error("SchemaMismatch: expected columns {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// A function overload was re-registered with a different implementation.
    #[error(
        "SignatureConflict: function {name}{signature} is already registered with a different \
         implementation; pass replace=true to overwrite it"
    )]
    SignatureConflict { name: String, signature: String },

    /// A row-mode function was registered without a return type.
    #[error("MissingReturnType: row function {0} requires a return type")]
    MissingReturnType(String),

    /// No registered overload matches the argument types of a call.
    #[error("NoMatchingSignature: no matching signature for {name}{signature}")]
    NoMatchingSignature { name: String, signature: String },

    /// A handler is already registered for an operator kind.
    #[error("HandlerConflict: a handler for {0} is already registered")]
    HandlerConflict(String),

    /// No handler is stored for an operator kind.
    #[error("HandlerNotFound: no handler registered for {0}")]
    HandlerNotFound(String),

    /// Two logical columns would share one name.
    #[error("DuplicateColumn: {0}")]
    DuplicateColumn(String),

    /// Column not found.
    #[error("ColumnNotFound: {0}")]
    ColumnNotFound(String),

    /// Table not registered in the catalog.
    #[error("TableNotFound: {0}")]
    TableNotFound(String),

    /// Schema-related error.
    #[error("SchemaError: {0}")]
    SchemaError(String),

    /// Type mismatch or invalid type operation.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Invalid value provided.
    #[error("ValueError: {0}")]
    ValueError(String),

    /// Query execution error.
    #[error("ExecutionError: {0}")]
    ExecutionError(String),

    /// Feature not yet implemented.
    #[error("NotImplemented: {0}")]
    NotImplemented(String),

    /// Internal error (bug in Quarry).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// Invalid parameter provided.
    #[error("InvalidParameter: {0}")]
    InvalidParameter(String),

    /// Arrow error.
    #[error("ArrowError: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl QuarryError {
    /// Create a new `UnsupportedOperator` error.
    pub fn unsupported_operator<S: Into<String>>(tag: S) -> Self {
        Self::UnsupportedOperator(tag.into())
    }

    /// Create a new `InputArity` error.
    pub fn input_arity<S: Into<String>>(operator: S, expected: usize, actual: usize) -> Self {
        Self::InputArity {
            operator: operator.into(),
            expected,
            actual,
        }
    }

    /// Create a new `SchemaMismatch` error.
    pub fn schema_mismatch(expected: Vec<String>, actual: Vec<String>) -> Self {
        Self::SchemaMismatch { expected, actual }
    }

    /// Create a new `SignatureConflict` error.
    pub fn signature_conflict<N: Into<String>, S: Into<String>>(name: N, signature: S) -> Self {
        Self::SignatureConflict {
            name: name.into(),
            signature: signature.into(),
        }
    }

    /// Create a new `NoMatchingSignature` error.
    pub fn no_matching_signature<N: Into<String>, S: Into<String>>(name: N, signature: S) -> Self {
        Self::NoMatchingSignature {
            name: name.into(),
            signature: signature.into(),
        }
    }

    /// Create a new `TypeError`.
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new `ValueError`.
    pub fn value_error<S: Into<String>>(msg: S) -> Self {
        Self::ValueError(msg.into())
    }

    /// Create a new `SchemaError`.
    pub fn schema_error<S: Into<String>>(msg: S) -> Self {
        Self::SchemaError(msg.into())
    }

    /// Create a new `NotImplemented` error.
    pub fn not_implemented<S: Into<String>>(msg: S) -> Self {
        Self::NotImplemented(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Create a new `ExecutionError`.
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Create a new `InvalidParameter` error.
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// Ensure a condition holds, returning an `ExecutionError` if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::QuarryError::ExecutionError($msg.to_string()));
        }
    };
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::QuarryError::$variant(format!($($msg)*)));
        }
    };
}

/// Return early with a `SchemaError`.
#[macro_export]
macro_rules! schema_err {
    ($($arg:tt)*) => {
        return Err($crate::QuarryError::SchemaError(format!($($arg)*)))
    };
}

/// Return early with a `TypeError`.
#[macro_export]
macro_rules! type_err {
    ($($arg:tt)*) => {
        return Err($crate::QuarryError::TypeError(format!($($arg)*)))
    };
}
