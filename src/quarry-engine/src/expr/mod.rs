//! Expression evaluation over Arrow record batches.

mod evaluator;

pub use evaluator::ExprEvaluator;
