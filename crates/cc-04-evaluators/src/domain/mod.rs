pub mod errors;

pub use errors::{EvaluationError, EvaluationResult};
