//! Custom operation interpreters, one per id.

use crate::domain::{EvaluationError, EvaluationResult};
use crate::ports::CustomOperationInterpreter;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Owns the custom operation interpreters and dispatches every operation.
///
/// Built-in operations are resolved by an exhaustive match; only
/// `custom_json` consults the registered interpreters.
#[derive(Default)]
pub struct EvaluatorRegistry {
    custom: BTreeMap<String, Arc<dyn CustomOperationInterpreter>>,
}

impl fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluatorRegistry")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the interpreter for `id`. Each id has exactly one
    /// interpreter; registering a second is a logic error.
    pub fn register_custom(
        &mut self,
        id: impl Into<String>,
        interpreter: Arc<dyn CustomOperationInterpreter>,
    ) -> EvaluationResult<()> {
        let id = id.into();
        if self.custom.contains_key(&id) {
            return Err(EvaluationError::DuplicateInterpreter(id));
        }
        info!(id = %id, "Registered custom operation interpreter");
        self.custom.insert(id, interpreter);
        Ok(())
    }

    pub fn interpreter(&self, id: &str) -> Option<&Arc<dyn CustomOperationInterpreter>> {
        self.custom.get(id)
    }

    pub fn custom_ids(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(String::as_str)
    }
}
