// core/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` definition and its construction.

use super::step::{Handler, StepDef};
use crate::error::PipelineError;
use std::collections::HashMap;

/// An ordered set of named steps over a root context `TData`.
///
/// `Err` is the error type handlers return. It must absorb
/// [`PipelineError`] so that engine failures (a non-optional step without a
/// handler) surface through the same channel as handler failures.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef>,
  pub(crate) handlers: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(step_name, optional)` pairs, run in the given order.
  pub fn new(name: impl Into<String>, step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, optional)| StepDef {
        name: (*step_name).to_string(),
        optional: *optional,
      })
      .collect();

    Self {
      name: name.into(),
      steps,
      handlers: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> impl Iterator<Item = &str> {
    self.steps.iter().map(|s| s.name.as_str())
  }

  /// Registering a handler on an undeclared step is a wiring bug, not a runtime
  /// condition, so it panics at construction time.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "pipeline '{}': step '{}' is not declared",
        self.name, step_name
      );
    }
  }

  pub(crate) fn handlers_for(&self, step_name: &str) -> &[Handler<TData, Err>] {
    self
      .handlers
      .get(step_name)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }
}
