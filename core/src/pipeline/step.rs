// core/src/pipeline/step.rs

use super::{ContextData, PipelineControl};
use std::future::Future;
use std::pin::Pin;

/// Boxed async handler registered against a step.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>> + Send + Sync,
>;

/// A named step. A non-optional step without handlers fails the run.
#[derive(Debug, Clone)]
pub struct StepDef {
  pub name: String,
  pub optional: bool,
}
