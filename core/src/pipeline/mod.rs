// core/src/pipeline/mod.rs

//! A small async step-pipeline engine.
//!
//! A [`Pipeline`] is an ordered list of named steps. Handlers attach to a step
//! and operate on a shared [`ContextData`]. Any handler may stop the run early; any handler error
//! aborts it.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod hooks;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::Pipeline;
pub use step::{Handler, StepDef};
