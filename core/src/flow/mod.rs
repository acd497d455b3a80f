// wallet_flow/src/flow/mod.rs

//! The async step-pipeline engine the orchestrator runs on.
//!
//! A `Pipeline<TData, Err>` is an ordered list of named steps. Each step has
//! `before`/`on`/`after` handlers that share one `ContextData<TData>`.
//! Pipelines are registered in a `FlowRegistry` keyed by `TData`.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod hooks;
pub mod registry;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::Pipeline;
pub use registry::FlowRegistry;
pub use step::{Handler, SkipCondition, StepDef};
