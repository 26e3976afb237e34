// onion/src/pipeline/mod.rs

//! Defines `Pipeline<TData, Err>`, its builder, and the execution logic.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::{compose, Pipeline, PipelineBuilder};
