// src/lib.rs

//! Onion: an asynchronous middleware composer for Rust.
//!
//! An ordered list of handlers is composed into a reusable [`Pipeline`]. Every
//! handler receives the shared context and a [`Next`] continuation standing for
//! "the rest of the chain", so it can:
//!  - run logic before delegating downstream,
//!  - await `next.run()` and observe (or recover from) the downstream result,
//!  - run logic after everything downstream has settled,
//!  - or short-circuit by never calling `next`.
//!
//! A continuation is one-shot: invoking it twice fails the run with
//! [`OnionError::NextCalledMultipleTimes`] instead of executing the remaining
//! layers again.
//!
//! ```ignore
//! let pipeline = compose(vec![
//!   handler_fn(|ctx: ContextData<Log>, next| async move {
//!     ctx.write().push("pre0");
//!     let res = next.run().await;
//!     ctx.write().push("post0");
//!     res
//!   }),
//!   // ...
//! ]);
//! pipeline.run(ContextData::new(Log::default())).await?;
//! ```

pub mod core;
pub mod error;
pub mod pipeline;

// --- Re-exports for the Public API ---

pub use crate::core::context_data::ContextData;
pub use crate::core::control::PipelineResult;
pub use crate::core::handler::{from_middleware, handler_fn, Handler, HandlerFuture, Middleware};
pub use crate::core::layer::{LayerDef, SkipCondition};
pub use crate::core::next::Next;

pub use crate::pipeline::definition::{compose, Pipeline, PipelineBuilder};

pub use crate::error::{OnionError, OnionResult};

// Re-exported so `Middleware` implementors don't need their own async-trait dependency.
pub use async_trait::async_trait;
