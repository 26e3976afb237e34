pub mod context_data;
pub mod control;
pub mod handler;
pub mod layer;
pub mod next;

// Re-export key types for easier access from other onion modules (and lib.rs)
pub use context_data::ContextData;
pub use control::PipelineResult;
pub use handler::{from_middleware, handler_fn, Handler, HandlerFuture, Middleware};
pub use layer::{LayerDef, SkipCondition};
pub use next::Next;
