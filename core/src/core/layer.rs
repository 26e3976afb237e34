// onion/src/core/layer.rs

//! Definition of a single named layer within a pipeline.

use super::{ContextData, Handler};

// Evaluated against the run's context right before the layer would be dispatched.
pub type SkipCondition<TData> = std::sync::Arc<dyn Fn(ContextData<TData>) -> bool + Send + Sync + 'static>;

/// Name and skip condition of a layer. The handler itself is kept next to it
/// by the builder (possibly absent) and by the built pipeline (always present).
#[derive(Clone)]
pub struct LayerDef<TData: 'static + Send + Sync> {
  pub name: String,
  // If this returns true for a run, dispatch moves straight on to the next layer.
  pub skip_if: Option<SkipCondition<TData>>,
}

impl<TData: 'static + Send + Sync> LayerDef<TData> {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      skip_if: None,
    }
  }

  pub(crate) fn should_skip(&self, ctx: &ContextData<TData>) -> bool {
    self.skip_if.as_ref().map_or(false, |cond| cond(ctx.clone()))
  }
}

impl<TData: 'static + Send + Sync> std::fmt::Debug for LayerDef<TData> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LayerDef")
      .field("name", &self.name)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}

/// A layer of a built pipeline: definition plus its (mandatory) handler.
pub(crate) struct Layer<TData: 'static + Send + Sync, Err> {
  pub(crate) def: LayerDef<TData>,
  pub(crate) handler: Handler<TData, Err>,
}
