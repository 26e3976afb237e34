// onion/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` type, the `compose` entry point, and
//! `PipelineBuilder` for named, declaratively assembled pipelines.

use crate::core::handler::Handler;
use crate::core::layer::{Layer, LayerDef, SkipCondition};
use crate::error::{OnionError, OnionResult};
use crate::pipeline::execution::Chain;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// A composed, reusable chain of handlers.
///
/// `TData` is the underlying type of the shared context; `Err` the error type
/// its handlers return. `Err` must be `From<OnionError>` so that composer-level
/// failures (e.g. a doubly invoked `next`) surface in the caller's error type.
///
/// Cloning is cheap and every clone runs the same layers. A pipeline holds no
/// per-run state, so `run` can be called repeatedly and concurrently.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  pub(crate) chain: Arc<Chain<TData, Err>>,
}

/// Composes `handlers` into a pipeline, preserving their order.
///
/// An empty sequence yields a pipeline that resolves immediately with
/// `PipelineResult::Completed`. Layers are named `layer_0`, `layer_1`, ...
pub fn compose<TData, Err>(handlers: impl IntoIterator<Item = Handler<TData, Err>>) -> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  Pipeline::compose(handlers)
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  /// See [`compose`].
  pub fn compose(handlers: impl IntoIterator<Item = Handler<TData, Err>>) -> Self {
    let layers = handlers
      .into_iter()
      .enumerate()
      .map(|(idx, handler)| Layer {
        def: LayerDef::new(format!("layer_{}", idx)),
        handler,
      })
      .collect();
    Self::from_layers("composed", layers)
  }

  /// Starts a named pipeline definition.
  pub fn builder(name: impl Into<String>) -> PipelineBuilder<TData, Err> {
    PipelineBuilder::new(name)
  }

  fn from_layers(name: impl Into<String>, layers: Vec<Layer<TData, Err>>) -> Self {
    Self {
      chain: Arc::new(Chain {
        name: name.into(),
        layers,
      }),
    }
  }

  pub fn name(&self) -> &str {
    self.chain.name()
  }

  pub fn len(&self) -> usize {
    self.chain.len()
  }

  pub fn is_empty(&self) -> bool {
    self.chain.layers.is_empty()
  }

  /// Layer names in execution order.
  pub fn layer_names(&self) -> Vec<&str> {
    self.chain.layers.iter().map(|l| l.def.name.as_str()).collect()
  }
}

impl<TData, Err> Clone for Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  fn clone(&self) -> Self {
    Self {
      chain: self.chain.clone(),
    }
  }
}

impl<TData, Err> std::fmt::Debug for Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline")
      .field("name", &self.chain.name)
      .field("layers", &self.layer_names())
      .finish()
  }
}

/// A layer under construction: its handler may not have been registered yet.
pub(crate) struct PendingLayer<TData: 'static + Send + Sync, Err> {
  pub(crate) def: LayerDef<TData>,
  pub(crate) handler: Option<Handler<TData, Err>>,
}

/// Named, editable pipeline definition.
///
/// Layers can be declared first and given handlers later (`declare` + `handle`),
/// or declared with their handler in one go (`layer`). `build` checks that every
/// declared layer has a handler, so a missing one is reported at composition
/// time instead of in the middle of a run.
pub struct PipelineBuilder<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) layers: Vec<PendingLayer<TData, Err>>,
}

impl<TData, Err> PipelineBuilder<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      layers: Vec::new(),
    }
  }

  pub(crate) fn position(&self, layer_name: &str) -> OnionResult<usize> {
    self
      .layers
      .iter()
      .position(|l| l.def.name == layer_name)
      .ok_or_else(|| OnionError::LayerNotFound {
        layer: layer_name.to_string(),
      })
  }

  fn ensure_layer_not_exists(&self, layer_name: &str) -> OnionResult<()> {
    if self.layers.iter().any(|l| l.def.name == layer_name) {
      return Err(OnionError::DuplicateLayer {
        layer: layer_name.to_string(),
      });
    }
    Ok(())
  }

  fn insert_at(&mut self, idx: usize, layer_name: String) -> OnionResult<&mut Self> {
    self.ensure_layer_not_exists(&layer_name)?;
    self.layers.insert(
      idx,
      PendingLayer {
        def: LayerDef::new(layer_name),
        handler: None,
      },
    );
    Ok(self)
  }

  // --- Structural Methods ---

  /// Appends a layer slot without a handler. Fill it with `handle` before `build`.
  pub fn declare<S: Into<String>>(&mut self, layer_name: S) -> OnionResult<&mut Self> {
    let idx = self.layers.len();
    self.insert_at(idx, layer_name.into())
  }

  pub fn insert_before<S: Into<String>>(&mut self, existing_layer: &str, new_layer: S) -> OnionResult<&mut Self> {
    let idx = self.position(existing_layer)?;
    self.insert_at(idx, new_layer.into())
  }

  pub fn insert_after<S: Into<String>>(&mut self, existing_layer: &str, new_layer: S) -> OnionResult<&mut Self> {
    let idx = self.position(existing_layer)?;
    self.insert_at(idx + 1, new_layer.into())
  }

  /// Removes a layer and its handler. Returns `false` if no such layer exists.
  pub fn remove_layer(&mut self, layer_name: &str) -> bool {
    match self.position(layer_name) {
      Ok(idx) => {
        self.layers.remove(idx);
        true
      }
      Err(_) => false,
    }
  }

  pub fn set_skip_condition(
    &mut self,
    layer_name: &str,
    skip_if: Option<SkipCondition<TData>>,
  ) -> OnionResult<&mut Self> {
    let idx = self.position(layer_name)?;
    self.layers[idx].def.skip_if = skip_if;
    Ok(self)
  }

  pub fn layer_names(&self) -> Vec<&str> {
    self.layers.iter().map(|l| l.def.name.as_str()).collect()
  }

  /// Validates the definition and freezes it into a runnable `Pipeline`.
  ///
  /// Fails with `OnionError::InvalidHandler` naming the first declared layer
  /// that never received a handler.
  #[instrument(
    name = "PipelineBuilder::build",
    skip_all,
    fields(pipeline = %self.name, num_layers = self.layers.len())
  )]
  pub fn build(self) -> OnionResult<Pipeline<TData, Err>> {
    let mut layers = Vec::with_capacity(self.layers.len());
    for (index, pending) in self.layers.into_iter().enumerate() {
      let Some(handler) = pending.handler else {
        event!(Level::ERROR, layer = %pending.def.name, layer_index = index, "Layer has no handler.");
        return Err(OnionError::InvalidHandler {
          layer: pending.def.name,
          index,
        });
      };
      layers.push(Layer {
        def: pending.def,
        handler,
      });
    }
    event!(Level::DEBUG, "Pipeline built.");
    Ok(Pipeline::from_layers(self.name, layers))
  }
}
