// onion/src/pipeline/hooks.rs

//! Handler registration on `PipelineBuilder`: closures via `layer`/`handle`,
//! `Middleware` implementations via `layer_with`/`handle_with`.

use tracing::{event, Level};

use crate::core::context_data::ContextData;
use crate::core::control::PipelineResult;
use crate::core::handler::{from_middleware, handler_fn, Handler, Middleware};
use crate::core::next::Next;
use crate::error::{OnionError, OnionResult};
use crate::pipeline::definition::PipelineBuilder;
use std::future::Future;

impl<TData, Err> PipelineBuilder<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  /// Appends a new layer with its handler.
  ///
  /// The handler takes the run's `ContextData<TData>` and its `Next`, and
  /// resolves to `Result<PipelineResult, UserProvidedErr>` where
  /// `UserProvidedErr` converts into the pipeline's `Err`.
  pub fn layer<F, UserProvidedErr>(
    &mut self,
    layer_name: &str,
    handler: impl Fn(ContextData<TData>, Next<TData, Err>) -> F + Send + Sync + 'static,
  ) -> OnionResult<&mut Self>
  where
    F: Future<Output = Result<PipelineResult, UserProvidedErr>> + Send + 'static,
    UserProvidedErr: Into<Err> + Send + Sync + 'static,
  {
    self.declare(layer_name)?;
    self.set_handler(layer_name, handler_fn(handler))
  }

  /// Appends a new layer backed by a `Middleware` implementation.
  pub fn layer_with<M>(&mut self, layer_name: &str, middleware: M) -> OnionResult<&mut Self>
  where
    M: Middleware<TData, Err>,
  {
    self.declare(layer_name)?;
    self.set_handler(layer_name, from_middleware(middleware))
  }

  /// Appends an already boxed handler, e.g. a nested pipeline's `into_handler()`.
  pub fn layer_boxed(&mut self, layer_name: &str, handler: Handler<TData, Err>) -> OnionResult<&mut Self> {
    self.declare(layer_name)?;
    self.set_handler(layer_name, handler)
  }

  /// Registers the handler of a previously declared layer, replacing any earlier one.
  pub fn handle<F, UserProvidedErr>(
    &mut self,
    layer_name: &str,
    handler: impl Fn(ContextData<TData>, Next<TData, Err>) -> F + Send + Sync + 'static,
  ) -> OnionResult<&mut Self>
  where
    F: Future<Output = Result<PipelineResult, UserProvidedErr>> + Send + 'static,
    UserProvidedErr: Into<Err> + Send + Sync + 'static,
  {
    self.set_handler(layer_name, handler_fn(handler))
  }

  pub fn handle_with<M>(&mut self, layer_name: &str, middleware: M) -> OnionResult<&mut Self>
  where
    M: Middleware<TData, Err>,
  {
    self.set_handler(layer_name, from_middleware(middleware))
  }

  fn set_handler(&mut self, layer_name: &str, handler: Handler<TData, Err>) -> OnionResult<&mut Self> {
    let idx = self.position(layer_name)?;
    if self.layers[idx].handler.replace(handler).is_some() {
      event!(Level::WARN, layer = %layer_name, "Replacing previously registered handler.");
    } else {
      event!(Level::TRACE, layer = %layer_name, "Handler registered.");
    }
    Ok(self)
  }
}
