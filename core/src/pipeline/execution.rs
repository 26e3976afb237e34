// onion/src/pipeline/execution.rs

//! Runtime side of a pipeline: the layer chain shared by every run, the
//! index-based `dispatch`, and `Pipeline::run`.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineResult;
use crate::core::handler::{Handler, HandlerFuture};
use crate::core::layer::Layer;
use crate::core::next::Next;
use crate::error::OnionError;
use crate::pipeline::definition::Pipeline;
use std::sync::Arc;
use tracing::{event, instrument, span, Instrument, Level};

/// Immutable, ordered layers of a built pipeline.
pub(crate) struct Chain<TData: 'static + Send + Sync, Err> {
  pub(crate) name: String,
  pub(crate) layers: Vec<Layer<TData, Err>>,
}

impl<TData: 'static + Send + Sync, Err> Chain<TData, Err> {
  pub(crate) fn name(&self) -> &str {
    &self.name
  }

  pub(crate) fn len(&self) -> usize {
    self.layers.len()
  }

  pub(crate) fn layer_name(&self, index: usize) -> &str {
    self.layers.get(index).map_or("<end>", |layer| layer.def.name.as_str())
  }
}

/// Runs layer `index` (or the first non-skipped layer after it) with a fresh
/// `Next` bound to the layer that follows.
///
/// The handler is invoked before this function returns; only its future is
/// deferred. Past the last layer, the enclosing pipeline's continuation runs
/// if there is one, otherwise the chain resolves to `Completed`.
pub(crate) fn dispatch<TData, Err>(
  chain: Arc<Chain<TData, Err>>,
  mut index: usize,
  ctx: ContextData<TData>,
  tail: Option<Arc<Next<TData, Err>>>,
) -> HandlerFuture<Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  while let Some(layer) = chain.layers.get(index) {
    if layer.def.should_skip(&ctx) {
      event!(Level::DEBUG, layer = %layer.def.name, layer_index = index, "Layer skipped due to 'skip_if' condition.");
      index += 1;
      continue;
    }

    let layer_span = span!(Level::DEBUG, "pipeline_layer", layer = %layer.def.name, layer_index = index);
    let next = Next::new(chain.clone(), index + 1, ctx.clone(), tail);
    let handler_fut = {
      let _enter = layer_span.enter();
      event!(Level::TRACE, "Invoking handler.");
      (layer.handler)(ctx, next)
    };
    return Box::pin(handler_fut.instrument(layer_span));
  }

  match tail {
    Some(outer_next) => {
      event!(Level::TRACE, pipeline = %chain.name, "End of nested chain, handing over to enclosing pipeline.");
      outer_next.run()
    }
    None => {
      event!(Level::TRACE, pipeline = %chain.name, "End of chain reached.");
      Box::pin(std::future::ready(Ok::<_, Err>(PipelineResult::Completed)))
    }
  }
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  /// Executes the pipeline against the given shared context.
  ///
  /// Resolves once the first layer's future (and therefore every `next` it
  /// awaited) has settled. A handler error is returned unchanged; there is no
  /// recovery at this level. An empty pipeline resolves to `Completed`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      pipeline = %self.chain.name,
      num_layers = self.chain.len(),
      context_data_type = %std::any::type_name::<TData>(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");
    let result = dispatch(self.chain.clone(), 0, ctx_data, None).await?;
    event!(Level::DEBUG, ?result, "Pipeline execution finished.");
    Ok(result)
  }

  /// Turns the pipeline into a single handler for use inside another pipeline.
  ///
  /// Its layers wrap the enclosing pipeline's downstream layers: once the last
  /// inner layer calls `next`, the outer `next` runs, and the inner post-phases
  /// execute after the outer downstream settles.
  pub fn into_handler(self) -> Handler<TData, Err> {
    let chain = self.chain;
    Box::new(move |ctx: ContextData<TData>, next: Next<TData, Err>| dispatch(chain.clone(), 0, ctx, Some(Arc::new(next))))
  }
}
