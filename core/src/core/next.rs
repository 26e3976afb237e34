// onion/src/core/next.rs

//! The `next` continuation handed to every handler.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineResult;
use crate::core::handler::HandlerFuture;
use crate::error::OnionError;
use crate::pipeline::execution::{dispatch, Chain};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{event, Level};

/// "Run the rest of the chain" for one handler in one run.
///
/// Bound to the index of the following layer and to this run's context only,
/// so concurrent runs never share continuation state. A continuation can be
/// consumed once: a second `run()` (on it or on any clone of it) resolves to
/// `OnionError::NextCalledMultipleTimes` converted into `Err`, and the
/// downstream layers are not executed again.
pub struct Next<TData, Err>
where
  TData: 'static + Send + Sync,
{
  chain: Arc<Chain<TData, Err>>,
  // Index of the first layer that `run` dispatches.
  index: usize,
  ctx: ContextData<TData>,
  consumed: Arc<AtomicBool>,
  // Continuation of an enclosing pipeline, run once this chain is exhausted.
  tail: Option<Arc<Next<TData, Err>>>,
}

impl<TData, Err> Next<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  pub(crate) fn new(
    chain: Arc<Chain<TData, Err>>,
    index: usize,
    ctx: ContextData<TData>,
    tail: Option<Arc<Next<TData, Err>>>,
  ) -> Self {
    Self {
      chain,
      index,
      ctx,
      consumed: Arc::new(AtomicBool::new(false)),
      tail,
    }
  }

  /// Dispatches the remaining layers and resolves to their result.
  ///
  /// The next handler is invoked as part of this call; its future (and
  /// everything it delegates to) is driven by awaiting the returned future.
  pub fn run(&self) -> HandlerFuture<Err> {
    if self.consumed.swap(true, Ordering::AcqRel) {
      let owner_index = self.index - 1;
      let err = OnionError::NextCalledMultipleTimes {
        layer: self.chain.layer_name(owner_index).to_string(),
        index: owner_index,
      };
      event!(Level::ERROR, error = %err, "Continuation invoked more than once.");
      let failed: Result<PipelineResult, Err> = Err(Err::from(err));
      return Box::pin(std::future::ready(failed));
    }
    dispatch(self.chain.clone(), self.index, self.ctx.clone(), self.tail.clone())
  }

  /// The context of the run this continuation belongs to.
  pub fn context(&self) -> &ContextData<TData> {
    &self.ctx
  }

  /// Whether `run` has already been called on this continuation.
  pub fn is_consumed(&self) -> bool {
    self.consumed.load(Ordering::Acquire)
  }

  /// Number of layers after the current one in this pipeline (skip conditions
  /// not evaluated, enclosing pipelines not counted).
  pub fn remaining(&self) -> usize {
    self.chain.len().saturating_sub(self.index)
  }
}

impl<TData, Err> Clone for Next<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  fn clone(&self) -> Self {
    Self {
      chain: self.chain.clone(),
      index: self.index,
      ctx: self.ctx.clone(),
      consumed: self.consumed.clone(),
      tail: self.tail.clone(),
    }
  }
}

impl<TData, Err> std::fmt::Debug for Next<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Next")
      .field("pipeline", &self.chain.name())
      .field("index", &self.index)
      .field("consumed", &self.is_consumed())
      .field("nested", &self.tail.is_some())
      .finish()
  }
}

