// onion/src/core/handler.rs

//! Handler types: the closure form stored in a pipeline, the `Middleware`
//! trait for struct-based handlers, and the adapters between them.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineResult;
use crate::core::next::Next;
use crate::error::OnionError;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by every handler and by `Next::run`.
pub type HandlerFuture<Err> = Pin<Box<dyn Future<Output = Result<PipelineResult, Err>> + Send>>;

/// Type alias for a pipeline handler.
///
/// A handler receives a clone of the run's `ContextData<TData>` and the `Next`
/// continuation for the rest of the chain. It may:
/// 1. run logic before delegating,
/// 2. call `next.run().await` (at most once) and inspect the downstream result,
/// 3. run logic after the downstream layers have settled,
/// 4. or return without calling `next`, which short-circuits the chain.
///
/// Lock guards on the context must be dropped before awaiting `next`.
pub type Handler<TData, Err> = Box<dyn Fn(ContextData<TData>, Next<TData, Err>) -> HandlerFuture<Err> + Send + Sync>;

/// Struct-based handler, for middleware that carries its own configuration.
///
/// ```ignore
/// struct Audit { label: &'static str }
///
/// #[async_trait]
/// impl Middleware<MyCtx, MyError> for Audit {
///   async fn handle(&self, ctx: ContextData<MyCtx>, next: Next<MyCtx, MyError>) -> Result<PipelineResult, MyError> {
///     ctx.write().audit.push(self.label);
///     next.run().await
///   }
/// }
/// ```
#[async_trait]
pub trait Middleware<TData, Err>: Send + Sync + 'static
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
{
  async fn handle(&self, ctx: ContextData<TData>, next: Next<TData, Err>) -> Result<PipelineResult, Err>;
}

/// Wraps a closure `Fn(ContextData<TData>, Next<TData, Err>) -> impl Future` into a [`Handler`].
///
/// The closure may fail with any error convertible into the pipeline's `Err`.
pub fn handler_fn<TData, Err, F, Fut, UserErr>(f: F) -> Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
  F: Fn(ContextData<TData>, Next<TData, Err>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<PipelineResult, UserErr>> + Send + 'static,
  UserErr: Into<Err> + Send + Sync + 'static,
{
  Box::new(move |ctx: ContextData<TData>, next: Next<TData, Err>| {
    let user_fut = f(ctx, next);
    Box::pin(async move { user_fut.await.map_err(Into::into) })
  })
}

/// Adapts a [`Middleware`] implementation into a [`Handler`].
pub fn from_middleware<TData, Err, M>(middleware: M) -> Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OnionError> + Send + Sync + 'static,
  M: Middleware<TData, Err>,
{
  let middleware = Arc::new(middleware);
  Box::new(move |ctx: ContextData<TData>, next: Next<TData, Err>| {
    let middleware = middleware.clone();
    Box::pin(async move { middleware.handle(ctx, next).await })
  })
}
