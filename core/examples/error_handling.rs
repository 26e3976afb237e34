// core/examples/error_handling.rs

use onion::{handler_fn, ContextData, Next, OnionError, Pipeline, PipelineResult};
use std::time::Duration;
use tracing::{error, info, warn};

// 1. Define a custom application error type
#[derive(Debug, thiserror::Error)]
enum ExampleAppError {
  #[error("A custom application error occurred: {0}")]
  CustomError(String),

  #[error("Downstream did not answer within {0:?}")]
  Timeout(Duration),

  #[error("Onion framework error: {0}")]
  OnionFramework(#[from] OnionError),
}

#[derive(Debug, Default)]
struct ErrorContext {
  processed: Vec<String>,
  fallback_used: bool,
}

type Ctx = ContextData<ErrorContext>;
type AppNext = Next<ErrorContext, ExampleAppError>;

#[tokio::main]
async fn main() -> Result<(), ExampleAppError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Error Handling Example ---");

  info!("\nScenario 1: an outer layer recovers from an inner failure");
  recover_from_inner_failure().await?;

  info!("\nScenario 2: a timeout layer races the rest of the chain");
  timeout_downstream().await;

  info!("\nScenario 3: calling next twice is rejected");
  double_next().await;

  info!("\nScenario 4: a declared layer without a handler fails at build time");
  missing_handler();

  Ok(())
}

async fn recover_from_inner_failure() -> Result<(), ExampleAppError> {
  let mut builder = Pipeline::<ErrorContext, ExampleAppError>::builder("recovering");
  builder.layer("fallback", |ctx: Ctx, next: AppNext| async move {
    match next.run().await {
      Ok(result) => Ok(result),
      Err(e) => {
        warn!("Downstream failed ({}), serving fallback.", e);
        ctx.write().fallback_used = true;
        Ok::<_, ExampleAppError>(PipelineResult::Stopped)
      }
    }
  })?;
  builder.layer("flaky", |ctx: Ctx, _next: AppNext| async move {
    ctx.write().processed.push("flaky".to_string());
    Err::<PipelineResult, _>(ExampleAppError::CustomError("backend unavailable".to_string()))
  })?;
  let pipeline = builder.build()?;

  let context = ContextData::new(ErrorContext::default());
  let result = pipeline.run(context.clone()).await?;
  info!(?result, "Pipeline recovered.");
  assert!(context.read().fallback_used);
  Ok(())
}

async fn timeout_downstream() {
  let limit = Duration::from_millis(50);
  let pipeline = onion::compose(vec![
    handler_fn(move |_ctx: Ctx, next: AppNext| async move {
      match tokio::time::timeout(limit, next.run()).await {
        Ok(result) => result,
        Err(_) => Err(ExampleAppError::Timeout(limit)),
      }
    }),
    handler_fn(|ctx: Ctx, next: AppNext| async move {
      ctx.write().processed.push("slow".to_string());
      tokio::time::sleep(Duration::from_secs(1)).await;
      next.run().await
    }),
  ]);

  match pipeline.run(ContextData::new(ErrorContext::default())).await {
    Err(e @ ExampleAppError::Timeout(_)) => info!("Pipeline failed as expected: {}", e),
    other => error!("Expected a timeout, got {:?}", other),
  }
}

async fn double_next() {
  let pipeline = onion::compose(vec![
    handler_fn(|_ctx: Ctx, next: AppNext| async move {
      next.run().await?;
      // A retry loop written this way would re-run every inner layer; it is refused.
      next.run().await
    }),
    handler_fn(|ctx: Ctx, next: AppNext| async move {
      ctx.write().processed.push("inner".to_string());
      next.run().await
    }),
  ]);

  let context = ContextData::new(ErrorContext::default());
  match pipeline.run(context.clone()).await {
    Err(ExampleAppError::OnionFramework(e @ OnionError::NextCalledMultipleTimes { .. })) => {
      info!("Pipeline failed as expected: {}", e)
    }
    other => error!("Expected NextCalledMultipleTimes, got {:?}", other),
  }
  assert_eq!(context.read().processed, vec!["inner"]);
}

fn missing_handler() {
  let mut builder = Pipeline::<ErrorContext, ExampleAppError>::builder("incomplete");
  if let Err(e) = builder.declare("auth").and_then(|b| b.declare("render")) {
    error!("Unexpected builder error: {}", e);
    return;
  }

  match builder.build() {
    Err(e @ OnionError::InvalidHandler { .. }) => info!("Build failed as expected: {}", e),
    Err(e) => error!("Unexpected error: {}", e),
    Ok(p) => error!("Expected InvalidHandler, built {:?}", p),
  }
}
