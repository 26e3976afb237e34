// core/examples/basic_pipeline.rs

use onion::{ContextData, OnionError, Pipeline, PipelineResult};
use std::time::Instant;
use tracing::info;

// 1. Define the Context Data shared by every layer
#[derive(Debug, Default)]
struct RequestContext {
  path: String,
  response: Option<String>,
  trail: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), OnionError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Onion Pipeline Example ---");

  // 2. Declare the layers, outermost first, and give each a handler
  let mut builder = Pipeline::<RequestContext, OnionError>::builder("basic");

  builder.layer("timing", |ctx: ContextData<RequestContext>, next| async move {
    let started = Instant::now();
    let result = next.run().await;
    let elapsed = started.elapsed();
    ctx.write().trail.push(format!("timing: {:?}", elapsed));
    info!(?elapsed, "Request handled.");
    result
  })?;

  builder.layer("normalize", |ctx: ContextData<RequestContext>, next| async move {
    {
      let mut data = ctx.write();
      data.path = data.path.trim_end_matches('/').to_lowercase();
      let msg = format!("normalize: path = {}", data.path);
      data.trail.push(msg);
    }
    next.run().await
  })?;

  builder.layer("respond", |ctx: ContextData<RequestContext>, _next| async move {
    let mut data = ctx.write();
    let body = format!("hello from {}", data.path);
    data.trail.push("respond".to_string());
    data.response = Some(body);
    // Innermost layer: answer instead of delegating.
    Ok::<_, OnionError>(PipelineResult::Completed)
  })?;

  let pipeline = builder.build()?;
  info!(layers = ?pipeline.layer_names(), "Pipeline built.");

  // 3. Run it
  let context = ContextData::new(RequestContext {
    path: "/Users/".to_string(),
    ..Default::default()
  });
  let result = pipeline.run(context.clone()).await?;
  info!(?result, "Pipeline finished.");

  let final_state = context.read();
  for entry in &final_state.trail {
    info!("- {}", entry);
  }
  assert_eq!(final_state.response.as_deref(), Some("hello from /users"));
  assert_eq!(final_state.trail.len(), 3);
  assert!(final_state.trail[2].starts_with("timing"));

  Ok(())
}
