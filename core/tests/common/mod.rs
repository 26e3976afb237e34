// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use onion::{handler_fn, ContextData, Handler, Next, OnionError, PipelineResult};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Common Context Structs ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub log: Vec<String>,
  pub counter: i32,
  pub skip_auth: bool,
}

pub type Ctx = ContextData<TestContext>;
pub type TestNext = Next<TestContext, TestError>;

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Onion framework error: {0}")]
  Onion(String), // OnionError as its Debug string, for Eq comparison

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<OnionError> for TestError {
  fn from(oe: OnionError) -> Self {
    TestError::Onion(format!("{:?}", oe))
  }
}

// --- Common Handler Creators ---

/// `log.push("pre{i}"); next().await?; log.push("post{i}")`
pub fn logging_layer(idx: usize) -> Handler<TestContext, TestError> {
  handler_fn(move |ctx: Ctx, next: TestNext| async move {
    ctx.write().log.push(format!("pre{}", idx));
    let downstream = next.run().await?;
    ctx.write().log.push(format!("post{}", idx));
    Ok::<_, TestError>(downstream)
  })
}

/// Logs its pre-phase, then fails without calling `next`.
pub fn failing_layer(idx: usize, message: &'static str) -> Handler<TestContext, TestError> {
  handler_fn(move |ctx: Ctx, _next: TestNext| async move {
    ctx.write().log.push(format!("pre{}", idx));
    tracing::warn!(target: "test_handlers", layer = idx, "failing with: '{}'", message);
    Err::<PipelineResult, _>(TestError::Handler(message.to_string()))
  })
}

/// Logs and answers without delegating.
pub fn stopping_layer(idx: usize) -> Handler<TestContext, TestError> {
  handler_fn(move |ctx: Ctx, _next: TestNext| async move {
    ctx.write().log.push(format!("stop{}", idx));
    Ok::<_, TestError>(PipelineResult::Stopped)
  })
}

/// Bumps `hits` every time it runs, then delegates.
pub fn counting_layer(hits: Arc<AtomicUsize>) -> Handler<TestContext, TestError> {
  handler_fn(move |ctx: Ctx, next: TestNext| {
    let hits = hits.clone();
    async move {
      hits.fetch_add(1, Ordering::SeqCst);
      ctx.write().counter += 1;
      next.run().await
    }
  })
}

pub fn logging_chain(len: usize) -> Vec<Handler<TestContext, TestError>> {
  (0..len).map(logging_layer).collect()
}

pub fn log_of(ctx: &Ctx) -> Vec<String> {
  ctx.read().log.clone()
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::TRACE)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
