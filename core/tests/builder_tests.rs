// tests/builder_tests.rs
mod common;

use common::*;
use onion::{ContextData, OnionError, Pipeline, PipelineBuilder, PipelineResult};
use serial_test::serial;

fn passthrough(builder: &mut PipelineBuilder<TestContext, TestError>, name: &'static str) {
  builder
    .handle(name, move |ctx: Ctx, next: TestNext| async move {
      ctx.write().log.push(name.to_string());
      next.run().await
    })
    .unwrap();
}

#[tokio::test]
#[serial]
async fn test_declared_layers_run_in_declaration_order() {
  setup_tracing();
  let mut builder = Pipeline::<TestContext, TestError>::builder("declared");
  builder.declare("first").unwrap().declare("second").unwrap().declare("third").unwrap();
  // Handlers may be registered in any order.
  passthrough(&mut builder, "third");
  passthrough(&mut builder, "first");
  passthrough(&mut builder, "second");
  let pipeline = builder.build().unwrap();

  assert_eq!(pipeline.name(), "declared");
  assert_eq!(pipeline.len(), 3);

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(log_of(&ctx), vec!["first", "second", "third"]);
}

#[test]
#[serial]
fn test_build_rejects_layer_without_handler() {
  setup_tracing();
  let mut builder = Pipeline::<TestContext, TestError>::builder("incomplete");
  builder.declare("auth").unwrap().declare("render").unwrap();
  passthrough(&mut builder, "auth");

  match builder.build() {
    Err(OnionError::InvalidHandler { layer, index }) => {
      assert_eq!(layer, "render");
      assert_eq!(index, 1);
    }
    other => panic!("Expected OnionError::InvalidHandler, got {:?}", other),
  }
}

#[test]
#[serial]
fn test_duplicate_layer_names_are_rejected() {
  setup_tracing();
  let mut builder = PipelineBuilder::<TestContext, TestError>::new("dupes");
  builder.declare("auth").unwrap();

  match builder.declare("auth") {
    Err(OnionError::DuplicateLayer { layer }) => assert_eq!(layer, "auth"),
    Err(other) => panic!("Expected DuplicateLayer, got {:?}", other),
    Ok(_) => panic!("Expected DuplicateLayer, got Ok"),
  }
  assert!(matches!(
    builder.insert_after("auth", "auth"),
    Err(OnionError::DuplicateLayer { .. })
  ));
  assert_eq!(builder.layer_names(), vec!["auth"]);
}

#[test]
#[serial]
fn test_unknown_layer_is_reported() {
  setup_tracing();
  let mut builder = PipelineBuilder::<TestContext, TestError>::new("typos");
  builder.declare("auth").unwrap();

  assert!(matches!(
    builder.handle("atuh", |_ctx: Ctx, next: TestNext| async move { next.run().await }),
    Err(OnionError::LayerNotFound { ref layer }) if layer == "atuh"
  ));
  assert!(matches!(
    builder.insert_before("missing", "new"),
    Err(OnionError::LayerNotFound { .. })
  ));
  assert!(matches!(
    builder.set_skip_condition("missing", None),
    Err(OnionError::LayerNotFound { .. })
  ));
}

#[tokio::test]
#[serial]
async fn test_insert_and_remove_layers() {
  setup_tracing();
  let mut builder = Pipeline::<TestContext, TestError>::builder("edited");
  builder.declare("b").unwrap().declare("d").unwrap();
  builder.insert_before("b", "a").unwrap();
  builder.insert_after("b", "c").unwrap();
  builder.insert_after("d", "e").unwrap();
  assert_eq!(builder.layer_names(), vec!["a", "b", "c", "d", "e"]);

  assert!(builder.remove_layer("e"));
  assert!(!builder.remove_layer("e"));

  for name in ["a", "b", "c", "d"] {
    passthrough(&mut builder, name);
  }
  let pipeline = builder.build().unwrap();

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(log_of(&ctx), vec!["a", "b", "c", "d"]);
}

#[tokio::test]
#[serial]
async fn test_handle_replaces_earlier_handler() {
  setup_tracing();
  let mut builder = Pipeline::<TestContext, TestError>::builder("replace");
  builder.layer_boxed("only", stopping_layer(0)).unwrap();
  passthrough(&mut builder, "only");
  let pipeline = builder.build().unwrap();

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(log_of(&ctx), vec!["only"]);
}

#[tokio::test]
#[serial]
async fn test_builder_without_layers_builds_noop_pipeline() {
  setup_tracing();
  let pipeline = PipelineBuilder::<TestContext, TestError>::new("empty").build().unwrap();
  assert!(pipeline.is_empty());

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert!(log_of(&ctx).is_empty());
}
