// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::Arc;
use wallet_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new(&[("step1", false, None), ("step2", false, None), ("step3", false, None)]);

  pipeline.on_root("step1", create_simple_handler("step1", " S1"));
  pipeline.on_root("step2", create_simple_handler("step2", " S2"));
  pipeline.on_root("step3", create_simple_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("stepA", false, None),
    ("stopStep", false, None),
    ("stepC", false, None),
  ]);

  pipeline.on_root("stepA", create_simple_handler("stepA", "A"));
  pipeline.on_root("stopStep", |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push("stopStep".to_string());
      Ok::<PipelineControl, FlowError>(PipelineControl::Stop)
    })
  });
  pipeline.on_root("stepC", create_simple_handler("stepC", "C"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.counter, 1);
  assert_eq!(guard.steps_executed, vec!["stepA", "stopStep"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_propagates_handler_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("good_step", false, None),
    ("bad_step", false, None),
    ("another_step", false, None),
  ]);

  pipeline.on_root("good_step", create_simple_handler("good_step", "Good"));
  pipeline.on_root("bad_step", create_failing_handler("bad_step", "I am a bad step!"));
  pipeline.on_root("another_step", create_simple_handler("another_step", "NeverRun"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("I am a bad step!".to_string()));
  let guard = ctx.read();
  assert_eq!(guard.message, "Good");
  assert_eq!(guard.steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_skips_step_if_condition_met() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("step1", false, None),
    (
      "step_to_skip",
      false,
      Some(Arc::new(|ctx: ContextData<TestContext>| ctx.read().counter > 0)),
    ),
    ("step3", false, None),
  ]);

  pipeline.on_root("step1", create_simple_handler("step1", " S1"));
  pipeline.on_root("step_to_skip", create_simple_handler("step_to_skip", " SKIPPED_THIS"));
  pipeline.on_root("step3", create_simple_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.message, " S1 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_skip_condition_can_be_set_after_construction() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("only", false, None)]);
  pipeline.on_root("only", create_simple_handler("only", "ran"));
  pipeline.set_skip_condition("only", Some(Arc::new(|_ctx: ContextData<TestContext>| true)));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert!(ctx.read().steps_executed.is_empty());
}

#[tokio::test]
#[serial]
async fn test_non_optional_step_missing_handler_fails() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::new(&[("step_with_no_handler", false, None)]);

  let result = pipeline.run(ContextData::new(TestContext::default())).await;

  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("step_with_no_handler"));
    }
    other => panic!("Expected FlowError::HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_optional_step_missing_handler_succeeds() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("optional_step_no_handler", true, None),
    ("required", false, None),
  ]);
  pipeline.on_root("required", create_simple_handler("required", "R"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["required"]);
}

#[tokio::test]
#[serial]
async fn test_step_made_optional_after_construction() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("maybe", false, None)]);
  pipeline.set_optional("maybe", true);

  let result = pipeline.run(ContextData::new(TestContext::default())).await;
  assert_eq!(result.unwrap(), PipelineResult::Completed);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_execution_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("main_step", false, None)]);

  pipeline.before_root("main_step", create_simple_handler("before_main", "Before;"));
  pipeline.on_root("main_step", create_simple_handler("on_main", "On;"));
  pipeline.after_root("main_step", create_simple_handler("after_main", "After;"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let guard = ctx.read();
  assert_eq!(guard.message, "Before;On;After;");
  assert_eq!(guard.steps_executed, vec!["before_main", "on_main", "after_main"]);
}

#[tokio::test]
#[serial]
async fn test_stop_in_before_phase_skips_the_rest_of_the_step() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("main_step", false, None), ("later", false, None)]);

  pipeline.before_root("main_step", create_simple_handler("before_main", "Before;"));
  pipeline.on_root("main_step", create_simple_handler("on_main", "On;"));
  pipeline.on_root("later", create_simple_handler("later", "Later;"));

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("before_main".to_string()),
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["before_main"]);
}

#[tokio::test]
#[serial]
async fn test_context_survives_await_between_handlers() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("write", false, None), ("read", false, None)]);

  pipeline.on_root("write", |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      tokio::time::sleep(std::time::Duration::from_millis(5)).await;
      ctx.write().counter = 41;
      Ok::<_, TestError>(PipelineControl::Continue)
    })
  });
  pipeline.on_root("read", |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let seen = { ctx.read().counter };
      tokio::time::sleep(std::time::Duration::from_millis(5)).await;
      ctx.write().counter = seen + 1;
      Ok::<_, TestError>(PipelineControl::Continue)
    })
  });

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().counter, 42);
}

#[test]
#[should_panic(expected = "Step 'no_such_step' not found")]
fn test_registering_handler_for_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("step1", false, None)]);
  pipeline.on_root("no_such_step", create_simple_handler("x", "x"));
}
