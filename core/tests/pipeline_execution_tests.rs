// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use orderflow::{ContextData, Pipeline, PipelineControl, PipelineResult, StepDef};
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn test_steps_run_in_declaration_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestOrderCtx, TestError>::new([
    StepDef::required("load_order"),
    StepDef::required("apply_update"),
    StepDef::required("acknowledge"),
  ]);
  pipeline.on("load_order", recording_handler("load_order", None));
  pipeline.on("apply_update", recording_handler("apply_update", Some("completed")));
  pipeline.on("acknowledge", recording_handler("acknowledge", None));

  let ctx = ContextData::new(TestOrderCtx::pending("ord_1"));
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.status, "completed");
  assert_eq!(guard.trail, vec!["load_order", "apply_update", "acknowledge"]);
}

#[tokio::test]
#[serial]
async fn test_stop_halts_remaining_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestOrderCtx, TestError>::new([
    StepDef::required("deduplicate"),
    StepDef::required("apply_update"),
  ]);
  pipeline.on("deduplicate", recording_handler("deduplicate", None));
  pipeline.on("apply_update", recording_handler("apply_update", Some("completed")));

  let mut initial = TestOrderCtx::pending("ord_1");
  initial.stop_at = Some("deduplicate".to_string());
  let ctx = ContextData::new(initial);

  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.status, "pending");
  assert_eq!(guard.trail, vec!["deduplicate"]);
}

#[tokio::test]
#[serial]
async fn test_handler_error_aborts_run() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestOrderCtx, TestError>::new([
    StepDef::required("load_order"),
    StepDef::required("call_provider"),
    StepDef::required("acknowledge"),
  ]);
  pipeline.on("load_order", recording_handler("load_order", None));
  pipeline.on("call_provider", failing_handler("call_provider", "provider unavailable"));
  pipeline.on("acknowledge", recording_handler("acknowledge", None));

  let ctx = ContextData::new(TestOrderCtx::pending("ord_1"));
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Step("provider unavailable".to_string()));
  assert_eq!(ctx.read().trail, vec!["load_order", "call_provider"]);
}

#[tokio::test]
#[serial]
async fn test_skip_condition_skips_step() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestOrderCtx, TestError>::new([
    StepDef::required("verify_signature").skip_when(|ctx: ContextData<TestOrderCtx>| ctx.with(|c| c.order_id.is_empty())),
    StepDef::required("parse"),
  ]);
  pipeline.on("verify_signature", recording_handler("verify_signature", None));
  pipeline.on("parse", recording_handler("parse", None));

  let ctx = ContextData::new(TestOrderCtx::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().trail, vec!["parse"]);
}

#[tokio::test]
#[serial]
async fn test_required_step_without_handlers_fails() {
  setup_tracing();
  let pipeline = Pipeline::<TestOrderCtx, TestError>::new([StepDef::required("unwired")]);

  let result = pipeline.run(ContextData::new(TestOrderCtx::default())).await;

  match result {
    Err(TestError::Flow(msg)) => {
      assert!(msg.contains("HandlerMissing"));
      assert!(msg.contains("unwired"));
    }
    other => panic!("expected HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let pipeline = Pipeline::<TestOrderCtx, TestError>::new([StepDef::optional("notify")]);

  let result = pipeline.run(ContextData::new(TestOrderCtx::default())).await;
  assert_eq!(result.unwrap(), PipelineResult::Completed);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestOrderCtx, TestError>::new([StepDef::required("apply_update")]);
  pipeline.after("apply_update", recording_handler("after", None));
  pipeline.on("apply_update", recording_handler("on", None));
  pipeline.before("apply_update", recording_handler("before", None));

  let ctx = ContextData::new(TestOrderCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().trail, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn test_async_handler_releases_lock_before_await() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestOrderCtx, TestError>::new([StepDef::required("slow_lookup")]);
  pipeline.on("slow_lookup", |ctx: ContextData<TestOrderCtx>| async move {
    let order_id = ctx.with(|c| c.order_id.clone());
    tokio::time::sleep(Duration::from_millis(5)).await;
    ctx.update(|c| c.trail.push(format!("looked up {}", order_id)));
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(TestOrderCtx::pending("ord_9"));
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.snapshot().trail, vec!["looked up ord_9"]);
}

#[test]
#[should_panic(expected = "not declared")]
fn test_attaching_handler_to_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestOrderCtx, TestError>::new([StepDef::required("known")]);
  pipeline.on("unknown", recording_handler("unknown", None));
}
