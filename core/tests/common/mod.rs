// tests/common/mod.rs
#![allow(dead_code)]

use orderflow::{ContextData, FlowError, PipelineControl};
use tracing::Level;

/// Stand-in for an order workflow context: a status that steps move forward
/// and a trail of which handlers ran.
#[derive(Clone, Debug, Default)]
pub struct TestOrderCtx {
  pub order_id: String,
  pub status: String,
  pub trail: Vec<String>,
  pub stop_at: Option<String>,
}

impl TestOrderCtx {
  pub fn pending(order_id: &str) -> Self {
    Self {
      order_id: order_id.to_string(),
      status: "pending".to_string(),
      ..Default::default()
    }
  }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("step failed: {0}")]
  Step(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(format!("{:?}", err))
  }
}

/// Records `label` in the trail, optionally setting a new status, and stops
/// when the context asks to stop at this label.
pub fn recording_handler(
  label: &'static str,
  new_status: Option<&'static str>,
) -> impl Fn(ContextData<TestOrderCtx>) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<PipelineControl, TestError>> + Send>>
     + Send
     + Sync
     + 'static {
  move |ctx: ContextData<TestOrderCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.trail.push(label.to_string());
      if let Some(status) = new_status {
        guard.status = status.to_string();
      }
      if guard.stop_at.as_deref() == Some(label) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  }
}

pub fn failing_handler(
  label: &'static str,
  message: &'static str,
) -> impl Fn(ContextData<TestOrderCtx>) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<PipelineControl, TestError>> + Send>>
     + Send
     + Sync
     + 'static {
  move |ctx: ContextData<TestOrderCtx>| {
    Box::pin(async move {
      ctx.write().trail.push(label.to_string());
      Err(TestError::Step(message.to_string()))
    })
  }
}

use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
