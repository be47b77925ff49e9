// core/src/registry.rs

//! `Registry<E>`: one pipeline per context type, dispatched by that type.

use crate::context::ContextData;
use crate::error::FlowError;
use crate::pipeline::Pipeline;
use crate::step::PipelineResult;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedRunner<E>: Send + Sync
where
  E: std::error::Error + Send + Sync + 'static,
{
  /// `ctx` must be a boxed `ContextData<T>` for the runner's `T`.
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<PipelineResult, E>;
}

struct Runner<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Pipeline<T, E>,
}

#[async_trait]
impl<T, E> ErasedRunner<E> for Runner<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<PipelineResult, E> {
    let ctx = ctx.downcast::<ContextData<T>>().map_err(|_| {
      E::from(FlowError::TypeMismatch {
        expected_type: std::any::type_name::<ContextData<T>>().to_string(),
      })
    })?;
    self.pipeline.run(*ctx).await
  }
}

/// Type-keyed pipeline registry shared by all request handlers.
pub struct Registry<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  runners: RwLock<HashMap<TypeId, Arc<dyn ErasedRunner<E>>>>,
}

impl<E> Registry<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      runners: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for context type `T`, replacing any earlier one.
  pub fn register<T>(&self, pipeline: Pipeline<T, E>)
  where
    T: Send + Sync + 'static,
  {
    event!(Level::DEBUG, context_type = %std::any::type_name::<T>(), steps = ?pipeline.step_names(), "Registering pipeline.");
    self
      .runners
      .write()
      .insert(TypeId::of::<T>(), Arc::new(Runner { pipeline }));
  }

  pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
    self.runners.read().contains_key(&TypeId::of::<T>())
  }

  /// Runs the pipeline registered for `T` against `ctx`.
  pub async fn run<T>(&self, ctx: ContextData<T>) -> Result<PipelineResult, E>
  where
    T: Send + Sync + 'static,
  {
    let runner = self.runners.read().get(&TypeId::of::<T>()).cloned().ok_or_else(|| {
      let context_type = std::any::type_name::<T>().to_string();
      event!(Level::ERROR, %context_type, "No pipeline registered for context type.");
      E::from(FlowError::NotRegistered { context_type })
    })?;
    runner.run_erased(Box::new(ctx)).await
  }
}

impl<E> Default for Registry<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
