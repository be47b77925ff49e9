// core/src/pipeline.rs

//! `Pipeline<T, E>`: step definitions, handler registration and execution.

use crate::context::ContextData;
use crate::error::FlowError;
use crate::step::{PipelineControl, PipelineResult, StepDef};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tracing::{event, info_span, instrument, Instrument, Level};

/// Boxed asynchronous step handler.
///
/// A handler receives its own clone of the context handle. It must release any
/// lock guard before awaiting.
pub type Handler<T, E> =
  Box<dyn Fn(ContextData<T>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, E>> + Send>> + Send + Sync>;

/// The three handler slots of a step, executed in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  const ORDER: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];

  fn label(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

/// An ordered set of named steps over context `T`, whose handlers fail with `E`.
///
/// `E: From<FlowError>` lets the engine report its own failures (such as a
/// required step without handlers) through the caller's error type.
pub struct Pipeline<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  steps: Vec<StepDef<T>>,
  handlers: HashMap<(String, Phase), Vec<Handler<T, E>>>,
}

impl<T, E> Pipeline<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new(steps: impl IntoIterator<Item = StepDef<T>>) -> Self {
    Self {
      steps: steps.into_iter().collect(),
      handlers: HashMap::new(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn before<F, Fut>(&mut self, step: &str, handler: F) -> &mut Self
  where
    F: Fn(ContextData<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PipelineControl, E>> + Send + 'static,
  {
    self.add_handler(step, Phase::Before, handler)
  }

  pub fn on<F, Fut>(&mut self, step: &str, handler: F) -> &mut Self
  where
    F: Fn(ContextData<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PipelineControl, E>> + Send + 'static,
  {
    self.add_handler(step, Phase::On, handler)
  }

  pub fn after<F, Fut>(&mut self, step: &str, handler: F) -> &mut Self
  where
    F: Fn(ContextData<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PipelineControl, E>> + Send + 'static,
  {
    self.add_handler(step, Phase::After, handler)
  }

  /// Attaches a handler to `step` in `phase`.
  ///
  /// Panics if the step was never declared.
  pub fn add_handler<F, Fut>(&mut self, step: &str, phase: Phase, handler: F) -> &mut Self
  where
    F: Fn(ContextData<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PipelineControl, E>> + Send + 'static,
  {
    if !self.steps.iter().any(|s| s.name == step) {
      panic!("orderflow setup error: step '{}' is not declared in this pipeline", step);
    }
    let boxed: Handler<T, E> = Box::new(
      move |ctx: ContextData<T>| -> Pin<Box<dyn Future<Output = Result<PipelineControl, E>> + Send>> {
        Box::pin(handler(ctx))
      },
    );
    self.handlers.entry((step.to_string(), phase)).or_default().push(boxed);
    self
  }

  fn has_handlers(&self, step: &str) -> bool {
    Phase::ORDER
      .iter()
      .any(|phase| self.handlers.get(&(step.to_string(), *phase)).is_some_and(|v| !v.is_empty()))
  }

  /// Runs every step in order against `ctx`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(context_type = %std::any::type_name::<T>(), num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx: ContextData<T>) -> Result<PipelineResult, E> {
    for (step_idx, step) in self.steps.iter().enumerate() {
      let step_name = step.name.as_str();

      if let Some(skip_if) = &step.skip_if {
        if skip_if(ctx.clone()) {
          event!(Level::DEBUG, step = step_name, "Step skipped by its skip condition.");
          continue;
        }
      }

      if !self.has_handlers(step_name) {
        if step.optional {
          event!(Level::DEBUG, step = step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, step = step_name, "Required step has no handlers.");
        return Err(E::from(FlowError::HandlerMissing {
          step_name: step.name.clone(),
        }));
      }

      for phase in Phase::ORDER {
        let Some(handlers) = self.handlers.get(&(step.name.clone(), phase)) else {
          continue;
        };
        for (handler_idx, handler) in handlers.iter().enumerate() {
          let span = info_span!(
            "pipeline_step",
            step = step_name,
            step_index = step_idx,
            phase = phase.label(),
            handler_index = handler_idx
          );
          match handler(ctx.clone()).instrument(span).await {
            Ok(PipelineControl::Continue) => {}
            Ok(PipelineControl::Stop) => {
              event!(Level::DEBUG, step = step_name, phase = phase.label(), "Pipeline stopped by handler.");
              return Ok(PipelineResult::Stopped);
            }
            Err(e) => {
              event!(Level::DEBUG, step = step_name, phase = phase.label(), error = %e, "Handler failed.");
              return Err(e);
            }
          }
        }
      }
    }

    Ok(PipelineResult::Completed)
  }
}
