// core/src/lib.rs

//! orderflow: a small asynchronous step-pipeline engine.
//!
//! A pipeline is an ordered list of named steps. Every step has three handler
//! phases (`before`, `on`, `after`) that run against a shared
//! [`ContextData<T>`]. Handlers decide whether the run continues or stops, and
//! the first handler error aborts the run.
//!
//! Typical use inside the storefront:
//!  1. Define a context struct holding the request inputs and the fields steps fill in.
//!  2. Build a `Pipeline<Ctx, AppError>` from step definitions and attach handlers.
//!  3. Register it once in a [`Registry`] at startup.
//!  4. Per request, wrap a fresh context in `ContextData` and call `registry.run(ctx.clone())`,
//!     then read the outcome back from the context.

pub mod context;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod step;

pub use crate::context::ContextData;
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::{Handler, Phase, Pipeline};
pub use crate::registry::Registry;
pub use crate::step::{PipelineControl, PipelineResult, SkipCondition, StepDef};
