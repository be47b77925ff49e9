// storefront/src/pipelines/mod.rs

//! Defines and registers the order/payment workflows.

use crate::errors::AppError;
use orderflow::Registry;

pub mod checkout_pipeline;
pub mod contexts;
pub mod resume_payment_pipeline;
pub mod webhook_pipeline;

/// Registers every pipeline with the shared registry. Called once while
/// building `AppState`.
pub fn register_all_pipelines(registry: &Registry<AppError>) {
  tracing::info!("Registering order pipelines...");

  webhook_pipeline::register_webhook_pipeline(registry);
  resume_payment_pipeline::register_resume_payment_pipeline(registry);
  checkout_pipeline::register_checkout_pipeline(registry);

  tracing::info!("All order pipelines registered.");
}
