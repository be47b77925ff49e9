// storefront/src/lib.rs

//! Order and payment service: checkout, payment webhooks, payment resumption
//! and order queries, each request flow running as an `orderflow` pipeline.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;

pub use errors::{AppError, Result};
pub use state::AppState;
