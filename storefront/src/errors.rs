// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use orderflow::FlowError;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

// Set once at startup from `AppConfig::expose_error_details()`.
static EXPOSE_ERROR_DETAILS: AtomicBool = AtomicBool::new(false);

pub fn set_expose_error_details(expose: bool) {
  EXPOSE_ERROR_DETAILS.store(expose, Ordering::Relaxed);
}

pub fn expose_error_details() -> bool {
  EXPOSE_ERROR_DETAILS.load(Ordering::Relaxed)
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// The order (or its payment intent) is not in a state that allows the operation.
  #[error("Invalid State: {message}")]
  InvalidState { message: String, should_refresh: bool },

  #[error("Payment Provider Error: {0}")]
  Upstream(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  pub fn invalid_state(message: impl Into<String>) -> Self {
    AppError::InvalidState {
      message: message.into(),
      should_refresh: false,
    }
  }

  pub fn invalid_state_refresh(message: impl Into<String>) -> Self {
    AppError::InvalidState {
      message: message.into(),
      should_refresh: true,
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(format!("{:#}", other)),
    }
  }
}

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
    AppError::Upstream(err.to_string())
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::InvalidState { .. } => StatusCode::BAD_REQUEST,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Upstream(_)
      | AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with server error");
    } else {
      tracing::warn!(application_error = %self, "Responding with client error");
    }

    let body = match self {
      AppError::Validation(m) | AppError::Unauthorized(m) | AppError::Forbidden(m) | AppError::NotFound(m) => {
        json!({ "error": m })
      }
      AppError::InvalidState {
        message,
        should_refresh: true,
      } => json!({ "error": message, "shouldRefresh": true }),
      AppError::InvalidState { message, .. } => json!({ "error": message }),
      AppError::Upstream(detail) => server_error_body("Erro ao comunicar com o provedor de pagamento", detail),
      AppError::Sqlx(e) => server_error_body("Erro interno do servidor", &e.to_string()),
      AppError::Workflow { source } => server_error_body("Erro interno do servidor", &source.to_string()),
      AppError::Config(detail) | AppError::Internal(detail) => server_error_body("Erro interno do servidor", detail),
    };
    HttpResponse::build(status).json(body)
  }
}

fn server_error_body(message: &str, detail: &str) -> serde_json::Value {
  if expose_error_details() {
    json!({ "error": message, "detail": detail })
  } else {
    json!({ "error": message })
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
