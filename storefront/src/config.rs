// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `production` hides upstream and internal error detail from responses.
  pub app_env: String,
  /// Absent means in-memory stores (development and tests only).
  pub database_url: Option<String>,
  pub run_migrations: bool,

  /// Absent means the in-process mock payment gateway.
  pub stripe_secret_key: Option<String>,
  pub stripe_api_base: String,
  /// When set, webhook deliveries must carry a valid `x-signature` header.
  pub webhook_secret: Option<String>,
  pub idempotency_ttl: Duration,

  pub session_cookie_name: String,
  pub default_currency: String,
  pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_var("SERVER_PORT", get_env("SERVER_PORT"), 8080u16)?;
    let app_env = get_env("APP_ENV").unwrap_or_else(|| "development".to_string());
    let database_url = get_env("DATABASE_URL");
    let run_migrations = parse_var("RUN_MIGRATIONS", get_env("RUN_MIGRATIONS"), false)?;

    let stripe_secret_key = get_env("STRIPE_SECRET_KEY");
    let stripe_api_base = get_env("STRIPE_API_BASE").unwrap_or_else(|| "https://api.stripe.com/v1".to_string());
    let webhook_secret = get_env("WEBHOOK_SECRET");
    let idempotency_ttl_secs = parse_var("IDEMPOTENCY_TTL_SECS", get_env("IDEMPOTENCY_TTL_SECS"), 86_400u64)?;

    let session_cookie_name = get_env("SESSION_COOKIE_NAME").unwrap_or_else(|| "session_token".to_string());
    let default_currency = get_env("DEFAULT_CURRENCY").unwrap_or_else(|| "BRL".to_string());
    let log_format = match get_env("LOG_FORMAT").as_deref() {
      None | Some("text") => LogFormat::Text,
      Some("json") => LogFormat::Json,
      Some(other) => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected text or json", other))),
    };

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      app_env,
      database_url,
      run_migrations,
      stripe_secret_key,
      stripe_api_base,
      webhook_secret,
      idempotency_ttl: Duration::from_secs(idempotency_ttl_secs),
      session_cookie_name,
      default_currency,
      log_format,
    })
  }

  pub fn is_production(&self) -> bool {
    self.app_env.eq_ignore_ascii_case("production")
  }

  pub fn expose_error_details(&self) -> bool {
    !self.is_production()
  }
}

impl Default for AppConfig {
  /// Development defaults: in-memory stores, mock gateway, no webhook secret.
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      app_env: "development".to_string(),
      database_url: None,
      run_migrations: false,
      stripe_secret_key: None,
      stripe_api_base: "https://api.stripe.com/v1".to_string(),
      webhook_secret: None,
      idempotency_ttl: Duration::from_secs(86_400),
      session_cookie_name: "session_token".to_string(),
      default_currency: "BRL".to_string(),
      log_format: LogFormat::Text,
    }
  }
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, value, e))),
  }
}
