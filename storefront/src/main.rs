// storefront/src/main.rs

use storefront::config::{AppConfig, LogFormat};
use storefront::db::{
  IdempotencyStore, InMemoryIdempotencyStore, InMemoryOrderStore, InMemorySessionStore, OrderStore,
  PgIdempotencyStore, PgOrderStore, PgSessionStore, SessionStore,
};
use storefront::errors::set_expose_error_details;
use storefront::services::{MockPaymentGateway, PaymentGateway, StripeGateway};
use storefront::state::AppState;
use storefront::web::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

type Stores = (Arc<dyn OrderStore>, Arc<dyn SessionStore>, Arc<dyn IdempotencyStore>);

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

async fn build_stores(config: &AppConfig) -> anyhow::Result<Stores> {
  let Some(database_url) = config.database_url.as_deref() else {
    tracing::warn!("DATABASE_URL not set; using in-memory stores. Data is lost on restart.");
    return Ok((
      Arc::new(InMemoryOrderStore::new()),
      Arc::new(InMemorySessionStore::new()),
      Arc::new(InMemoryIdempotencyStore::new(config.idempotency_ttl)),
    ));
  };

  let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
  tracing::info!("Successfully connected to the database.");
  if config.run_migrations {
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied.");
  }

  Ok((
    Arc::new(PgOrderStore::new(pool.clone())),
    Arc::new(PgSessionStore::new(pool.clone())),
    Arc::new(PgIdempotencyStore::new(pool, config.idempotency_ttl)),
  ))
}

fn build_gateway(config: &AppConfig) -> anyhow::Result<Arc<dyn PaymentGateway>> {
  match config.stripe_secret_key.as_deref() {
    Some(key) => Ok(Arc::new(StripeGateway::new(config.stripe_api_base.clone(), key)?)),
    None => {
      tracing::warn!("STRIPE_SECRET_KEY not set; using the mock payment gateway.");
      Ok(Arc::new(MockPaymentGateway::new()))
    }
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let config = AppConfig::from_env()?;
  init_tracing(config.log_format);
  tracing::info!(env = %config.app_env, "Starting storefront server...");

  set_expose_error_details(config.expose_error_details());
  if config.webhook_secret.is_none() {
    tracing::warn!("WEBHOOK_SECRET not set; webhook signatures will not be verified.");
  }

  let (orders, sessions, idempotency) = build_stores(&config).await?;
  let payments = build_gateway(&config)?;
  let server_address = format!("{}:{}", config.server_host, config.server_port);
  let app_state = AppState::new(config, orders, sessions, idempotency, payments);

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  tracing::info!("Server stopped.");
  Ok(())
}
