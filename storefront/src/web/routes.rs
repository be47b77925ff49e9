// storefront/src/web/routes.rs

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::web::handlers::{admin_handlers, checkout_handlers, order_handlers, payment_handlers, webhook_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .route(
        "/webhooks/payments",
        web::post().to(webhook_handlers::payment_webhook_handler),
      )
      .route(
        "/payments/resume",
        web::get().to(payment_handlers::resume_payment_handler),
      )
      .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
      // Fixed paths first so they are not captured by `{order_id}`.
      .service(
        web::scope("/orders")
          .route("/mine", web::get().to(order_handlers::my_orders_handler))
          .route("/by-payment", web::get().to(order_handlers::order_by_payment_handler))
          .route("/status", web::get().to(order_handlers::legacy_status_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
      )
      .service(
        web::scope("/admin")
          .route("/orders", web::get().to(admin_handlers::list_orders_handler))
          .route(
            "/orders/{order_id}/status",
            web::patch().to(admin_handlers::override_status_handler),
          ),
      ),
  );
}
