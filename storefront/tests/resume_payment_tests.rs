// tests/resume_payment_tests.rs
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::*;
use serde_json::{json, Value};
use storefront::models::OrderStatus;
use storefront::services::PaymentIntentStatus;

async fn resume(app: &TestApp, query: &str) -> (StatusCode, Value) {
  let service = init_app!(app);
  let req = test::TestRequest::get()
    .uri(&format!("/api/payments/resume{}", query))
    .to_request();
  let resp = test::call_service(&service, req).await;
  let status = resp.status();
  (status, test::read_body_json(resp).await)
}

#[actix_web::test]
async fn returns_client_secret_for_open_intent() {
  let app = TestApp::new();
  let mut order = order_fixture("ord_1", OrderStatus::Pending, Some("pi_open"), "49.90");
  order.email = "ana@example.com".to_string();
  app.seed(&order, &[]).await;
  app
    .payments
    .insert_intent("pi_open", 4990, PaymentIntentStatus::RequiresPaymentMethod);

  let (status, body) = resume(&app, "?orderId=ord_1").await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["clientSecret"].as_str().unwrap().starts_with("pi_open_secret_"));
  assert_eq!(body["amount"], json!(49.9));
  assert_eq!(body["paymentIntentId"], "pi_open");
  assert_eq!(body["orderId"], "ord_1");
  assert_eq!(body["email"], "ana@example.com");
}

#[actix_web::test]
async fn missing_payment_reference_fails_before_provider_call() {
  let app = TestApp::new();
  app
    .seed(&order_fixture("ord_2", OrderStatus::Pending, None, "20.00"), &[])
    .await;

  let (status, body) = resume(&app, "?orderId=ord_2").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "error": "Payment Intent não encontrado para este pedido" }));
  assert_eq!(app.payments.retrieve_calls(), 0);
}

#[actix_web::test]
async fn completed_order_never_returns_secret() {
  let app = TestApp::new();
  app
    .seed(&order_fixture("ord_3", OrderStatus::Completed, Some("pi_3"), "20.00"), &[])
    .await;
  app
    .payments
    .insert_intent("pi_3", 2000, PaymentIntentStatus::RequiresPaymentMethod);

  let (status, body) = resume(&app, "?orderId=ord_3").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Pedido já foi pago");
  assert!(body.get("clientSecret").is_none());
  assert_eq!(app.payments.retrieve_calls(), 0);
}

#[actix_web::test]
async fn non_pending_orders_are_rejected() {
  let app = TestApp::new();
  app
    .seed(&order_fixture("ord_c", OrderStatus::Cancelled, Some("pi_c"), "20.00"), &[])
    .await;
  app
    .seed(&order_fixture("ord_p", OrderStatus::Processing, Some("pi_p"), "20.00"), &[])
    .await;
  app
    .seed(&order_fixture("ord_r", OrderStatus::Refunded, Some("pi_r"), "20.00"), &[])
    .await;

  let (status, body) = resume(&app, "?orderId=ord_c").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Pedido cancelado não pode ser pago");

  for order_id in ["ord_p", "ord_r"] {
    let (status, body) = resume(&app, &format!("?orderId={}", order_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Pedido não está aguardando pagamento");
  }
  assert_eq!(app.payments.retrieve_calls(), 0);
}

#[actix_web::test]
async fn succeeded_intent_asks_client_to_refresh() {
  let app = TestApp::new();
  app
    .seed(&order_fixture("ord_4", OrderStatus::Pending, Some("pi_4"), "20.00"), &[])
    .await;
  app.payments.insert_intent("pi_4", 2000, PaymentIntentStatus::Succeeded);

  let (status, body) = resume(&app, "?orderId=ord_4").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(
    body,
    json!({ "error": "Pagamento já foi confirmado, aguardando processamento", "shouldRefresh": true })
  );
}

#[actix_web::test]
async fn cancelled_intent_is_rejected() {
  let app = TestApp::new();
  app
    .seed(&order_fixture("ord_5", OrderStatus::Pending, Some("pi_5"), "20.00"), &[])
    .await;
  app
    .payments
    .insert_intent("pi_5", 2000, PaymentIntentStatus::RequiresAction);
  app.payments.set_status("pi_5", PaymentIntentStatus::Canceled);

  let (status, body) = resume(&app, "?orderId=ord_5").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "error": "Payment Intent foi cancelado" }));
}

#[actix_web::test]
async fn missing_or_unknown_order_id() {
  let app = TestApp::new();

  let (status, body) = resume(&app, "").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "orderId é obrigatório");

  let (status, body) = resume(&app, "?orderId=ord_missing").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "Pedido não encontrado");
}

#[actix_web::test]
async fn provider_failure_is_reported_generically() {
  let app = TestApp::new();
  app
    .seed(&order_fixture("ord_6", OrderStatus::Pending, Some("pi_6"), "20.00"), &[])
    .await;
  app
    .payments
    .insert_intent("pi_6", 2000, PaymentIntentStatus::RequiresPaymentMethod);
  app.payments.fail_next_call();

  let (status, body) = resume(&app, "?orderId=ord_6").await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["error"], "Erro ao comunicar com o provedor de pagamento");
}
