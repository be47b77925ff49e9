// tests/order_query_tests.rs
mod common;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::test;
use chrono::{Duration, Utc};
use common::*;
use serde_json::{json, Value};
use storefront::config::AppConfig;
use storefront::models::{Order, OrderStatus, Role, Session};

fn owned(order: Order, user_id: &str) -> Order {
  Order {
    user_id: Some(user_id.to_string()),
    ..order
  }
}

#[actix_web::test]
async fn order_by_id_requires_session() {
  let app = TestApp::new();
  app
    .seed(&owned(order_fixture("ord_1", OrderStatus::Pending, None, "10.00"), "user_1"), &[])
    .await;
  let service = init_app!(app);

  let req = test::TestRequest::get().uri("/api/orders/ord_1").to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::get()
    .uri("/api/orders/ord_1")
    .cookie(Cookie::new("session_token", "tok_unknown"))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn expired_session_is_unauthorized() {
  let app = TestApp::new();
  app.sessions.insert(
    "tok_old",
    Session {
      user_id: "user_1".to_string(),
      email: "ana@example.com".to_string(),
      role: Role::Customer,
      expires_at: Utc::now() - Duration::minutes(1),
    },
  );
  let service = init_app!(app);

  let req = test::TestRequest::get()
    .uri("/api/orders/mine")
    .cookie(Cookie::new("session_token", "tok_old"))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn order_by_id_is_forbidden_for_other_users() {
  let app = TestApp::new();
  app
    .seed(&owned(order_fixture("ord_1", OrderStatus::Pending, None, "10.00"), "user_1"), &[])
    .await;
  app
    .seed(&order_fixture("ord_guest", OrderStatus::Pending, None, "10.00"), &[])
    .await;
  app.login("tok_2", "user_2", "bia@example.com", Role::Customer);
  let service = init_app!(app);

  for order_id in ["ord_1", "ord_guest"] {
    let req = test::TestRequest::get()
      .uri(&format!("/api/orders/{}", order_id))
      .cookie(Cookie::new("session_token", "tok_2"))
      .to_request();
    assert_eq!(test::call_service(&service, req).await.status(), StatusCode::FORBIDDEN);
  }

  let req = test::TestRequest::get()
    .uri("/api/orders/ord_nope")
    .cookie(Cookie::new("session_token", "tok_2"))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn owner_gets_order_with_items() {
  let app = TestApp::new();
  app
    .seed(
      &owned(order_fixture("ord_1", OrderStatus::Pending, Some("pi_1"), "49.90"), "user_1"),
      &[item_fixture("ord_1", "prod_a", "19.95", 2)],
    )
    .await;
  app.login("tok_1", "user_1", "ana@example.com", Role::Customer);
  let service = init_app!(app);

  let req = test::TestRequest::get()
    .uri("/api/orders/ord_1")
    .insert_header(("Authorization", "Bearer tok_1"))
    .to_request();
  let body: Value = test::call_and_read_body_json(&service, req).await;
  assert_eq!(body["id"], "ord_1");
  assert_eq!(body["total"], json!(49.9));
  assert_eq!(body["status"], "pending");
  assert_eq!(body["paymentIntentId"], "pi_1");
  assert_eq!(body["items"].as_array().unwrap().len(), 1);
  assert_eq!(body["items"][0]["lineTotal"], json!(39.9));
}

#[actix_web::test]
async fn my_orders_matches_user_or_email_without_duplicates() {
  let app = TestApp::new();
  let mut by_user = owned(order_fixture("ord_user", OrderStatus::Pending, None, "10.00"), "user_1");
  by_user.email = "old@example.com".to_string();
  let mut by_email = order_fixture("ord_email", OrderStatus::Completed, None, "20.00");
  by_email.email = "ana@example.com".to_string();
  let mut by_both = owned(order_fixture("ord_both", OrderStatus::Pending, None, "30.00"), "user_1");
  by_both.email = "ana@example.com".to_string();
  let mut other = owned(order_fixture("ord_other", OrderStatus::Pending, None, "40.00"), "user_2");
  other.email = "bia@example.com".to_string();

  app.seed(&created_minutes_ago(by_user, 30), &[item_fixture("ord_user", "prod_a", "5.00", 2)]).await;
  app
    .seed(
      &created_minutes_ago(by_email, 20),
      &[
        item_fixture("ord_email", "prod_a", "5.00", 2),
        item_fixture("ord_email", "prod_b", "10.00", 1),
      ],
    )
    .await;
  app.seed(&created_minutes_ago(by_both, 10), &[]).await;
  app.seed(&other, &[]).await;
  app.login("tok_1", "user_1", "ana@example.com", Role::Customer);
  let service = init_app!(app);

  let req = test::TestRequest::get()
    .uri("/api/orders/mine")
    .cookie(Cookie::new("session_token", "tok_1"))
    .to_request();
  let body: Value = test::call_and_read_body_json(&service, req).await;
  let orders = body["orders"].as_array().unwrap();
  let ids: Vec<&str> = orders.iter().map(|o| o["id"].as_str().unwrap()).collect();
  assert_eq!(ids, vec!["ord_both", "ord_email", "ord_user"]);
  assert_eq!(orders[1]["itemCount"], 2);
  assert_eq!(orders[1]["items"].as_array().unwrap().len(), 2);
  assert_eq!(orders[0]["itemCount"], 0);
}

#[actix_web::test]
async fn by_payment_returns_order_and_named_items() {
  let app = TestApp::new();
  app.orders.add_product("prod_a", "Guia de Viagem", money("19.95"));
  app
    .seed(
      &order_fixture("ord_1", OrderStatus::Completed, Some("pi_abc"), "39.90"),
      &[item_fixture("ord_1", "prod_a", "19.95", 2)],
    )
    .await;
  let service = init_app!(app);

  let req = test::TestRequest::get()
    .uri("/api/orders/by-payment?payment_intent=pi_abc")
    .to_request();
  let body: Value = test::call_and_read_body_json(&service, req).await;
  assert_eq!(body["order"]["id"], "ord_1");
  assert_eq!(body["order"]["status"], "completed");
  assert_eq!(body["items"][0]["productName"], "Guia de Viagem");
  assert_eq!(body["items"][0]["quantity"], 2);
  assert!(body["items"][0]["variationName"].is_null());
}

#[actix_web::test]
async fn by_payment_not_found_hides_debug_context_in_production() {
  let app = TestApp::with_config(AppConfig {
    app_env: "production".to_string(),
    ..AppConfig::default()
  });
  app
    .seed(&order_fixture("ord_1", OrderStatus::Pending, Some("pi_abc"), "10.00"), &[])
    .await;
  let service = init_app!(app);

  let req = test::TestRequest::get()
    .uri("/api/orders/by-payment?payment_intent=pi_zzz")
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "error": "Pedido não encontrado" }));
}

#[actix_web::test]
async fn by_payment_not_found_lists_recent_orders_outside_production() {
  let app = TestApp::new();
  for n in 0..7 {
    let payment_ref = format!("pi_{}", n);
    let order = order_fixture(&format!("ord_{}", n), OrderStatus::Pending, Some(payment_ref.as_str()), "10.00");
    app.seed(&created_minutes_ago(order, 10 - n), &[]).await;
  }
  let service = init_app!(app);

  let req = test::TestRequest::get()
    .uri("/api/orders/by-payment?payment_intent=pi_zzz")
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let body: Value = test::read_body_json(resp).await;
  let recent = body["debug"]["recentOrders"].as_array().unwrap();
  assert_eq!(recent.len(), 5);
  assert_eq!(recent[0]["id"], "ord_6");
  assert_eq!(body["debug"]["searchedPaymentIntent"], "pi_zzz");
}

#[actix_web::test]
async fn legacy_status_lookup() {
  let app = TestApp::new();
  let mut order = order_fixture("ord_legacy", OrderStatus::Completed, None, "10.00");
  order.legacy_payment_id = Some("pay_123".to_string());
  app.seed(&order, &[]).await;
  let service = init_app!(app);

  let req = test::TestRequest::get()
    .uri("/api/orders/status?paymentId=pay_123")
    .to_request();
  let body: Value = test::call_and_read_body_json(&service, req).await;
  assert_eq!(body, json!({ "status": "completed" }));

  let req = test::TestRequest::get()
    .uri("/api/orders/status?paymentId=pay_999")
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::get().uri("/api/orders/status").to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::BAD_REQUEST);
}
