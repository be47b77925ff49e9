// storefront/src/web/extractors.rs

//! Session extractors. The token comes from the session cookie or an
//! `Authorization: Bearer` header and is resolved through `SessionStore`.

use crate::errors::AppError;
use crate::models::{Role, Session};
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use tracing::debug;

fn session_token(req: &HttpRequest, cookie_name: &str) -> Option<String> {
  if let Some(cookie) = req.cookie(cookie_name) {
    let value = cookie.value().trim();
    if !value.is_empty() {
      return Some(value.to_string());
    }
  }
  req
    .headers()
    .get(AUTHORIZATION)
    .and_then(|h| h.to_str().ok())
    .and_then(|h| h.strip_prefix("Bearer "))
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
}

async fn resolve_session(state: web::Data<AppState>, token: Option<String>) -> Result<Option<Session>, AppError> {
  let Some(token) = token else {
    return Ok(None);
  };
  let session = state.sessions.find(&token).await?;
  Ok(session.filter(|s| !s.is_expired(Utc::now())))
}

fn app_state(req: &HttpRequest) -> Result<web::Data<AppState>, AppError> {
  req
    .app_data::<web::Data<AppState>>()
    .cloned()
    .ok_or_else(|| AppError::Internal("AppState not configured".to_string()))
}

/// Session if the request carries a valid one, `None` otherwise.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

impl FromRequest for MaybeSession {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = app_state(req);
    let token = state
      .as_ref()
      .ok()
      .and_then(|s| session_token(req, &s.config.session_cookie_name));
    Box::pin(async move {
      let session = resolve_session(state?, token).await?;
      Ok::<_, AppError>(MaybeSession(session))
    })
  }
}

/// A valid session; rejects with `Unauthorized` otherwise.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession(pub Session);

impl FromRequest for AuthenticatedSession {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let maybe = MaybeSession::from_request(req, payload);
    Box::pin(async move {
      match maybe.await? {
        MaybeSession(Some(session)) => Ok(AuthenticatedSession(session)),
        MaybeSession(None) => {
          debug!("Request without a valid session.");
          Err(AppError::Unauthorized("Não autenticado".to_string()))
        }
      }
    })
  }
}

/// A valid session with the admin role.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl FromRequest for AdminSession {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let authenticated = AuthenticatedSession::from_request(req, payload);
    Box::pin(async move {
      let AuthenticatedSession(session) = authenticated.await?;
      if session.role != Role::Admin {
        return Err(AppError::Forbidden("Acesso restrito a administradores".to_string()));
      }
      Ok(AdminSession(session))
    })
  }
}
