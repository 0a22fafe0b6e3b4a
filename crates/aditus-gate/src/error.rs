//! Error types and axum `IntoResponse` implementation.
//!
//! Only request-level and infrastructure failures live here. Denials are
//! not errors: they travel inside a successful scan response, reasons and
//! all.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("operator lacks the required capability")]
  Forbidden,

  /// Invalid exam id supplied — a caller error, not a verdict.
  #[error("exam not found: {0}")]
  ExamNotFound(Uuid),

  #[error("student not found: {0}")]
  StudentNotFound(String),

  #[error("scan rate limit exceeded")]
  RateLimited,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("ledger error: {0}")]
  Ledger(#[source] aditus_core::ledger::LedgerError),

  #[error("registry error: {0}")]
  Registry(#[source] aditus_core::registry::RegistryError),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden => StatusCode::FORBIDDEN,
      Error::ExamNotFound(_) | Error::StudentNotFound(_) => {
        StatusCode::NOT_FOUND
      }
      Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Ledger(_) | Error::Registry(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };

    let mut res =
      (status, Json(json!({ "error": self.to_string() }))).into_response();

    if matches!(self, Error::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"aditus\""),
      );
    }
    res
  }
}
