//! Error types for the leveling service

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] DbErr),

  #[error("stats for user {user_id} in chat {chat_id} changed concurrently")]
  Conflict { user_id: i64, chat_id: i64 },

  #[error("store unavailable: {0}")]
  Unavailable(String),

  #[error("invalid achievement `{id}`: {reason}")]
  InvalidAchievement { id: String, reason: String },

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("notification failed: {0}")]
  Notify(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl Error {
  /// Failures worth another attempt with a freshly read row.
  pub fn is_transient(&self) -> bool {
    match self {
      Error::Conflict { .. } | Error::Unavailable(_) => true,
      Error::Database(DbErr::Conn(_) | DbErr::ConnectionAcquire(_)) => true,
      Error::Database(err) => {
        let text = err.to_string();
        text.contains("database is locked") || text.contains("timed out")
      }
      _ => false,
    }
  }
}

impl From<teloxide::RequestError> for Error {
  fn from(err: teloxide::RequestError) -> Self {
    Error::Notify(err.to_string())
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      Error::Conflict { .. } => (StatusCode::CONFLICT, "Concurrent update"),
      Error::Unavailable(_) => {
        (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable")
      }
      Error::Config(_) | Error::InvalidAchievement { .. } => {
        (StatusCode::BAD_REQUEST, "Invalid request")
      }
      Error::Database(_) | Error::Notify(_) | Error::Internal(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
      }
    };

    if status.is_server_error() {
      tracing::error!("Request failed: {self}");
    }

    let body = json::json!({
      "success": false,
      "error": message
    });

    (status, axum::Json(body)).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
