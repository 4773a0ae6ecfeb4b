use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{prelude::*, state::AppState};

pub async fn health() -> &'static str {
  "OK"
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
  pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct Entry {
  pub rank: usize,
  pub user_id: i64,
  pub xp: i64,
  pub level: i32,
  pub messages_count: i64,
}

pub async fn leaderboard(
  State(app): State<Arc<AppState>>,
  Path(chat_id): Path<i64>,
  Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<Entry>>> {
  let rows = app.engine.leaderboard(chat_id, query.limit.unwrap_or(10)).await?;

  let entries = rows
    .into_iter()
    .enumerate()
    .map(|(i, stats)| Entry {
      rank: i + 1,
      user_id: stats.user_id,
      xp: stats.xp,
      level: stats.level,
      messages_count: stats.messages_count,
    })
    .collect();

  Ok(Json(entries))
}

pub async fn profile(
  State(app): State<Arc<AppState>>,
  Path((chat_id, user_id)): Path<(i64, i64)>,
) -> Result<Response> {
  match app.engine.profile(user_id, chat_id).await? {
    Some(profile) => Ok(Json(profile).into_response()),
    None => Ok(
      (
        StatusCode::NOT_FOUND,
        Json(json::json!({ "success": false, "error": "User not found" })),
      )
        .into_response(),
    ),
  }
}
