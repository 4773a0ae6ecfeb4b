//! Leveling state of one member in one chat

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_stats")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i64,
  #[sea_orm(primary_key, auto_increment = false)]
  pub chat_id: i64,
  pub xp: i64,
  pub level: i32,
  pub messages_count: i64,
  pub links_shared: i64,
  pub thanks_received: i64,
  pub daily_messages: i64,
  /// local day of the last counted message
  pub active_on: Option<Date>,
  pub consecutive_days: i64,
  pub days_active: i64,
  /// json object of cumulative context counters
  pub signals: Json,
  /// bumped on every committed update
  pub version: i64,
  pub last_activity: Option<DateTime>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  pub fn fresh(user_id: i64, chat_id: i64, now: DateTime) -> Self {
    Self {
      user_id,
      chat_id,
      xp: 0,
      level: 1,
      messages_count: 0,
      links_shared: 0,
      thanks_received: 0,
      daily_messages: 0,
      active_on: None,
      consecutive_days: 0,
      days_active: 0,
      signals: Json::Object(Default::default()),
      version: 0,
      last_activity: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn key(&self) -> (i64, i64) {
    (self.user_id, self.chat_id)
  }

  pub fn signal(&self, name: &str) -> i64 {
    self.signals.get(name).and_then(Json::as_i64).unwrap_or(0)
  }

  pub fn bump_signal(&mut self, name: &str, by: i64) {
    if by == 0 {
      return;
    }
    if !self.signals.is_object() {
      self.signals = Json::Object(Default::default());
    }
    let next = self.signal(name).saturating_add(by);
    if let Some(map) = self.signals.as_object_mut() {
      map.insert(name.to_string(), Json::from(next));
    }
  }
}
