//! Storage collaborators of the leveling engine
//!
//! [`StatsStore`] keeps one row per (user, chat), [`AchievementStore`] keeps
//! definitions and unlock records, and [`Store::commit`] writes both in one
//! transaction.

pub mod memory;
pub mod sql;

pub use memory::Memory;
pub use sql::Sql;

use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
  /// Row written; holds the ids of achievements that were actually inserted.
  Applied { unlocked: Vec<String> },
  /// The row changed since it was read.
  Conflict,
}

#[async_trait]
pub trait StatsStore: Send + Sync {
  async fn get(&self, user_id: i64, chat_id: i64) -> Result<Option<UserStats>>;

  /// Inserts a fresh row unless one exists and returns the stored row.
  async fn create(&self, user_id: i64, chat_id: i64) -> Result<UserStats>;

  /// Writes `stats` only while the stored version still equals
  /// `stats.version`, bumping it. Returns `false` on a stale or missing row.
  async fn update(&self, stats: &UserStats) -> Result<bool>;

  /// Ordered by xp, then level, then messages count, all descending.
  async fn leaderboard(
    &self,
    chat_id: i64,
    limit: u64,
  ) -> Result<Vec<UserStats>>;

  /// 1-based position under the leaderboard ordering.
  async fn rank(&self, user_id: i64, chat_id: i64) -> Result<Option<u64>>;

  async fn get_or_create(
    &self,
    user_id: i64,
    chat_id: i64,
  ) -> Result<UserStats> {
    match self.get(user_id, chat_id).await? {
      Some(stats) => Ok(stats),
      None => self.create(user_id, chat_id).await,
    }
  }
}

#[async_trait]
pub trait AchievementStore: Send + Sync {
  async fn definitions(&self) -> Result<Vec<Achievement>>;

  async fn upsert_definition(&self, def: &Achievement) -> Result<()>;

  async fn has_unlock(
    &self,
    user_id: i64,
    chat_id: i64,
    achievement_id: &str,
  ) -> Result<bool>;

  /// Returns `false` when the record already existed.
  async fn unlock(&self, record: &UserAchievement) -> Result<bool>;

  async fn unlocks(
    &self,
    user_id: i64,
    chat_id: i64,
  ) -> Result<Vec<UserAchievement>>;
}

#[async_trait]
pub trait Store: StatsStore + AchievementStore {
  /// Conditional stats update plus unlock inserts, all or nothing.
  async fn commit(
    &self,
    stats: &UserStats,
    unlocks: &[UserAchievement],
  ) -> Result<Commit>;
}

/// Leaderboard ordering shared by the store implementations.
pub fn ranks_before(a: &UserStats, b: &UserStats) -> std::cmp::Ordering {
  b.xp
    .cmp(&a.xp)
    .then(b.level.cmp(&a.level))
    .then(b.messages_count.cmp(&a.messages_count))
}
