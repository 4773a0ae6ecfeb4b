//! In-memory store for embedding and tests.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

use super::{AchievementStore, Commit, StatsStore, Store, ranks_before};
use crate::prelude::*;

type Key = (i64, i64);

fn lock_err(context: &'static str) -> Error {
  Error::Internal(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct State {
  stats: HashMap<Key, UserStats>,
  definitions: BTreeMap<String, Achievement>,
  unlocks: BTreeMap<(i64, i64, String), UserAchievement>,
}

impl State {
  fn write(&mut self, stats: &UserStats) -> bool {
    match self.stats.get_mut(&stats.key()) {
      Some(stored) if stored.version == stats.version => {
        *stored = UserStats { version: stats.version + 1, ..stats.clone() };
        true
      }
      _ => false,
    }
  }

  fn insert(&mut self, record: &UserAchievement) -> bool {
    let key = (record.user_id, record.chat_id, record.achievement_id.clone());
    if self.unlocks.contains_key(&key) {
      return false;
    }
    self.unlocks.insert(key, record.clone());
    true
  }
}

#[derive(Debug, Default)]
pub struct Memory {
  state: RwLock<State>,
  failures: AtomicU32,
}

impl Memory {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes the next `n` commits fail with a transient error.
  pub fn fail_next(&self, n: u32) {
    self.failures.store(n, Ordering::SeqCst);
  }

  fn take_failure(&self) -> bool {
    self
      .failures
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok()
  }
}

#[async_trait]
impl StatsStore for Memory {
  async fn get(&self, user_id: i64, chat_id: i64) -> Result<Option<UserStats>> {
    let state = self.state.read().map_err(|_| lock_err("stats read"))?;
    Ok(state.stats.get(&(user_id, chat_id)).cloned())
  }

  async fn create(&self, user_id: i64, chat_id: i64) -> Result<UserStats> {
    let mut state = self.state.write().map_err(|_| lock_err("stats write"))?;
    let now = Utc::now().naive_utc();
    let stats = state
      .stats
      .entry((user_id, chat_id))
      .or_insert_with(|| UserStats::fresh(user_id, chat_id, now));
    Ok(stats.clone())
  }

  async fn update(&self, stats: &UserStats) -> Result<bool> {
    let mut state = self.state.write().map_err(|_| lock_err("stats write"))?;
    Ok(state.write(stats))
  }

  async fn leaderboard(
    &self,
    chat_id: i64,
    limit: u64,
  ) -> Result<Vec<UserStats>> {
    let state = self.state.read().map_err(|_| lock_err("stats read"))?;
    let mut rows: Vec<_> =
      state.stats.values().filter(|s| s.chat_id == chat_id).cloned().collect();
    rows.sort_by(|a, b| ranks_before(a, b).then(a.user_id.cmp(&b.user_id)));
    rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    Ok(rows)
  }

  async fn rank(&self, user_id: i64, chat_id: i64) -> Result<Option<u64>> {
    let state = self.state.read().map_err(|_| lock_err("stats read"))?;
    let Some(stats) = state.stats.get(&(user_id, chat_id)) else {
      return Ok(None);
    };
    let ahead = state
      .stats
      .values()
      .filter(|s| s.chat_id == chat_id)
      .filter(|s| ranks_before(s, stats).is_lt())
      .count();
    Ok(Some(ahead as u64 + 1))
  }
}

#[async_trait]
impl AchievementStore for Memory {
  async fn definitions(&self) -> Result<Vec<Achievement>> {
    let state = self.state.read().map_err(|_| lock_err("definitions read"))?;
    Ok(state.definitions.values().cloned().collect())
  }

  async fn upsert_definition(&self, def: &Achievement) -> Result<()> {
    let mut state =
      self.state.write().map_err(|_| lock_err("definitions write"))?;
    state.definitions.insert(def.id.clone(), def.clone());
    Ok(())
  }

  async fn has_unlock(
    &self,
    user_id: i64,
    chat_id: i64,
    achievement_id: &str,
  ) -> Result<bool> {
    let state = self.state.read().map_err(|_| lock_err("unlocks read"))?;
    Ok(
      state
        .unlocks
        .contains_key(&(user_id, chat_id, achievement_id.to_string())),
    )
  }

  async fn unlock(&self, record: &UserAchievement) -> Result<bool> {
    let mut state = self.state.write().map_err(|_| lock_err("unlocks write"))?;
    Ok(state.insert(record))
  }

  async fn unlocks(
    &self,
    user_id: i64,
    chat_id: i64,
  ) -> Result<Vec<UserAchievement>> {
    let state = self.state.read().map_err(|_| lock_err("unlocks read"))?;
    let mut records: Vec<_> = state
      .unlocks
      .values()
      .filter(|r| r.user_id == user_id && r.chat_id == chat_id)
      .cloned()
      .collect();
    records.sort_by_key(|r| r.unlocked_at);
    Ok(records)
  }
}

#[async_trait]
impl Store for Memory {
  async fn commit(
    &self,
    stats: &UserStats,
    unlocks: &[UserAchievement],
  ) -> Result<Commit> {
    if self.take_failure() {
      return Err(Error::Unavailable("injected failure".into()));
    }

    let mut state = self.state.write().map_err(|_| lock_err("commit"))?;
    if !state.write(stats) {
      return Ok(Commit::Conflict);
    }

    let unlocked = unlocks
      .iter()
      .filter(|record| state.insert(record))
      .map(|record| record.achievement_id.clone())
      .collect();

    Ok(Commit::Applied { unlocked })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(user_id: i64, id: &str) -> UserAchievement {
    UserAchievement {
      user_id,
      chat_id: -1,
      achievement_id: id.into(),
      unlocked_at: Utc::now().naive_utc(),
    }
  }

  #[tokio::test]
  async fn versioned_update() {
    let store = Memory::new();
    let stats = store.get_or_create(1, -1).await.unwrap();

    let mut next = stats.clone();
    next.xp = 3;
    assert!(store.update(&next).await.unwrap());
    assert!(!store.update(&next).await.unwrap());

    let stored = store.get(1, -1).await.unwrap().unwrap();
    assert_eq!((stored.xp, stored.version), (3, 1));
  }

  #[tokio::test]
  async fn update_of_missing_row_fails() {
    let store = Memory::new();
    let stats = UserStats::fresh(1, -1, Utc::now().naive_utc());
    assert!(!store.update(&stats).await.unwrap());
  }

  #[tokio::test]
  async fn injected_failures_are_transient() {
    let store = Memory::new();
    let stats = store.create(1, -1).await.unwrap();
    store.fail_next(1);

    let err = store.commit(&stats, &[]).await.unwrap_err();
    assert!(err.is_transient());
    let commit =
      store.commit(&stats, &[record(1, "first_message")]).await.unwrap();
    assert_eq!(
      commit,
      Commit::Applied { unlocked: vec!["first_message".to_string()] }
    );
    assert_eq!(store.commit(&stats, &[]).await.unwrap(), Commit::Conflict);
  }

  #[tokio::test]
  async fn rank_matches_leaderboard() {
    let store = Memory::new();
    for (user_id, xp) in [(1, 10), (2, 30), (3, 20)] {
      let mut stats = store.create(user_id, -1).await.unwrap();
      stats.xp = xp;
      store.update(&stats).await.unwrap();
    }

    let order: Vec<_> = store
      .leaderboard(-1, 10)
      .await
      .unwrap()
      .iter()
      .map(|s| s.user_id)
      .collect();
    assert_eq!(order, vec![2, 3, 1]);
    assert_eq!(store.rank(1, -1).await.unwrap(), Some(3));
    assert_eq!(store.rank(1, -2).await.unwrap(), None);
  }
}
