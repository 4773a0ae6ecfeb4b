//! Outbound announcements of level-ups and unlocked achievements
//!
//! Notifiers run after the stats row is committed; a failed delivery is
//! logged by the engine and never undoes the update.

pub mod text;

use std::sync::Mutex;

use crate::leveling::{LevelUp, Member, Origin};
use crate::prelude::*;

#[async_trait]
pub trait Notifier: Send + Sync {
  async fn notify_level_up(
    &self,
    level_up: &LevelUp,
    member: &Member,
    origin: Origin,
  ) -> Result<()>;

  async fn notify_achievement(
    &self,
    achievement: &Achievement,
    member: &Member,
    origin: Origin,
  ) -> Result<()>;

  /// Several unlocks from one update, delivered as one announcement.
  /// Sends them one by one unless the implementation can combine them.
  async fn notify_batch(
    &self,
    achievements: &[Achievement],
    member: &Member,
    origin: Origin,
  ) -> Result<()> {
    for achievement in achievements {
      self.notify_achievement(achievement, member, origin).await?;
    }
    Ok(())
  }

  /// A single unlock always goes through [`Notifier::notify_achievement`].
  async fn notify_achievements(
    &self,
    achievements: &[Achievement],
    member: &Member,
    origin: Origin,
  ) -> Result<()> {
    match achievements {
      [] => Ok(()),
      [one] => self.notify_achievement(one, member, origin).await,
      many => self.notify_batch(many, member, origin).await,
    }
  }
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

#[async_trait]
impl Notifier for Silent {
  async fn notify_level_up(
    &self,
    _: &LevelUp,
    _: &Member,
    _: Origin,
  ) -> Result<()> {
    Ok(())
  }

  async fn notify_achievement(
    &self,
    _: &Achievement,
    _: &Member,
    _: Origin,
  ) -> Result<()> {
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
  LevelUp { user_id: i64, level_up: LevelUp },
  Achievements { user_id: i64, ids: Vec<String> },
}

/// Keeps delivered notices in memory, optionally failing every delivery.
#[derive(Debug, Default)]
pub struct Recorder {
  notices: Mutex<Vec<Notice>>,
  failing: bool,
}

impl Recorder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing() -> Self {
    Self { failing: true, ..Self::default() }
  }

  pub fn notices(&self) -> Vec<Notice> {
    self.notices.lock().map(|n| n.clone()).unwrap_or_default()
  }

  fn push(&self, notice: Notice) -> Result<()> {
    if self.failing {
      return Err(Error::Notify("recipient unreachable".into()));
    }
    self
      .notices
      .lock()
      .map_err(|_| Error::Internal("poisoned lock: notices".into()))?
      .push(notice);
    Ok(())
  }
}

#[async_trait]
impl Notifier for Recorder {
  async fn notify_level_up(
    &self,
    level_up: &LevelUp,
    member: &Member,
    _: Origin,
  ) -> Result<()> {
    let level_up = level_up.clone();
    self.push(Notice::LevelUp { user_id: member.id, level_up })
  }

  async fn notify_achievement(
    &self,
    achievement: &Achievement,
    member: &Member,
    _: Origin,
  ) -> Result<()> {
    let ids = vec![achievement.id.clone()];
    self.push(Notice::Achievements { user_id: member.id, ids })
  }

  async fn notify_batch(
    &self,
    achievements: &[Achievement],
    member: &Member,
    _: Origin,
  ) -> Result<()> {
    let ids = achievements.iter().map(|a| a.id.clone()).collect();
    self.push(Notice::Achievements { user_id: member.id, ids })
  }
}
