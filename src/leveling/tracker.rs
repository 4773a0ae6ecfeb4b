//! Per-chat signals that depend on what happened just before a message

use super::condition::{Context, Flag, Signal};
use crate::prelude::*;

/// Local hours in which the first message of the day counts as a morning one.
const MORNING: std::ops::Range<u32> = 5..10;

/// Chats silent for longer than this lose their run.
const IDLE_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy)]
struct ChatState {
  last_sender: i64,
  run: i64,
  day: Date,
}

#[derive(Debug)]
pub struct ChatTracker {
  chats: DashMap<i64, ChatState>,
  utc_offset: TimeDelta,
}

impl Default for ChatTracker {
  fn default() -> Self {
    Self::new(0)
  }
}

impl ChatTracker {
  pub fn new(utc_offset_hours: i32) -> Self {
    Self {
      chats: DashMap::new(),
      utc_offset: TimeDelta::hours(i64::from(utc_offset_hours)),
    }
  }

  pub fn local_time(&self, at: DateTime) -> DateTime {
    at + self.utc_offset
  }

  pub fn local_date(&self, at: DateTime) -> Date {
    self.local_time(at).date()
  }

  /// Records a message and returns `consecutive_messages` and, when it
  /// applies, `first_morning_message`.
  pub fn observe(&self, chat_id: i64, sender_id: i64, at: DateTime) -> Context {
    let local = self.local_time(at);
    let day = local.date();
    let mut ctx = Context::new();

    let mut entry = self.chats.entry(chat_id).or_insert(ChatState {
      last_sender: sender_id,
      run: 0,
      day: day.pred_opt().unwrap_or(day),
    });
    let state = entry.value_mut();

    let first_today = state.day < day;
    if first_today && MORNING.contains(&local.hour()) {
      ctx.raise(Flag::FirstMorningMessage);
    }

    state.run = if state.last_sender == sender_id { state.run + 1 } else { 1 };
    state.last_sender = sender_id;
    state.day = state.day.max(day);

    ctx.set(Signal::ConsecutiveMessages, state.run);
    ctx
  }

  /// Drops chats without messages in the last [`IDLE_DAYS`] local days.
  pub fn gc(&self, now: DateTime) {
    let horizon = self.local_date(now) - TimeDelta::days(IDLE_DAYS);
    self.chats.retain(|_, state| state.day >= horizon);
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn at(day: u32, hour: u32) -> DateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
      .and_then(|d| d.and_hms_opt(hour, 0, 0))
      .unwrap()
  }

  #[test]
  fn counts_runs_of_the_same_sender() {
    let tracker = ChatTracker::default();

    let run = |sender| {
      tracker.observe(-1, sender, at(2, 12)).count(Signal::ConsecutiveMessages)
    };

    assert_eq!(run(1), 1);
    assert_eq!(run(1), 2);
    assert_eq!(run(2), 1);
    assert_eq!(run(1), 1);
  }

  #[test]
  fn chats_are_independent() {
    let tracker = ChatTracker::default();
    tracker.observe(-1, 1, at(2, 12));
    tracker.observe(-1, 1, at(2, 12));

    let other = tracker.observe(-2, 1, at(2, 12));
    assert_eq!(other.count(Signal::ConsecutiveMessages), 1);
  }

  #[test]
  fn first_message_of_a_morning() {
    let tracker = ChatTracker::default();

    assert!(tracker.observe(-1, 1, at(2, 7)).flag(Flag::FirstMorningMessage));
    assert!(!tracker.observe(-1, 2, at(2, 8)).flag(Flag::FirstMorningMessage));
    // first of the day but too late
    assert!(!tracker.observe(-1, 2, at(3, 14)).flag(Flag::FirstMorningMessage));
  }

  #[test]
  fn offset_shifts_the_day() {
    let tracker = ChatTracker::new(3);
    let local = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
    assert_eq!(tracker.local_date(at(2, 22)), local);
    // 04:00 UTC is 07:00 local
    assert!(tracker.observe(-1, 1, at(4, 4)).flag(Flag::FirstMorningMessage));
  }

  #[test]
  fn gc_drops_idle_chats() {
    let tracker = ChatTracker::default();
    tracker.observe(-1, 1, at(2, 12));
    tracker.observe(-2, 1, at(9, 12));

    tracker.gc(at(10, 12));
    assert_eq!(tracker.chats.len(), 1);

    // a dropped chat starts a fresh run
    let ctx = tracker.observe(-1, 1, at(10, 13));
    assert_eq!(ctx.count(Signal::ConsecutiveMessages), 1);
  }
}
