//! Rolling-window XP cap per member

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::prelude::*;

#[derive(Debug)]
pub struct RateLimiter {
  cap: i64,
  window: TimeDelta,
  grants: DashMap<(i64, i64), VecDeque<(DateTime, i64)>>,
  limited: AtomicU64,
}

impl RateLimiter {
  pub fn new(cap: i64, window: Duration) -> Self {
    Self {
      cap,
      window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
      grants: DashMap::new(),
      limited: AtomicU64::new(0),
    }
  }

  /// Reserves `xp` for the member unless that would push the window over
  /// the cap. Refusals are all-or-nothing and counted.
  pub fn try_grant(&self, key: (i64, i64), xp: i64, at: DateTime) -> bool {
    if xp <= 0 {
      return true;
    }

    let mut grants = self.grants.entry(key).or_default();
    prune(&mut grants, at, self.window);

    let used: i64 = grants.iter().map(|(_, xp)| xp).sum();
    if used.saturating_add(xp) > self.cap {
      self.limited.fetch_add(1, Ordering::Relaxed);
      return false;
    }

    grants.push_back((at, xp));
    true
  }

  /// Number of events whose XP was dropped.
  pub fn limited(&self) -> u64 {
    self.limited.load(Ordering::Relaxed)
  }

  pub fn gc(&self, now: DateTime) {
    self.grants.retain(|_, grants| {
      prune(grants, now, self.window);
      !grants.is_empty()
    });
  }
}

fn prune(
  grants: &mut VecDeque<(DateTime, i64)>,
  at: DateTime,
  window: TimeDelta,
) {
  let horizon = at.checked_sub_signed(window);
  while let Some(&(granted_at, _)) = grants.front()
    && horizon.is_some_and(|horizon| granted_at <= horizon)
  {
    grants.pop_front();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn now() -> DateTime {
    Utc::now().naive_utc()
  }

  #[test]
  fn drops_whole_grant_over_cap() {
    let limiter = RateLimiter::new(10, Duration::from_secs(60));
    let t = now();

    assert!(limiter.try_grant((1, -1), 4, t));
    assert!(limiter.try_grant((1, -1), 4, t));
    assert!(!limiter.try_grant((1, -1), 4, t));
    assert!(limiter.try_grant((1, -1), 2, t));
    assert_eq!(limiter.limited(), 1);
  }

  #[test]
  fn members_are_isolated() {
    let limiter = RateLimiter::new(5, Duration::from_secs(60));
    let t = now();

    assert!(limiter.try_grant((1, -1), 5, t));
    assert!(limiter.try_grant((2, -1), 5, t));
    assert!(limiter.try_grant((1, -2), 5, t));
  }

  #[test]
  fn window_rolls() {
    let limiter = RateLimiter::new(5, Duration::from_secs(60));
    let t = now();

    assert!(limiter.try_grant((1, -1), 5, t));
    assert!(!limiter.try_grant((1, -1), 1, t + TimeDelta::seconds(30)));
    assert!(limiter.try_grant((1, -1), 5, t + TimeDelta::seconds(61)));
  }

  #[test]
  fn gc_forgets_idle_members() {
    let limiter = RateLimiter::new(5, Duration::from_secs(60));
    let t = now();
    limiter.try_grant((1, -1), 1, t);

    limiter.gc(t + TimeDelta::seconds(120));
    assert!(limiter.grants.is_empty());
  }
}
