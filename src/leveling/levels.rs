//! Level thresholds
//!
//! Level 1 starts at 0 XP, level `n >= 2` at `base_xp * multiplier^(n - 2)`
//! truncated to an integer. With the defaults that gives 0, 50, 100, 200,
//! 400, 800, ...

use dashmap::DashMap;
use serde::Serialize;

use crate::prelude::*;

pub const DEFAULT_BASE_XP: i64 = 50;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug)]
pub struct LevelModel {
  base_xp: i64,
  multiplier: f64,
  max_level: u32,
  cache: DashMap<u32, i64>,
}

/// Position of a user inside their current level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
  pub level: u32,
  /// XP earned since the current level started
  pub xp_in_level: i64,
  /// XP between the current and the next level, 0 at the top level
  pub level_span: i64,
  pub next_level_xp: Option<i64>,
  pub percent: f64,
}

impl Default for LevelModel {
  fn default() -> Self {
    Self::build(DEFAULT_BASE_XP, DEFAULT_MULTIPLIER)
  }
}

impl LevelModel {
  pub fn new(base_xp: i64, multiplier: f64) -> Result<Self> {
    validate(base_xp, multiplier)?;
    Ok(Self::build(base_xp, multiplier))
  }

  fn build(base_xp: i64, multiplier: f64) -> Self {
    Self {
      base_xp,
      multiplier,
      max_level: max_level(base_xp, multiplier),
      cache: DashMap::new(),
    }
  }

  /// Swap the curve parameters and drop every cached threshold.
  pub fn reconfigure(&mut self, base_xp: i64, multiplier: f64) -> Result<()> {
    validate(base_xp, multiplier)?;
    self.base_xp = base_xp;
    self.multiplier = multiplier;
    self.max_level = max_level(base_xp, multiplier);
    self.cache.clear();
    Ok(())
  }

  pub fn base_xp(&self) -> i64 {
    self.base_xp
  }

  pub fn multiplier(&self) -> f64 {
    self.multiplier
  }

  /// Highest level whose threshold still fits into an `i64`.
  pub fn max_level(&self) -> u32 {
    self.max_level
  }

  /// XP required to reach `level`. Saturates at `i64::MAX` past the top.
  pub fn threshold(&self, level: u32) -> i64 {
    if level <= 1 {
      return 0;
    }
    if level > self.max_level {
      return i64::MAX;
    }
    if let Some(xp) = self.cache.get(&level) {
      return *xp;
    }

    let xp = raw_threshold(self.base_xp, self.multiplier, level);
    self.cache.insert(level, xp);
    xp
  }

  /// Largest level whose threshold is `<= xp`.
  pub fn level_for_xp(&self, xp: i64) -> u32 {
    if xp <= 0 {
      return 1;
    }

    // grow the upper bound until it overshoots
    let mut lo = 1;
    let mut hi = 2.min(self.max_level);
    while self.threshold(hi) <= xp {
      if hi == self.max_level {
        return hi;
      }
      lo = hi;
      hi = hi.saturating_mul(2).min(self.max_level);
    }

    // threshold(lo) <= xp < threshold(hi)
    while hi - lo > 1 {
      let mid = lo + (hi - lo) / 2;
      if self.threshold(mid) <= xp {
        lo = mid;
      } else {
        hi = mid;
      }
    }
    lo
  }

  /// XP still missing until the level after `level`, `None` at the top.
  pub fn xp_for_next(&self, level: u32) -> Option<i64> {
    (level < self.max_level).then(|| self.threshold(level + 1))
  }

  pub fn progress(&self, xp: i64) -> Progress {
    let xp = xp.max(0);
    let level = self.level_for_xp(xp);
    let start = self.threshold(level);
    let next_level_xp = self.xp_for_next(level);

    let xp_in_level = xp - start;
    let level_span = next_level_xp.map(|next| next - start).unwrap_or(0);

    let percent = if level_span <= 0 {
      100.0
    } else {
      (xp_in_level as f64 / level_span as f64 * 100.0).clamp(0.0, 100.0)
    };

    Progress { level, xp_in_level, level_span, next_level_xp, percent }
  }
}

fn validate(base_xp: i64, multiplier: f64) -> Result<()> {
  if base_xp < 1 {
    return Err(Error::Config(format!(
      "base xp must be positive, got {base_xp}"
    )));
  }
  if !multiplier.is_finite() || multiplier <= 1.0 {
    return Err(Error::Config(format!(
      "level multiplier must be greater than 1, got {multiplier}"
    )));
  }
  // keeps consecutive truncated thresholds at least 1 XP apart
  if (base_xp as f64) * (multiplier - 1.0) < 1.0 {
    return Err(Error::Config(format!(
      "base xp {base_xp} with multiplier {multiplier} repeats thresholds"
    )));
  }
  Ok(())
}

fn raw_threshold(base_xp: i64, multiplier: f64, level: u32) -> i64 {
  (base_xp as f64 * multiplier.powf(f64::from(level - 2))).trunc() as i64
}

fn max_level(base_xp: i64, multiplier: f64) -> u32 {
  let limit = i64::MAX as f64;
  let steps = ((limit / base_xp as f64).ln() / multiplier.ln()).floor();
  let mut level = (steps.clamp(0.0, (u32::MAX - 2) as f64) as u32) + 2;

  while level > 2
    && base_xp as f64 * multiplier.powf(f64::from(level - 2)) >= limit
  {
    level -= 1;
  }
  level
}
