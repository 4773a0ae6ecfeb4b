//! Process configuration read from the environment

use std::str::FromStr;

use crate::leveling::XpRule;
use crate::leveling::levels::{DEFAULT_BASE_XP, DEFAULT_MULTIPLIER, LevelModel};
use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
  /// XP a member may earn inside one window
  pub cap: i64,
  pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
  pub attempts: u32,
  /// grows linearly with the attempt number
  pub backoff: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { attempts: 3, backoff: Duration::from_millis(50) }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leveling {
  pub base_xp: i64,
  pub multiplier: f64,
  pub rule: XpRule,
  pub rate_limit: Option<RateLimit>,
  pub retry: RetryPolicy,
  pub utc_offset_hours: i32,
}

impl Default for Leveling {
  fn default() -> Self {
    Self {
      base_xp: DEFAULT_BASE_XP,
      multiplier: DEFAULT_MULTIPLIER,
      rule: XpRule::default(),
      rate_limit: None,
      retry: RetryPolicy::default(),
      utc_offset_hours: 0,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub bot_token: Option<String>,
  pub port: u16,
  pub leveling: Leveling,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:chatxp.db?mode=rwc"),
      bot_token: None,
      port: 3000,
      leveling: Leveling::default(),
    }
  }
}

struct Env<F> {
  lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
  fn raw(&self, key: &str) -> Option<String> {
    (self.lookup)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
  }

  fn parse<T>(&self, key: &str, default: T) -> Result<T>
  where
    T: FromStr,
    T::Err: std::fmt::Display,
  {
    match self.raw(key) {
      Some(value) => value
        .parse()
        .map_err(|err| Error::Config(format!("{key}={value:?}: {err}"))),
      None => Ok(default),
    }
  }

  fn duration(&self, key: &str, default: Duration) -> Result<Duration> {
    match self.raw(key) {
      Some(value) => humantime::parse_duration(&value)
        .map_err(|err| Error::Config(format!("{key}={value:?}: {err}"))),
      None => Ok(default),
    }
  }
}

impl Config {
  pub fn from_env() -> Result<Self> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let env = Env { lookup };
    let defaults = Config::default();
    let retry = RetryPolicy::default();

    let rate_limit = match env.raw("XP_RATE_LIMIT") {
      Some(_) => Some(RateLimit {
        cap: env.parse("XP_RATE_LIMIT", 0)?,
        window: env.duration("XP_RATE_WINDOW", Duration::from_secs(60))?,
      }),
      None => None,
    };

    let config = Self {
      database_url: env.raw("DATABASE_URL").unwrap_or(defaults.database_url),
      bot_token: env.raw("TELOXIDE_TOKEN"),
      port: env.parse("PORT", defaults.port)?,
      leveling: Leveling {
        base_xp: env.parse("LEVEL_BASE_XP", DEFAULT_BASE_XP)?,
        multiplier: env.parse("LEVEL_MULTIPLIER", DEFAULT_MULTIPLIER)?,
        rule: XpRule {
          message_xp: env.parse("XP_MESSAGE", XpRule::default().message_xp)?,
          link_bonus: env.parse("XP_LINK_BONUS", XpRule::default().link_bonus)?,
          thanks_bonus: env
            .parse("XP_THANKS_BONUS", XpRule::default().thanks_bonus)?,
        },
        rate_limit,
        retry: RetryPolicy {
          attempts: env.parse("STORE_RETRY_ATTEMPTS", retry.attempts)?,
          backoff: env.duration("STORE_RETRY_BACKOFF", retry.backoff)?,
        },
        utc_offset_hours: env.parse("UTC_OFFSET_HOURS", 0)?,
      },
    };

    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    let leveling = &self.leveling;

    LevelModel::new(leveling.base_xp, leveling.multiplier).map_err(|err| {
      Error::Config(format!("LEVEL_BASE_XP/LEVEL_MULTIPLIER: {err}"))
    })?;

    let rule = &leveling.rule;
    for (key, value) in [
      ("XP_MESSAGE", rule.message_xp),
      ("XP_LINK_BONUS", rule.link_bonus),
      ("XP_THANKS_BONUS", rule.thanks_bonus),
    ] {
      if value < 0 {
        return Err(Error::Config(format!("{key} must not be negative")));
      }
    }

    if let Some(limit) = &leveling.rate_limit {
      if limit.cap <= 0 {
        return Err(Error::Config("XP_RATE_LIMIT must be positive".into()));
      }
      if limit.window.is_zero() {
        return Err(Error::Config("XP_RATE_WINDOW must be positive".into()));
      }
    }

    if leveling.retry.attempts == 0 {
      return Err(Error::Config(
        "STORE_RETRY_ATTEMPTS must be at least 1".into(),
      ));
    }

    if !(-12..=14).contains(&leveling.utc_offset_hours) {
      return Err(Error::Config(format!(
        "UTC_OFFSET_HOURS must be within -12..=14, got {}",
        leveling.utc_offset_hours
      )));
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(vars: &[(&str, &str)]) -> Result<Config> {
    let vars: HashMap<String, String> =
      vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    Config::from_lookup(move |key| vars.get(key).cloned())
  }

  #[test]
  fn defaults_without_env() {
    let config = config(&[]).unwrap();

    assert_eq!(config.port, 3000);
    assert_eq!(config.bot_token, None);
    assert_eq!(config.leveling, Leveling::default());
    assert_eq!(config.leveling.rate_limit, None);
  }

  #[test]
  fn overrides_are_parsed() {
    let config = config(&[
      ("PORT", "8080"),
      ("LEVEL_BASE_XP", "100"),
      ("LEVEL_MULTIPLIER", "1.5"),
      ("XP_LINK_BONUS", "0"),
      ("XP_RATE_LIMIT", "30"),
      ("XP_RATE_WINDOW", "5m"),
      ("STORE_RETRY_BACKOFF", "10ms"),
      ("UTC_OFFSET_HOURS", "3"),
    ])
    .unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.leveling.base_xp, 100);
    assert_eq!(config.leveling.multiplier, 1.5);
    assert_eq!(config.leveling.rule.link_bonus, 0);
    assert_eq!(
      config.leveling.rate_limit,
      Some(RateLimit { cap: 30, window: Duration::from_secs(300) })
    );
    assert_eq!(config.leveling.retry.backoff, Duration::from_millis(10));
    assert_eq!(config.leveling.utc_offset_hours, 3);
  }

  #[test]
  fn blank_values_fall_back_to_defaults() {
    assert_eq!(config(&[("PORT", "  ")]).unwrap().port, 3000);
  }

  #[test]
  fn invalid_values_name_the_variable() {
    for vars in [
      [("LEVEL_MULTIPLIER", "1.0")],
      [("LEVEL_BASE_XP", "abc")],
      [("XP_RATE_LIMIT", "0")],
      [("STORE_RETRY_ATTEMPTS", "0")],
      [("STORE_RETRY_BACKOFF", "soon")],
      [("UTC_OFFSET_HOURS", "20")],
      [("XP_THANKS_BONUS", "-5")],
    ] {
      let key = vars[0].0;
      match config(&vars) {
        Err(Error::Config(msg)) => assert!(msg.contains(key), "{msg}"),
        other => panic!("{key}: expected config error, got {other:?}"),
      }
    }
  }
}
