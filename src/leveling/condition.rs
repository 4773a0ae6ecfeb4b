//! Achievement conditions
//!
//! Every `condition_type` tag maps to a predicate in [`ConditionRegistry`].
//! New condition types are added with [`ConditionRegistry::register`];
//! tags nobody registered never match.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::prelude::*;

/// Numeric per-member signals. A missing signal reads as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
  DailyMessages,
  ConsecutiveDays,
  DaysActive,
  PhotosShared,
  TwitterLinks,
  SteamLinks,
  MemesShared,
  VideosUploaded,
  MusicShared,
  ReactionsReceived,
  RepliesMade,
  PollsCreated,
  EmojisSent,
  LaughMessages,
  MentionsMade,
  StickersSent,
  ConsecutiveMessages,
  SwearWords,
}

impl Signal {
  pub const ALL: [Signal; 18] = [
    Signal::DailyMessages,
    Signal::ConsecutiveDays,
    Signal::DaysActive,
    Signal::PhotosShared,
    Signal::TwitterLinks,
    Signal::SteamLinks,
    Signal::MemesShared,
    Signal::VideosUploaded,
    Signal::MusicShared,
    Signal::ReactionsReceived,
    Signal::RepliesMade,
    Signal::PollsCreated,
    Signal::EmojisSent,
    Signal::LaughMessages,
    Signal::MentionsMade,
    Signal::StickersSent,
    Signal::ConsecutiveMessages,
    Signal::SwearWords,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::DailyMessages => "daily_messages",
      Self::ConsecutiveDays => "consecutive_days",
      Self::DaysActive => "days_active",
      Self::PhotosShared => "photos_shared",
      Self::TwitterLinks => "twitter_links",
      Self::SteamLinks => "steam_links",
      Self::MemesShared => "memes_shared",
      Self::VideosUploaded => "videos_uploaded",
      Self::MusicShared => "music_shared",
      Self::ReactionsReceived => "reactions_received",
      Self::RepliesMade => "replies_made",
      Self::PollsCreated => "polls_created",
      Self::EmojisSent => "emojis_sent",
      Self::LaughMessages => "laugh_messages",
      Self::MentionsMade => "mentions_made",
      Self::StickersSent => "stickers_sent",
      Self::ConsecutiveMessages => "consecutive_messages",
      Self::SwearWords => "swear_words",
    }
  }

  pub fn parse(tag: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|signal| signal.as_str() == tag)
  }

  /// Accumulated in the `signals` column of the stats row. The day counters
  /// have their own columns and `consecutive_messages` lives per message.
  pub fn is_accumulated(&self) -> bool {
    !matches!(
      self,
      Self::DailyMessages
        | Self::ConsecutiveDays
        | Self::DaysActive
        | Self::ConsecutiveMessages
    )
  }
}

/// Boolean per-message signals. A missing flag reads as false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
  FirstMorningMessage,
  LastNightMessage,
  LongestMessage,
  ShortestMessage,
}

impl Flag {
  pub const ALL: [Flag; 4] = [
    Flag::FirstMorningMessage,
    Flag::LastNightMessage,
    Flag::LongestMessage,
    Flag::ShortestMessage,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::FirstMorningMessage => "first_morning_message",
      Self::LastNightMessage => "last_night_message",
      Self::LongestMessage => "longest_message",
      Self::ShortestMessage => "shortest_message",
    }
  }
}

/// Auxiliary signals evaluated next to the stats row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
  counts: HashMap<Signal, i64>,
  flags: HashSet<Flag>,
}

impl Context {
  pub fn new() -> Self {
    Self::default()
  }

  /// Cumulative view of a stats row.
  pub fn of(stats: &UserStats) -> Self {
    let mut ctx = Self::new();
    ctx.set(Signal::DailyMessages, stats.daily_messages);
    ctx.set(Signal::ConsecutiveDays, stats.consecutive_days);
    ctx.set(Signal::DaysActive, stats.days_active);

    for signal in Signal::ALL.into_iter().filter(Signal::is_accumulated) {
      ctx.set(signal, stats.signal(signal.as_str()));
    }
    ctx
  }

  pub fn count(&self, signal: Signal) -> i64 {
    self.counts.get(&signal).copied().unwrap_or(0)
  }

  pub fn flag(&self, flag: Flag) -> bool {
    self.flags.contains(&flag)
  }

  pub fn set(&mut self, signal: Signal, value: i64) {
    if value == 0 {
      self.counts.remove(&signal);
    } else {
      self.counts.insert(signal, value);
    }
  }

  pub fn add(&mut self, signal: Signal, by: i64) {
    self.set(signal, self.count(signal).saturating_add(by));
  }

  pub fn raise(&mut self, flag: Flag) {
    self.flags.insert(flag);
  }

  pub fn with(mut self, signal: Signal, value: i64) -> Self {
    self.set(signal, value);
    self
  }

  pub fn with_flag(mut self, flag: Flag) -> Self {
    self.raise(flag);
    self
  }

  /// Replaces counts present in `other` and unions flags.
  pub fn overlay(&mut self, other: &Context) {
    for (&signal, &value) in &other.counts {
      self.set(signal, value);
    }
    self.flags.extend(other.flags.iter().copied());
  }

  pub fn counts(&self) -> impl Iterator<Item = (Signal, i64)> + '_ {
    self.counts.iter().map(|(&signal, &value)| (signal, value))
  }

  pub fn is_empty(&self) -> bool {
    self.counts.is_empty() && self.flags.is_empty()
  }
}

pub type Predicate =
  Box<dyn Fn(&UserStats, &Context, i64) -> bool + Send + Sync>;

pub struct ConditionRegistry {
  predicates: HashMap<String, Predicate>,
}

impl fmt::Debug for ConditionRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut tags: Vec<_> = self.predicates.keys().collect();
    tags.sort();
    f.debug_struct("ConditionRegistry").field("tags", &tags).finish()
  }
}

impl Default for ConditionRegistry {
  fn default() -> Self {
    Self::standard()
  }
}

impl ConditionRegistry {
  pub fn empty() -> Self {
    Self { predicates: HashMap::new() }
  }

  /// Stats counters, context counters and context flags.
  pub fn standard() -> Self {
    let mut registry = Self::empty();

    registry
      .register("messages_count", |stats, _, value| {
        stats.messages_count >= value
      })
      .register("links_shared", |stats, _, value| stats.links_shared >= value)
      .register("thanks_received", |stats, _, value| {
        stats.thanks_received >= value
      })
      .register("level", |stats, _, value| i64::from(stats.level) >= value)
      .register("xp", |stats, _, value| stats.xp >= value);

    for signal in Signal::ALL {
      registry.register(signal.as_str(), move |_, ctx, value| {
        ctx.count(signal) >= value
      });
    }

    for flag in Flag::ALL {
      registry.register(flag.as_str(), move |_, ctx, _| ctx.flag(flag));
    }

    registry
  }

  /// Adds or replaces the predicate behind `tag`.
  pub fn register<F>(
    &mut self,
    tag: impl Into<String>,
    predicate: F,
  ) -> &mut Self
  where
    F: Fn(&UserStats, &Context, i64) -> bool + Send + Sync + 'static,
  {
    self.predicates.insert(tag.into(), Box::new(predicate));
    self
  }

  pub fn is_registered(&self, tag: &str) -> bool {
    self.predicates.contains_key(tag)
  }

  pub fn met(
    &self,
    achievement: &Achievement,
    stats: &UserStats,
    ctx: &Context,
  ) -> bool {
    match self.predicates.get(&achievement.condition_type) {
      Some(predicate) => predicate(stats, ctx, achievement.condition_value),
      None => {
        debug!(
          achievement = %achievement.id,
          condition = %achievement.condition_type,
          "unknown condition type"
        );
        false
      }
    }
  }
}
