//! Event processing and the per-member commit loop
//!
//! Every affected member goes through the same cycle: read the row fresh,
//! apply the event's delta, derive the level, evaluate the catalog and
//! commit stats plus unlocks in one transaction guarded by the row version.
//! A lost race or a transient store failure restarts the cycle from a new
//! read, up to the configured number of attempts.

use std::collections::HashSet;
use std::future::Future;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::OnceCell;

use super::analyzer;
use super::catalog::Catalog;
use super::condition::{ConditionRegistry, Context, Flag, Signal};
use super::event::{
  LevelUp, Member, MessageEvent, Origin, ReactionEvent, Report, Skip, XpGain,
};
use super::levels::{LevelModel, Progress};
use super::limiter::RateLimiter;
use super::tracker::ChatTracker;
use super::xp::XpRule;
use crate::config::{Leveling, RetryPolicy};
use crate::notify::Notifier;
use crate::prelude::*;
use crate::store::{Commit, Store};

pub const LEADERBOARD_MAX: u64 = 100;

/// Counter changes for one member, applied on top of a freshly read row.
#[derive(Debug, Clone, Default)]
struct Delta {
  xp: i64,
  messages: i64,
  links: i64,
  thanks: i64,
  /// increments of accumulated signals
  signals: Context,
  /// counts toward the day counters and `last_activity`
  active: bool,
}

impl Delta {
  fn apply(&self, stats: &mut UserStats, today: Date, at: DateTime) {
    stats.xp = stats.xp.saturating_add(self.xp.max(0));
    stats.messages_count += self.messages;
    stats.links_shared += self.links;
    stats.thanks_received += self.thanks;

    for (signal, by) in self.signals.counts() {
      if signal.is_accumulated() {
        stats.bump_signal(signal.as_str(), by);
      }
    }

    if self.active {
      roll_day(stats, today);
      stats.last_activity =
        Some(stats.last_activity.map_or(at, |last| last.max(at)));
    }
  }
}

fn roll_day(stats: &mut UserStats, today: Date) {
  match stats.active_on {
    // late events from an earlier day count into the current one
    Some(day) if day >= today => stats.daily_messages += 1,
    Some(day) if day.succ_opt() == Some(today) => {
      stats.consecutive_days += 1;
      stats.days_active += 1;
      stats.daily_messages = 1;
      stats.active_on = Some(today);
    }
    _ => {
      stats.consecutive_days = 1;
      stats.days_active += 1;
      stats.daily_messages = 1;
      stats.active_on = Some(today);
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Unlocked {
  pub achievement: Achievement,
  pub unlocked_at: DateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
  pub stats: UserStats,
  pub progress: Progress,
  pub rank: Option<u64>,
  pub achievements: Vec<Unlocked>,
  pub total_achievements: usize,
}

pub struct Engine {
  store: Arc<dyn Store>,
  notifier: Arc<dyn Notifier>,
  levels: LevelModel,
  rule: XpRule,
  registry: ConditionRegistry,
  catalog: Catalog,
  tracker: ChatTracker,
  limiter: Option<RateLimiter>,
  retry: RetryPolicy,
  seeded: OnceCell<()>,
}

impl Engine {
  pub fn new(
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    config: &Leveling,
  ) -> Result<Self> {
    let registry = ConditionRegistry::standard();
    let catalog = Catalog::standard(&registry);

    Ok(Self {
      store,
      notifier,
      levels: LevelModel::new(config.base_xp, config.multiplier)?,
      rule: config.rule,
      registry,
      catalog,
      tracker: ChatTracker::new(config.utc_offset_hours),
      limiter: config
        .rate_limit
        .map(|limit| RateLimiter::new(limit.cap, limit.window)),
      retry: config.retry,
      seeded: OnceCell::new(),
    })
  }

  /// Replaces the condition registry and the catalog built on top of it.
  pub fn with_achievements(
    mut self,
    registry: ConditionRegistry,
    defs: impl IntoIterator<Item = Achievement>,
  ) -> Self {
    self.catalog = Catalog::load(defs, &registry);
    self.registry = registry;
    self.seeded = OnceCell::new();
    self
  }

  pub fn levels(&self) -> &LevelModel {
    &self.levels
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  /// Stored levels computed with the old curve are fixed lazily by
  /// [`Engine::sync`] and by the next event of each member.
  pub fn reconfigure_levels(
    &mut self,
    base_xp: i64,
    multiplier: f64,
  ) -> Result<()> {
    self.levels.reconfigure(base_xp, multiplier)?;
    info!(base_xp, multiplier, "Level curve reconfigured");
    Ok(())
  }

  /// Events whose XP was dropped by the rate limit.
  pub fn rate_limited(&self) -> u64 {
    self.limiter.as_ref().map_or(0, RateLimiter::limited)
  }

  /// Sweeps idle rate limit windows and chat runs.
  pub fn gc(&self) {
    let now = Utc::now().naive_utc();
    if let Some(limiter) = &self.limiter {
      limiter.gc(now);
    }
    self.tracker.gc(now);
  }

  /// Upserts every catalog definition into the store.
  pub async fn seed_catalog(&self) -> Result<usize> {
    for def in self.catalog.all() {
      self.store.upsert_definition(def).await?;
    }
    info!(count = self.catalog.len(), "Achievement catalog seeded");
    Ok(self.catalog.len())
  }

  async fn ensure_seeded(&self) -> Result<()> {
    self
      .seeded
      .get_or_try_init(|| async move { self.seed_catalog().await.map(|_| ()) })
      .await?;
    Ok(())
  }

  pub async fn process_message(&self, event: &MessageEvent) -> Report {
    if event.sender.is_bot {
      debug!(user_id = event.sender.id, "Skipping bot message");
      return Report::skipped(Skip::BotSender);
    }
    if !event.chat_kind.is_group() {
      debug!(chat_id = event.chat_id, "Skipping message outside of groups");
      return Report::skipped(Skip::NotGroup);
    }

    let award = self.rule.award(event);
    let analysis = analyzer::analyze(&event.text);

    let mut transient =
      self.tracker.observe(event.chat_id, event.sender.id, event.sent_at);
    transient.overlay(&event.extra);
    for flag in Flag::ALL {
      if analysis.signals.flag(flag) {
        transient.raise(flag);
      }
    }

    let mut signals = analysis.signals;
    for media in &event.media {
      if let Some(signal) = media.signal() {
        signals.add(signal, 1);
      }
    }
    if event.reply_to.is_some() {
      signals.add(Signal::RepliesMade, 1);
    }

    let mut jobs = vec![(
      event.sender.clone(),
      Delta {
        xp: award.sender,
        messages: 1,
        links: i64::from(award.has_link),
        signals,
        active: true,
        ..Default::default()
      },
      transient,
    )];

    for (&user_id, &xp) in &award.recipients {
      let member = event
        .reply_to
        .clone()
        .filter(|m| m.id == user_id)
        .unwrap_or_else(|| Member::new(user_id, user_id.to_string()));
      jobs.push((
        member,
        Delta { xp, thanks: 1, ..Default::default() },
        Context::new(),
      ));
    }

    self.run(jobs, event.chat_id, event.sent_at, event.origin()).await
  }

  /// Credits `reactions_received` to the author of the reacted message.
  pub async fn process_reaction(&self, event: &ReactionEvent) -> Report {
    if event.reactor.is_bot {
      return Report::skipped(Skip::BotSender);
    }
    if !event.chat_kind.is_group() {
      return Report::skipped(Skip::NotGroup);
    }
    if event.author.is_bot || event.author.id == event.reactor.id {
      return Report::default();
    }

    let delta = Delta {
      signals: Context::new().with(Signal::ReactionsReceived, 1),
      ..Default::default()
    };
    let jobs = vec![(event.author.clone(), delta, Context::new())];

    self.run(jobs, event.chat_id, event.reacted_at, event.origin()).await
  }

  async fn run(
    &self,
    jobs: Vec<(Member, Delta, Context)>,
    chat_id: i64,
    at: DateTime,
    origin: Origin,
  ) -> Report {
    let mut report = Report::default();

    if let Err(err) = self.ensure_seeded().await {
      error!(chat_id, "Achievement catalog is not seeded: {err}");
      report.failed = jobs.iter().map(|(member, ..)| member.id).collect();
      return report;
    }

    let results = join_all(jobs.iter().map(|(member, delta, ctx)| {
      self.settle(member, chat_id, delta, ctx, at, origin)
    }))
    .await;

    for ((member, ..), result) in jobs.iter().zip(results) {
      match result {
        Ok(gain) => report.gains.push(gain),
        Err(err) => {
          error!(user_id = member.id, chat_id, "Dropping stats update: {err}");
          report.failed.push(member.id);
        }
      }
    }

    report
  }

  async fn settle(
    &self,
    member: &Member,
    chat_id: i64,
    delta: &Delta,
    transient: &Context,
    at: DateTime,
    origin: Origin,
  ) -> Result<XpGain> {
    let key = (member.id, chat_id);

    let mut delta = delta.clone();
    let mut rate_limited = false;
    if let Some(limiter) = &self.limiter
      && !limiter.try_grant(key, delta.xp, at)
    {
      warn!(user_id = member.id, chat_id, xp = delta.xp, "XP rate limited");
      delta.xp = 0;
      rate_limited = true;
    }

    let today = self.tracker.local_date(at);
    let delta = &delta;
    let mut gain = self
      .retrying(key, || async move {
        let current = self.store.get_or_create(key.0, key.1).await?;
        let mut next = current.clone();
        delta.apply(&mut next, today, at);
        self.transition(current, next, transient, at).await
      })
      .await?;
    gain.rate_limited = rate_limited;

    self.dispatch(&gain, member, origin).await;
    Ok(gain)
  }

  async fn retrying<T, F, Fut>(&self, key: (i64, i64), mut op: F) -> Result<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let mut attempt = 1;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(err) if err.is_transient() && attempt < self.retry.attempts => {
          warn!(
            user_id = key.0,
            chat_id = key.1,
            attempt,
            "Retrying stats update: {err}"
          );
          time::sleep(self.retry.backoff * attempt).await;
          attempt += 1;
        }
        Err(err) => return Err(err),
      }
    }
  }

  /// Derives the level of `next`, evaluates the achievements the member
  /// does not hold yet and commits. Nothing is written when neither the row
  /// nor the unlocks changed.
  async fn transition(
    &self,
    current: UserStats,
    mut next: UserStats,
    transient: &Context,
    at: DateTime,
  ) -> Result<XpGain> {
    let (user_id, chat_id) = current.key();

    let old_level = u32::try_from(current.level).unwrap_or(1).max(1);
    let new_level = self.levels.level_for_xp(next.xp);
    next.level = i32::try_from(new_level).unwrap_or(i32::MAX);

    let mut ctx = Context::of(&next);
    ctx.overlay(transient);

    let held: HashSet<String> = self
      .store
      .unlocks(user_id, chat_id)
      .await?
      .into_iter()
      .map(|record| record.achievement_id)
      .collect();

    let records: Vec<UserAchievement> = self
      .catalog
      .all()
      .iter()
      .filter(|a| !held.contains(&a.id))
      .filter(|a| self.registry.met(a, &next, &ctx))
      .map(|a| UserAchievement {
        user_id,
        chat_id,
        achievement_id: a.id.clone(),
        unlocked_at: at,
      })
      .collect();

    let unlocked = if next == current && records.is_empty() {
      Vec::new()
    } else {
      next.updated_at = Utc::now().naive_utc();
      match self.store.commit(&next, &records).await? {
        Commit::Applied { unlocked } => unlocked,
        Commit::Conflict => return Err(Error::Conflict { user_id, chat_id }),
      }
    };

    let unlocked: Vec<Achievement> =
      unlocked.iter().filter_map(|id| self.catalog.get(id)).cloned().collect();

    let level_up = (new_level > old_level).then(|| LevelUp {
      old_level,
      new_level,
      xp_for_next_level: self.levels.xp_for_next(new_level),
    });

    if level_up.is_some() {
      info!(user_id, chat_id, old_level, new_level, "Level up");
    }
    for achievement in &unlocked {
      let achievement = achievement.id.as_str();
      info!(user_id, chat_id, achievement, "Achievement unlocked");
    }

    Ok(XpGain {
      user_id,
      chat_id,
      xp_delta: next.xp - current.xp,
      xp: next.xp,
      level: new_level,
      level_up,
      unlocked,
      rate_limited: false,
    })
  }

  async fn dispatch(&self, gain: &XpGain, member: &Member, origin: Origin) {
    if let Some(level_up) = &gain.level_up
      && let Err(err) =
        self.notifier.notify_level_up(level_up, member, origin).await
    {
      warn!(user_id = member.id, "Level-up notification failed: {err}");
    }

    if !gain.unlocked.is_empty()
      && let Err(err) =
        self.notifier.notify_achievements(&gain.unlocked, member, origin).await
    {
      warn!(user_id = member.id, "Achievement notification failed: {err}");
    }
  }

  /// Fixes a stale level and backfills achievements the stored state
  /// already satisfies. Idempotent and silent; `None` for unknown members.
  pub async fn sync(
    &self,
    user_id: i64,
    chat_id: i64,
  ) -> Result<Option<XpGain>> {
    self.ensure_seeded().await?;

    self
      .retrying((user_id, chat_id), || async move {
        let Some(current) = self.store.get(user_id, chat_id).await? else {
          return Ok(None);
        };
        let next = current.clone();
        let at = Utc::now().naive_utc();
        self.transition(current, next, &Context::new(), at).await.map(Some)
      })
      .await
  }

  pub async fn profile(
    &self,
    user_id: i64,
    chat_id: i64,
  ) -> Result<Option<Profile>> {
    if self.sync(user_id, chat_id).await?.is_none() {
      return Ok(None);
    }
    let Some(stats) = self.store.get(user_id, chat_id).await? else {
      return Ok(None);
    };

    let rank = self.store.rank(user_id, chat_id).await?;
    let achievements = self
      .store
      .unlocks(user_id, chat_id)
      .await?
      .into_iter()
      .filter_map(|record| {
        self.catalog.get(&record.achievement_id).map(|a| Unlocked {
          achievement: a.clone(),
          unlocked_at: record.unlocked_at,
        })
      })
      .collect();

    Ok(Some(Profile {
      progress: self.levels.progress(stats.xp),
      stats,
      rank,
      achievements,
      total_achievements: self.catalog.len(),
    }))
  }

  /// Top of the chat, `limit` clamped to `1..=100`.
  pub async fn leaderboard(
    &self,
    chat_id: i64,
    limit: u64,
  ) -> Result<Vec<UserStats>> {
    self.store.leaderboard(chat_id, limit.clamp(1, LEADERBOARD_MAX)).await
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use tokio_test::assert_ok;

  use super::*;
  use crate::config::RateLimit;
  use crate::leveling::catalog::DEFINITIONS;
  use crate::leveling::event::{ChatKind, Media};
  use crate::notify::{Notice, Recorder};
  use crate::store::{AchievementStore, Memory, Sql, StatsStore};

  const CHAT: i64 = -100;

  fn noon(day: u32) -> DateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
      .and_then(|d| d.and_hms_opt(12, 0, 0))
      .unwrap()
  }

  fn alice() -> Member {
    Member::new(1, "Alice")
  }

  fn bob() -> Member {
    Member::new(2, "Bob")
  }

  fn say(member: Member, text: &str) -> MessageEvent {
    MessageEvent::new(CHAT, member, text).at(noon(2))
  }

  struct Harness {
    store: Arc<Memory>,
    notices: Arc<Recorder>,
    engine: Engine,
  }

  fn harness_with(leveling: Leveling, notices: Recorder) -> Harness {
    let store = Arc::new(Memory::new());
    let notices = Arc::new(notices);
    let engine =
      Engine::new(store.clone(), notices.clone(), &leveling).unwrap();
    Harness { store, notices, engine }
  }

  fn harness() -> Harness {
    harness_with(Leveling::default(), Recorder::new())
  }

  async fn preset(
    store: &Memory,
    user_id: i64,
    f: impl FnOnce(&mut UserStats),
  ) {
    let mut stats = store.get_or_create(user_id, CHAT).await.unwrap();
    f(&mut stats);
    assert!(store.update(&stats).await.unwrap());
  }

  fn ids(gain: &XpGain) -> Vec<&str> {
    gain.unlocked.iter().map(|a| a.id.as_str()).collect()
  }

  #[tokio::test]
  async fn crossing_a_threshold_levels_up() {
    let h = harness();
    preset(&h.store, 1, |s| {
      s.xp = 49;
      s.messages_count = 10;
    })
    .await;

    let report = h.engine.process_message(&say(alice(), "Hello")).await;
    let gain = report.gain_of(1).unwrap();

    assert_eq!((gain.xp, gain.level, gain.xp_delta), (50, 2, 1));
    assert_eq!(
      gain.level_up,
      Some(LevelUp { old_level: 1, new_level: 2, xp_for_next_level: Some(100) })
    );

    let stored = h.store.get(1, CHAT).await.unwrap().unwrap();
    assert_eq!((stored.xp, stored.level), (50, 2));
    assert!(h.notices.notices().contains(&Notice::LevelUp {
      user_id: 1,
      level_up: gain.level_up.clone().unwrap(),
    }));
  }

  #[tokio::test]
  async fn hundredth_message_unlocks_once() {
    let h = harness();
    preset(&h.store, 1, |s| s.messages_count = 99).await;

    let first = h.engine.process_message(&say(alice(), "Hello")).await;
    let gain = first.gain_of(1).unwrap();
    assert_eq!(ids(gain).iter().filter(|&&id| id == "messages_100").count(), 1);

    let again = h.engine.sync(1, CHAT).await.unwrap().unwrap();
    assert!(again.unlocked.is_empty());

    let next = h.engine.process_message(&say(alice(), "Hello")).await;
    assert!(!ids(next.gain_of(1).unwrap()).contains(&"messages_100"));

    let records = h.store.unlocks(1, CHAT).await.unwrap();
    let hundred = records.iter().filter(|r| r.achievement_id == "messages_100");
    assert_eq!(hundred.count(), 1);
  }

  #[tokio::test]
  async fn thanks_credit_the_reply_target() {
    let h = harness();
    let event = say(alice(), "Thank you!").replying_to(bob());

    let report = h.engine.process_message(&event).await;

    assert_eq!(report.gain_of(1).unwrap().xp_delta, 1);
    let bob_gain = report.gain_of(2).unwrap();
    assert_eq!(bob_gain.xp_delta, 5);
    assert!(ids(bob_gain).contains(&"first_thanks"));

    let bob_stats = h.store.get(2, CHAT).await.unwrap().unwrap();
    assert_eq!(bob_stats.thanks_received, 1);
    assert_eq!(bob_stats.messages_count, 0);

    let alice_stats = h.store.get(1, CHAT).await.unwrap().unwrap();
    assert_eq!(alice_stats.signal("replies_made"), 1);
  }

  #[tokio::test]
  async fn links_and_media_are_counted() {
    let h = harness();
    let event = say(alice(), "look https://x.com/a https://example.com")
      .with_media(Media::Photo);

    let report = h.engine.process_message(&event).await;
    assert_eq!(report.gain_of(1).unwrap().xp_delta, 4);

    let stats = h.store.get(1, CHAT).await.unwrap().unwrap();
    assert_eq!(stats.links_shared, 1);
    assert_eq!(stats.signal("twitter_links"), 1);
    assert_eq!(stats.signal("photos_shared"), 1);
  }

  #[tokio::test]
  async fn bots_and_private_chats_are_skipped() {
    let h = harness();

    let bot = h.engine.process_message(&say(alice().bot(), "beep")).await;
    assert_eq!(bot.skipped, Some(Skip::BotSender));

    let private = say(alice(), "hi").in_chat(ChatKind::Private);
    let private = h.engine.process_message(&private).await;
    assert_eq!(private.skipped, Some(Skip::NotGroup));

    assert!(h.store.get(1, CHAT).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn level_always_matches_xp() {
    let h = harness();
    for i in 0..60 {
      let text = if i % 3 == 0 { "see https://example.com" } else { "hi" };
      let event = say(alice(), text).replying_to(bob());
      let event = if i % 4 == 0 {
        MessageEvent { text: "thanks".into(), ..event }
      } else {
        event
      };
      h.engine.process_message(&event).await;

      for user_id in [1, 2] {
        if let Some(stats) = h.store.get(user_id, CHAT).await.unwrap() {
          let expected = h.engine.levels().level_for_xp(stats.xp);
          assert_eq!(stats.level as u32, expected);
        }
      }
    }
  }

  #[tokio::test]
  async fn rate_limit_drops_xp_but_keeps_activity() {
    let leveling = Leveling {
      rate_limit: Some(RateLimit { cap: 2, window: Duration::from_secs(60) }),
      ..Leveling::default()
    };
    let h = harness_with(leveling, Recorder::new());

    let event = say(alice(), "https://example.com").replying_to(bob());
    let event =
      MessageEvent { text: "thanks https://example.com".into(), ..event };
    let report = h.engine.process_message(&event).await;

    let gain = report.gain_of(1).unwrap();
    assert!(gain.rate_limited);
    assert_eq!(gain.xp_delta, 0);
    assert_eq!(h.engine.rate_limited(), 2);

    let stats = h.store.get(1, CHAT).await.unwrap().unwrap();
    assert_eq!((stats.xp, stats.messages_count), (0, 1));

    // 5 XP for bob is over the cap too, but alice's refusal did not block it
    let bob_gain = report.gain_of(2).unwrap();
    assert!(bob_gain.rate_limited);
    assert_eq!(h.store.get(2, CHAT).await.unwrap().unwrap().thanks_received, 1);

    let small = h.engine.process_message(&say(alice(), "ok")).await;
    assert_eq!(small.gain_of(1).unwrap().xp_delta, 1);
  }

  #[tokio::test]
  async fn transient_failures_are_retried() {
    let leveling = Leveling {
      retry: RetryPolicy { attempts: 3, backoff: Duration::from_millis(1) },
      ..Leveling::default()
    };
    let h = harness_with(leveling, Recorder::new());

    h.store.fail_next(2);
    let report = h.engine.process_message(&say(alice(), "hi")).await;
    assert!(report.failed.is_empty());
    assert_eq!(h.store.get(1, CHAT).await.unwrap().unwrap().xp, 1);

    h.store.fail_next(3);
    let report = h.engine.process_message(&say(alice(), "hi")).await;
    assert_eq!(report.failed, vec![1]);
    assert_eq!(h.store.get(1, CHAT).await.unwrap().unwrap().xp, 1);
  }

  #[tokio::test]
  async fn failed_notifications_keep_the_commit() {
    let h = harness_with(Leveling::default(), Recorder::failing());
    preset(&h.store, 1, |s| s.xp = 49).await;

    let report = h.engine.process_message(&say(alice(), "hi")).await;

    assert!(report.failed.is_empty());
    assert!(report.gain_of(1).unwrap().level_up.is_some());
    assert_eq!(h.store.get(1, CHAT).await.unwrap().unwrap().level, 2);
    assert!(h.store.has_unlock(1, CHAT, "first_message").await.unwrap());
  }

  #[tokio::test]
  async fn sync_backfills_new_definitions_and_fixes_levels() {
    let h = harness();
    for _ in 0..3 {
      h.engine.process_message(&say(alice(), "hi")).await;
    }
    preset(&h.store, 1, |s| s.level = 7).await;

    let mut defs: Vec<_> =
      DEFINITIONS.iter().map(|d| d.to_achievement()).collect();
    defs.push(Achievement {
      id: "messages_3".into(),
      title: "Trio".into(),
      description: "Send 3 messages".into(),
      emoji: "3️⃣".into(),
      condition_type: "messages_count".into(),
      condition_value: 3,
      category: Category::Activity,
    });
    let engine =
      Engine::new(h.store.clone(), h.notices.clone(), &Leveling::default())
        .unwrap()
        .with_achievements(ConditionRegistry::standard(), defs);

    let before = h.notices.notices().len();
    let gain = engine.sync(1, CHAT).await.unwrap().unwrap();
    assert_eq!(ids(&gain), vec!["messages_3"]);
    assert_eq!(gain.level, 1);
    assert_eq!(h.notices.notices().len(), before);

    let stored = h.store.get(1, CHAT).await.unwrap().unwrap();
    assert_eq!(stored.level, 1);

    let again = engine.sync(1, CHAT).await.unwrap().unwrap();
    assert!(again.unlocked.is_empty());
    let unchanged = h.store.get(1, CHAT).await.unwrap().unwrap();
    assert_eq!(unchanged.version, stored.version);

    assert!(engine.sync(42, CHAT).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn reactions_credit_the_author() {
    let h = harness();
    let reaction = ReactionEvent::new(CHAT, bob(), alice());

    let report = h.engine.process_reaction(&reaction).await;
    assert_eq!(report.gain_of(1).unwrap().xp_delta, 0);
    let author = h.store.get(1, CHAT).await.unwrap().unwrap();
    assert_eq!(author.signal("reactions_received"), 1);

    let own = ReactionEvent::new(CHAT, alice(), alice());
    assert!(h.engine.process_reaction(&own).await.gains.is_empty());
  }

  #[tokio::test]
  async fn day_counters_follow_local_dates() {
    let h = harness();
    for day in [2, 2, 3, 5] {
      let event = MessageEvent::new(CHAT, alice(), "hi").at(noon(day));
      h.engine.process_message(&event).await;
    }

    let stats = h.store.get(1, CHAT).await.unwrap().unwrap();
    assert_eq!(stats.days_active, 3);
    assert_eq!(stats.consecutive_days, 1);
    assert_eq!(stats.daily_messages, 1);
    assert_eq!(stats.active_on, NaiveDate::from_ymd_opt(2026, 3, 5));
  }

  #[tokio::test]
  async fn caller_flags_unlock_rare_achievements() {
    let h = harness();
    let event =
      say(alice(), "a very long story").with_flag(Flag::LongestMessage);

    let report = h.engine.process_message(&event).await;
    assert!(ids(report.gain_of(1).unwrap()).contains(&"novelist"));

    let ok = h.engine.process_message(&say(bob(), "ok")).await;
    assert!(ids(ok.gain_of(2).unwrap()).contains(&"laconic"));
  }

  #[tokio::test]
  async fn concurrent_messages_lose_no_updates() {
    let leveling = Leveling {
      retry: RetryPolicy { attempts: 50, backoff: Duration::from_millis(1) },
      ..Leveling::default()
    };
    let h = harness_with(leveling, Recorder::new());
    let engine = Arc::new(h.engine);

    let tasks: Vec<_> = (0..16)
      .map(|_| {
        let engine = engine.clone();
        tokio::spawn(async move {
          engine.process_message(&say(alice(), "hi")).await
        })
      })
      .collect();
    for task in tasks {
      assert!(task.await.unwrap().failed.is_empty());
    }

    let stats = h.store.get(1, CHAT).await.unwrap().unwrap();
    assert_eq!((stats.messages_count, stats.xp), (16, 16));
    assert_eq!(stats.daily_messages, 16);
  }

  #[tokio::test]
  async fn profile_and_leaderboard() {
    let h = harness();
    h.engine.process_message(&say(alice(), "hi")).await;
    h.engine.process_message(&say(bob(), "https://example.com")).await;

    let profile = h.engine.profile(1, CHAT).await.unwrap().unwrap();
    assert_eq!(profile.rank, Some(2));
    assert_eq!(profile.progress.level, 1);
    assert_eq!(profile.total_achievements, h.engine.catalog().len());
    assert!(
      profile
        .achievements
        .iter()
        .any(|unlocked| unlocked.achievement.id == "first_message")
    );

    assert!(h.engine.profile(9, CHAT).await.unwrap().is_none());

    let top = h.engine.leaderboard(CHAT, 0).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].user_id, 2);
  }

  #[tokio::test]
  async fn reconfigured_curve_applies_on_next_event() {
    let mut h = harness();
    preset(&h.store, 1, |s| {
      s.xp = 99;
      s.level = 2;
    })
    .await;

    assert_ok!(h.engine.reconfigure_levels(10, 2.0));
    let report = h.engine.process_message(&say(alice(), "hi")).await;

    // 100 XP is level 5 on 0, 10, 20, 40, 80, 160
    let gain = report.gain_of(1).unwrap();
    assert_eq!(gain.level, 5);
    assert_eq!(gain.level_up.as_ref().map(|l| l.old_level), Some(2));
  }

  #[tokio::test]
  async fn sql_store_commits_with_seeded_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("xp.db").display());
    let store = Arc::new(Sql::connect(&url).await.unwrap());
    let leveling = Leveling {
      retry: RetryPolicy { attempts: 20, backoff: Duration::from_millis(5) },
      ..Leveling::default()
    };
    let engine = Arc::new(
      Engine::new(store.clone(), Arc::new(Recorder::new()), &leveling).unwrap(),
    );

    let tasks: Vec<_> = (0..8)
      .map(|i| {
        let engine = engine.clone();
        tokio::spawn(async move {
          let event = say(alice(), "hi").replying_to(bob());
          let event = if i == 0 {
            MessageEvent { text: "thanks!".into(), ..event }
          } else {
            event
          };
          engine.process_message(&event).await
        })
      })
      .collect();
    for task in tasks {
      assert!(task.await.unwrap().failed.is_empty());
    }

    let stats = store.get(1, CHAT).await.unwrap().unwrap();
    assert_eq!(stats.messages_count, 8);
    assert_eq!(stats.signal("replies_made"), 8);
    assert!(store.has_unlock(1, CHAT, "first_message").await.unwrap());
    assert!(store.has_unlock(2, CHAT, "first_thanks").await.unwrap());
    let seeded = store.definitions().await.unwrap();
    assert_eq!(seeded.len(), engine.catalog().len());
  }
}
