//! Achievement catalog
//!
//! Definitions are plain data. Loading checks every entry against the
//! condition registry and drops the ones that can never be evaluated.

use super::condition::ConditionRegistry;
use crate::prelude::*;

#[derive(Debug, Clone, Copy)]
pub struct Definition {
  pub id: &'static str,
  pub title: &'static str,
  pub description: &'static str,
  pub emoji: &'static str,
  pub condition: &'static str,
  pub value: i64,
  pub category: Category,
}

impl Definition {
  pub fn to_achievement(&self) -> Achievement {
    Achievement {
      id: self.id.to_string(),
      title: self.title.to_string(),
      description: self.description.to_string(),
      emoji: self.emoji.to_string(),
      condition_type: self.condition.to_string(),
      condition_value: self.value,
      category: self.category,
    }
  }
}

macro_rules! def {
  ($cat:ident, $id:literal, $emoji:literal, $title:literal, $desc:literal, $cond:literal >= $value:literal) => {
    Definition {
      id: $id,
      title: $title,
      description: $desc,
      emoji: $emoji,
      condition: $cond,
      value: $value,
      category: Category::$cat,
    }
  };
}

/// Built-in achievements, in display order.
#[rustfmt::skip]
pub static DEFINITIONS: &[Definition] = &[
  // Activity
  def!(Activity, "first_message", "👋", "Hello, World", "Send your first message", "messages_count" >= 1),
  def!(Activity, "messages_100", "💬", "Chatterbox", "Send 100 messages", "messages_count" >= 100),
  def!(Activity, "messages_500", "🗣", "Talkative", "Send 500 messages", "messages_count" >= 500),
  def!(Activity, "messages_1000", "📢", "Loudspeaker", "Send 1000 messages", "messages_count" >= 1000),
  def!(Activity, "messages_5000", "🏛", "Pillar of the Chat", "Send 5000 messages", "messages_count" >= 5000),
  def!(Activity, "daily_50", "⚡", "Busy Day", "Send 50 messages in one day", "daily_messages" >= 50),
  def!(Activity, "daily_200", "🌪", "Whirlwind", "Send 200 messages in one day", "daily_messages" >= 200),
  def!(Activity, "streak_3", "🔥", "Warming Up", "Write 3 days in a row", "consecutive_days" >= 3),
  def!(Activity, "streak_7", "📅", "Regular", "Write 7 days in a row", "consecutive_days" >= 7),
  def!(Activity, "streak_30", "🗓", "Unstoppable", "Write 30 days in a row", "consecutive_days" >= 30),
  def!(Activity, "days_30", "🌱", "Settler", "Be active on 30 different days", "days_active" >= 30),
  def!(Activity, "days_100", "🌳", "Old Timer", "Be active on 100 different days", "days_active" >= 100),
  def!(Activity, "days_365", "🎂", "Veteran", "Be active on 365 different days", "days_active" >= 365),
  def!(Activity, "spree_10", "🚂", "Monologue", "Send 10 messages in a row", "consecutive_messages" >= 10),
  // Media
  def!(Media, "first_photo", "📷", "Snapshot", "Share your first photo", "photos_shared" >= 1),
  def!(Media, "photos_50", "🖼", "Photographer", "Share 50 photos", "photos_shared" >= 50),
  def!(Media, "first_video", "🎥", "Rolling", "Upload your first video", "videos_uploaded" >= 1),
  def!(Media, "videos_25", "🎬", "Director", "Upload 25 videos", "videos_uploaded" >= 25),
  def!(Media, "music_10", "🎧", "DJ", "Share 10 audio tracks or voice notes", "music_shared" >= 10),
  def!(Media, "stickers_100", "🃏", "Sticker Fan", "Send 100 stickers", "stickers_sent" >= 100),
  def!(Media, "polls_5", "📊", "Pollster", "Create 5 polls", "polls_created" >= 5),
  def!(Media, "links_10", "🔗", "Link Sharer", "Share 10 messages with links", "links_shared" >= 10),
  def!(Media, "links_100", "📚", "Librarian", "Share 100 messages with links", "links_shared" >= 100),
  def!(Media, "twitter_10", "🐦", "Birdwatcher", "Share 10 Twitter/X links", "twitter_links" >= 10),
  def!(Media, "steam_5", "🎮", "Gamer", "Share 5 Steam links", "steam_links" >= 5),
  def!(Media, "memes_50", "🐸", "Meme Lord", "Share 50 memes", "memes_shared" >= 50),
  // Social
  def!(Social, "first_thanks", "🙏", "Appreciated", "Get thanked for the first time", "thanks_received" >= 1),
  def!(Social, "thanks_10", "🤝", "Helpful", "Get thanked 10 times", "thanks_received" >= 10),
  def!(Social, "thanks_50", "🧙", "Guru", "Get thanked 50 times", "thanks_received" >= 50),
  def!(Social, "reactions_100", "❤", "Beloved", "Receive 100 reactions", "reactions_received" >= 100),
  def!(Social, "replies_100", "↩", "Conversationalist", "Reply to 100 messages", "replies_made" >= 100),
  def!(Social, "mentions_50", "📣", "Caller", "Mention people 50 times", "mentions_made" >= 50),
  def!(Social, "emojis_500", "🎨", "Emoji Artist", "Send 500 emoji", "emojis_sent" >= 500),
  def!(Social, "laughs_100", "🤣", "Comedian", "Laugh 100 times", "laugh_messages" >= 100),
  // Rare
  def!(Rare, "early_bird", "🌅", "Early Bird", "Be the first to write in the morning", "first_morning_message" >= 1),
  def!(Rare, "night_owl", "🦉", "Night Owl", "Write the last message of the night", "last_night_message" >= 1),
  def!(Rare, "novelist", "📜", "Novelist", "Write the longest message in the chat", "longest_message" >= 1),
  def!(Rare, "laconic", "🤏", "Laconic", "Answer with a single ok", "shortest_message" >= 1),
  def!(Rare, "sailor", "🏴‍☠", "Sailor", "Use 100 strong words", "swear_words" >= 100),
  // Level
  def!(Level, "level_5", "⭐", "Rising Star", "Reach level 5", "level" >= 5),
  def!(Level, "level_10", "🌟", "Shining", "Reach level 10", "level" >= 10),
  def!(Level, "level_20", "💫", "Stellar", "Reach level 20", "level" >= 20),
  def!(Level, "level_30", "👑", "Legend", "Reach level 30", "level" >= 30),
  def!(Level, "xp_10000", "💎", "Ten Thousand", "Earn 10000 XP", "xp" >= 10000),
];

#[derive(Debug, Clone, Default)]
pub struct Catalog {
  items: Vec<Achievement>,
  index: HashMap<String, usize>,
}

impl Catalog {
  pub fn standard(registry: &ConditionRegistry) -> Self {
    Self::load(DEFINITIONS.iter().map(Definition::to_achievement), registry)
  }

  /// Keeps valid definitions in order, skipping invalid and duplicate ones.
  pub fn load(
    defs: impl IntoIterator<Item = Achievement>,
    registry: &ConditionRegistry,
  ) -> Self {
    let mut catalog = Self::default();

    for def in defs {
      if let Err(err) = validate(&def, registry) {
        warn!("Skipping achievement definition: {err}");
        continue;
      }
      if catalog.index.contains_key(&def.id) {
        warn!(achievement = %def.id, "Skipping duplicate achievement id");
        continue;
      }
      catalog.index.insert(def.id.clone(), catalog.items.len());
      catalog.items.push(def);
    }

    catalog
  }

  pub fn all(&self) -> &[Achievement] {
    &self.items
  }

  pub fn get(&self, id: &str) -> Option<&Achievement> {
    self.index.get(id).map(|&idx| &self.items[idx])
  }

  pub fn by_category(&self, category: Category) -> Vec<&Achievement> {
    self.items.iter().filter(|a| a.category == category).collect()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

pub fn validate(def: &Achievement, registry: &ConditionRegistry) -> Result<()> {
  let invalid = |reason: &str| Error::InvalidAchievement {
    id: def.id.clone(),
    reason: reason.to_string(),
  };

  let id_ok = !def.id.is_empty()
    && def
      .id
      .chars()
      .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
  if !id_ok {
    return Err(invalid("id must be non-empty snake_case"));
  }
  if def.title.trim().is_empty() {
    return Err(invalid("title is empty"));
  }
  if def.condition_value < 0 {
    return Err(invalid("condition value is negative"));
  }
  if !registry.is_registered(&def.condition_type) {
    return Err(invalid(&format!(
      "unknown condition type `{}`",
      def.condition_type
    )));
  }
  Ok(())
}
