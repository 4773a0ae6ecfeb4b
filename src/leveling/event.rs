//! Inputs and outputs of the leveling engine

use std::collections::HashSet;

use serde::Serialize;

use super::condition::{Context, Flag, Signal};
use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
  Private,
  Group,
  Supergroup,
  Channel,
}

impl ChatKind {
  pub fn is_group(&self) -> bool {
    matches!(self, Self::Group | Self::Supergroup)
  }
}

/// A chat participant as seen in one update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
  pub id: i64,
  pub name: String,
  pub username: Option<String>,
  pub is_bot: bool,
}

impl Member {
  pub fn new(id: i64, name: impl Into<String>) -> Self {
    Self { id, name: name.into(), username: None, is_bot: false }
  }

  pub fn with_username(mut self, username: impl Into<String>) -> Self {
    self.username = Some(username.into());
    self
  }

  pub fn bot(mut self) -> Self {
    self.is_bot = true;
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Media {
  Photo,
  Video,
  VideoNote,
  Animation,
  Audio,
  Voice,
  Sticker,
  Poll,
  Document,
}

impl Media {
  /// Accumulated signal bumped by one attachment of this kind.
  pub fn signal(&self) -> Option<Signal> {
    match self {
      Self::Photo => Some(Signal::PhotosShared),
      Self::Video | Self::VideoNote => Some(Signal::VideosUploaded),
      Self::Audio | Self::Voice => Some(Signal::MusicShared),
      Self::Sticker => Some(Signal::StickersSent),
      Self::Poll => Some(Signal::PollsCreated),
      Self::Animation | Self::Document => None,
    }
  }
}

/// Where notifications about an event should be posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
  pub chat_id: i64,
  pub message_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct MessageEvent {
  pub chat_id: i64,
  pub chat_kind: ChatKind,
  pub message_id: Option<i32>,
  pub sender: Member,
  /// text or media caption
  pub text: String,
  pub reply_to: Option<Member>,
  pub media: HashSet<Media>,
  /// signals computed by collaborators with access to chat history
  pub extra: Context,
  pub sent_at: DateTime,
}

impl MessageEvent {
  pub fn new(chat_id: i64, sender: Member, text: impl Into<String>) -> Self {
    Self {
      chat_id,
      chat_kind: ChatKind::Supergroup,
      message_id: None,
      sender,
      text: text.into(),
      reply_to: None,
      media: HashSet::new(),
      extra: Context::new(),
      sent_at: Utc::now().naive_utc(),
    }
  }

  pub fn in_chat(mut self, kind: ChatKind) -> Self {
    self.chat_kind = kind;
    self
  }

  pub fn with_message_id(mut self, message_id: i32) -> Self {
    self.message_id = Some(message_id);
    self
  }

  pub fn replying_to(mut self, member: Member) -> Self {
    self.reply_to = Some(member);
    self
  }

  pub fn with_media(mut self, media: Media) -> Self {
    self.media.insert(media);
    self
  }

  pub fn with_flag(mut self, flag: Flag) -> Self {
    self.extra.raise(flag);
    self
  }

  pub fn at(mut self, sent_at: DateTime) -> Self {
    self.sent_at = sent_at;
    self
  }

  pub fn origin(&self) -> Origin {
    Origin { chat_id: self.chat_id, message_id: self.message_id }
  }
}

/// Someone reacted to a message written by `author`.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
  pub chat_id: i64,
  pub chat_kind: ChatKind,
  pub message_id: Option<i32>,
  pub reactor: Member,
  pub author: Member,
  pub reacted_at: DateTime,
}

impl ReactionEvent {
  pub fn new(chat_id: i64, reactor: Member, author: Member) -> Self {
    Self {
      chat_id,
      chat_kind: ChatKind::Supergroup,
      message_id: None,
      reactor,
      author,
      reacted_at: Utc::now().naive_utc(),
    }
  }

  pub fn origin(&self) -> Origin {
    Origin { chat_id: self.chat_id, message_id: self.message_id }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelUp {
  pub old_level: u32,
  pub new_level: u32,
  /// threshold of the level after `new_level`, `None` at the top
  pub xp_for_next_level: Option<i64>,
}

/// Effect of one committed update on one member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XpGain {
  pub user_id: i64,
  pub chat_id: i64,
  pub xp_delta: i64,
  pub xp: i64,
  pub level: u32,
  pub level_up: Option<LevelUp>,
  pub unlocked: Vec<Achievement>,
  pub rate_limited: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
  BotSender,
  NotGroup,
}

#[derive(Debug, Default)]
pub struct Report {
  pub skipped: Option<Skip>,
  pub gains: Vec<XpGain>,
  /// members whose update could not be committed
  pub failed: Vec<i64>,
}

impl Report {
  pub fn skipped(reason: Skip) -> Self {
    Self { skipped: Some(reason), ..Default::default() }
  }

  pub fn gain_of(&self, user_id: i64) -> Option<&XpGain> {
    self.gains.iter().find(|gain| gain.user_id == user_id)
  }
}
