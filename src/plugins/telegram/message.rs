//! Mapping of Telegram updates onto engine events

use teloxide::types::{Chat, Message, MessageKind, User};

use crate::leveling::{ChatKind, Media, Member, MessageEvent};

pub fn member(user: &User) -> Member {
  Member {
    id: user.id.0 as i64,
    name: user.full_name(),
    username: user.username.clone(),
    is_bot: user.is_bot,
  }
}

pub fn chat_kind(chat: &Chat) -> ChatKind {
  if chat.is_supergroup() {
    ChatKind::Supergroup
  } else if chat.is_group() {
    ChatKind::Group
  } else if chat.is_channel() {
    ChatKind::Channel
  } else {
    ChatKind::Private
  }
}

fn media(msg: &Message) -> Vec<Media> {
  let mut media = Vec::new();
  if msg.photo().is_some() {
    media.push(Media::Photo);
  }
  if msg.video().is_some() {
    media.push(Media::Video);
  }
  if msg.video_note().is_some() {
    media.push(Media::VideoNote);
  }
  if msg.animation().is_some() {
    media.push(Media::Animation);
  }
  if msg.audio().is_some() {
    media.push(Media::Audio);
  }
  if msg.voice().is_some() {
    media.push(Media::Voice);
  }
  if msg.sticker().is_some() {
    media.push(Media::Sticker);
  }
  if msg.poll().is_some() {
    media.push(Media::Poll);
  }
  if msg.document().is_some() && msg.animation().is_none() {
    media.push(Media::Document);
  }
  media
}

/// Forum topic messages point at the topic's creation message even when
/// they are not replies.
fn opens_topic(msg: &Message) -> bool {
  matches!(msg.kind, MessageKind::ForumTopicCreated(_))
}

/// `None` for updates without a human-visible sender, such as channel posts.
pub fn event(msg: &Message) -> Option<MessageEvent> {
  let sender = msg.from.as_ref()?;
  let text = msg.text().or(msg.caption()).unwrap_or_default();

  let mut event = MessageEvent::new(msg.chat.id.0, member(sender), text)
    .in_chat(chat_kind(&msg.chat))
    .with_message_id(msg.id.0)
    .at(msg.date.naive_utc());

  if let Some(reply) = msg.reply_to_message()
    && !opens_topic(reply)
    && let Some(author) = reply.from.as_ref()
  {
    event = event.replying_to(member(author));
  }

  for media in media(msg) {
    event = event.with_media(media);
  }

  Some(event)
}
