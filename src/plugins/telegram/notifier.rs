use teloxide::{
  Bot,
  prelude::*,
  types::{ChatId, MessageId, ParseMode, ReplyParameters},
};

use crate::{
  leveling::{LevelUp, Member, Origin},
  notify::{Notifier, text},
  prelude::*,
};

/// Replies to the message that triggered the notification.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
  bot: Bot,
}

impl TelegramNotifier {
  pub fn new(bot: Bot) -> Self {
    Self { bot }
  }

  async fn send(&self, origin: Origin, text: String) -> Result<()> {
    let mut request = self
      .bot
      .send_message(ChatId(origin.chat_id), text)
      .parse_mode(ParseMode::Html);

    if let Some(message_id) = origin.message_id {
      request =
        request.reply_parameters(ReplyParameters::new(MessageId(message_id)));
    }

    request.await?;
    Ok(())
  }
}

#[async_trait]
impl Notifier for TelegramNotifier {
  async fn notify_level_up(
    &self,
    level_up: &LevelUp,
    member: &Member,
    origin: Origin,
  ) -> Result<()> {
    self.send(origin, text::level_up(level_up, member)).await
  }

  async fn notify_achievement(
    &self,
    achievement: &Achievement,
    member: &Member,
    origin: Origin,
  ) -> Result<()> {
    let text = text::achievements(std::slice::from_ref(achievement), member);
    self.send(origin, text).await
  }

  async fn notify_batch(
    &self,
    achievements: &[Achievement],
    member: &Member,
    origin: Origin,
  ) -> Result<()> {
    self.send(origin, text::achievements(achievements, member)).await
  }
}
