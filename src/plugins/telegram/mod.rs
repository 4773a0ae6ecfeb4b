mod command;
mod message;
mod notifier;

use std::sync::Arc;

use command::Command;
pub use notifier::TelegramNotifier;
use teloxide::{
  Bot,
  dispatching::{Dispatcher, HandlerExt, UpdateFilterExt},
  prelude::*,
  types::{
    ChatId, Message, MessageId, ParseMode, ReplyParameters, Update, UserId,
  },
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

#[async_trait::async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    run_bot(app).await;
    Ok(())
  }
}

pub async fn run_bot(app: Arc<AppState>) {
  info!("Starting Telegram bot...");

  let bot = app.bot.clone();

  let handler = teloxide::dptree::entry()
    .branch(Update::filter_message().filter_command::<Command>().endpoint({
      let app = app.clone();
      move |bot: Bot, msg: Message, cmd: Command| {
        let app = app.clone();
        let bot = ReplyBot::new(bot, msg.chat.id, msg.id);
        command::handle(app, bot, msg, cmd)
      }
    }))
    .branch(Update::filter_message().endpoint({
      let app = app.clone();
      move |msg: Message| {
        let app = app.clone();
        handle_message(app, msg)
      }
    }));

  Dispatcher::builder(bot, handler).build().dispatch().await;
}

async fn handle_message(
  app: Arc<AppState>,
  msg: Message,
) -> ResponseResult<()> {
  let Some(event) = message::event(&msg) else {
    return Ok(());
  };

  let report = app.engine.process_message(&event).await;
  if !report.failed.is_empty() {
    debug!(
      chat_id = event.chat_id,
      failed = ?report.failed,
      "Message processed with failures"
    );
  }
  Ok(())
}

#[derive(Debug, Clone)]
struct ReplyBot {
  inner: Bot,
  pub chat_id: ChatId,
  pub message_id: MessageId,
}

impl ReplyBot {
  pub fn new(inner: Bot, chat_id: ChatId, message_id: MessageId) -> Self {
    Self { inner, chat_id, message_id }
  }

  async fn reply_html(
    &self,
    text: impl Into<String>,
  ) -> ResponseResult<Message> {
    self
      .inner
      .send_message(self.chat_id, text.into())
      .parse_mode(ParseMode::Html)
      .reply_parameters(ReplyParameters::new(self.message_id))
      .await
  }

  /// Send a potentially long message by splitting it into chunks if needed.
  /// Returns the last message sent, or error if any chunk fails.
  async fn reply_html_chunked(
    &self,
    text: impl Into<String>,
  ) -> ResponseResult<Option<Message>> {
    let mut last_msg = None;

    for chunk in utils::chunk_message(&text.into(), 0) {
      last_msg = Some(
        self
          .inner
          .send_message(self.chat_id, chunk)
          .parse_mode(ParseMode::Html)
          .await?,
      );
    }

    Ok(last_msg)
  }

  /// Full name of a chat member, or their id when Telegram cannot say.
  async fn display_name(&self, user_id: i64) -> String {
    let Ok(id) = u64::try_from(user_id) else {
      return user_id.to_string();
    };
    match self.inner.get_chat_member(self.chat_id, UserId(id)).await {
      Ok(member) => member.user.full_name(),
      Err(_) => format!("id{user_id}"),
    }
  }
}
