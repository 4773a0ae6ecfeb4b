use std::{collections::HashSet, sync::Arc};

use futures::future;
use teloxide::{prelude::*, utils::command::BotCommands};

use super::{ReplyBot, message};
use crate::{notify::text, prelude::*, state::AppState};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
  Help,
  Profile,
  Top,
  Achievements,
}

const HELP: &str = "\
<b>📋 Commands</b>

/profile - Your level, XP and achievements (reply to someone to see theirs)
/top - Most active members of this chat
/achievements - Every achievement and which ones you have
/help - Show this message

XP: 1 per message, +3 for a message with a link, +5 when someone thanks \
you in a reply.";

const UNAVAILABLE: &str =
  "⚠️ Stats are unavailable right now, try again later.";

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  msg: Message,
  cmd: Command,
) -> ResponseResult<()> {
  let chat_id = bot.chat_id.0;

  // the replied-to member for /profile, the sender otherwise
  let target = msg
    .reply_to_message()
    .and_then(|reply| reply.from.as_ref())
    .filter(|user| !user.is_bot && matches!(cmd, Command::Profile))
    .or(msg.from.as_ref())
    .map(message::member);

  match cmd {
    Command::Help => {
      bot.reply_html(HELP).await?;
    }
    Command::Profile => {
      let Some(member) = target else {
        return Ok(());
      };
      let reply = match app.engine.profile(member.id, chat_id).await {
        Ok(Some(profile)) => text::profile(&profile, &member),
        Ok(None) => "No activity recorded in this chat yet.".to_string(),
        Err(err) => {
          error!(user_id = member.id, chat_id, "Profile failed: {err}");
          UNAVAILABLE.to_string()
        }
      };
      bot.reply_html(reply).await?;
    }
    Command::Top => {
      let reply = match app.engine.leaderboard(chat_id, 10).await {
        Ok(rows) => {
          let names = future::join_all(
            rows.iter().map(|stats| bot.display_name(stats.user_id)),
          )
          .await;
          text::leaderboard(&names.into_iter().zip(rows).collect::<Vec<_>>())
        }
        Err(err) => {
          error!(chat_id, "Leaderboard failed: {err}");
          UNAVAILABLE.to_string()
        }
      };
      bot.reply_html(reply).await?;
    }
    Command::Achievements => {
      let unlocked: HashSet<String> = match &target {
        Some(member) => match app.engine.profile(member.id, chat_id).await {
          Ok(profile) => profile
            .into_iter()
            .flat_map(|p| p.achievements)
            .map(|u| u.achievement.id)
            .collect(),
          Err(err) => {
            warn!(user_id = member.id, chat_id, "Achievements failed: {err}");
            HashSet::new()
          }
        },
        None => HashSet::new(),
      };
      bot
        .reply_html_chunked(text::catalog(app.engine.catalog(), &unlocked))
        .await?;
    }
  }

  Ok(())
}
