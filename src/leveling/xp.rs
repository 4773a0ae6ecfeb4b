//! XP accrual for message events

use std::sync::LazyLock;

use regex::Regex;

use super::analyzer;
use super::event::MessageEvent;
use crate::prelude::*;

pub const MESSAGE_XP: i64 = 1;
pub const LINK_BONUS: i64 = 3;
pub const THANKS_BONUS: i64 = 5;

static THANKS: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?ix)
      \b(?: thanks? | thx | thnx | tnx | ty | tysm | tyvm | cheers
          | спасибо | спасибки | спс | пасиб[оа]? | благодарю | дякую
          | danke | gracias | merci | dzięki | grazie | obrigad[oa] )\b",
  )
  .expect("thanks pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpRule {
  pub message_xp: i64,
  /// flat bonus for a message with at least one link
  pub link_bonus: i64,
  /// awarded to the replied-to member of a thank-you message
  pub thanks_bonus: i64,
}

impl Default for XpRule {
  fn default() -> Self {
    Self {
      message_xp: MESSAGE_XP,
      link_bonus: LINK_BONUS,
      thanks_bonus: THANKS_BONUS,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XpAward {
  pub sender: i64,
  pub has_link: bool,
  pub recipients: HashMap<i64, i64>,
}

impl XpRule {
  /// Thanks go to the replied-to member only. @mentions never receive the
  /// bonus, and neither do bots or the sender thanking themselves.
  pub fn award(&self, event: &MessageEvent) -> XpAward {
    let has_link = analyzer::contains_link(&event.text);
    let sender =
      self.message_xp + if has_link { self.link_bonus } else { 0 };

    let mut recipients = HashMap::new();
    if let Some(target) = &event.reply_to
      && target.id != event.sender.id
      && !target.is_bot
      && is_thanks(&event.text)
    {
      recipients.insert(target.id, self.thanks_bonus);
    }

    XpAward { sender, has_link, recipients }
  }
}

pub fn is_thanks(text: &str) -> bool {
  THANKS.is_match(&text.to_lowercase())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::leveling::event::Member;

  fn message(text: &str) -> MessageEvent {
    MessageEvent::new(-100, Member::new(1, "Alice"), text)
  }

  #[test]
  fn plain_message() {
    let award = XpRule::default().award(&message("Hello"));
    assert_eq!(award.sender, 1);
    assert!(award.recipients.is_empty());
  }

  #[test]
  fn link_bonus_is_flat() {
    let rule = XpRule::default();
    assert_eq!(rule.award(&message("Check https://example.com")).sender, 4);
    assert_eq!(
      rule
        .award(&message("https://example.com and https://example.org"))
        .sender,
      4
    );
  }

  #[test]
  fn thanks_go_to_reply_target() {
    let event = message("Thank you!").replying_to(Member::new(2, "Bob"));
    let award = XpRule::default().award(&event);

    assert_eq!(award.sender, 1);
    assert_eq!(award.recipients.get(&2), Some(&5));
  }

  #[test]
  fn thanks_without_reply_or_to_self_or_bot() {
    let rule = XpRule::default();
    assert!(rule.award(&message("спасибо @bob")).recipients.is_empty());

    let own = message("thanks").replying_to(Member::new(1, "Alice"));
    assert!(rule.award(&own).recipients.is_empty());

    let bot = message("thanks").replying_to(Member::new(9, "Helper").bot());
    assert!(rule.award(&bot).recipients.is_empty());
  }

  #[test]
  fn classifier_is_multilingual() {
    let thanks =
      ["Thanks!", "thx a lot", "Спасибо большое", "спс", "Danke", "merci"];
    for text in thanks {
      assert!(is_thanks(text), "{text}");
    }
    for text in ["thankless job", "hello", "typical"] {
      assert!(!is_thanks(text), "{text}");
    }
  }
}
