//! Message content analysis
//!
//! Turns raw message text into per-message signal increments. Keyword lists
//! mix English and Russian since both show up in the same chats.

use std::sync::LazyLock;

use regex::Regex;

use super::condition::{Context, Flag, Signal};

static LINK: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)(?:https?://|\bwww\.)(?:www\.)?([^\s/:?#<>]+)[^\s<>]*")
    .expect("link pattern")
});

static LAUGH: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?ix)
      \b(?: a?ha(?:ha)+h? | he(?:he)+ | lol+ | lmf?ao+ | rofl | xd+
          | а?ха(?:ха)+х? | хе(?:хе)+ | лол | ржу | ору )\b
      | [😂🤣😆😹]",
  )
  .expect("laugh pattern")
});

static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\p{Extended_Pictographic}").expect("emoji pattern")
});

static MENTION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?:^|[^\w@])@(\w{3,32})").expect("mention pattern")
});

const TWITTER_HOSTS: &[&str] = &[
  "twitter.com",
  "x.com",
  "t.co",
  "fxtwitter.com",
  "vxtwitter.com",
  "fixupx.com",
];

const STEAM_HOSTS: &[&str] =
  &["steampowered.com", "steamcommunity.com", "s.team"];

const MEME_HOSTS: &[&str] =
  &["9gag.com", "imgflip.com", "knowyourmeme.com", "memepedia.ru"];

const MEME_ROOTS: &[&str] = &["meme", "мем", "кек", "kek"];

const SWEAR_ROOTS: &[&str] = &[
  "fuck", "shit", "bitch", "asshole", "bastard", "dickhead", "бля", "хуй",
  "хуе", "хуё", "нахуй", "похуй", "пизд", "ебан", "ебат", "ёбан", "сука",
  "суки", "мудак", "говн",
];

/// Whole-message replies counted as the shortest possible answer.
const SHORTEST: &[&str] =
  &["ok", "k", "kk", "okay", "oki", "ок", "окей", "кк", "к", "+", "👌"];

/// Signal increments derived from one message text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
  pub links: usize,
  pub signals: Context,
}

impl Analysis {
  pub fn has_link(&self) -> bool {
    self.links > 0
  }
}

pub fn analyze(text: &str) -> Analysis {
  let lower = text.to_lowercase();
  let mut signals = Context::new();

  let hosts: Vec<String> = LINK
    .captures_iter(&lower)
    .filter_map(|caps| caps.get(1))
    .map(|host| host.as_str().trim_end_matches('.').to_string())
    .collect();

  let twitter = hosts.iter().filter(|h| matches_host(h, TWITTER_HOSTS)).count();
  let steam = hosts.iter().filter(|h| matches_host(h, STEAM_HOSTS)).count();
  signals.add(Signal::TwitterLinks, twitter as i64);
  signals.add(Signal::SteamLinks, steam as i64);

  if LAUGH.is_match(&lower) {
    signals.add(Signal::LaughMessages, 1);
  }

  let words = words(&lower);
  let swears = words.iter().filter(|w| starts_with_any(w, SWEAR_ROOTS)).count();
  signals.add(Signal::SwearWords, swears as i64);

  let meme = hosts.iter().any(|h| matches_host(h, MEME_HOSTS))
    || words.iter().any(|w| starts_with_any(w, MEME_ROOTS));
  if meme {
    signals.add(Signal::MemesShared, 1);
  }

  signals.add(Signal::EmojisSent, EMOJI.find_iter(text).count() as i64);
  signals.add(Signal::MentionsMade, MENTION.find_iter(text).count() as i64);

  if is_shortest(&lower) {
    signals.raise(Flag::ShortestMessage);
  }

  Analysis { links: hosts.len(), signals }
}

pub fn contains_link(text: &str) -> bool {
  LINK.is_match(text)
}

pub fn is_shortest(text: &str) -> bool {
  let text = text.trim().to_lowercase();
  SHORTEST.contains(&text.as_str())
}

fn matches_host(host: &str, known: &[&str]) -> bool {
  known.iter().any(|domain| {
    host == *domain
      || host.strip_suffix(domain).is_some_and(|rest| rest.ends_with('.'))
  })
}

fn starts_with_any(word: &str, roots: &[&str]) -> bool {
  roots.iter().any(|root| word.starts_with(root))
}

fn words(text: &str) -> Vec<&str> {
  text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_text_has_no_signals() {
    let analysis = analyze("Hello there");
    assert_eq!(analysis.links, 0);
    assert!(analysis.signals.is_empty());
  }

  #[test]
  fn distinguishes_link_domains() {
    let analysis = analyze(
      "look https://x.com/user/status/1 and \
       https://store.steampowered.com/app/570 or https://example.com",
    );
    assert_eq!(analysis.links, 3);
    assert_eq!(analysis.signals.count(Signal::TwitterLinks), 1);
    assert_eq!(analysis.signals.count(Signal::SteamLinks), 1);
  }

  #[test]
  fn lookalike_domains_do_not_count() {
    let analysis = analyze("https://notx.com/a https://mobile.twitter.com/b");
    assert_eq!(analysis.signals.count(Signal::TwitterLinks), 1);
  }

  #[test]
  fn detects_laughter_in_both_languages() {
    assert_eq!(analyze("ахахах").signals.count(Signal::LaughMessages), 1);
    assert_eq!(analyze("HAHAHA nice").signals.count(Signal::LaughMessages), 1);
    assert_eq!(analyze("😂").signals.count(Signal::LaughMessages), 1);
    assert_eq!(analyze("ha").signals.count(Signal::LaughMessages), 0);
  }

  #[test]
  fn counts_profanity_per_word() {
    let analysis = analyze("shit, this is fucking broken, блять");
    assert_eq!(analysis.signals.count(Signal::SwearWords), 3);
    assert_eq!(analyze("тебе привет").signals.count(Signal::SwearWords), 0);
  }

  #[test]
  fn memes_by_keyword_or_host() {
    assert_eq!(analyze("лови мем").signals.count(Signal::MemesShared), 1);
    assert_eq!(
      analyze("https://9gag.com/gag/abc").signals.count(Signal::MemesShared),
      1
    );
  }

  #[test]
  fn counts_emojis_and_mentions() {
    let analysis = analyze("hi @alice and @bob 🎉🎉 mail me at a@b.io");
    assert_eq!(analysis.signals.count(Signal::EmojisSent), 2);
    assert_eq!(analysis.signals.count(Signal::MentionsMade), 2);
  }

  #[test]
  fn shortest_is_exact_match() {
    assert!(analyze("ok").signals.flag(Flag::ShortestMessage));
    assert!(analyze(" Ок ").signals.flag(Flag::ShortestMessage));
    assert!(!analyze("ok thanks").signals.flag(Flag::ShortestMessage));
  }
}
