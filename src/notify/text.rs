//! HTML renderings for Telegram

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::leveling::{Catalog, LevelUp, Member, Profile};
use crate::prelude::*;

pub fn mention(member: &Member) -> String {
  format!(
    "<a href=\"tg://user?id={}\">{}</a>",
    member.id,
    utils::escape_html(&member.name)
  )
}

pub fn level_up(level_up: &LevelUp, member: &Member) -> String {
  let mut text = format!(
    "🎉 {} reached <b>level {}</b>!",
    mention(member),
    level_up.new_level
  );
  match level_up.xp_for_next_level {
    Some(next) => {
      let next = utils::format_number(next);
      let _ = write!(text, "\nNext level at {next} XP.");
    }
    None => text.push_str("\nThat is the top of the ladder."),
  }
  text
}

pub fn achievements(achievements: &[Achievement], member: &Member) -> String {
  let mut text = match achievements {
    [_] => format!("🏆 {} unlocked an achievement!\n", mention(member)),
    _ => format!(
      "🏆 {} unlocked {} achievements!\n",
      mention(member),
      achievements.len()
    ),
  };
  for a in achievements {
    let _ = write!(
      text,
      "\n{} <b>{}</b> · {}",
      a.emoji,
      utils::escape_html(&a.title),
      utils::escape_html(&a.description)
    );
  }
  text
}

pub fn profile(profile: &Profile, member: &Member) -> String {
  let stats = &profile.stats;
  let progress = &profile.progress;

  let mut text = format!("👤 <b>{}</b>\n\n", utils::escape_html(&member.name));

  let _ = writeln!(text, "⭐ Level <b>{}</b>", progress.level);
  match progress.next_level_xp {
    Some(next) => {
      let _ = writeln!(
        text,
        "{} {:.0}%\n✨ {} / {} XP",
        utils::progress_bar(progress.percent, 10),
        progress.percent,
        utils::format_number(stats.xp),
        utils::format_number(next)
      );
    }
    None => {
      let xp = utils::format_number(stats.xp);
      let _ = writeln!(text, "✨ {xp} XP (max level)");
    }
  }
  if let Some(rank) = profile.rank {
    let _ = writeln!(text, "🏅 Rank #{rank}");
  }

  let _ = write!(
    text,
    "\n💬 Messages: {}\n🔗 Links: {}\n🙏 Thanks: {}\n🔥 Streak: {} days\
     \n📅 Active days: {}",
    utils::format_number(stats.messages_count),
    utils::format_number(stats.links_shared),
    utils::format_number(stats.thanks_received),
    stats.consecutive_days,
    stats.days_active,
  );

  let _ = write!(
    text,
    "\n\n🏆 Achievements: {}/{}",
    profile.achievements.len(),
    profile.total_achievements
  );
  for unlocked in profile.achievements.iter().rev().take(5) {
    let achievement = &unlocked.achievement;
    let _ = write!(
      text,
      "\n{} {}",
      achievement.emoji,
      utils::escape_html(&achievement.title)
    );
  }

  if let Some(since) = stats.last_activity {
    let _ = write!(text, "\n\n<i>Last seen {}</i>", utils::format_date(since));
  }
  text
}

pub fn leaderboard(rows: &[(String, UserStats)]) -> String {
  if rows.is_empty() {
    return "Nobody has earned XP here yet.".to_string();
  }

  let mut text = String::from("🏆 <b>Top members</b>\n");
  for (i, (name, stats)) in rows.iter().enumerate() {
    let place = match i {
      0 => "🥇".to_string(),
      1 => "🥈".to_string(),
      2 => "🥉".to_string(),
      _ => format!("{}.", i + 1),
    };
    let _ = write!(
      text,
      "\n{place} {} · lvl {} · {} XP",
      utils::escape_html(name),
      stats.level,
      utils::format_number(stats.xp)
    );
  }
  text
}

pub fn catalog(catalog: &Catalog, unlocked: &HashSet<String>) -> String {
  let mut text = format!(
    "🏆 <b>Achievements</b> {}/{}\n",
    catalog.all().iter().filter(|a| unlocked.contains(&a.id)).count(),
    catalog.len()
  );

  for category in Category::ALL {
    let items = catalog.by_category(category);
    if items.is_empty() {
      continue;
    }
    let _ = write!(text, "\n<b>{}</b>", category.label());
    for a in items {
      let mark = if unlocked.contains(&a.id) { "✅" } else { "▫" };
      let _ = write!(
        text,
        "\n{mark} {} {} · <i>{}</i>",
        a.emoji,
        utils::escape_html(&a.title),
        utils::escape_html(&a.description)
      );
    }
    text.push('\n');
  }
  text
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::leveling::{
    ConditionRegistry, LevelModel, Unlocked, catalog::DEFINITIONS,
  };

  fn alice() -> Member {
    Member::new(7, "Alice <3")
  }

  #[test]
  fn mentions_are_escaped() {
    assert_eq!(mention(&alice()), "<a href=\"tg://user?id=7\">Alice &lt;3</a>");
  }

  #[test]
  fn level_up_mentions_next_threshold() {
    let up =
      LevelUp { old_level: 1, new_level: 2, xp_for_next_level: Some(100) };
    let text = level_up(&up, &alice());
    assert!(text.contains("level 2"));
    assert!(text.contains("100 XP"));

    let top = LevelUp { old_level: 58, new_level: 59, xp_for_next_level: None };
    assert!(level_up(&top, &alice()).contains("top of the ladder"));
  }

  #[test]
  fn several_achievements_collapse_into_one_text() {
    let list: Vec<_> =
      DEFINITIONS.iter().take(2).map(|d| d.to_achievement()).collect();
    let text = achievements(&list, &alice());
    assert!(text.contains("2 achievements"));
    assert!(text.contains("Hello, World"));
    assert!(text.contains("Chatterbox"));
  }

  #[test]
  fn catalog_marks_unlocked() {
    let catalog = Catalog::standard(&ConditionRegistry::standard());
    let unlocked = HashSet::from(["first_message".to_string()]);
    let text = super::catalog(&catalog, &unlocked);
    assert!(text.contains(&format!("1/{}", catalog.len())));
    assert!(text.contains("✅ 👋 Hello, World"));
  }

  #[test]
  fn profile_lists_latest_achievements() {
    let now = Utc::now().naive_utc();
    let mut stats = UserStats::fresh(7, -100, now);
    stats.xp = 75;
    stats.messages_count = 75;

    let achievements = DEFINITIONS
      .iter()
      .take(2)
      .map(|def| Unlocked {
        achievement: def.to_achievement(),
        unlocked_at: now,
      })
      .collect();
    let profile = Profile {
      progress: LevelModel::default().progress(stats.xp),
      stats,
      rank: Some(1),
      achievements,
      total_achievements: DEFINITIONS.len(),
    };

    let text = super::profile(&profile, &alice());
    assert!(text.contains("Level <b>2</b>"));
    assert!(text.contains("Rank #1"));
    assert!(text.contains(&format!("2/{}", DEFINITIONS.len())));
    assert!(text.contains("💬 Chatterbox"));
    assert!(text.find("Chatterbox") < text.find("Hello, World"));
  }

  #[test]
  fn empty_leaderboard() {
    assert!(leaderboard(&[]).contains("Nobody"));
  }
}
