use crate::prelude::*;

pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y").to_string()
}

/// Thousands separated by thin spaces, `12 345`.
pub fn format_number(n: i64) -> String {
  let digits = n.unsigned_abs().to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

  if n < 0 {
    out.push('-');
  }
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(' ');
    }
    out.push(ch);
  }
  out
}

pub fn escape_html(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for ch in text.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      _ => out.push(ch),
    }
  }
  out
}

/// `▰▰▰▱▱▱▱▱▱▱` for 30%.
pub fn progress_bar(percent: f64, width: usize) -> String {
  let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round();
  let filled = (filled as usize).min(width);
  format!("{}{}", "▰".repeat(filled), "▱".repeat(width - filled))
}

/// Maximum message length for Telegram Bot API (4096 characters).
/// Kept below that to leave room for HTML entity expansion.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4000;

fn split_at_boundary(text: &str, max_len: usize) -> (&str, &str) {
  let mut at = max_len.min(text.len());
  while !text.is_char_boundary(at) {
    at -= 1;
  }
  text.split_at(at)
}

/// Splits a long message into chunks that fit within Telegram's message limit.
/// Attempts to split at newline boundaries to preserve formatting.
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
  let max_len =
    if max_len == 0 { TELEGRAM_MAX_MESSAGE_LENGTH } else { max_len };

  if text.len() <= max_len {
    return vec![text.to_string()];
  }

  let mut chunks = Vec::new();
  let mut current = String::new();

  for line in text.lines() {
    if !current.is_empty() && current.len() + line.len() + 1 > max_len {
      chunks.push(std::mem::take(&mut current));
    }

    if line.len() > max_len {
      if !current.is_empty() {
        chunks.push(std::mem::take(&mut current));
      }
      let mut remaining = line;
      while remaining.len() > max_len {
        let (head, tail) = split_at_boundary(remaining, max_len);
        if head.is_empty() {
          break;
        }
        chunks.push(head.to_string());
        remaining = tail;
      }
      current = remaining.to_string();
    } else {
      if !current.is_empty() {
        current.push('\n');
      }
      current.push_str(line);
    }
  }

  if !current.is_empty() {
    chunks.push(current);
  }

  chunks
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numbers_are_grouped() {
    assert_eq!(format_number(0), "0");
    assert_eq!(format_number(999), "999");
    assert_eq!(format_number(12345), "12 345");
    assert_eq!(format_number(-1234567), "-1 234 567");
  }

  #[test]
  fn html_is_escaped() {
    assert_eq!(
      escape_html("<b>Tom & \"Jerry\"</b>"),
      "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;"
    );
  }

  #[test]
  fn bar_width_is_stable() {
    assert_eq!(progress_bar(0.0, 10), "▱▱▱▱▱▱▱▱▱▱");
    assert_eq!(progress_bar(30.0, 10), "▰▰▰▱▱▱▱▱▱▱");
    assert_eq!(progress_bar(250.0, 4), "▰▰▰▰");
  }

  #[test]
  fn short_text_is_one_chunk() {
    assert_eq!(chunk_message("hello", 0), vec!["hello"]);
  }

  #[test]
  fn chunks_split_on_lines() {
    let text = "aaaa\nbbbb\ncccc";
    assert_eq!(chunk_message(text, 9), vec!["aaaa\nbbbb", "cccc"]);
  }

  #[test]
  fn long_lines_split_on_char_boundaries() {
    let text = "ёёёёё";
    let chunks = chunk_message(text, 3);
    assert!(chunks.iter().all(|c| c.len() <= 3));
    assert_eq!(chunks.concat(), text);
  }
}
