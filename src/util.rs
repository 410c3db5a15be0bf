//! Small utility helpers used across modules.

/// Lenient parser for comma-separated seed values typed by an admin.
/// Unparsable entries become 0; an empty input falls back to `[0]` so a
/// saved sequence always has at least one start value.
pub fn parse_seed_list(input: &str) -> Vec<i64> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return vec![0];
  }
  let seeds: Vec<i64> = trimmed
    .split(',')
    .map(|tok| tok.trim().parse::<i64>().unwrap_or(0))
    .collect();
  if seeds.is_empty() { vec![0] } else { seeds }
}

/// Derive a URL-friendly id from a display name.
/// Returns an empty string when nothing usable remains; callers fall back
/// to a generated id in that case.
pub fn slugify(name: &str) -> String {
  let mut out = String::new();
  for ch in name.trim().to_lowercase().chars() {
    if ch.is_ascii_alphanumeric() {
      out.push(ch);
    } else if !out.is_empty() && !out.ends_with('-') {
      out.push('-');
    }
  }
  out.trim_end_matches('-').to_string()
}

/// Cap a string for one-line messages, marking how much was dropped.
/// The cut backs off to a char boundary so multibyte text never splits.
pub fn ellipsize(s: &str, max_bytes: usize) -> String {
  if s.len() <= max_bytes {
    return s.to_string();
  }
  let mut end = max_bytes;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… [{} of {} bytes]", &s[..end], end, s.len())
}
