//! Token scanning around the cursor.
//!
//! Everything here is a pure query over the document; nothing mutates.
//! Out-of-range inputs degrade to empty strings.

use pyedit_core::{
  chars::{
    char_is_hint_separator,
    char_is_word_separator,
  },
  line_ending::line_without_line_ending,
};
use ropey::Rope;

use crate::document::Document;

/// Suffixes of the nearby text that ask for member or path completion even
/// when no identifier has been typed yet.
const COMPLETION_TRIGGERS: &[&str] = &[".", "\\\\", "/"];

/// The current line from column 0 up to (excluding) the cursor.
pub fn nearby_text(doc: &Document) -> String {
  let cursor = doc.cursor();
  doc
    .line(cursor.row)
    .map(|line| line.slice(..cursor.col.min(line.len_chars())).to_string())
    .unwrap_or_default()
}

/// The partially typed identifier left of the cursor.
///
/// Empty inside comment lines and right after a separator.
pub fn current_hint(doc: &Document, comment_token: &str) -> String {
  let line = doc.line_text(doc.current_line());
  if is_comment_line(&line, comment_token) {
    return String::new();
  }
  hint_of(&nearby_text(doc)).to_owned()
}

/// Last segment of `nearby` after splitting on the hint separators.
pub fn hint_of(nearby: &str) -> &str {
  nearby
    .rfind(char_is_hint_separator)
    .map_or(nearby, |idx| {
      // Separators are all single-byte except unicode whitespace.
      let sep_len = nearby[idx..].chars().next().map_or(1, char::len_utf8);
      &nearby[idx + sep_len..]
    })
}

pub fn is_comment_line(line: &str, comment_token: &str) -> bool {
  !comment_token.is_empty() && line.trim_start().starts_with(comment_token)
}

/// Whether a completion request should be issued for this hint and nearby
/// text.
pub fn wants_completion(hint: &str, nearby: &str) -> bool {
  !hint.is_empty() || COMPLETION_TRIGGERS.iter().any(|suffix| nearby.ends_with(suffix))
}

/// The word enclosing `column` on `line`.
///
/// Scans outward from `column` until a word separator (or the line edge) is
/// hit on each side and trims separators from the result. Negative or
/// past-the-end columns and missing lines yield an empty string.
pub fn word_at(text: &Rope, line: usize, column: isize) -> String {
  let Ok(column) = usize::try_from(column) else {
    return String::new();
  };
  if line >= text.len_lines() {
    return String::new();
  }
  let slice = text.slice(..);
  let content = line_without_line_ending(&slice, line);
  let len = content.len_chars();
  if column >= len {
    return String::new();
  }

  let mut start = column;
  while start > 0 && !char_is_word_separator(content.char(start)) {
    start -= 1;
  }
  let mut end = column;
  while end + 1 < len && !char_is_word_separator(content.char(end)) {
    end += 1;
  }

  content
    .slice(start..=end)
    .to_string()
    .trim_matches(char_is_word_separator)
    .to_owned()
}

#[cfg(test)]
mod test {
  use quickcheck::quickcheck;

  use super::*;
  use crate::position::Position;

  fn doc_at(text: &str, row: usize, col: usize) -> Document {
    let mut doc = Document::from(text);
    doc.set_cursor(Position::new(row, col));
    doc
  }

  #[test]
  fn nearby_text_stops_at_cursor() {
    let doc = doc_at("x = 1\nimport os.pa\n", 1, 12);
    assert_eq!(nearby_text(&doc), "import os.pa");
    let doc = doc_at("x = 1\nimport os.pa\n", 1, 3);
    assert_eq!(nearby_text(&doc), "imp");
  }

  #[test]
  fn hint_is_last_segment() {
    assert_eq!(hint_of("import os.pa"), "pa");
    assert_eq!(hint_of("foo(bar"), "bar");
    assert_eq!(hint_of("x = "), "");
    assert_eq!(hint_of("os."), "");
    assert_eq!(hint_of("path\\fi"), "fi");
    assert_eq!(hint_of("pri"), "pri");
    assert_eq!(hint_of(""), "");
  }

  #[test]
  fn comment_lines_have_no_hint() {
    let doc = doc_at("    # prin", 0, 10);
    assert_eq!(current_hint(&doc, "#"), "");
    let doc = doc_at("    prin", 0, 8);
    assert_eq!(current_hint(&doc, "#"), "prin");
  }

  #[test]
  fn completion_triggers() {
    assert!(wants_completion("pa", "os.pa"));
    assert!(wants_completion("", "os."));
    assert!(wants_completion("", "dir/"));
    assert!(wants_completion("", "C:\\\\"));
    assert!(!wants_completion("", "C:\\"));
    assert!(!wants_completion("", "x = "));
  }

  #[test]
  fn word_under_column() {
    let text = Rope::from("for item in items:\n    print(item.name)\n");
    assert_eq!(word_at(&text, 0, 0), "for");
    assert_eq!(word_at(&text, 0, 2), "for");
    assert_eq!(word_at(&text, 0, 5), "item");
    assert_eq!(word_at(&text, 0, 16), "items");
    assert_eq!(word_at(&text, 1, 6), "print");
    assert_eq!(word_at(&text, 1, 12), "item");
    assert_eq!(word_at(&text, 1, 17), "name");
  }

  #[test]
  fn word_at_out_of_range_is_empty() {
    let text = Rope::from("abc\n");
    assert_eq!(word_at(&text, 0, -1), "");
    assert_eq!(word_at(&text, 0, 3), "");
    assert_eq!(word_at(&text, 0, 400), "");
    assert_eq!(word_at(&text, 7, 0), "");
    assert_eq!(word_at(&text, 1, 0), "");
    assert_eq!(word_at(&Rope::new(), 0, 0), "");
  }

  #[test]
  fn word_at_on_separator_is_empty() {
    let text = Rope::from("a + b");
    assert_eq!(word_at(&text, 0, 2), "");
  }

  quickcheck! {
    fn word_at_never_panics(text: String, line: usize, column: isize) -> bool {
      let rope = Rope::from(text.as_str());
      let word = word_at(&rope, line % 4, column);
      !word.starts_with(char_is_word_separator) && !word.ends_with(char_is_word_separator)
    }

    fn hint_has_no_separators(nearby: String) -> bool {
      !hint_of(&nearby).contains(char_is_hint_separator)
    }
  }
}
