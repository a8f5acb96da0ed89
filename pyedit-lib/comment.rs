//! Line comment toggling.
//!
//! Each line decides on its own: a line whose first non-blank text is the
//! comment token loses that token, any other line gets the token prepended
//! at column 0. Mixed selections therefore flip line by line instead of being
//! normalized to one state.
//!
//! ```no_run
//! use pyedit_lib::{
//!   comment::toggle_comments,
//!   document::Document,
//! };
//!
//! let mut doc = Document::from("x = 1\n    #y = 2");
//! doc.select(0, 14);
//! toggle_comments(&mut doc, "#").unwrap();
//! assert_eq!(doc.text().to_string(), "#x = 1\n    y = 2");
//! ```

use ropey::RopeSlice;

use crate::{
  document::Document,
  transaction::Result,
};

pub const DEFAULT_COMMENT_TOKEN: &str = "#";

/// Char index of the first non-whitespace char in `line`, if any.
fn first_non_whitespace_char(line: RopeSlice) -> Option<usize> {
  line.chars().position(|ch| !ch.is_whitespace())
}

/// Column of the comment token on `line`, if the line is a comment.
pub fn comment_column(line: RopeSlice, token: &str) -> Option<usize> {
  let start = first_non_whitespace_char(line)?;
  let token_len = token.chars().count();
  let end = start + token_len;
  (!token.is_empty() && end <= line.len_chars() && line.slice(start..end) == token).then_some(start)
}

/// Toggles the comment state of every line the selection touches (or of the
/// cursor line), as one edit block. Returns whether anything changed.
pub fn toggle_comments(doc: &mut Document, token: &str) -> Result<bool> {
  if token.is_empty() {
    return Ok(false);
  }
  let (first, last) = doc.selected_lines();
  let token_len = token.chars().count();

  doc.transact(|scope| {
    for line in first..=last {
      // Each edit stays within its own line, so line starts below are stable
      // in number but not in offset; look them up fresh.
      let start = scope.text().line_to_char(line);
      match comment_column(scope.text().line(line), token) {
        Some(col) => scope.delete(start + col, start + col + token_len)?,
        None => scope.insert(start, token)?,
      }
    }
    Ok(())
  })?;
  tracing::trace!(first, last, "toggled comments");
  Ok(true)
}
