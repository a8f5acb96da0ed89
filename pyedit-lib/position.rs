use pyedit_core::line_ending::line_end_char_index;
use ropey::RopeSlice;

/// This is a single point in a text buffer.
/// 0-indexed as all things should be.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
  pub row: usize,
  pub col: usize,
}

impl Position {
  pub const fn new(row: usize, col: usize) -> Self {
    Self { row, col }
  }
}

impl From<(usize, usize)> for Position {
  fn from((row, col): (usize, usize)) -> Self {
    Self { row, col }
  }
}

/// Converts a char offset into a (line, column) pair. The offset is clamped
/// to the text and the column never points past the line's content, so an
/// offset inside a CRLF pair resolves to the end of that line.
pub fn pos_at_char_idx(text: RopeSlice, char_idx: usize) -> Position {
  let char_idx = char_idx.min(text.len_chars());
  let row = text.char_to_line(char_idx);
  let line_start = text.line_to_char(row);
  let line_end = line_end_char_index(&text, row);
  Position::new(row, char_idx.min(line_end) - line_start)
}

/// Converts a (line, column) pair into a char offset, clamping the line to
/// the last line and the column to that line's length.
pub fn char_idx_at_pos(text: RopeSlice, pos: Position) -> usize {
  let row = pos.row.min(text.len_lines().saturating_sub(1));
  let line_start = text.line_to_char(row);
  let line_end = line_end_char_index(&text, row);
  (line_start + pos.col).min(line_end)
}
