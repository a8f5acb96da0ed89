//! Document state: text, cursor/selection and undo history.
//!
//! The document is passive. It knows nothing about keys,
//! completion or highlighting; it only offers position queries and the
//! [`Document::transact`] entry point through which every mutation flows as
//! one [`EditBlock`](crate::transaction::EditBlock).
//!
//! # Example
//!
//! ```no_run
//! use pyedit_lib::{
//!   document::Document,
//!   position::Position,
//! };
//!
//! let mut doc = Document::from("if True:\n");
//! doc.set_cursor(Position::new(0, 8));
//! doc
//!   .transact(|scope| {
//!     let at = scope.cursor();
//!     scope.insert(at, " pass")
//!   })
//!   .unwrap();
//! assert_eq!(doc.text().to_string(), "if True: pass\n");
//! assert!(doc.undo().unwrap());
//! ```

use pyedit_core::line_ending::{
  LineEnding,
  NATIVE_LINE_ENDING,
  detect_line_ending,
  line_without_line_ending,
};
use ropey::{
  Rope,
  RopeSlice,
};
use thiserror::Error;

use crate::{
  history::History,
  position::{
    Position,
    char_idx_at_pos,
    pos_at_char_idx,
  },
  selection::Range,
  transaction::{
    EditError,
    EditScope,
  },
};

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
  #[error("line {line} is out of range (document has {len_lines} lines)")]
  LineOutOfRange { line: usize, len_lines: usize },
  #[error(transparent)]
  Edit(#[from] EditError),
}

#[derive(Debug)]
pub struct Document {
  text:      Rope,
  selection: Range,
  history:   History,
  modified:  bool,
  revision:  u64,
}

impl Default for Document {
  fn default() -> Self {
    Self::new(Rope::new())
  }
}

impl From<&str> for Document {
  fn from(text: &str) -> Self {
    Self::new(Rope::from(text))
  }
}

impl Document {
  pub fn new(text: Rope) -> Self {
    Self {
      text,
      selection: Range::point(0),
      history: History::default(),
      modified: false,
      revision: 0,
    }
  }

  #[inline]
  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn len_chars(&self) -> usize {
    self.text.len_chars()
  }

  pub fn len_lines(&self) -> usize {
    self.text.len_lines()
  }

  /// The content of `line` without its terminator.
  pub fn line(&self, line: usize) -> Option<RopeSlice<'_>> {
    (line < self.text.len_lines()).then(|| line_without_line_ending(&self.text.slice(..), line))
  }

  /// Owned copy of a line's content; empty for lines past the end.
  pub fn line_text(&self, line: usize) -> String {
    self.line(line).map(String::from).unwrap_or_default()
  }

  pub fn line_len(&self, line: usize) -> usize {
    self.line(line).map_or(0, |slice| slice.len_chars())
  }

  pub fn line_start(&self, line: usize) -> usize {
    self
      .text
      .line_to_char(line.min(self.text.len_lines().saturating_sub(1)))
  }

  // Cursor and selection.

  /// The raw range, which is a point when nothing is selected.
  #[inline]
  pub fn range(&self) -> Range {
    self.selection
  }

  pub fn selection(&self) -> Option<Range> {
    (!self.selection.is_empty()).then_some(self.selection)
  }

  pub fn has_selection(&self) -> bool {
    !self.selection.is_empty()
  }

  #[inline]
  pub fn cursor_offset(&self) -> usize {
    self.selection.head
  }

  pub fn cursor(&self) -> Position {
    pos_at_char_idx(self.text.slice(..), self.selection.head)
  }

  pub fn current_line(&self) -> usize {
    self.cursor().row
  }

  pub fn offset_to_pos(&self, offset: usize) -> Position {
    pos_at_char_idx(self.text.slice(..), offset)
  }

  pub fn pos_to_offset(&self, pos: Position) -> usize {
    char_idx_at_pos(self.text.slice(..), pos)
  }

  /// Moves the cursor, dropping any selection. Out-of-range positions are
  /// clamped onto the nearest valid one.
  pub fn set_cursor(&mut self, pos: Position) {
    self.selection = Range::point(self.pos_to_offset(pos));
  }

  pub fn set_cursor_offset(&mut self, offset: usize) {
    let pos = self.offset_to_pos(offset);
    self.set_cursor(pos);
  }

  /// Selects from `anchor` to `head` (char offsets, clamped).
  pub fn select(&mut self, anchor: usize, head: usize) {
    let text = self.text.slice(..);
    let anchor = char_idx_at_pos(text, pos_at_char_idx(text, anchor));
    let head = char_idx_at_pos(text, pos_at_char_idx(text, head));
    self.selection = Range::new(anchor, head);
  }

  pub fn clear_selection(&mut self) {
    self.selection = Range::point(self.selection.head);
  }

  pub fn selected_text(&self) -> String {
    self.selection.fragment(self.text.slice(..))
  }

  /// First and last line of the selection (or the cursor line twice).
  pub fn selected_lines(&self) -> (usize, usize) {
    self.selection.line_range(self.text.slice(..))
  }

  /// Moves the cursor to the start of `line`, counted from 1.
  pub fn go_to_line(&mut self, line: usize) -> Result<()> {
    let len_lines = self.len_lines();
    if line == 0 || line > len_lines {
      return Err(DocumentError::LineOutOfRange { line, len_lines });
    }
    self.set_cursor(Position::new(line - 1, 0));
    Ok(())
  }

  // Mutation.

  /// Runs `f` as one edit block. Either every primitive edit lands and the
  /// block is committed to the undo history, or the text and selection are
  /// restored and the error is returned.
  pub fn transact<T>(
    &mut self,
    f: impl FnOnce(&mut EditScope<'_>) -> std::result::Result<T, EditError>,
  ) -> std::result::Result<T, EditError> {
    let mut scope = EditScope::new(&mut self.text, &mut self.selection);
    match f(&mut scope) {
      Ok(value) => {
        let block = scope.finish();
        if !block.is_empty() {
          tracing::trace!(ops = block.len(), "committing edit block");
          self.history.commit(block);
          self.touch();
        }
        Ok(value)
      },
      Err(err) => {
        scope.abort();
        Err(err)
      },
    }
  }

  /// Removes the selection (if any) and inserts `replacement` in its place.
  pub fn replace_selection(&mut self, replacement: &str) -> Result<()> {
    self.transact(|scope| {
      scope.delete_selection()?;
      let at = scope.cursor();
      scope.insert(at, replacement)
    })?;
    Ok(())
  }

  /// Reverts the most recent edit block. Returns false if there was none.
  pub fn undo(&mut self) -> Result<bool> {
    let Some(block) = self.history.next_undo() else {
      return Ok(false);
    };
    block.revert(&mut self.text)?;
    self.selection = block.selection_before();
    self.history.undo_applied();
    self.touch();
    Ok(true)
  }

  /// Re-applies the most recently undone edit block.
  pub fn redo(&mut self) -> Result<bool> {
    let Some(block) = self.history.next_redo() else {
      return Ok(false);
    };
    block.apply(&mut self.text)?;
    self.selection = block.selection_after();
    self.history.redo_applied();
    self.touch();
    Ok(true)
  }

  fn touch(&mut self) {
    self.modified = true;
    self.revision = self.revision.wrapping_add(1);
  }

  // Bookkeeping.

  pub fn is_modified(&self) -> bool {
    self.modified
  }

  /// Called by the host after the text was persisted.
  pub fn mark_saved(&mut self) {
    self.modified = false;
  }

  /// Incremented on every text change, including undo and redo.
  pub fn revision(&self) -> u64 {
    self.revision
  }

  pub fn history(&self) -> &History {
    &self.history
  }

  /// The dominant line terminator, or the platform default for text without
  /// any line break.
  pub fn line_ending(&self) -> LineEnding {
    detect_line_ending(self.text.chars()).unwrap_or(NATIVE_LINE_ENDING)
  }
}
