//! Primitive mutations and edit blocks.
//!
//! An [`Operation`] is a single insert or delete at an absolute char offset.
//! Deletions keep the removed text so every operation can be inverted without
//! consulting the document again.
//!
//! An [`EditBlock`] is the undo unit: the ordered list of operations one
//! editing command performed, plus the selection before and after it.
//! Undoing a block reverts its operations in reverse order and restores the
//! earlier selection; redoing re-applies them and restores the later one.
//!
//! Blocks are never built by hand outside this crate. They are recorded by
//! [`EditScope`], which applies each primitive immediately (so later steps of
//! an algorithm observe earlier ones, like a cursor walking a live buffer)
//! and maps the selection through it.
//!
//! ```ignore
//! doc.transact(|scope| {
//!   let at = scope.cursor();
//!   scope.insert(at, "()")?;
//!   scope.set_selection(Range::point(at + 1));
//!   Ok(())
//! })?;
//! ```

use ropey::Rope;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
  Tendril,
  selection::Range,
};

pub type Result<T> = std::result::Result<T, EditError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditError {
  #[error("invalid edit range: start {from} is after end {to}")]
  InvalidRange { from: usize, to: usize },
  #[error("edit range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
}

/// How a position at the exact insertion point is mapped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  /// Stay in front of the inserted text.
  Before,
  /// Move behind the inserted text.
  After,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
  Insert { at: usize, text: Tendril },
  /// `text` is what was removed starting at `at`.
  Delete { at: usize, text: Tendril },
}

impl Operation {
  fn text_len(text: &Tendril) -> usize {
    text.chars().count()
  }

  pub fn at(&self) -> usize {
    match self {
      Operation::Insert { at, .. } | Operation::Delete { at, .. } => *at,
    }
  }

  pub fn len_chars(&self) -> usize {
    match self {
      Operation::Insert { text, .. } | Operation::Delete { text, .. } => Self::text_len(text),
    }
  }

  pub fn invert(&self) -> Operation {
    match self.clone() {
      Operation::Insert { at, text } => Operation::Delete { at, text },
      Operation::Delete { at, text } => Operation::Insert { at, text },
    }
  }

  /// Applies the operation, checking bounds first so a failure leaves the
  /// rope untouched.
  pub fn apply(&self, doc: &mut Rope) -> Result<()> {
    let len = doc.len_chars();
    match self {
      Operation::Insert { at, text } => {
        if *at > len {
          return Err(EditError::RangeOutOfBounds {
            from: *at,
            to: *at,
            len,
          });
        }
        doc.insert(*at, text);
      },
      Operation::Delete { at, .. } => {
        let to = at + self.len_chars();
        if to > len {
          return Err(EditError::RangeOutOfBounds { from: *at, to, len });
        }
        doc.remove(*at..to);
      },
    }
    Ok(())
  }

  /// Maps a position in the document before this operation to the matching
  /// position after it.
  pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
    match self {
      Operation::Insert { at, .. } => {
        let len = self.len_chars();
        if pos > *at || (pos == *at && assoc == Assoc::After) {
          pos + len
        } else {
          pos
        }
      },
      Operation::Delete { at, .. } => {
        let to = at + self.len_chars();
        if pos >= to {
          pos - self.len_chars()
        } else if pos > *at {
          *at
        } else {
          pos
        }
      },
    }
  }
}

/// One undoable unit of editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBlock {
  ops:              SmallVec<[Operation; 4]>,
  selection_before: Range,
  selection_after:  Range,
}

impl EditBlock {
  pub fn ops(&self) -> &[Operation] {
    &self.ops
  }

  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }

  pub fn len(&self) -> usize {
    self.ops.len()
  }

  pub fn selection_before(&self) -> Range {
    self.selection_before
  }

  pub fn selection_after(&self) -> Range {
    self.selection_after
  }

  /// Re-applies the block to the state it was recorded against.
  pub fn apply(&self, doc: &mut Rope) -> Result<()> {
    for (idx, op) in self.ops.iter().enumerate() {
      if let Err(err) = op.apply(doc) {
        rollback(doc, &self.ops[..idx]);
        return Err(err);
      }
    }
    Ok(())
  }

  /// Reverts the block from the state it produced.
  pub fn revert(&self, doc: &mut Rope) -> Result<()> {
    let inverted: SmallVec<[Operation; 4]> = self.ops.iter().rev().map(Operation::invert).collect();
    for (idx, op) in inverted.iter().enumerate() {
      if let Err(err) = op.apply(doc) {
        rollback(doc, &inverted[..idx]);
        return Err(err);
      }
    }
    Ok(())
  }
}

/// Undo already-applied operations, newest first.
fn rollback(doc: &mut Rope, applied: &[Operation]) {
  for op in applied.iter().rev() {
    if let Err(err) = op.invert().apply(doc) {
      tracing::warn!("failed to roll back {op:?}: {err}");
    }
  }
}

/// Records primitive edits for one [`EditBlock`] while applying them.
///
/// Every operation is applied immediately and the selection is mapped
/// through it (insertions at a selection endpoint push that endpoint
/// forward, as a text cursor does when typing).
pub struct EditScope<'a> {
  text:      &'a mut Rope,
  selection: &'a mut Range,
  before:    Range,
  ops:       SmallVec<[Operation; 4]>,
}

impl<'a> EditScope<'a> {
  pub(crate) fn new(text: &'a mut Rope, selection: &'a mut Range) -> Self {
    let before = *selection;
    Self {
      text,
      selection,
      before,
      ops: SmallVec::new(),
    }
  }

  pub fn text(&self) -> &Rope {
    self.text
  }

  pub fn selection(&self) -> Range {
    *self.selection
  }

  pub fn cursor(&self) -> usize {
    self.selection.head
  }

  /// Replaces the selection, clamping both ends to the document.
  pub fn set_selection(&mut self, range: Range) {
    let len = self.text.len_chars();
    *self.selection = Range::new(range.anchor.min(len), range.head.min(len));
  }

  pub fn insert(&mut self, at: usize, text: &str) -> Result<()> {
    if text.is_empty() {
      return Ok(());
    }
    self.push(Operation::Insert {
      at,
      text: Tendril::from(text),
    })
  }

  pub fn delete(&mut self, from: usize, to: usize) -> Result<()> {
    if from > to {
      return Err(EditError::InvalidRange { from, to });
    }
    let len = self.text.len_chars();
    if to > len {
      return Err(EditError::RangeOutOfBounds { from, to, len });
    }
    if from == to {
      return Ok(());
    }
    let removed = Tendril::from(self.text.slice(from..to).to_string());
    self.push(Operation::Delete {
      at:   from,
      text: removed,
    })
  }

  /// Deletes the selected text, if any. Returns whether anything was removed.
  pub fn delete_selection(&mut self) -> Result<bool> {
    let range = *self.selection;
    if range.is_empty() {
      return Ok(false);
    }
    self.delete(range.from(), range.to())?;
    Ok(true)
  }

  fn push(&mut self, op: Operation) -> Result<()> {
    op.apply(self.text)?;
    *self.selection = self.selection.map(&op);
    self.ops.push(op);
    Ok(())
  }

  /// Undoes everything recorded so far and restores the initial selection.
  pub(crate) fn abort(self) {
    rollback(self.text, &self.ops);
    *self.selection = self.before;
  }

  pub(crate) fn finish(self) -> EditBlock {
    EditBlock {
      ops:              self.ops,
      selection_before: self.before,
      selection_after:  *self.selection,
    }
  }
}
