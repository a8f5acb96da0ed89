use crate::transaction::EditBlock;

/// Default number of edit blocks kept for undo.
pub const DEFAULT_UNDO_LIMIT: usize = 1000;

/// Linear undo/redo stacks of [`EditBlock`]s.
///
/// Committing a new block discards the redo stack. The history only stores
/// blocks; applying them to a document is the caller's job, and a block is
/// moved to the opposite stack only after the caller reports success via
/// [`History::undo_applied`] / [`History::redo_applied`]. That keeps the
/// stacks in sync with the text even if applying fails.
#[derive(Debug)]
pub struct History {
  undo:  Vec<EditBlock>,
  redo:  Vec<EditBlock>,
  limit: usize,
}

impl Default for History {
  fn default() -> Self {
    Self::with_limit(DEFAULT_UNDO_LIMIT)
  }
}

impl History {
  pub fn with_limit(limit: usize) -> Self {
    Self {
      undo:  Vec::new(),
      redo:  Vec::new(),
      limit: limit.max(1),
    }
  }

  pub fn commit(&mut self, block: EditBlock) {
    if block.is_empty() {
      return;
    }
    self.redo.clear();
    self.undo.push(block);
    if self.undo.len() > self.limit {
      let excess = self.undo.len() - self.limit;
      self.undo.drain(..excess);
    }
  }

  pub fn can_undo(&self) -> bool {
    !self.undo.is_empty()
  }

  pub fn can_redo(&self) -> bool {
    !self.redo.is_empty()
  }

  /// The block the next undo would revert.
  pub fn next_undo(&self) -> Option<&EditBlock> {
    self.undo.last()
  }

  /// The block the next redo would re-apply.
  pub fn next_redo(&self) -> Option<&EditBlock> {
    self.redo.last()
  }

  pub fn undo_applied(&mut self) {
    if let Some(block) = self.undo.pop() {
      self.redo.push(block);
    }
  }

  pub fn redo_applied(&mut self) {
    if let Some(block) = self.redo.pop() {
      self.undo.push(block);
    }
  }

  pub fn undo_len(&self) -> usize {
    self.undo.len()
  }
}
