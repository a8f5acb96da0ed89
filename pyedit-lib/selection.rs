//! Cursor and selection state.
//!
//! A [`Range`] has two char offsets: `anchor` and `head`. The `head` is where
//! the cursor is drawn; the anchor is the other end of the selection. When
//! both are equal the range is a plain cursor and the document has no
//! selection.
//!
//! ```text
//! anchor=2, head=7: "he[llo w]orld"  (forward selection)
//! anchor=7, head=2: "he]llo w[orld"  (backward selection)
//! anchor=5, head=5: "hello|world"    (cursor only)
//! ```

use ropey::RopeSlice;

use crate::transaction::{
  Assoc,
  Operation,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
  pub anchor: usize,
  pub head:   usize,
}

impl Range {
  pub fn new(anchor: usize, head: usize) -> Self {
    Self { anchor, head }
  }

  #[inline]
  pub fn point(head: usize) -> Self {
    Self::new(head, head)
  }

  /// Start of the range
  #[inline]
  #[must_use]
  pub fn from(&self) -> usize {
    std::cmp::min(self.anchor, self.head)
  }

  /// End of the range
  #[inline]
  #[must_use]
  pub fn to(&self) -> usize {
    std::cmp::max(self.anchor, self.head)
  }

  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.to() - self.from()
  }

  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.anchor == self.head
  }

  /// First and last line touched by the range, both inclusive. A selection
  /// that ends at column 0 of a line still touches that line.
  #[inline]
  #[must_use]
  pub fn line_range(&self, slice: RopeSlice) -> (usize, usize) {
    let len = slice.len_chars();
    (
      slice.char_to_line(self.from().min(len)),
      slice.char_to_line(self.to().min(len)),
    )
  }

  /// Maps both ends through a primitive edit.
  #[must_use]
  pub fn map(self, op: &Operation) -> Self {
    Self {
      anchor: op.map_pos(self.anchor, Assoc::After),
      head:   op.map_pos(self.head, Assoc::After),
    }
  }

  pub fn fragment(&self, text: RopeSlice) -> String {
    let len = text.len_chars();
    text.slice(self.from().min(len)..self.to().min(len)).to_string()
  }
}

impl From<(usize, usize)> for Range {
  fn from((anchor, head): (usize, usize)) -> Self {
    Self { anchor, head }
  }
}

#[cfg(test)]
mod test {
  use ropey::Rope;

  use super::*;

  #[test]
  fn test_new_range() {
    let range = Range::new(7, 2);
    assert_eq!(range.from(), 2);
    assert_eq!(range.to(), 7);
    assert_eq!(range.len(), 5);
    assert!(Range::point(3).is_empty());
  }

  #[test]
  fn test_line_range() {
    let doc = Rope::from("ab\ncd\nef");
    let text = doc.slice(..);
    assert_eq!(Range::point(4).line_range(text), (1, 1));
    assert_eq!(Range::new(1, 6).line_range(text), (0, 2));
    assert_eq!(Range::new(8, 0).line_range(text), (0, 2));
    assert_eq!(Range::new(0, 99).line_range(text), (0, 2));
  }

  #[test]
  fn test_map_through_insert() {
    let op = Operation::Insert {
      at:   3,
      text: "xx".into(),
    };
    assert_eq!(Range::new(1, 3).map(&op), Range::new(1, 5));
    assert_eq!(Range::point(2).map(&op), Range::point(2));
  }

  #[test]
  fn test_fragment() {
    let doc = Rope::from("hello world");
    assert_eq!(Range::new(11, 6).fragment(doc.slice(..)), "world");
  }
}
