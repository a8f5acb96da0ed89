//! Highlight marks and the highlighter seam.
//!
//! Marks are registered from outside (typically from a linter run) and keyed
//! by line index. They are not moved when lines are inserted or removed;
//! instead [`HighlightRegistry::sync_line_count`] drops every mark as soon as
//! the document's line count differs from the one the marks were registered
//! against.

use std::collections::{
  BTreeMap,
  BTreeSet,
};

use ropey::Rope;
use serde::{
  Deserialize,
  Serialize,
};

use crate::position::Position;

/// Raw length value meaning "until the end of the line".
pub const TO_END_OF_LINE: isize = -1;

pub const PYTHON_KEYWORDS: &[&str] = &[
  "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
  "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in",
  "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with",
  "yield",
];

pub const DEFAULT_COLORS: &[(&str, &str)] = &[
  ("keyword", "#0000ff"),
  ("builtin", "#008080"),
  ("string", "#008000"),
  ("comment", "#808080"),
  ("number", "#ff8000"),
  ("definition", "#000080"),
  ("error-marker", "#ff0000"),
  ("warning-marker", "#ffa500"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
  Error,
  Warning,
  Information,
  Hint,
}

impl MarkerKind {
  pub fn from_code(code: u8) -> Option<Self> {
    match code {
      1 => Some(Self::Error),
      2 => Some(Self::Warning),
      3 => Some(Self::Information),
      4 => Some(Self::Hint),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkLength {
  ToEndOfLine,
  Chars(usize),
}

impl MarkLength {
  /// Decodes the raw form where `-1` stands for the rest of the line. Other
  /// negative values are rejected.
  pub fn from_raw(length: isize) -> Option<Self> {
    match length {
      TO_END_OF_LINE => Some(Self::ToEndOfLine),
      len => usize::try_from(len).ok().map(Self::Chars),
    }
  }

  /// Exclusive end column for a mark starting at `start` on a line holding
  /// `line_len` chars.
  pub fn end(self, start: usize, line_len: usize) -> usize {
    match self {
      Self::ToEndOfLine => line_len,
      Self::Chars(len) => start.saturating_add(len),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightMark {
  pub line:   usize,
  pub start:  usize,
  pub length: MarkLength,
  pub kind:   MarkerKind,
  pub hint:   String,
}

impl HighlightMark {
  pub fn contains(&self, col: usize, line_len: usize) -> bool {
    self.start <= col && col < self.length.end(self.start, line_len)
  }
}

/// Tooltip state derived from a hover query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tooltip {
  pub text:     String,
  pub visible:  bool,
  pub position: Option<Position>,
}

impl Tooltip {
  pub fn hidden() -> Self {
    Self::default()
  }
}

#[derive(Debug, Clone, Default)]
pub struct HighlightRegistry {
  marks:      BTreeMap<usize, Vec<HighlightMark>>,
  line_count: usize,
}

impl HighlightRegistry {
  pub fn new(line_count: usize) -> Self {
    Self {
      marks: BTreeMap::new(),
      line_count,
    }
  }

  /// Appends a mark to its line, after any marks already there.
  pub fn register(&mut self, mark: HighlightMark) {
    self.marks.entry(mark.line).or_default().push(mark);
  }

  /// Registers a mark given the raw length encoding. Returns `false` and
  /// stores nothing for an invalid length.
  pub fn register_raw(
    &mut self,
    line: usize,
    start: usize,
    length: isize,
    kind: MarkerKind,
    hint: impl Into<String>,
  ) -> bool {
    let Some(length) = MarkLength::from_raw(length) else {
      tracing::debug!(line, start, length, "rejected highlight mark with invalid length");
      return false;
    };
    self.register(HighlightMark {
      line,
      start,
      length,
      kind,
      hint: hint.into(),
    });
    true
  }

  pub fn clear(&mut self) {
    self.marks.clear();
  }

  pub fn is_empty(&self) -> bool {
    self.marks.is_empty()
  }

  pub fn len(&self) -> usize {
    self.marks.values().map(Vec::len).sum()
  }

  pub fn marks_on(&self, line: usize) -> &[HighlightMark] {
    self.marks.get(&line).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn iter(&self) -> impl Iterator<Item = &HighlightMark> {
    self.marks.values().flatten()
  }

  /// First mark on `line` covering `col`, in registration order.
  pub fn mark_at(&self, line: usize, col: usize, line_len: usize) -> Option<&HighlightMark> {
    self
      .marks_on(line)
      .iter()
      .find(|mark| mark.contains(col, line_len))
  }

  pub fn tooltip(&self, pos: Position, line_len: usize) -> Tooltip {
    match self.mark_at(pos.row, pos.col, line_len) {
      Some(mark) => {
        Tooltip {
          text:     mark.hint.trim().to_owned(),
          visible:  true,
          position: Some(pos),
        }
      },
      None => Tooltip::hidden(),
    }
  }

  /// Records the document's current line count. If it changed, every mark
  /// is dropped since their line keys no longer mean anything. Returns
  /// whether marks were dropped.
  pub fn sync_line_count(&mut self, line_count: usize) -> bool {
    if line_count == self.line_count {
      return false;
    }
    self.line_count = line_count;
    if self.marks.is_empty() {
      return false;
    }
    tracing::debug!(line_count, marks = self.len(), "line count changed, dropping marks");
    self.marks.clear();
    true
  }
}

/// Keyword set and token colors of a highlighter.
///
/// Owned by whoever constructs the highlighter; reloading a color scheme
/// builds a new value instead of mutating a shared one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HighlightConfig {
  pub keywords: BTreeSet<String>,
  pub colors:   BTreeMap<String, String>,
}

impl Default for HighlightConfig {
  fn default() -> Self {
    Self {
      keywords: PYTHON_KEYWORDS.iter().map(|kw| (*kw).to_owned()).collect(),
      colors:   DEFAULT_COLORS
        .iter()
        .map(|(token, color)| ((*token).to_owned(), (*color).to_owned()))
        .collect(),
    }
  }
}

impl HighlightConfig {
  pub fn is_keyword(&self, word: &str) -> bool {
    self.keywords.contains(word)
  }

  pub fn color(&self, token: &str) -> Option<&str> {
    self.colors.get(token).map(String::as_str)
  }

  /// A copy of this config with `scheme` layered over the token colors.
  #[must_use]
  pub fn with_color_scheme<K, V>(&self, scheme: impl IntoIterator<Item = (K, V)>) -> Self
  where
    K: Into<String>,
    V: Into<String>,
  {
    let mut next = self.clone();
    next
      .colors
      .extend(scheme.into_iter().map(|(token, color)| (token.into(), color.into())));
    next
  }
}

/// The token-coloring collaborator.
///
/// How text is classified is up to the implementation; the editor only needs
/// the keyword set and a way to trigger a full pass.
pub trait Highlighter {
  fn config(&self) -> &HighlightConfig;

  fn set_config(&mut self, config: HighlightConfig);

  /// Recolors the whole buffer, overlaying `marks`.
  fn rehighlight(&mut self, text: &Rope, marks: &HighlightRegistry);

  fn is_keyword(&self, word: &str) -> bool {
    self.config().is_keyword(word)
  }
}

/// A highlighter that classifies nothing. It keeps its configuration and
/// counts passes, which is all a headless editor needs.
#[derive(Debug, Clone, Default)]
pub struct PlainHighlighter {
  config: HighlightConfig,
  passes: usize,
}

impl PlainHighlighter {
  pub fn new(config: HighlightConfig) -> Self {
    Self { config, passes: 0 }
  }

  pub fn passes(&self) -> usize {
    self.passes
  }
}

impl Highlighter for PlainHighlighter {
  fn config(&self) -> &HighlightConfig {
    &self.config
  }

  fn set_config(&mut self, config: HighlightConfig) {
    self.config = config;
  }

  fn rehighlight(&mut self, text: &Rope, marks: &HighlightRegistry) {
    self.passes += 1;
    tracing::trace!(
      chars = text.len_chars(),
      marks = marks.len(),
      pass = self.passes,
      "rehighlight"
    );
  }
}
