//! Automatic bracket pairing.
//!
//! Typing an opening bracket with nothing selected inserts the whole pair in
//! one edit block and leaves the cursor between the two halves:
//!
//! ```text
//! foo|     type `(`     foo(|)
//! ```
//!
//! The set of pairs is configurable; [`DEFAULT_PAIRS`] covers the three
//! bracket kinds. Only single-character openers are triggered by a key press.

use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  Tendril,
  document::Document,
  selection::Range,
  transaction::Result,
};

pub const DEFAULT_PAIRS: &[(&str, &str)] = &[("(", ")"), ("[", "]"), ("{", "}")];

/// Represents the config for a particular pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
  pub open:  Tendril,
  pub close: Tendril,
}

impl Pair {
  pub fn open_len(&self) -> usize {
    self.open.chars().count()
  }

  /// The key that triggers this pair, if the opener is a single char.
  pub fn trigger(&self) -> Option<char> {
    let mut chars = self.open.chars();
    let ch = chars.next()?;
    chars.next().is_none().then_some(ch)
  }
}

impl From<(&str, &str)> for Pair {
  fn from((open, close): (&str, &str)) -> Self {
    Self {
      open:  Tendril::from(open),
      close: Tendril::from(close),
    }
  }
}

impl From<(String, String)> for Pair {
  fn from((open, close): (String, String)) -> Self {
    Self::from((open.as_str(), close.as_str()))
  }
}

/// The collection of auto pairs, kept in configuration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct AutoPairs(Vec<Pair>);

impl AutoPairs {
  pub fn new<V, A>(pairs: V) -> Self
  where
    V: IntoIterator<Item = A>,
    A: Into<Pair>,
  {
    Self(pairs.into_iter().map(Into::into).collect())
  }

  pub fn pairs(&self) -> &[Pair] {
    &self.0
  }

  /// The first pair opened by `ch`.
  pub fn get(&self, ch: char) -> Option<&Pair> {
    self.0.iter().find(|pair| pair.trigger() == Some(ch))
  }
}

impl Default for AutoPairs {
  fn default() -> Self {
    AutoPairs::new(DEFAULT_PAIRS.iter().copied())
  }
}

impl From<Vec<(String, String)>> for AutoPairs {
  fn from(pairs: Vec<(String, String)>) -> Self {
    Self::new(pairs)
  }
}

impl From<AutoPairs> for Vec<(String, String)> {
  fn from(pairs: AutoPairs) -> Self {
    pairs
      .0
      .into_iter()
      .map(|pair| (pair.open.to_string(), pair.close.to_string()))
      .collect()
  }
}

/// Insert hook for a typed char. Returns `false` if `ch` opens no pair or a
/// selection is active, in which case the caller inserts `ch` as usual.
pub fn hook(doc: &mut Document, ch: char, pairs: &AutoPairs) -> Result<bool> {
  if doc.has_selection() {
    return Ok(false);
  }
  let Some(pair) = pairs.get(ch) else {
    return Ok(false);
  };
  tracing::trace!(open = %pair.open, close = %pair.close, "auto pair");

  let inserted = format!("{}{}", pair.open, pair.close);
  let open_len = pair.open_len();
  doc.transact(|scope| {
    let at = scope.cursor();
    scope.insert(at, &inserted)?;
    scope.set_selection(Range::point(at + open_len));
    Ok(())
  })?;
  Ok(true)
}
