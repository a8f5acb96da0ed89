//! Character classes used by the cursor scanners.
//!
//! There are two separator sets: the hint separators decide
//! where the identifier currently being typed begins, while the word
//! separators bound the word under an arbitrary column. They overlap but are
//! not identical (quotes only break words, `?` only breaks hints).

/// Punctuation that terminates the identifier left of the cursor.
pub const HINT_SEPARATORS: &[char] = &[
  '.', ':', ';', ',', '?', '!', '+', '-', '=', '*', '\\', '/', '(', ')', '[', ']', '{', '}',
];

/// Characters that bound a word when scanning outward from a column.
pub const WORD_SEPARATORS: &[char] = &[
  ' ', '\n', ',', '(', ')', '[', ']', '{', '}', '\'', '"', ';', ':', '\t', '!', '+', '-', '*',
  '/', '\\', '=', '.',
];

/// Whitespace or one of [`HINT_SEPARATORS`].
#[inline]
pub fn char_is_hint_separator(ch: char) -> bool {
  ch.is_whitespace() || HINT_SEPARATORS.contains(&ch)
}

#[inline]
pub fn char_is_word_separator(ch: char) -> bool {
  WORD_SEPARATORS.contains(&ch)
}
