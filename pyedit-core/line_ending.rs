use ropey::RopeSlice;

#[cfg(target_os = "windows")]
pub const NATIVE_LINE_ENDING: LineEnding = LineEnding::Crlf;

#[cfg(not(target_os = "windows"))]
pub const NATIVE_LINE_ENDING: LineEnding = LineEnding::LF;

/// Line terminators recognized by the buffer. Ropey is built with only
/// `cr_lines`, so these are exactly the breaks it splits lines on. Form feed,
/// NEL and the Unicode separators stay part of the line's content.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum LineEnding {
  /// CarriageReturn followed by LineFeed.
  Crlf,

  /// U+000A -- LineFeed
  LF,

  /// U+000D -- CarriageReturn
  CR,
}

impl LineEnding {
  #[inline]
  pub const fn len_chars(&self) -> usize {
    match self {
      Self::Crlf => 2,
      _ => 1,
    }
  }

  #[inline]
  pub const fn as_str(&self) -> &'static str {
    match self {
      Self::Crlf => "\u{000D}\u{000A}",
      Self::LF => "\u{000A}",
      Self::CR => "\u{000D}",
    }
  }

  #[inline]
  pub const fn from_char(ch: char) -> Option<LineEnding> {
    match ch {
      '\u{000A}' => Some(LineEnding::LF),
      '\u{000D}' => Some(LineEnding::CR),
      _ => None,
    }
  }

  /// Tie-break rank when two terminators are equally frequent.
  const fn rank(&self) -> u8 {
    match self {
      Self::Crlf => 2,
      Self::CR => 1,
      Self::LF => 0,
    }
  }
}

/// Returns the passed line's line ending, if any.
pub fn get_line_ending(line: &RopeSlice) -> Option<LineEnding> {
  let len = line.len_chars();
  let last = line.get_char(len.checked_sub(1)?)?;
  match last {
    '\u{000A}' if len >= 2 && line.get_char(len - 2) == Some('\u{000D}') => Some(LineEnding::Crlf),
    ch => LineEnding::from_char(ch),
  }
}

/// Returns the char index of the end of the given line, not including its line
/// ending.
pub fn line_end_char_index(slice: &RopeSlice, line: usize) -> usize {
  slice.line_to_char(line + 1)
    - get_line_ending(&slice.line(line))
      .map(|le| le.len_chars())
      .unwrap_or(0)
}

/// Get line `line_idx` from the passed rope slice, sans any line ending.
pub fn line_without_line_ending<'a>(slice: &RopeSlice<'a>, line_idx: usize) -> RopeSlice<'a> {
  let start = slice.line_to_char(line_idx);
  let end = line_end_char_index(slice, line_idx);
  slice.slice(start..end)
}

/// Reports the most frequent line terminator in a stream of chars, such as
/// `str::chars` or a rope's `chars()`.
///
/// Equal counts prefer CRLF, then CR, then LF. Returns `None` when the text
/// holds no terminator at all; callers fall back to [`NATIVE_LINE_ENDING`].
pub fn detect_line_ending(chars: impl IntoIterator<Item = char>) -> Option<LineEnding> {
  let (mut crlf, mut lf, mut cr) = (0usize, 0usize, 0usize);
  let mut chars = chars.into_iter().peekable();
  while let Some(ch) = chars.next() {
    match ch {
      '\r' if chars.peek() == Some(&'\n') => {
        chars.next();
        crlf += 1;
      },
      '\r' => cr += 1,
      '\n' => lf += 1,
      _ => {},
    }
  }

  [
    (crlf, LineEnding::Crlf),
    (cr, LineEnding::CR),
    (lf, LineEnding::LF),
  ]
  .into_iter()
  .filter(|(count, _)| *count > 0)
  .max_by_key(|(count, ending)| (*count, ending.rank()))
  .map(|(_, ending)| ending)
}
