//! Structural indentation driven by key presses.
//!
//! Indentation is always spaces. Every operation here that changes text does
//! so inside a single [`Document::transact`] call, so one key press is one
//! undo step.

use pyedit_core::line_ending::{
  get_line_ending,
  line_end_char_index,
};

use crate::{
  document::Document,
  scanner,
  selection::Range,
  transaction::{
    EditScope,
    Result,
  },
};

/// What a tab press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabOutcome {
  /// Every selected line was indented.
  Indented,
  /// Literal spaces were inserted at the cursor.
  InsertedSpaces,
  /// Nothing was inserted; the cursor sits on something completable.
  RequestCompletion,
}

/// Splits a line into its trimmed content and the width of its leading
/// whitespace. Tabs count as `tab_width` columns.
pub fn split_indent(line: &str, tab_width: usize) -> (&str, usize) {
  let indent = line
    .chars()
    .take_while(|ch| ch.is_whitespace())
    .map(|ch| if ch == '\t' { tab_width } else { 1 })
    .sum();
  (line.trim(), indent)
}

/// Indent width for a line following `line`.
pub fn newline_indent(line: &str, width: usize) -> usize {
  let (content, indent) = split_indent(line, width);
  if content.ends_with(':') {
    indent + width
  } else {
    indent
  }
}

/// Breaks the line at the cursor and indents the new line.
///
/// Only applies when the cursor sits at the end of its line with nothing
/// selected; returns `false` otherwise and leaves the document untouched so
/// the caller can fall back to a plain line break.
pub fn insert_newline(doc: &mut Document, width: usize) -> Result<bool> {
  if doc.has_selection() {
    return Ok(false);
  }
  let cursor = doc.cursor();
  if cursor.col != doc.line_len(cursor.row) {
    return Ok(false);
  }

  let line = doc.line_text(cursor.row);
  let ending = get_line_ending(&doc.text().line(cursor.row)).unwrap_or_else(|| doc.line_ending());
  let indent = newline_indent(&line, width.max(1));
  let insert = format!("{}{}", ending.as_str(), " ".repeat(indent));
  tracing::trace!(indent, "newline");

  doc.transact(|scope| {
    let at = scope.cursor();
    scope.insert(at, &insert)
  })?;
  Ok(true)
}

/// Tab key: indent a selection, ask for completion after a partial token, or
/// insert `width` spaces.
pub fn on_tab(doc: &mut Document, width: usize, comment_token: &str) -> Result<TabOutcome> {
  if indent_selection(doc, width)? {
    return Ok(TabOutcome::Indented);
  }

  let hint = scanner::current_hint(doc, comment_token);
  if scanner::wants_completion(&hint, &scanner::nearby_text(doc)) {
    return Ok(TabOutcome::RequestCompletion);
  }

  let spaces = " ".repeat(width.max(1));
  doc.transact(|scope| {
    let at = scope.cursor();
    scope.insert(at, &spaces)
  })?;
  Ok(TabOutcome::InsertedSpaces)
}

/// Back-tab key: unindent a selection or dedent the cursor line.
pub fn on_back_tab(doc: &mut Document, width: usize) -> Result<bool> {
  if doc.has_selection() {
    unindent_selection(doc, width)
  } else {
    dedent_line(doc, width)
  }
}

/// Prepends `width` spaces to every line the selection touches, then selects
/// those lines in full. Returns `false` without a selection.
pub fn indent_selection(doc: &mut Document, width: usize) -> Result<bool> {
  if !doc.has_selection() {
    return Ok(false);
  }
  let (first, last) = doc.selected_lines();
  let indent = " ".repeat(width.max(1));

  doc.transact(|scope| {
    // Bottom-up so earlier line starts stay valid.
    for line in (first..=last).rev() {
      let at = scope.text().line_to_char(line);
      scope.insert(at, &indent)?;
    }
    select_lines(scope, first, last);
    Ok(())
  })?;
  Ok(true)
}

/// Removes one full indent level from every selected line that starts with
/// one. Shorter or non-space indents are left alone.
pub fn unindent_selection(doc: &mut Document, width: usize) -> Result<bool> {
  if !doc.has_selection() {
    return Ok(false);
  }
  let (first, last) = doc.selected_lines();
  let width = width.max(1);

  doc.transact(|scope| {
    for line in (first..=last).rev() {
      let at = scope.text().line_to_char(line);
      if leading_spaces(scope, line, width) == width {
        scope.delete(at, at + width)?;
      }
    }
    select_lines(scope, first, last);
    Ok(())
  })?;
  Ok(true)
}

/// Removes up to `width` leading spaces from the cursor line.
pub fn dedent_line(doc: &mut Document, width: usize) -> Result<bool> {
  let row = doc.current_line();
  let start = doc.line_start(row);
  let count = doc
    .line(row)
    .map_or(0, |line| line.chars().take(width).take_while(|ch| *ch == ' ').count());
  if count == 0 {
    return Ok(false);
  }
  doc.transact(|scope| scope.delete(start, start + count))?;
  Ok(true)
}

/// Backspace key.
///
/// Inside leading whitespace the cursor snaps back to the previous tab stop;
/// anywhere else one character (or the selection) is deleted. A line break is
/// removed as a whole, CRLF included.
pub fn backspace(doc: &mut Document, width: usize) -> Result<bool> {
  if doc.has_selection() {
    return doc.transact(|scope| scope.delete_selection());
  }

  let width = width.max(1);
  let col = doc.cursor().col;
  let offset = doc.cursor_offset();
  let nearby = scanner::nearby_text(doc);

  let count = if !nearby.is_empty() && nearby.chars().all(char::is_whitespace) {
    (col - 1) % width + 1
  } else if offset == 0 {
    return Ok(false);
  } else if col == 0 && offset >= 2 && doc.text().slice(offset - 2..offset) == "\r\n" {
    2
  } else {
    1
  };

  doc.transact(|scope| scope.delete(offset - count, offset))?;
  Ok(true)
}

fn leading_spaces(scope: &EditScope<'_>, line: usize, limit: usize) -> usize {
  scope
    .text()
    .line(line)
    .chars()
    .take(limit)
    .take_while(|ch| *ch == ' ')
    .count()
}

fn select_lines(scope: &mut EditScope<'_>, first: usize, last: usize) {
  let text = scope.text().slice(..);
  let from = text.line_to_char(first);
  let to = line_end_char_index(&text, last);
  scope.set_selection(Range::new(from, to));
}
