//! The editing surface a host embeds.
//!
//! `CodeEditor` owns one document together with everything that reacts to
//! it: the completion coordinator, highlight marks, the deferred-update
//! scheduler and the highlighter. The host feeds it key and pointer events
//! and calls [`CodeEditor::tick`] on a timer; everything runs on the caller's
//! thread.
//!
//! Notifications go out through an [`EventBus`] owned by the editor:
//!
//! ```
//! use std::time::Instant;
//!
//! use pyedit_lib::{
//!   editor::{
//!     CodeEditor,
//!     EditorEvent,
//!   },
//!   input::KeyEvent,
//! };
//!
//! let mut editor = CodeEditor::default();
//! editor.events_mut().register(|event: &EditorEvent| {
//!   if let EditorEvent::SaveRequested = event {
//!     // persist the buffer
//!   }
//!   Ok(())
//! });
//! editor.handle_key(KeyEvent::ctrl('s'), Instant::now()).unwrap();
//! ```

use std::time::Instant;

use pyedit_event::EventBus;
use tokio::{
  sync::mpsc::UnboundedReceiver,
  time::Interval,
};

use crate::{
  auto_pairs,
  comment,
  completion::{
    CompletionCoordinator,
    CompletionDecision,
    CompletionPopup,
    CompletionResult,
    PopupKeyOutcome,
  },
  config::EditorConfig,
  document::{
    Document,
    Result,
  },
  highlight::{
    HighlightMark,
    HighlightRegistry,
    Highlighter,
    MarkerKind,
    PlainHighlighter,
    Tooltip,
  },
  indent::{
    self,
    TabOutcome,
  },
  input::{
    Key,
    KeyEvent,
    KeyOutcome,
    Modifiers,
  },
  position::Position,
  scheduler::{
    self,
    PendingUpdate,
    UpdateScheduler,
  },
  worker::{
    CompletionEngine,
    spawn_completion_worker,
  },
};

/// Notifications emitted by [`CodeEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
  /// The text changed. Sent after the modified flag was updated.
  TextChanged { revision: u64 },
  /// Ctrl+S. Persisting is up to the host, which then calls
  /// [`CodeEditor::mark_saved`].
  SaveRequested,
  FocusGained,
  /// The buffer has been quiet for the idle threshold. Sent once per quiet
  /// period.
  Idle,
}

pub struct CodeEditor<H = PlainHighlighter> {
  doc:         Document,
  config:      EditorConfig,
  completion:  CompletionCoordinator,
  marks:       HighlightRegistry,
  scheduler:   UpdateScheduler,
  highlighter: H,
  tooltip:     Tooltip,
  visible:     bool,
  events:      EventBus<EditorEvent>,
  results:     Option<UnboundedReceiver<CompletionResult>>,
}

impl Default for CodeEditor {
  fn default() -> Self {
    Self::new(Document::default(), EditorConfig::default())
  }
}

impl CodeEditor {
  /// An editor whose highlighter uses the keyword set and colors of
  /// `config.highlight`.
  pub fn new(doc: Document, config: EditorConfig) -> Self {
    let highlighter = PlainHighlighter::new(config.highlight.clone());
    Self::with_highlighter(doc, config, highlighter)
  }
}

impl<H: Highlighter> CodeEditor<H> {
  pub fn with_highlighter(doc: Document, config: EditorConfig, highlighter: H) -> Self {
    let completion =
      CompletionCoordinator::new(CompletionPopup::new(config.popup_reshow_interval()));
    let marks = HighlightRegistry::new(doc.len_lines());
    let scheduler = UpdateScheduler::new(config.idle_threshold());
    Self {
      doc,
      config,
      completion,
      marks,
      scheduler,
      highlighter,
      tooltip: Tooltip::hidden(),
      visible: true,
      events: EventBus::new(),
      results: None,
    }
  }

  pub fn doc(&self) -> &Document {
    &self.doc
  }

  pub fn config(&self) -> &EditorConfig {
    &self.config
  }

  pub fn highlighter(&self) -> &H {
    &self.highlighter
  }

  pub fn popup(&self) -> &CompletionPopup {
    self.completion.popup()
  }

  pub fn completion(&self) -> &CompletionCoordinator {
    &self.completion
  }

  pub fn marks(&self) -> &HighlightRegistry {
    &self.marks
  }

  pub fn tooltip(&self) -> &Tooltip {
    &self.tooltip
  }

  pub fn scheduler(&self) -> &UpdateScheduler {
    &self.scheduler
  }

  pub fn events_mut(&mut self) -> &mut EventBus<EditorEvent> {
    &mut self.events
  }

  /// Runs `f` against the document and reacts to any text change it made as
  /// if it had been typed.
  pub fn edit<T>(&mut self, now: Instant, f: impl FnOnce(&mut Document) -> T) -> T {
    let revision = self.doc.revision();
    let value = f(&mut self.doc);
    if self.doc.revision() != revision {
      self.on_text_changed(now);
    }
    value
  }

  // Input.

  /// Routes a key press. The completion popup sees it first; whatever it
  /// does not consume goes to the buffer.
  pub fn handle_key(&mut self, event: KeyEvent, now: Instant) -> Result<KeyOutcome> {
    let revision = self.doc.revision();
    let outcome = self.dispatch_key(event, now)?;
    if self.doc.revision() != revision {
      self.on_text_changed(now);
    }
    Ok(outcome)
  }

  fn dispatch_key(&mut self, event: KeyEvent, now: Instant) -> Result<KeyOutcome> {
    match self.completion.popup_mut().handle_key(&event) {
      PopupKeyOutcome::Confirm => {
        self
          .completion
          .confirm(&mut self.doc, self.highlighter.config())?;
        return Ok(KeyOutcome::Handled);
      },
      PopupKeyOutcome::Consumed => return Ok(KeyOutcome::Handled),
      PopupKeyOutcome::Forward => {},
    }

    if event.is_ctrl_char('s') {
      self.events.dispatch(&EditorEvent::SaveRequested);
      return Ok(KeyOutcome::Handled);
    }
    if event.is_ctrl_char('/') {
      comment::toggle_comments(&mut self.doc, &self.config.comment_token)?;
      return Ok(KeyOutcome::Handled);
    }
    if event.is_ctrl_char('z') {
      self.doc.undo()?;
      return Ok(KeyOutcome::Handled);
    }
    if event.is_ctrl_char('y') {
      self.doc.redo()?;
      return Ok(KeyOutcome::Handled);
    }

    let width = self.config.indent_width;
    let mods = event.modifiers;
    let extend = mods.shift();
    match event.key {
      Key::Tab if mods.is_empty() => {
        let outcome = indent::on_tab(&mut self.doc, width, &self.config.comment_token)?;
        if outcome == TabOutcome::RequestCompletion {
          self.request_completion(now);
        }
      },
      Key::BackTab => {
        indent::on_back_tab(&mut self.doc, width)?;
      },
      Key::Tab if mods == Modifiers::SHIFT => {
        indent::on_back_tab(&mut self.doc, width)?;
      },
      Key::Enter => {
        if !indent::insert_newline(&mut self.doc, width)? {
          let ending = self.doc.line_ending();
          self.doc.replace_selection(ending.as_str())?;
        }
      },
      Key::Backspace => {
        indent::backspace(&mut self.doc, width)?;
      },
      Key::Delete => self.delete_forward()?,
      Key::Char(ch) if !mods.ctrl() && !mods.alt() => {
        if !auto_pairs::hook(&mut self.doc, ch, &self.config.auto_pairs)? {
          let mut buf = [0; 4];
          self.doc.replace_selection(ch.encode_utf8(&mut buf))?;
        }
      },
      Key::Left => {
        let target = match self.doc.selection() {
          Some(range) if !extend => range.from(),
          _ => prev_offset(&self.doc, self.doc.cursor_offset()),
        };
        self.move_to(target, extend);
      },
      Key::Right => {
        let target = match self.doc.selection() {
          Some(range) if !extend => range.to(),
          _ => next_offset(&self.doc, self.doc.cursor_offset()),
        };
        self.move_to(target, extend);
      },
      Key::Home => {
        let target = self.doc.line_start(self.doc.current_line());
        self.move_to(target, extend);
      },
      Key::End => {
        let row = self.doc.current_line();
        let target = self.doc.line_start(row) + self.doc.line_len(row);
        self.move_to(target, extend);
      },
      Key::Up | Key::Down => {
        let cursor = self.doc.cursor();
        let row = if event.key == Key::Up {
          cursor.row.saturating_sub(1)
        } else {
          cursor.row + 1
        };
        let target = self.doc.pos_to_offset(Position::new(row, cursor.col));
        self.move_to(target, extend);
      },
      _ => return Ok(KeyOutcome::Continue),
    }
    Ok(KeyOutcome::Handled)
  }

  fn move_to(&mut self, offset: usize, extend: bool) {
    if extend {
      let anchor = self.doc.range().anchor;
      self.doc.select(anchor, offset);
    } else {
      self.doc.set_cursor_offset(offset);
    }
  }

  fn delete_forward(&mut self) -> Result<()> {
    if self.doc.has_selection() {
      self.doc.transact(|scope| scope.delete_selection())?;
      return Ok(());
    }
    let offset = self.doc.cursor_offset();
    let to = next_offset(&self.doc, offset);
    if to > offset {
      self.doc.transact(|scope| scope.delete(offset, to))?;
    }
    Ok(())
  }

  /// A pointer press inside the text hides the popup and moves the cursor.
  pub fn pointer_pressed(&mut self, pos: Position) {
    self.completion.dismiss();
    self.doc.set_cursor(pos);
  }

  /// Updates the tooltip for the pointer hovering over `pos`.
  pub fn hover(&mut self, pos: Position) -> &Tooltip {
    self.tooltip = if self.insight_enabled() && pos.row < self.doc.len_lines() {
      self.marks.tooltip(pos, self.doc.line_len(pos.row))
    } else {
      Tooltip::hidden()
    };
    &self.tooltip
  }

  pub fn focus_gained(&mut self) {
    self.events.dispatch(&EditorEvent::FocusGained);
  }

  /// Whether the buffer is on screen. Deferred updates wait while it is not.
  pub fn set_visible(&mut self, visible: bool) {
    self.visible = visible;
  }

  // Text changes.

  fn on_text_changed(&mut self, now: Instant) {
    let revision = self.doc.revision();
    self.marks.sync_line_count(self.doc.len_lines());
    self.scheduler.note_edit(now);
    self.scheduler.request(PendingUpdate::Rehighlight);
    self.events.dispatch(&EditorEvent::TextChanged { revision });
    self.request_completion(now);
  }

  fn insight_enabled(&self) -> bool {
    self.doc.len_chars() < self.config.max_insight_chars
  }

  // Completion.

  /// Starts a completion worker for `engine` on the current tokio runtime.
  pub fn connect_completion_worker<E: CompletionEngine>(&mut self, engine: E) {
    let (requests, results) = spawn_completion_worker(engine, self.config.completion_debounce());
    self.completion.connect(requests);
    self.results = Some(results);
  }

  /// Asks for completions at the cursor if the text before it calls for
  /// them. Returns the request id.
  pub fn request_completion(&mut self, now: Instant) -> Option<u64> {
    if !self.insight_enabled() {
      self.completion.dismiss();
      return None;
    }
    self
      .completion
      .request(&self.doc, &self.config.comment_token, now)
  }

  pub fn on_completion_result(
    &mut self,
    result: CompletionResult,
    now: Instant,
  ) -> CompletionDecision {
    self
      .completion
      .on_result(result, &self.doc, &self.config.comment_token, now)
  }

  /// Applies every completion result that has arrived so far. Returns how
  /// many there were.
  pub fn poll_completions(&mut self, now: Instant) -> usize {
    let mut count = 0;
    while let Some(result) = self.results.as_mut().and_then(|rx| rx.try_recv().ok()) {
      self.on_completion_result(result, now);
      count += 1;
    }
    count
  }

  /// Waits for the next result from the connected worker. `None` without a
  /// worker or once it has shut down.
  pub async fn next_completion(&mut self) -> Option<CompletionResult> {
    self.results.as_mut()?.recv().await
  }

  // Highlighting.

  pub fn register_highlight(&mut self, mark: HighlightMark) {
    self.marks.register(mark);
  }

  /// Registers a mark in the raw encoding used by analysis tools: a length
  /// of `-1` runs to the end of the line and `code` is the marker kind.
  pub fn register_highlight_raw(
    &mut self,
    line: usize,
    start: usize,
    length: isize,
    code: u8,
    hint: impl Into<String>,
  ) -> bool {
    let Some(kind) = MarkerKind::from_code(code) else {
      tracing::debug!(code, "unknown marker kind");
      return false;
    };
    self.marks.register_raw(line, start, length, kind, hint)
  }

  pub fn clear_highlight(&mut self) {
    self.marks.clear();
    self.tooltip = Tooltip::hidden();
  }

  /// Queues a full re-highlight for the next idle tick.
  pub fn rehighlight(&mut self) {
    self.scheduler.request(PendingUpdate::Rehighlight);
  }

  /// Layers `scheme` over the highlighter's colors and queues a repaint.
  pub fn load_color_scheme<K, V>(&mut self, scheme: impl IntoIterator<Item = (K, V)>)
  where
    K: Into<String>,
    V: Into<String>,
  {
    let config = self.highlighter.config().with_color_scheme(scheme);
    self.highlighter.set_config(config);
    self.rehighlight();
  }

  // Scheduling.

  /// One timer tick: runs the pending update if the buffer is visible and
  /// idle, and reports idleness. Returns whether an update ran.
  pub fn tick(&mut self, now: Instant) -> bool {
    let ran = match self.scheduler.tick(now, self.visible) {
      Some(PendingUpdate::Rehighlight) => {
        self.highlighter.rehighlight(self.doc.text(), &self.marks);
        true
      },
      None => false,
    };
    if self.scheduler.take_idle(now) {
      self.events.dispatch(&EditorEvent::Idle);
    }
    ran
  }

  /// The timer the host should drive [`CodeEditor::tick`] with.
  pub fn tick_interval(&self) -> Interval {
    scheduler::tick_interval(self.config.tick_interval())
  }

  // Document passthroughs.

  pub fn go_to_line(&mut self, line: usize) -> Result<()> {
    self.completion.dismiss();
    self.doc.go_to_line(line)
  }

  pub fn is_modified(&self) -> bool {
    self.doc.is_modified()
  }

  pub fn mark_saved(&mut self) {
    self.doc.mark_saved();
  }
}

/// The offset one step left of `offset`, treating CRLF as one step.
fn prev_offset(doc: &Document, offset: usize) -> usize {
  if offset >= 2 && doc.text().slice(offset - 2..offset) == "\r\n" {
    offset - 2
  } else {
    offset.saturating_sub(1)
  }
}

fn next_offset(doc: &Document, offset: usize) -> usize {
  let len = doc.len_chars();
  if offset + 2 <= len && doc.text().slice(offset..offset + 2) == "\r\n" {
    offset + 2
  } else {
    (offset + 1).min(len)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::RefCell,
    rc::Rc,
    time::Duration,
  };

  use ropey::Rope;

  use super::*;
  use crate::completion::{
    CompletionCandidate,
    CompletionPosition,
  };

  fn editor_at(text: &str, row: usize, col: usize) -> CodeEditor {
    let mut doc = Document::from(text);
    doc.set_cursor(Position::new(row, col));
    CodeEditor::new(doc, EditorConfig::default())
  }

  fn type_str(editor: &mut CodeEditor, text: &str, now: Instant) {
    for ch in text.chars() {
      editor.handle_key(KeyEvent::char(ch), now).unwrap();
    }
  }

  fn record_events(editor: &mut CodeEditor) -> Rc<RefCell<Vec<EditorEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    editor.events_mut().register(move |event: &EditorEvent| {
      sink.borrow_mut().push(event.clone());
      Ok(())
    });
    seen
  }

  #[test]
  fn enter_after_colon_indents() {
    let mut editor = editor_at("if True:", 0, 8);
    editor.handle_key(Key::Enter.into(), Instant::now()).unwrap();
    assert_eq!(editor.doc().text().to_string(), "if True:\n    ");
    assert_eq!(editor.doc().cursor(), Position::new(1, 4));
  }

  #[test]
  fn enter_mid_line_splits_plainly() {
    let mut editor = editor_at("    ab", 0, 5);
    editor.handle_key(Key::Enter.into(), Instant::now()).unwrap();
    assert_eq!(editor.doc().text().to_string(), "    a\nb");
  }

  #[test]
  fn tab_and_back_tab_on_selection() {
    let text = "    a = 1\n    b = 2\n    c = 3";
    let mut editor = editor_at(text, 0, 0);
    editor.edit(Instant::now(), |doc| doc.select(2, 20));

    let now = Instant::now();
    editor.handle_key(Key::Tab.into(), now).unwrap();
    assert_eq!(
      editor.doc().text().to_string(),
      "        a = 1\n        b = 2\n        c = 3"
    );
    editor.handle_key(Key::BackTab.into(), now).unwrap();
    assert_eq!(editor.doc().text().to_string(), text);

    editor
      .handle_key(KeyEvent::new(Key::Tab, Modifiers::SHIFT), now)
      .unwrap();
    assert_eq!(
      editor.doc().text().to_string(),
      "a = 1\nb = 2\nc = 3"
    );
  }

  #[test]
  fn tab_without_selection_inserts_spaces() {
    let mut editor = editor_at("x = ", 0, 4);
    editor.handle_key(Key::Tab.into(), Instant::now()).unwrap();
    assert_eq!(editor.doc().text().to_string(), "x =     ");
  }

  #[test]
  fn tab_after_partial_name_requests_completion() {
    let mut editor = editor_at("pri", 0, 3);
    editor.handle_key(Key::Tab.into(), Instant::now()).unwrap();
    assert_eq!(editor.doc().text().to_string(), "pri");
    assert_eq!(
      editor.completion().live_request().map(|(_, pos)| pos),
      Some(CompletionPosition::new(1, 3))
    );
  }

  #[test]
  fn typing_dot_shows_completions() {
    let now = Instant::now();
    let mut editor = editor_at("import os\n", 1, 0);
    type_str(&mut editor, "os.", now);

    let (id, position) = editor.completion().live_request().unwrap();
    assert_eq!(position, CompletionPosition::new(2, 3));

    let decision = editor.on_completion_result(
      CompletionResult {
        request_id: id,
        position,
        candidates: vec![
          CompletionCandidate::new("path", "path"),
          CompletionCandidate::new("getcwd", "getcwd"),
        ],
      },
      now,
    );
    assert_eq!(decision, CompletionDecision::Shown(2));
    assert_eq!(editor.popup().items().len(), 2);
    assert_eq!(editor.popup().selected_index(), Some(0));

    editor.handle_key(Key::Down.into(), now).unwrap();
    editor.handle_key(Key::Enter.into(), now).unwrap();
    assert_eq!(editor.doc().text().to_string(), "import os\nos.getcwd");
    assert!(!editor.popup().is_visible());
  }

  #[test]
  fn moving_the_cursor_makes_results_stale() {
    let now = Instant::now();
    let mut editor = editor_at("os.", 0, 3);
    let id = editor.request_completion(now).unwrap();
    editor.handle_key(Key::Left.into(), now).unwrap();

    let decision = editor.on_completion_result(
      CompletionResult {
        request_id: id,
        position:   CompletionPosition::new(1, 3),
        candidates: vec![CompletionCandidate::new("path", "path")],
      },
      now,
    );
    assert_eq!(decision, CompletionDecision::Stale);
    assert!(!editor.popup().is_visible());
  }

  #[test]
  fn escape_hides_popup_without_editing() {
    let now = Instant::now();
    let mut editor = editor_at("os.", 0, 3);
    let id = editor.request_completion(now).unwrap();
    editor.on_completion_result(
      CompletionResult {
        request_id: id,
        position:   CompletionPosition::new(1, 3),
        candidates: vec![CompletionCandidate::new("path", "path")],
      },
      now,
    );
    assert!(editor.popup().is_visible());
    assert_eq!(
      editor.handle_key(Key::Escape.into(), now).unwrap(),
      KeyOutcome::Handled
    );
    assert!(!editor.popup().is_visible());
    assert_eq!(editor.doc().text().to_string(), "os.");
  }

  #[test]
  fn shift_tab_with_popup_dedents() {
    let now = Instant::now();
    let mut editor = editor_at("    os.", 0, 7);
    let id = editor.request_completion(now).unwrap();
    editor.on_completion_result(
      CompletionResult {
        request_id: id,
        position:   CompletionPosition::new(1, 7),
        candidates: vec![CompletionCandidate::new("path", "path")],
      },
      now,
    );
    assert!(editor.popup().is_visible());

    editor
      .handle_key(KeyEvent::new(Key::Tab, Modifiers::SHIFT), now)
      .unwrap();
    assert_eq!(editor.doc().text().to_string(), "os.");
    assert!(!editor.popup().is_visible());
  }

  #[test]
  fn hover_tooltip() {
    let mut editor = editor_at("a\nb\nc\nx = undefined_name\n", 0, 0);
    editor.register_highlight_raw(3, 2, 5, 1, "undefined name");

    let tooltip = editor.hover(Position::new(3, 4));
    assert!(tooltip.visible);
    assert_eq!(tooltip.text, "undefined name");

    assert!(!editor.hover(Position::new(3, 9)).visible);
    assert!(!editor.hover(Position::new(40, 0)).visible);
  }

  #[test]
  fn insight_size_gate() {
    let mut config = EditorConfig::default();
    config.max_insight_chars = 4;
    let mut doc = Document::from("os.pa");
    doc.set_cursor(Position::new(0, 5));
    let mut editor = CodeEditor::new(doc, config);
    editor.register_highlight_raw(0, 0, -1, 2, "warning");

    assert_eq!(editor.request_completion(Instant::now()), None);
    assert!(!editor.hover(Position::new(0, 1)).visible);
  }

  #[test]
  fn unknown_marker_code_is_rejected() {
    let mut editor = editor_at("x\n", 0, 0);
    assert!(!editor.register_highlight_raw(0, 0, 1, 9, "?"));
    assert!(!editor.register_highlight_raw(0, 0, -3, 1, "?"));
    assert!(editor.marks().is_empty());
  }

  #[test]
  fn line_count_change_drops_marks() {
    let now = Instant::now();
    let mut editor = editor_at("x = 1", 0, 5);
    editor.register_highlight_raw(0, 0, 1, 1, "bad");
    type_str(&mut editor, " + 2", now);
    assert_eq!(editor.marks().len(), 1);
    editor.handle_key(Key::Enter.into(), now).unwrap();
    assert!(editor.marks().is_empty());
  }

  #[test]
  fn ctrl_slash_toggles_comment() {
    let now = Instant::now();
    let mut editor = editor_at("    x = 1", 0, 0);
    editor.handle_key(KeyEvent::ctrl('/'), now).unwrap();
    assert_eq!(editor.doc().text().to_string(), "#    x = 1");
    editor.handle_key(KeyEvent::ctrl('/'), now).unwrap();
    assert_eq!(editor.doc().text().to_string(), "    x = 1");
  }

  #[test]
  fn auto_pairs_and_undo() {
    let now = Instant::now();
    let mut editor = editor_at("", 0, 0);
    type_str(&mut editor, "f(", now);
    assert_eq!(editor.doc().text().to_string(), "f()");
    assert_eq!(editor.doc().cursor(), Position::new(0, 2));

    editor.handle_key(KeyEvent::ctrl('z'), now).unwrap();
    assert_eq!(editor.doc().text().to_string(), "f");
    editor.handle_key(KeyEvent::ctrl('y'), now).unwrap();
    assert_eq!(editor.doc().text().to_string(), "f()");
  }

  #[test]
  fn backspace_snaps_to_tab_stop() {
    let mut editor = editor_at("      x", 0, 6);
    editor
      .handle_key(Key::Backspace.into(), Instant::now())
      .unwrap();
    assert_eq!(editor.doc().text().to_string(), "    x");
  }

  #[test]
  fn delete_forward_handles_crlf() {
    let now = Instant::now();
    let mut editor = editor_at("a\r\nb", 0, 1);
    editor.handle_key(Key::Delete.into(), now).unwrap();
    assert_eq!(editor.doc().text().to_string(), "ab");
    editor.handle_key(Key::Delete.into(), now).unwrap();
    editor.handle_key(Key::Delete.into(), now).unwrap();
    assert_eq!(editor.doc().text().to_string(), "a");
  }

  #[test]
  fn cursor_movement() {
    let now = Instant::now();
    let mut editor = editor_at("abc\r\nde", 0, 3);
    editor.handle_key(Key::Right.into(), now).unwrap();
    assert_eq!(editor.doc().cursor(), Position::new(1, 0));
    editor.handle_key(Key::Left.into(), now).unwrap();
    assert_eq!(editor.doc().cursor(), Position::new(0, 3));
    editor.handle_key(Key::Down.into(), now).unwrap();
    assert_eq!(editor.doc().cursor(), Position::new(1, 2));
    editor.handle_key(Key::Home.into(), now).unwrap();
    assert_eq!(editor.doc().cursor(), Position::new(1, 0));
    editor
      .handle_key(KeyEvent::new(Key::End, Modifiers::SHIFT), now)
      .unwrap();
    assert_eq!(editor.doc().selected_text(), "de");
    editor.handle_key(Key::Left.into(), now).unwrap();
    assert!(!editor.doc().has_selection());
    assert_eq!(editor.doc().cursor(), Position::new(1, 0));
    editor.handle_key(Key::Up.into(), now).unwrap();
    assert_eq!(editor.doc().cursor(), Position::new(0, 0));
  }

  #[test]
  fn unbound_keys_continue() {
    let now = Instant::now();
    let mut editor = editor_at("x", 0, 0);
    assert_eq!(
      editor.handle_key(Key::Other.into(), now).unwrap(),
      KeyOutcome::Continue
    );
    assert_eq!(
      editor.handle_key(KeyEvent::ctrl('q'), now).unwrap(),
      KeyOutcome::Continue
    );
    assert_eq!(editor.doc().revision(), 0);
  }

  #[test]
  fn pointer_press_hides_popup() {
    let now = Instant::now();
    let mut editor = editor_at("os.\nx", 0, 3);
    let id = editor.request_completion(now).unwrap();
    editor.on_completion_result(
      CompletionResult {
        request_id: id,
        position:   CompletionPosition::new(1, 3),
        candidates: vec![CompletionCandidate::new("path", "path")],
      },
      now,
    );
    editor.pointer_pressed(Position::new(1, 1));
    assert!(!editor.popup().is_visible());
    assert_eq!(editor.doc().cursor(), Position::new(1, 1));
  }

  #[test]
  fn events_in_order() {
    let now = Instant::now();
    let mut editor = editor_at("", 0, 0);
    let seen = record_events(&mut editor);

    editor.focus_gained();
    type_str(&mut editor, "x", now);
    assert!(editor.is_modified());
    editor.handle_key(KeyEvent::ctrl('s'), now).unwrap();
    editor.mark_saved();
    assert!(!editor.is_modified());

    assert_eq!(*seen.borrow(), vec![
      EditorEvent::FocusGained,
      EditorEvent::TextChanged { revision: 1 },
      EditorEvent::SaveRequested,
    ]);
  }

  #[test]
  fn rehighlight_runs_when_idle() {
    let start = Instant::now();
    let ms = Duration::from_millis(1);
    let mut editor = editor_at("", 0, 0);
    let seen = record_events(&mut editor);

    type_str(&mut editor, "ab", start);
    assert!(!editor.tick(start + 300 * ms));
    assert_eq!(editor.highlighter().passes(), 0);

    assert!(editor.tick(start + 600 * ms));
    assert_eq!(editor.highlighter().passes(), 1);
    assert!(!editor.tick(start + 900 * ms));

    editor.set_visible(false);
    editor.rehighlight();
    assert!(!editor.tick(start + 1200 * ms));
    editor.set_visible(true);
    assert!(editor.tick(start + 1500 * ms));
    assert_eq!(editor.highlighter().passes(), 2);

    let idle = seen
      .borrow()
      .iter()
      .filter(|event| **event == EditorEvent::Idle)
      .count();
    assert_eq!(idle, 1);
  }

  #[test]
  fn color_scheme_reload_is_owned() {
    let mut editor = editor_at("", 0, 0);
    let other = CodeEditor::default();
    editor.load_color_scheme([("keyword", "#123456")]);
    assert_eq!(
      editor.highlighter().config().color("keyword"),
      Some("#123456")
    );
    assert_ne!(
      other.highlighter().config().color("keyword"),
      Some("#123456")
    );
    assert_eq!(
      editor.scheduler().pending(),
      Some(PendingUpdate::Rehighlight)
    );
  }

  #[test]
  fn go_to_line_is_one_based() {
    let mut editor = editor_at("a\nb\nc", 0, 0);
    editor.go_to_line(3).unwrap();
    assert_eq!(editor.doc().cursor(), Position::new(2, 0));
    assert!(editor.go_to_line(0).is_err());
    assert!(editor.go_to_line(4).is_err());
  }

  #[tokio::test]
  async fn completion_worker_round_trip() {
    let now = Instant::now();
    let mut editor = editor_at("import os\n", 1, 0);
    editor.connect_completion_worker(|_: &Rope, _: CompletionPosition| {
      vec![
        CompletionCandidate::new("path", "path"),
        CompletionCandidate::new("getcwd", "getcwd"),
      ]
    });
    type_str(&mut editor, "os.", now);

    let shown = tokio::time::timeout(Duration::from_secs(5), async {
      loop {
        let result = editor.next_completion().await?;
        if let CompletionDecision::Shown(count) = editor.on_completion_result(result, now) {
          return Some(count);
        }
      }
    })
    .await
    .unwrap();
    assert_eq!(shown, Some(2));
    assert_eq!(editor.poll_completions(now), 0);
  }
}
