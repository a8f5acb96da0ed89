//! Completion request/result correlation and the popup model.
//!
//! The coordinator issues at most one live request at a time. Each request
//! supersedes the previous one, and a result is only ever shown if the live
//! cursor still sits where the request was made:
//!
//! ```text
//! request  at cursor (row 4, col 7)  ->  CompletionPosition { line: 5, column: 7 }
//! result   for        { line: 5, column: 7 }  accepted iff cursor is (4, 7)
//! ```
//!
//! Positions sent to and received from the analysis worker use one-based
//! lines and zero-based columns. The conversion happens in exactly one place,
//! [`CompletionPosition::from_cursor`].

use std::time::{
  Duration,
  Instant,
};

use pyedit_event::send_blocking;
use ropey::Rope;
use tokio::sync::mpsc::Sender;

use crate::{
  document::Document,
  highlight::HighlightConfig,
  input::{
    Key,
    KeyEvent,
  },
  position::{
    Position,
    pos_at_char_idx,
  },
  scanner,
  transaction::Result,
};

pub const DEFAULT_RESHOW_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompletionPosition {
  /// One-based.
  pub line:   usize,
  /// Zero-based.
  pub column: usize,
}

impl CompletionPosition {
  pub const fn new(line: usize, column: usize) -> Self {
    Self { line, column }
  }

  pub const fn from_cursor(cursor: Position) -> Self {
    Self {
      line:   cursor.row + 1,
      column: cursor.col,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
  /// What the popup lists.
  pub display_name: String,
  /// What confirming the candidate inserts at the cursor.
  pub insert_text:  String,
}

impl CompletionCandidate {
  pub fn new(display_name: impl Into<String>, insert_text: impl Into<String>) -> Self {
    Self {
      display_name: display_name.into(),
      insert_text:  insert_text.into(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
  pub id:        u64,
  pub position:  CompletionPosition,
  pub snapshot:  Rope,
  pub issued_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
  pub request_id: u64,
  pub position:   CompletionPosition,
  pub candidates: Vec<CompletionCandidate>,
}

/// What happened to an incoming result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDecision {
  /// The popup now lists this many candidates.
  Shown(usize),
  /// Nothing worth offering (no candidates, or only what was already typed).
  Empty,
  /// The cursor moved since the request; the popup was hidden.
  Stale,
  /// A newer request is outstanding; the result was dropped untouched.
  Superseded,
  /// The popup refused to reappear this soon after it was last shown.
  Suppressed,
}

/// How the popup reacted to a key while it was visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKeyOutcome {
  /// Insert the selected candidate.
  Confirm,
  /// The popup used the key (navigation or Escape).
  Consumed,
  /// The key belongs to the buffer. The popup may have been hidden.
  Forward,
}

/// The visible candidate list.
#[derive(Debug, Clone)]
pub struct CompletionPopup {
  items:           Vec<CompletionCandidate>,
  selected:        usize,
  visible:         bool,
  last_shown:      Option<Instant>,
  reshow_interval: Duration,
}

impl Default for CompletionPopup {
  fn default() -> Self {
    Self::new(DEFAULT_RESHOW_INTERVAL)
  }
}

impl CompletionPopup {
  pub fn new(reshow_interval: Duration) -> Self {
    Self {
      items: Vec::new(),
      selected: 0,
      visible: false,
      last_shown: None,
      reshow_interval,
    }
  }

  pub fn is_visible(&self) -> bool {
    self.visible
  }

  pub fn items(&self) -> &[CompletionCandidate] {
    &self.items
  }

  pub fn selected_index(&self) -> Option<usize> {
    (self.visible && !self.items.is_empty()).then_some(self.selected)
  }

  pub fn selected_candidate(&self) -> Option<&CompletionCandidate> {
    self.items.get(self.selected_index()?)
  }

  /// A hidden popup may not reappear within the re-show interval of its last
  /// appearance. A visible one can always be repopulated.
  pub fn can_show(&self, now: Instant) -> bool {
    self.visible
      || self
        .last_shown
        .is_none_or(|shown| now.saturating_duration_since(shown) >= self.reshow_interval)
  }

  /// Replaces the list and shows it with the first item selected. An empty
  /// list hides the popup instead. Returns whether the popup is showing.
  pub fn show(&mut self, items: Vec<CompletionCandidate>, now: Instant) -> bool {
    if items.is_empty() {
      self.hide();
      return false;
    }
    if !self.can_show(now) {
      return false;
    }
    self.items = items;
    self.selected = 0;
    self.visible = true;
    self.last_shown = Some(now);
    true
  }

  pub fn hide(&mut self) {
    self.items.clear();
    self.selected = 0;
    self.visible = false;
  }

  pub fn select_next(&mut self) {
    if self.selected + 1 < self.items.len() {
      self.selected += 1;
    }
  }

  pub fn select_prev(&mut self) {
    self.selected = self.selected.saturating_sub(1);
  }

  /// Applies a key press to a visible popup. Keys that edit or move the
  /// caret sideways hide it and continue to the buffer.
  pub fn handle_key(&mut self, event: &KeyEvent) -> PopupKeyOutcome {
    if !self.visible {
      return PopupKeyOutcome::Forward;
    }
    match event.key {
      Key::Enter | Key::Tab if event.modifiers.is_empty() => PopupKeyOutcome::Confirm,
      Key::Escape => {
        self.hide();
        PopupKeyOutcome::Consumed
      },
      Key::Up => {
        self.select_prev();
        PopupKeyOutcome::Consumed
      },
      Key::Down => {
        self.select_next();
        PopupKeyOutcome::Consumed
      },
      _ => {
        self.hide();
        PopupKeyOutcome::Forward
      },
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LiveRequest {
  id:       u64,
  position: CompletionPosition,
}

/// Issues completion requests and decides what to do with their results.
#[derive(Debug)]
pub struct CompletionCoordinator {
  next_id: u64,
  live:    Option<LiveRequest>,
  popup:   CompletionPopup,
  worker:  Option<Sender<CompletionRequest>>,
}

impl Default for CompletionCoordinator {
  fn default() -> Self {
    Self::new(CompletionPopup::default())
  }
}

impl CompletionCoordinator {
  pub fn new(popup: CompletionPopup) -> Self {
    Self {
      next_id: 0,
      live: None,
      popup,
      worker: None,
    }
  }

  /// Routes future requests to a worker channel.
  pub fn connect(&mut self, worker: Sender<CompletionRequest>) {
    self.worker = Some(worker);
  }

  pub fn popup(&self) -> &CompletionPopup {
    &self.popup
  }

  pub fn popup_mut(&mut self) -> &mut CompletionPopup {
    &mut self.popup
  }

  /// Id and position of the newest request, if one is outstanding.
  pub fn live_request(&self) -> Option<(u64, CompletionPosition)> {
    self.live.map(|live| (live.id, live.position))
  }

  /// Evaluates the trigger rule at the cursor and issues a request if it
  /// holds. Otherwise hides the popup. Returns the new request id.
  pub fn request(&mut self, doc: &Document, comment_token: &str, now: Instant) -> Option<u64> {
    let hint = scanner::current_hint(doc, comment_token);
    if !scanner::wants_completion(&hint, &scanner::nearby_text(doc)) {
      self.popup.hide();
      return None;
    }

    self.next_id = self.next_id.wrapping_add(1);
    let request = CompletionRequest {
      id:        self.next_id,
      position:  CompletionPosition::from_cursor(doc.cursor()),
      snapshot:  doc.text().clone(),
      issued_at: now,
    };
    self.live = Some(LiveRequest {
      id:       request.id,
      position: request.position,
    });
    tracing::debug!(id = request.id, position = ?request.position, %hint, "completion request");

    if let Some(worker) = &self.worker {
      send_blocking(worker, request);
    }
    Some(self.next_id)
  }

  /// Decides whether a result still applies to the live cursor and updates
  /// the popup accordingly.
  pub fn on_result(
    &mut self,
    result: CompletionResult,
    doc: &Document,
    comment_token: &str,
    now: Instant,
  ) -> CompletionDecision {
    if self.live.is_some_and(|live| result.request_id < live.id) {
      tracing::debug!(id = result.request_id, "dropping superseded completion result");
      return CompletionDecision::Superseded;
    }

    let cursor = CompletionPosition::from_cursor(doc.cursor());
    if cursor != result.position {
      tracing::debug!(
        id = result.request_id,
        result = ?result.position,
        ?cursor,
        "dropping stale completion result"
      );
      self.popup.hide();
      return CompletionDecision::Stale;
    }

    if let [only] = result.candidates.as_slice()
      && only.display_name == scanner::current_hint(doc, comment_token)
    {
      self.popup.hide();
      return CompletionDecision::Empty;
    }

    let count = result.candidates.len();
    if count == 0 {
      self.popup.hide();
      return CompletionDecision::Empty;
    }
    if self.popup.show(result.candidates, now) {
      CompletionDecision::Shown(count)
    } else {
      CompletionDecision::Suppressed
    }
  }

  /// Inserts the selected candidate and, if that completes a keyword,
  /// a trailing space, all as one edit block. Hides the popup. Returns
  /// whether anything was inserted.
  pub fn confirm(&mut self, doc: &mut Document, config: &HighlightConfig) -> Result<bool> {
    let Some(candidate) = self.popup.selected_candidate().cloned() else {
      self.popup.hide();
      return Ok(false);
    };
    self.popup.hide();

    doc.transact(|scope| {
      let at = scope.cursor();
      scope.insert(at, &candidate.insert_text)?;

      let cursor = pos_at_char_idx(scope.text().slice(..), scope.cursor());
      let column = cursor.col as isize - 1;
      let word = scanner::word_at(scope.text(), cursor.row, column);
      if config.is_keyword(&word) {
        let at = scope.cursor();
        scope.insert(at, " ")?;
      }
      Ok(())
    })?;
    tracing::debug!(candidate = %candidate.display_name, "completion confirmed");
    Ok(true)
  }

  pub fn dismiss(&mut self) {
    self.popup.hide();
  }
}
