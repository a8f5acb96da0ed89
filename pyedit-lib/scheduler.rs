//! Deferred buffer updates.
//!
//! Edits only record a timestamp and mark an update as pending. A periodic
//! tick on the editing thread runs the pending update once the buffer has
//! been quiet for the idle threshold:
//!
//! ```text
//!  edit   edit      edit                     tick        tick
//!   |      |         |                        |           |
//!   +------+---------+---- idle threshold ----+ run       + nothing pending
//! ```
//!
//! There is a single pending slot, so any number of requests between two
//! runs collapse into one.

use std::time::{
  Duration,
  Instant,
};

use tokio::time::{
  Interval,
  MissedTickBehavior,
};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(300);
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingUpdate {
  Rehighlight,
}

#[derive(Debug, Clone)]
pub struct UpdateScheduler {
  last_edit:      Option<Instant>,
  pending:        Option<PendingUpdate>,
  idle_threshold: Duration,
  idle_reported:  bool,
}

impl Default for UpdateScheduler {
  fn default() -> Self {
    Self::new(DEFAULT_IDLE_THRESHOLD)
  }
}

impl UpdateScheduler {
  pub fn new(idle_threshold: Duration) -> Self {
    Self {
      last_edit: None,
      pending: None,
      idle_threshold,
      idle_reported: false,
    }
  }

  pub fn note_edit(&mut self, now: Instant) {
    self.last_edit = Some(now);
    self.idle_reported = false;
  }

  /// Marks `update` as pending. Returns `false` if one was already pending
  /// and this request merged into it.
  pub fn request(&mut self, update: PendingUpdate) -> bool {
    self.pending.replace(update).is_none()
  }

  pub fn pending(&self) -> Option<PendingUpdate> {
    self.pending
  }

  pub fn last_edit(&self) -> Option<Instant> {
    self.last_edit
  }

  /// Whether the idle threshold has passed since the last edit. A buffer
  /// that was never edited is idle.
  pub fn is_idle(&self, now: Instant) -> bool {
    self
      .last_edit
      .is_none_or(|edit| now.saturating_duration_since(edit) >= self.idle_threshold)
  }

  /// One scheduler tick. Hands out the pending update if the buffer is
  /// visible and idle, leaving the slot empty.
  pub fn tick(&mut self, now: Instant, visible: bool) -> Option<PendingUpdate> {
    if !visible || !self.is_idle(now) {
      return None;
    }
    let update = self.pending.take()?;
    tracing::debug!(?update, "running deferred update");
    Some(update)
  }

  /// Reports the transition into idleness once per quiet period.
  pub fn take_idle(&mut self, now: Instant) -> bool {
    if self.idle_reported || self.last_edit.is_none() || !self.is_idle(now) {
      return false;
    }
    self.idle_reported = true;
    true
  }
}

/// The timer driving [`UpdateScheduler::tick`]. A late tick is followed by a
/// full period rather than a burst of catch-up ticks.
pub fn tick_interval(period: Duration) -> Interval {
  let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
  interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
  interval
}
