//! Debounced async hooks.
//!
//! A hook owns whatever state it needs to coalesce a burst of events (for
//! example keystrokes that each supersede the previous completion request)
//! and is driven by a tokio task that wakes it once the debounce deadline
//! passes without a newer event arriving.

use std::time::Duration;

use futures_executor::block_on;
use tokio::{
  runtime::Handle,
  sync::mpsc::{
    self,
    Sender,
    error::TrySendError,
  },
  time::Instant,
};

/// Upper bound on how long a synchronous sender may block on a full channel.
const SEND_TIMEOUT_MS: u64 = 2;

/// Default channel capacity for [`AsyncHook::spawn`].
const DEFAULT_CAPACITY: usize = 128;

pub trait AsyncHook: Sync + Send + 'static + Sized {
  type Event: Sync + Send + 'static;

  /// Called for every received event. Returns the deadline at which
  /// [`AsyncHook::finish_debounce`] should run, `None` to cancel any
  /// pending deadline, or `timeout` to keep the current one.
  fn handle_event(&mut self, event: Self::Event, timeout: Option<Instant>) -> Option<Instant>;

  /// Called once the debounce deadline is reached.
  fn finish_debounce(&mut self);

  fn spawn(self) -> mpsc::Sender<Self::Event> {
    self.spawn_with_capacity(DEFAULT_CAPACITY)
  }

  /// Spawns the hook on the current tokio runtime. Outside a runtime the
  /// hook is dropped and the returned sender reports a closed channel, which
  /// keeps unrelated synchronous tests free of runtime setup.
  fn spawn_with_capacity(self, capacity: usize) -> mpsc::Sender<Self::Event> {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    if Handle::try_current().is_ok() {
      tokio::spawn(run(self, rx));
    }
    tx
  }
}

async fn run<Hook: AsyncHook>(mut hook: Hook, mut rx: mpsc::Receiver<Hook::Event>) {
  let mut deadline = None;
  loop {
    let event = match deadline {
      Some(deadline_) => {
        match tokio::time::timeout_at(deadline_, rx.recv()).await {
          Ok(event) => event,
          Err(_) => {
            hook.finish_debounce();
            deadline = None;
            continue;
          },
        }
      },
      None => rx.recv().await,
    };
    let Some(event) = event else {
      // Senders are gone; flush whatever is still pending.
      if deadline.is_some() {
        hook.finish_debounce();
      }
      break;
    };
    deadline = hook.handle_event(event, deadline);
  }
}

/// Sends from synchronous code, blocking for at most a couple of
/// milliseconds when the channel is full. The event is dropped after that,
/// or right away when no tokio runtime is around to drive the timeout.
pub fn send_blocking<T>(tx: &Sender<T>, data: T) {
  match tx.try_send(data) {
    Ok(()) => {},
    Err(TrySendError::Full(_)) if Handle::try_current().is_err() => {
      log::warn!("dropping event: hook channel full and no runtime to wait on");
    },
    Err(TrySendError::Full(data)) => {
      if block_on(tx.send_timeout(data, Duration::from_millis(SEND_TIMEOUT_MS))).is_err() {
        log::warn!("dropping event: hook channel stayed full");
      }
    },
    Err(TrySendError::Closed(_)) => {
      log::warn!("attempted to send to closed hook channel");
    },
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    Mutex,
  };

  use super::*;

  /// Keeps only the most recent value and publishes it on debounce.
  struct Latest {
    pending: Option<u32>,
    fired:   Arc<Mutex<Vec<u32>>>,
    delay:   Duration,
  }

  impl AsyncHook for Latest {
    type Event = u32;

    fn handle_event(&mut self, event: u32, _timeout: Option<Instant>) -> Option<Instant> {
      self.pending = Some(event);
      Some(Instant::now() + self.delay)
    }

    fn finish_debounce(&mut self) {
      if let Some(value) = self.pending.take() {
        self.fired.lock().unwrap().push(value);
      }
    }
  }

  #[tokio::test(start_paused = true)]
  async fn burst_collapses_to_last_event() {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let tx = Latest {
      pending: None,
      fired:   fired.clone(),
      delay:   Duration::from_millis(50),
    }
    .spawn();

    for value in 1..=5 {
      tx.send(value).await.unwrap();
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*fired.lock().unwrap(), vec![5]);

    tx.send(9).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*fired.lock().unwrap(), vec![5, 9]);
  }

  #[test]
  fn spawn_outside_runtime_yields_closed_channel() {
    let tx = Latest {
      pending: None,
      fired:   Arc::default(),
      delay:   Duration::ZERO,
    }
    .spawn();
    assert!(tx.is_closed());
    // Must not panic or block.
    send_blocking(&tx, 2);
  }

  #[test]
  fn full_channel_outside_runtime_drops() {
    let (tx, mut rx) = mpsc::channel(1);
    send_blocking(&tx, 1);
    send_blocking(&tx, 2);
    assert_eq!(rx.try_recv().ok(), Some(1));
    assert!(rx.try_recv().is_err());
  }
}
