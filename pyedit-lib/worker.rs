//! Background completion worker.
//!
//! Requests arrive on a bounded channel and are debounced: within a burst of
//! keystrokes only the newest request survives. The engine then runs on the
//! blocking pool, and results flow back on an unbounded channel that the
//! editing thread drains at its own pace.
//!
//! Every request bumps a shared "latest id". A request that is no longer the
//! latest when its turn comes is skipped, and an answer computed for a
//! request that was superseded meanwhile is thrown away.

use std::{
  sync::{
    Arc,
    atomic::{
      AtomicU64,
      Ordering,
    },
  },
  time::Duration,
};

use pyedit_event::AsyncHook;
use ropey::Rope;
use tokio::{
  sync::mpsc::{
    self,
    Sender,
    UnboundedReceiver,
    UnboundedSender,
  },
  time::Instant,
};

use crate::completion::{
  CompletionCandidate,
  CompletionPosition,
  CompletionRequest,
  CompletionResult,
};

/// The code-analysis collaborator. May take arbitrarily long.
pub trait CompletionEngine: Send + Sync + 'static {
  fn complete(&self, text: &Rope, position: CompletionPosition) -> Vec<CompletionCandidate>;
}

impl<F> CompletionEngine for F
where
  F: Fn(&Rope, CompletionPosition) -> Vec<CompletionCandidate> + Send + Sync + 'static,
{
  fn complete(&self, text: &Rope, position: CompletionPosition) -> Vec<CompletionCandidate> {
    self(text, position)
  }
}

pub struct CompletionWorker<E> {
  engine:   Arc<E>,
  pending:  Option<CompletionRequest>,
  latest:   Arc<AtomicU64>,
  debounce: Duration,
  results:  UnboundedSender<CompletionResult>,
}

impl<E: CompletionEngine> CompletionWorker<E> {
  pub fn new(engine: E, debounce: Duration, results: UnboundedSender<CompletionResult>) -> Self {
    Self {
      engine: Arc::new(engine),
      pending: None,
      latest: Arc::new(AtomicU64::new(0)),
      debounce,
      results,
    }
  }
}

impl<E: CompletionEngine> AsyncHook for CompletionWorker<E> {
  type Event = CompletionRequest;

  fn handle_event(&mut self, request: Self::Event, _timeout: Option<Instant>) -> Option<Instant> {
    self.latest.store(request.id, Ordering::Release);
    if let Some(superseded) = self.pending.replace(request) {
      tracing::trace!(id = superseded.id, "completion request superseded");
    }
    Some(Instant::now() + self.debounce)
  }

  fn finish_debounce(&mut self) {
    let Some(request) = self.pending.take() else {
      return;
    };
    let engine = self.engine.clone();
    let latest = self.latest.clone();
    let results = self.results.clone();

    tokio::task::spawn_blocking(move || {
      let is_latest = || latest.load(Ordering::Acquire) == request.id;
      if !is_latest() {
        return;
      }
      let candidates = engine.complete(&request.snapshot, request.position);
      if !is_latest() {
        tracing::debug!(id = request.id, "discarding completion for superseded request");
        return;
      }
      tracing::debug!(
        id = request.id,
        candidates = candidates.len(),
        elapsed = ?request.issued_at.elapsed(),
        "completion ready"
      );
      let result = CompletionResult {
        request_id: request.id,
        position: request.position,
        candidates,
      };
      if results.send(result).is_err() {
        tracing::warn!("completion result receiver is gone");
      }
    });
  }
}

/// Spawns a worker for `engine` on the current tokio runtime and returns the
/// request sender and result receiver. Outside a runtime the sender reports
/// a closed channel and no result ever arrives.
pub fn spawn_completion_worker<E: CompletionEngine>(
  engine: E,
  debounce: Duration,
) -> (Sender<CompletionRequest>, UnboundedReceiver<CompletionResult>) {
  let (results_tx, results_rx) = mpsc::unbounded_channel();
  let requests = CompletionWorker::new(engine, debounce, results_tx).spawn();
  (requests, results_rx)
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;

  use super::*;

  fn request(id: u64, text: &str, column: usize) -> CompletionRequest {
    CompletionRequest {
      id,
      position: CompletionPosition::new(1, column),
      snapshot: Rope::from(text),
      issued_at: std::time::Instant::now(),
    }
  }

  fn counting_engine(
    calls: Arc<AtomicUsize>,
  ) -> impl Fn(&Rope, CompletionPosition) -> Vec<CompletionCandidate> + Send + Sync + 'static {
    move |text: &Rope, position: CompletionPosition| {
      calls.fetch_add(1, Ordering::SeqCst);
      vec![CompletionCandidate::new(
        text.to_string(),
        position.column.to_string(),
      )]
    }
  }

  #[tokio::test(start_paused = true)]
  async fn burst_resolves_to_latest_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) =
      spawn_completion_worker(counting_engine(calls.clone()), Duration::from_millis(20));

    tx.send(request(1, "o", 1)).await.unwrap();
    tx.send(request(2, "os", 2)).await.unwrap();
    tx.send(request(3, "os.", 3)).await.unwrap();

    let result = rx.recv().await.unwrap();
    assert_eq!(result.request_id, 3);
    assert_eq!(result.position, CompletionPosition::new(1, 3));
    assert_eq!(result.candidates, vec![CompletionCandidate::new("os.", "3")]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn spaced_requests_each_get_an_answer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) =
      spawn_completion_worker(counting_engine(calls.clone()), Duration::from_millis(20));

    tx.send(request(1, "a", 1)).await.unwrap();
    assert_eq!(rx.recv().await.unwrap().request_id, 1);
    tx.send(request(2, "ab", 2)).await.unwrap();
    assert_eq!(rx.recv().await.unwrap().request_id, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn dropped_receiver_does_not_panic() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = spawn_completion_worker(counting_engine(calls), Duration::ZERO);
    drop(rx);
    tx.send(request(1, "x", 1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!tx.is_closed());
  }

  #[test]
  fn outside_runtime_channel_is_closed() {
    let (tx, _rx) = spawn_completion_worker(
      |_: &Rope, _: CompletionPosition| Vec::<CompletionCandidate>::new(),
      Duration::from_millis(20),
    );
    assert!(tx.is_closed());
  }
}
