//! Ordered, synchronous event dispatch.
//!
//! The bus is an ordinary value owned by the component that emits events.
//! There is no process-wide registry: two editors never see each other's
//! handlers. Handlers run on the calling thread, in registration order, and
//! a failing handler does not prevent the remaining ones from running.

use std::fmt;

type Handler<E> = Box<dyn FnMut(&E) -> anyhow::Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

pub struct EventBus<E> {
  handlers: Vec<(HandlerId, Handler<E>)>,
  next_id:  u64,
}

impl<E> Default for EventBus<E> {
  fn default() -> Self {
    Self {
      handlers: Vec::new(),
      next_id:  0,
    }
  }
}

impl<E> fmt::Debug for EventBus<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventBus")
      .field("handlers", &self.handlers.len())
      .finish()
  }
}

impl<E: fmt::Debug> EventBus<E> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<F>(&mut self, handler: F) -> HandlerId
  where
    F: FnMut(&E) -> anyhow::Result<()> + 'static,
  {
    let id = HandlerId(self.next_id);
    self.next_id += 1;
    self.handlers.push((id, Box::new(handler)));
    id
  }

  /// Removes a handler. Returns false if it was already gone.
  pub fn unregister(&mut self, id: HandlerId) -> bool {
    let before = self.handlers.len();
    self.handlers.retain(|(handler_id, _)| *handler_id != id);
    self.handlers.len() != before
  }

  /// Runs every handler for `event` and returns how many succeeded.
  pub fn dispatch(&mut self, event: &E) -> usize {
    let mut ok = 0;
    for (id, handler) in &mut self.handlers {
      match handler(event) {
        Ok(()) => ok += 1,
        Err(err) => log::warn!("event handler {id:?} failed on {event:?}: {err:#}"),
      }
    }
    ok
  }

  pub fn len(&self) -> usize {
    self.handlers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handlers.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::RefCell,
    rc::Rc,
  };

  use super::*;

  #[derive(Debug)]
  enum Ping {
    A,
    B,
  }

  #[test]
  fn handlers_run_in_registration_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut bus = EventBus::new();
    for name in ["first", "second", "third"] {
      let log = log.clone();
      bus.register(move |event: &Ping| {
        log.borrow_mut().push(format!("{name}:{event:?}"));
        Ok(())
      });
    }

    assert_eq!(bus.dispatch(&Ping::A), 3);
    assert_eq!(*log.borrow(), vec!["first:A", "second:A", "third:A"]);
  }

  #[test]
  fn failing_handler_does_not_stop_dispatch() {
    let hits = Rc::new(RefCell::new(0));
    let mut bus = EventBus::new();
    bus.register(|_: &Ping| anyhow::bail!("boom"));
    let counter = hits.clone();
    bus.register(move |_: &Ping| {
      *counter.borrow_mut() += 1;
      Ok(())
    });

    assert_eq!(bus.dispatch(&Ping::B), 1);
    assert_eq!(*hits.borrow(), 1);
  }

  #[test]
  fn unregister_removes_only_that_handler() {
    let mut bus = EventBus::<Ping>::new();
    let a = bus.register(|_| Ok(()));
    let _b = bus.register(|_| Ok(()));
    assert!(bus.unregister(a));
    assert!(!bus.unregister(a));
    assert_eq!(bus.len(), 1);
  }
}
