//! Event plumbing shared by the editing core.
//!
//! - [`AsyncHook`]: a debounced background task fed through a channel.
//! - [`EventBus`]: synchronous, ordered dispatch of editor events to handlers
//!   owned by whoever holds the bus.

mod bus;
mod debounce;

pub use bus::{
  EventBus,
  HandlerId,
};
pub use debounce::{
  AsyncHook,
  send_blocking,
};
