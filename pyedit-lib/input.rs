//! Input event types for editor dispatch.

use bitflags::bitflags;

bitflags! {
  #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
  pub struct Modifiers: u8 {
    const CTRL  = 0b0000_0001;
    const ALT   = 0b0000_0010;
    const SHIFT = 0b0000_0100;
  }
}

impl Modifiers {
  #[must_use]
  pub const fn ctrl(self) -> bool {
    self.contains(Self::CTRL)
  }

  #[must_use]
  pub const fn alt(self) -> bool {
    self.contains(Self::ALT)
  }

  #[must_use]
  pub const fn shift(self) -> bool {
    self.contains(Self::SHIFT)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
  Char(char),
  Enter,
  Escape,
  Backspace,
  Tab,
  /// Shift+Tab as most toolkits report it.
  BackTab,
  Delete,
  Home,
  End,
  Left,
  Right,
  Up,
  Down,
  Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
  pub key:       Key,
  pub modifiers: Modifiers,
}

impl KeyEvent {
  pub const fn new(key: Key, modifiers: Modifiers) -> Self {
    Self { key, modifiers }
  }

  pub const fn plain(key: Key) -> Self {
    Self::new(key, Modifiers::empty())
  }

  pub const fn char(ch: char) -> Self {
    Self::plain(Key::Char(ch))
  }

  pub const fn ctrl(ch: char) -> Self {
    Self::new(Key::Char(ch), Modifiers::CTRL)
  }

  /// Whether this is `ch` with Ctrl as the only modifier.
  pub fn is_ctrl_char(&self, ch: char) -> bool {
    self.modifiers == Modifiers::CTRL && self.key == Key::Char(ch)
  }
}

impl From<Key> for KeyEvent {
  fn from(key: Key) -> Self {
    Self::plain(key)
  }
}

/// Whether the editor consumed a key. An ignored key is left for the host
/// (for example to move focus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOutcome {
  #[default]
  Continue,
  Handled,
}
