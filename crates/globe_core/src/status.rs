//! Single-line status text with a hold timer.

use std::time::Duration;

// WASM compat: use web_time::Instant, NOT std::time::Instant
use web_time::Instant;

/// Status line. A message written with a non-zero lock cannot be replaced
/// until the lock expires; writes during the lock are dropped, not queued.
#[derive(Clone, Debug, Default)]
pub struct StatusLine {
  text: String,
  locked_until: Option<Instant>,
}

impl StatusLine {
  pub fn new() -> Self {
    Self::default()
  }

  /// Write `message` unless locked. Returns whether it was shown.
  pub fn update(&mut self, message: impl Into<String>, lock: Duration, now: Instant) -> bool {
    if self.is_locked(now) {
      return false;
    }
    self.text = message.into();
    self.locked_until = (!lock.is_zero()).then(|| now + lock);
    true
  }

  pub fn is_locked(&self, now: Instant) -> bool {
    self.locked_until.is_some_and(|until| now < until)
  }

  pub fn text(&self) -> &str {
    &self.text
  }
}
