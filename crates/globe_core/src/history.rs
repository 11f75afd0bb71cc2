//! Undo/redo history of full hierarchy snapshots.
//!
//! Snapshots are deep copies: `PointHierarchy` owns its whole tree, so a
//! `clone()` shares nothing with the live hierarchy and later edits can never
//! reach back into a stored snapshot.

use std::collections::VecDeque;

use crate::constants::HISTORY_LIMIT;
use crate::hierarchy::PointHierarchy;

/// Enabled state of the undo/redo controls, for the external UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistoryControls {
  pub can_undo: bool,
  pub can_redo: bool,
}

/// Two bounded snapshot stacks.
#[derive(Clone, Debug)]
pub struct History {
  undo: VecDeque<PointHierarchy>,
  redo: Vec<PointHierarchy>,
  limit: usize,
}

impl History {
  pub fn new() -> Self {
    Self::with_limit(HISTORY_LIMIT)
  }

  /// Create a history retaining at most `limit` undo snapshots (minimum 1).
  pub fn with_limit(limit: usize) -> Self {
    let limit = limit.max(1);
    Self {
      undo: VecDeque::with_capacity(limit),
      redo: Vec::new(),
      limit,
    }
  }

  /// Snapshot `current` before a new edit is applied, clearing redo.
  pub fn record_before_edit(&mut self, current: &PointHierarchy) {
    self.push_undo(current.clone());
    self.redo.clear();
  }

  /// Step back: returns the previous state and stores `current` for redo.
  ///
  /// Returns `None` when there is nothing to undo.
  pub fn undo(&mut self, current: &PointHierarchy) -> Option<PointHierarchy> {
    let previous = self.undo.pop_back()?;
    self.redo.push(current.clone());
    Some(previous)
  }

  /// Step forward: returns the next state and stores `current` for undo.
  pub fn redo(&mut self, current: &PointHierarchy) -> Option<PointHierarchy> {
    let next = self.redo.pop()?;
    self.push_undo(current.clone());
    Some(next)
  }

  pub fn can_undo(&self) -> bool {
    !self.undo.is_empty()
  }

  pub fn can_redo(&self) -> bool {
    !self.redo.is_empty()
  }

  pub fn controls(&self) -> HistoryControls {
    HistoryControls {
      can_undo: self.can_undo(),
      can_redo: self.can_redo(),
    }
  }

  pub fn undo_len(&self) -> usize {
    self.undo.len()
  }

  pub fn redo_len(&self) -> usize {
    self.redo.len()
  }

  fn push_undo(&mut self, snapshot: PointHierarchy) {
    if self.undo.len() >= self.limit {
      self.undo.pop_front();
    }
    self.undo.push_back(snapshot);
  }
}

impl Default for History {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;
