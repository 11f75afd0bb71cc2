//! EditorConfig - tunables for interaction, loading and history.

use std::time::Duration;

use serde::Deserialize;

use crate::constants::{
  DETAIL_ZOOM, HISTORY_LIMIT, INITIAL_BATCH_SIZE, MAX_ZOOM, MIN_ZOOM, NEST_DEBOUNCE, NEST_THRESHOLD,
  NUDGE_STEP, OVERVIEW_ZOOM, STATUS_LOCK,
};

/// Configuration for an editor session.
///
/// Every field has a default, so a partial TOML table is valid.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
  /// Lower zoom bound.
  pub min_zoom: f64,

  /// Upper zoom bound.
  pub max_zoom: f64,

  /// Zoom at or below which the viewport shows only the original batch.
  pub overview_zoom: f64,

  /// Zoom at or above which the center compartment is added.
  pub detail_zoom: f64,

  /// Grab and nest distance in world units.
  pub nest_threshold: f64,

  /// Hover time before an automatic nest, in milliseconds.
  pub nest_debounce_ms: u64,

  /// Records loaded synchronously at startup.
  pub initial_batch_size: usize,

  /// Undo snapshots retained.
  pub history_limit: usize,

  /// Keyboard nudge step.
  pub nudge_step: f64,

  /// Notification hold time in milliseconds.
  pub status_lock_ms: u64,
}

/// Reasons an [`EditorConfig`] is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
  #[error("zoom range is empty: min {min} > max {max}")]
  ZoomRange { min: f64, max: f64 },
  #[error("overview zoom {overview} must not exceed detail zoom {detail}")]
  DetailBand { overview: f64, detail: f64 },
  #[error("{field} must be positive, got {value}")]
  NotPositive { field: &'static str, value: f64 },
}

impl EditorConfig {
  /// Check ranges, returning the first violation.
  pub fn validate(&self) -> Result<(), ConfigError> {
    for (field, value) in [
      ("min_zoom", self.min_zoom),
      ("nest_threshold", self.nest_threshold),
      ("nudge_step", self.nudge_step),
    ] {
      if !(value > 0.0) {
        return Err(ConfigError::NotPositive { field, value });
      }
    }
    if self.min_zoom > self.max_zoom {
      return Err(ConfigError::ZoomRange {
        min: self.min_zoom,
        max: self.max_zoom,
      });
    }
    if self.overview_zoom > self.detail_zoom {
      return Err(ConfigError::DetailBand {
        overview: self.overview_zoom,
        detail: self.detail_zoom,
      });
    }
    Ok(())
  }

  #[inline]
  pub fn nest_debounce(&self) -> Duration {
    Duration::from_millis(self.nest_debounce_ms)
  }

  #[inline]
  pub fn status_lock(&self) -> Duration {
    Duration::from_millis(self.status_lock_ms)
  }
}

impl Default for EditorConfig {
  fn default() -> Self {
    Self {
      min_zoom: MIN_ZOOM,
      max_zoom: MAX_ZOOM,
      overview_zoom: OVERVIEW_ZOOM,
      detail_zoom: DETAIL_ZOOM,
      nest_threshold: NEST_THRESHOLD,
      nest_debounce_ms: NEST_DEBOUNCE.as_millis() as u64,
      initial_batch_size: INITIAL_BATCH_SIZE,
      history_limit: HISTORY_LIMIT,
      nudge_step: NUDGE_STEP,
      status_lock_ms: STATUS_LOCK.as_millis() as u64,
    }
  }
}
