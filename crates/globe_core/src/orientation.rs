//! Orientation state: the rotation and zoom of the view.
//!
//! The values are kept clamped at all times. `rotation_x` tilts toward the
//! poles and stops at +/- pi/2, `rotation_y` spins freely.

use std::f64::consts::FRAC_PI_2;

use crate::config::EditorConfig;
use crate::constants::{MAX_ZOOM, MIN_ZOOM, ROTATION_KEY, ZOOM_KEY};
use crate::error::StoreError;
use crate::store::KeyValueStore;

/// Inclusive zoom bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomLimits {
  pub min: f64,
  pub max: f64,
}

impl ZoomLimits {
  #[inline]
  pub fn clamp(&self, zoom: f64) -> f64 {
    let zoom = if zoom.is_nan() { 1.0 } else { zoom };
    // Does not panic on an inverted range.
    zoom.max(self.min).min(self.max)
  }
}

impl Default for ZoomLimits {
  fn default() -> Self {
    Self {
      min: MIN_ZOOM,
      max: MAX_ZOOM,
    }
  }
}

impl From<&EditorConfig> for ZoomLimits {
  fn from(config: &EditorConfig) -> Self {
    Self {
      min: config.min_zoom,
      max: config.max_zoom,
    }
  }
}

/// Current view orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
  rotation_x: f64,
  rotation_y: f64,
  zoom_scale: f64,
  limits: ZoomLimits,
}

impl Orientation {
  /// Create a clamped orientation.
  pub fn new(rotation_x: f64, rotation_y: f64, zoom_scale: f64, limits: ZoomLimits) -> Self {
    let mut o = Self {
      rotation_x: 0.0,
      rotation_y: 0.0,
      zoom_scale: limits.clamp(1.0),
      limits,
    };
    o.set_rotation(rotation_x, rotation_y);
    o.set_zoom(zoom_scale);
    o
  }

  #[inline]
  pub fn rotation_x(&self) -> f64 {
    self.rotation_x
  }

  #[inline]
  pub fn rotation_y(&self) -> f64 {
    self.rotation_y
  }

  #[inline]
  pub fn zoom_scale(&self) -> f64 {
    self.zoom_scale
  }

  #[inline]
  pub fn limits(&self) -> ZoomLimits {
    self.limits
  }

  pub fn set_rotation(&mut self, rotation_x: f64, rotation_y: f64) {
    self.rotation_x = finite(rotation_x, self.rotation_x).clamp(-FRAC_PI_2, FRAC_PI_2);
    self.rotation_y = finite(rotation_y, self.rotation_y);
  }

  /// Add a rotation delta (drag-to-rotate).
  pub fn rotate_by(&mut self, dx: f64, dy: f64) {
    self.set_rotation(self.rotation_x + dx, self.rotation_y + dy);
  }

  /// Set the zoom, clamped to the limits.
  pub fn set_zoom(&mut self, zoom: f64) {
    self.zoom_scale = self.limits.clamp(zoom);
  }

  /// Restore from `kv`, falling back to zoom 1 and rotation (0, 0).
  pub fn load(kv: &dyn KeyValueStore, limits: ZoomLimits) -> Self {
    let zoom = kv
      .get(ZOOM_KEY)
      .and_then(|s| s.trim().parse::<f64>().ok())
      .filter(|z| z.is_finite())
      .unwrap_or(1.0);
    let (rx, ry) = kv
      .get(ROTATION_KEY)
      .and_then(|s| parse_rotation(&s))
      .unwrap_or((0.0, 0.0));
    Self::new(rx, ry, zoom, limits)
  }

  /// Persist zoom and rotation to `kv`.
  pub fn save(&self, kv: &dyn KeyValueStore) -> Result<(), StoreError> {
    kv.set(ZOOM_KEY, &self.zoom_scale.to_string())?;
    kv.set(ROTATION_KEY, &format!("{},{}", self.rotation_x, self.rotation_y))
  }
}

impl Default for Orientation {
  fn default() -> Self {
    Self::new(0.0, 0.0, 1.0, ZoomLimits::default())
  }
}

fn finite(value: f64, fallback: f64) -> f64 {
  if value.is_finite() {
    value
  } else {
    fallback
  }
}

// Accepts "x,y" and the bracketed "[x,y]" form.
fn parse_rotation(s: &str) -> Option<(f64, f64)> {
  let s = s.trim().trim_start_matches('[').trim_end_matches(']');
  let (x, y) = s.split_once(',')?;
  let x = x.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
  let y = y.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
  Some((x, y))
}
