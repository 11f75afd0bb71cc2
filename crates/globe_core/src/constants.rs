//! Fixed constants for the sphere editor.
//!
//! # Compartment Grid
//!
//! ```text
//!   y = +1 ┌────┬────┬────┬ ··· ┬────┐
//!          │ 56 │ 57 │ 58 │     │ 63 │   lat 7
//!          ├────┼────┼────┼ ··· ┼────┤
//!          ·    ·    ·    ·     ·    ·
//!          ├────┼────┼────┼ ··· ┼────┤
//!          │  8 │  9 │ 10 │     │ 15 │   lat 1
//!          ├────┼────┼────┼ ··· ┼────┤
//!          │  0 │  1 │  2 │     │  7 │   lat 0
//!   y = -1 └────┴────┴────┴ ··· ┴────┘
//!        x = -1                   x = +1
//!
//! index = lat * 8 + lon
//! lat   = floor((y + 1) / 2 * 8)  clamped to [0, 7]
//! lon   = floor((x + 1) / 2 * 8)  clamped to [0, 7]
//! ```
//!
//! Only the projected `(x, y)` of a world point selects its compartment; `z`
//! is ignored, so front and back hemisphere points share buckets.

use std::time::Duration;

/// Compartments per grid axis.
pub const GRID_SIZE: usize = 8;

/// Total compartments (8x8 grid).
pub const NUM_COMPARTMENTS: usize = GRID_SIZE * GRID_SIZE; // 64

/// Euclidean distance under which a point can be grabbed or nested.
pub const NEST_THRESHOLD: f64 = 0.05;

/// How long a dragged point must hover over a candidate parent before it nests.
pub const NEST_DEBOUNCE: Duration = Duration::from_millis(1200);

/// Records loaded synchronously before the background pass completes.
pub const INITIAL_BATCH_SIZE: usize = 5000;

/// Determinant magnitude under which a rotation block is treated as singular.
pub const DEGENERATE_DETERMINANT: f64 = 1e-6;

/// Default zoom bounds.
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 3.0;

/// Zoom at or below which only the original batch is shown.
pub const OVERVIEW_ZOOM: f64 = 2.5;

/// Zoom at or above which the center compartment is paged in.
pub const DETAIL_ZOOM: f64 = 3.0;

/// Depth scale of the view matrix (`diag(zoom, zoom, 0.1, 1)`).
pub const VIEW_DEPTH_SCALE: f64 = 0.1;

/// Keyboard nudge step in world units.
pub const NUDGE_STEP: f64 = 0.05;

/// Undo snapshots retained before the oldest is discarded.
pub const HISTORY_LIMIT: usize = 50;

/// How long notification messages hold the status line.
pub const STATUS_LOCK: Duration = Duration::from_millis(1200);

/// Persisted orientation keys.
pub const ZOOM_KEY: &str = "zoomScale";
pub const ROTATION_KEY: &str = "rotation";

/// Map a projected coordinate in `[-1, 1]` to a grid cell in `[0, 7]`.
///
/// Out-of-range and NaN inputs clamp; `+1.0` lands in cell 7, not 8.
#[inline]
pub fn grid_cell(coord: f64) -> usize {
  let cell = ((coord + 1.0) / 2.0 * GRID_SIZE as f64).floor();
  if cell.is_nan() {
    return 0;
  }
  cell.clamp(0.0, (GRID_SIZE - 1) as f64) as usize
}

/// Combine grid cells into a compartment index.
#[inline]
pub const fn compartment_index(lat: usize, lon: usize) -> usize {
  lat * GRID_SIZE + lon
}

/// Split a compartment index into `(lat, lon)`.
#[inline]
pub const fn compartment_cells(index: usize) -> (usize, usize) {
  (index / GRID_SIZE, index % GRID_SIZE)
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
