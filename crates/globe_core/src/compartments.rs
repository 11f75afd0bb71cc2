//! Spatial partition index: 64 compartments over the projected `(x, y)` extent.
//!
//! See [`crate::constants`] for the grid layout. A `CompartmentIndex` is built
//! wholesale (by the background loader or [`CompartmentIndex::bucket_all`]) and
//! replaced wholesale; it is never partially invalidated.

use glam::DVec3;
use rayon::prelude::*;

use crate::constants::{compartment_index, grid_cell, NUM_COMPARTMENTS};

/// Compartment of a world point. Total and deterministic; always `< 64`.
#[inline]
pub fn compartment_index_of(point: DVec3) -> usize {
  compartment_index(grid_cell(point.y), grid_cell(point.x))
}

/// Fixed array of 64 unordered point buckets.
#[derive(Clone, Debug, PartialEq)]
pub struct CompartmentIndex {
  buckets: [Vec<DVec3>; NUM_COMPARTMENTS],
}

impl CompartmentIndex {
  /// Create an index with 64 empty compartments.
  pub fn new() -> Self {
    Self {
      buckets: std::array::from_fn(|_| Vec::new()),
    }
  }

  /// Assign every point to exactly one compartment (parallel).
  #[tracing::instrument(skip_all, fields(points = points.len()))]
  pub fn bucket_all(points: &[DVec3]) -> Self {
    points
      .par_iter()
      .fold(Self::new, |mut index, &p| {
        index.insert(p);
        index
      })
      .reduce(Self::new, |mut a, b| {
        a.merge(b);
        a
      })
  }

  /// Insert one point, returning the compartment it landed in.
  #[inline]
  pub fn insert(&mut self, point: DVec3) -> usize {
    let idx = compartment_index_of(point);
    self.buckets[idx].push(point);
    idx
  }

  /// Move all points of `other` into `self`.
  pub fn merge(&mut self, other: Self) {
    for (dst, src) in self.buckets.iter_mut().zip(other.buckets) {
      if dst.is_empty() {
        *dst = src;
      } else {
        dst.extend(src);
      }
    }
  }

  /// Points in compartment `idx` (empty for out-of-range indices).
  pub fn get(&self, idx: usize) -> &[DVec3] {
    self.buckets.get(idx).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Number of points in compartment `idx`.
  pub fn len_of(&self, idx: usize) -> usize {
    self.get(idx).len()
  }

  /// Total points across all compartments.
  pub fn total_points(&self) -> usize {
    self.buckets.iter().map(Vec::len).sum()
  }

  /// Check if every compartment is empty.
  pub fn is_empty(&self) -> bool {
    self.buckets.iter().all(Vec::is_empty)
  }

  /// Per-compartment point counts.
  pub fn occupancy(&self) -> [usize; NUM_COMPARTMENTS] {
    std::array::from_fn(|i| self.buckets[i].len())
  }

  /// Iterate `(index, points)` over all 64 compartments.
  pub fn iter(&self) -> impl Iterator<Item = (usize, &[DVec3])> {
    self.buckets.iter().map(Vec::as_slice).enumerate()
  }
}

impl Default for CompartmentIndex {
  fn default() -> Self {
    Self::new()
  }
}

impl Extend<DVec3> for CompartmentIndex {
  fn extend<I: IntoIterator<Item = DVec3>>(&mut self, iter: I) {
    for p in iter {
      self.insert(p);
    }
  }
}

impl FromIterator<DVec3> for CompartmentIndex {
  fn from_iter<I: IntoIterator<Item = DVec3>>(iter: I) -> Self {
    let mut index = Self::new();
    index.extend(iter);
    index
  }
}

#[cfg(test)]
#[path = "compartments_test.rs"]
mod compartments_test;
