//! Point hierarchy: the live, editable point set with optional nesting.
//!
//! Top-level points are addressed by their index in insertion order. Indices
//! shift on removal, so an index returned by one edit is only valid until the
//! next one.
//!
//! ```text
//!   nest(i)                         burst(j)
//!   [a, b, c]  ──(b near c)──►  [a, c{b}]  ──►  [a, c, b]
//! ```
//!
//! Each `Point` owns its children by value, so a point lives in exactly one
//! place and cycles cannot be built.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::math::normalize;

/// A point on (or near) the unit sphere, optionally containing other points.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
  pub position: DVec3,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub children: Vec<Point>,
}

impl Point {
  /// Create a leaf at `position`.
  pub fn leaf(position: DVec3) -> Self {
    Self {
      position,
      children: Vec::new(),
    }
  }

  /// A point with at least one child.
  #[inline]
  pub fn is_container(&self) -> bool {
    !self.children.is_empty()
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  /// Longest child chain below this point (a leaf has depth 0).
  pub fn depth(&self) -> usize {
    self
      .children
      .iter()
      .map(|c| 1 + c.depth())
      .max()
      .unwrap_or(0)
  }

  /// This point plus every descendant.
  pub fn subtree_len(&self) -> usize {
    1 + self.children.iter().map(Point::subtree_len).sum::<usize>()
  }
}

impl From<DVec3> for Point {
  fn from(position: DVec3) -> Self {
    Self::leaf(position)
  }
}

/// Result of a successful [`PointHierarchy::nest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NestOutcome {
  /// Post-removal index of the new parent.
  pub parent_index: usize,
}

/// Result of a successful burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurstOutcome {
  /// Number of points appended to the top level.
  pub released: usize,
  /// Index of the first appended point.
  pub first_index: usize,
}

/// Ordered top-level points.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointHierarchy {
  points: Vec<Point>,
}

impl PointHierarchy {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of top-level points.
  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&Point> {
    self.points.get(index)
  }

  pub fn points(&self) -> &[Point] {
    &self.points
  }

  pub fn iter(&self) -> impl Iterator<Item = &Point> {
    self.points.iter()
  }

  /// Append a top-level point.
  pub fn push(&mut self, point: impl Into<Point>) {
    self.points.push(point.into());
  }

  /// Replace the whole top-level sequence.
  pub fn replace_all(&mut self, points: Vec<Point>) {
    self.points = points;
  }

  /// Count of every point reachable by full traversal.
  ///
  /// Nest and burst move points between levels without creating or dropping
  /// any, so this count is preserved by both.
  pub fn total_points(&self) -> usize {
    self.points.iter().map(Point::subtree_len).sum()
  }

  /// Deepest nesting among top-level points.
  pub fn max_depth(&self) -> usize {
    self.points.iter().map(Point::depth).max().unwrap_or(0)
  }

  /// First top-level point within `threshold` of `target`.
  pub fn hit_test(&self, target: DVec3, threshold: f64) -> Option<usize> {
    self
      .points
      .iter()
      .position(|p| p.position.distance(target) < threshold)
  }

  /// First other top-level point within `threshold` of point `index`.
  pub fn nest_candidate(&self, index: usize, threshold: f64) -> Option<usize> {
    let dragged = self.points.get(index)?.position;
    self
      .points
      .iter()
      .enumerate()
      .position(|(j, p)| j != index && p.position.distance(dragged) < threshold)
  }

  /// Nest point `index` into the first other point within `threshold`.
  ///
  /// Returns `None` and leaves the hierarchy untouched when `index` is out of
  /// range or no candidate is close enough.
  pub fn nest(&mut self, index: usize, threshold: f64) -> Option<NestOutcome> {
    let parent = self.nest_candidate(index, threshold)?;
    let child = self.points.remove(index);
    // Removal shifts every later index down by one.
    let parent_index = if index < parent { parent - 1 } else { parent };
    self.points[parent_index].children.push(child);
    tracing::debug!(index, parent_index, "nested point");
    Some(NestOutcome { parent_index })
  }

  /// Move the direct children of point `index` to the top level.
  ///
  /// The children keep their own children; call again on them to go deeper.
  pub fn burst(&mut self, index: usize) -> Option<BurstOutcome> {
    let point = self.points.get_mut(index).filter(|p| p.is_container())?;
    let children = std::mem::take(&mut point.children);
    Some(self.release(index, children))
  }

  /// Flatten the whole subtree of point `index` into the top level.
  ///
  /// Direct children come first, followed by each child's flattened subtree.
  pub fn deep_burst(&mut self, index: usize) -> Option<BurstOutcome> {
    let point = self.points.get_mut(index).filter(|p| p.is_container())?;
    let released = flatten_children(point);
    Some(self.release(index, released))
  }

  fn release(&mut self, index: usize, released: Vec<Point>) -> BurstOutcome {
    let outcome = BurstOutcome {
      released: released.len(),
      first_index: self.points.len(),
    };
    self.points.extend(released);
    tracing::debug!(index, released = outcome.released, "burst point");
    outcome
  }

  /// Move point `index` to the direction `position` (normalized).
  ///
  /// Returns `false` if the index is out of range or `position` is zero.
  pub fn set_position(&mut self, index: usize, position: DVec3) -> bool {
    let position = normalize(position);
    match self.points.get_mut(index) {
      Some(point) if position != DVec3::ZERO => {
        point.position = position;
        true
      }
      _ => false,
    }
  }

  /// Shift point `index` by `delta` in x/y, then renormalize.
  pub fn nudge(&mut self, index: usize, delta: DVec2) -> bool {
    let Some(point) = self.points.get(index) else {
      return false;
    };
    let moved = point.position + delta.extend(0.0);
    self.set_position(index, moved)
  }

  /// Top-level positions as the flat buffer a renderer consumes.
  ///
  /// Containers contribute only their own position.
  pub fn positions(&self) -> Vec<[f32; 3]> {
    self
      .points
      .iter()
      .map(|p| p.position.as_vec3().to_array())
      .collect()
  }
}

impl From<Vec<Point>> for PointHierarchy {
  fn from(points: Vec<Point>) -> Self {
    Self { points }
  }
}

impl FromIterator<DVec3> for PointHierarchy {
  fn from_iter<I: IntoIterator<Item = DVec3>>(iter: I) -> Self {
    Self {
      points: iter.into_iter().map(Point::leaf).collect(),
    }
  }
}

fn flatten_children(point: &mut Point) -> Vec<Point> {
  let mut direct = std::mem::take(&mut point.children);
  let nested: Vec<Point> = direct.iter_mut().flat_map(flatten_children).collect();
  direct.extend(nested);
  direct
}

#[cfg(test)]
#[path = "hierarchy_test.rs"]
mod hierarchy_test;
