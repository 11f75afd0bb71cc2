//! Viewport loader: decides which points are live for the current view.
//!
//! Zoomed out, only the original batch is shown. Zoomed in past the detail
//! threshold, the compartment under the screen center is paged in ahead of
//! the original batch. Between the two thresholds the previous choice is
//! kept.
//!
//! ```text
//!   zoom  0.5 ──────────── 2.5 ░░░░░ 3.0 ─────
//!         Overview         keep prior   Detail
//! ```

use smallvec::{smallvec, SmallVec};

use crate::compartments::{compartment_index_of, CompartmentIndex};
use crate::config::EditorConfig;
use crate::constants::{DETAIL_ZOOM, OVERVIEW_ZOOM};
use crate::hierarchy::Point;
use crate::orientation::Orientation;
use crate::transform::TransformEngine;

/// Status text shown when a detail compartment is paged in.
pub const MORE_POINTS_MESSAGE: &str = "More points being added";

/// Which points make up the live set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewPolicy {
  /// Original batch only.
  #[default]
  Overview,
  /// One compartment followed by the original batch.
  Detail { compartment: usize },
}

/// Result of [`ViewportLoader::visible_compartments`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibleSet {
  pub policy: ViewPolicy,
  /// Compartments paged in on top of the original batch.
  pub compartments: SmallVec<[usize; 4]>,
  /// The caller should report [`MORE_POINTS_MESSAGE`].
  pub notify: bool,
}

/// Holds the original batch and the latest compartment index.
#[derive(Debug)]
pub struct ViewportLoader {
  original: Vec<Point>,
  compartments: Option<CompartmentIndex>,
  policy: ViewPolicy,
  // Set when an install lands while a detail set is live.
  stale: bool,
  overview_zoom: f64,
  detail_zoom: f64,
}

impl ViewportLoader {
  pub fn new(original: Vec<Point>) -> Self {
    Self {
      original,
      compartments: None,
      policy: ViewPolicy::Overview,
      stale: false,
      overview_zoom: OVERVIEW_ZOOM,
      detail_zoom: DETAIL_ZOOM,
    }
  }

  pub fn with_config(original: Vec<Point>, config: &EditorConfig) -> Self {
    Self {
      overview_zoom: config.overview_zoom,
      detail_zoom: config.detail_zoom,
      ..Self::new(original)
    }
  }

  /// Replace the original batch. The current policy is left as is.
  pub fn set_original(&mut self, original: Vec<Point>) {
    self.original = original;
  }

  pub fn original(&self) -> &[Point] {
    &self.original
  }

  pub fn compartments(&self) -> Option<&CompartmentIndex> {
    self.compartments.as_ref()
  }

  pub fn policy(&self) -> ViewPolicy {
    self.policy
  }

  /// Replace the compartment index wholesale.
  pub fn install(&mut self, index: CompartmentIndex) {
    tracing::debug!(points = index.total_points(), "installed compartment index");
    self.compartments = Some(index);
    if matches!(self.policy, ViewPolicy::Detail { .. }) {
      self.stale = true;
    }
  }

  /// Decide the policy for `orientation` without applying it.
  pub fn visible_compartments(&self, orientation: &Orientation) -> VisibleSet {
    let zoom = orientation.zoom_scale();
    let policy = if zoom <= self.overview_zoom {
      ViewPolicy::Overview
    } else if zoom >= self.detail_zoom {
      let center = TransformEngine::screen_center_world(orientation);
      ViewPolicy::Detail {
        compartment: compartment_index_of(center),
      }
    } else {
      self.policy
    };
    let compartments = match policy {
      ViewPolicy::Overview => SmallVec::new(),
      ViewPolicy::Detail { compartment } => smallvec![compartment],
    };
    VisibleSet {
      policy,
      compartments,
      notify: zoom >= self.detail_zoom,
    }
  }

  /// Adopt `visible`, returning the new live set if it differs from the current one.
  pub fn apply(&mut self, visible: &VisibleSet) -> Option<Vec<Point>> {
    if visible.policy == self.policy && !self.stale {
      return None;
    }
    self.policy = visible.policy;
    self.stale = false;

    let mut points = Vec::new();
    if let Some(index) = &self.compartments {
      for &c in &visible.compartments {
        points.extend(index.get(c).iter().copied().map(Point::leaf));
      }
    }
    points.extend(self.original.iter().cloned());
    tracing::debug!(policy = ?self.policy, live = points.len(), "viewport live set replaced");
    Some(points)
  }

  /// [`visible_compartments`](Self::visible_compartments) then [`apply`](Self::apply).
  pub fn refresh(&mut self, orientation: &Orientation) -> Option<Vec<Point>> {
    let visible = self.visible_compartments(orientation);
    self.apply(&visible)
  }
}

impl Default for ViewportLoader {
  fn default() -> Self {
    Self::new(Vec::new())
  }
}
