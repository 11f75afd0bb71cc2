//! Editor session: one interactive editing context.
//!
//! The session owns the live hierarchy, its history, the orientation, focus,
//! drag state and the viewport loader. The host feeds it input events and a
//! clock, and hands it a [`Renderer`] to draw into.
//!
//! # Usage
//!
//! ```ignore
//! let mut session = EditorSession::open(config, store.as_ref(), kv)?;
//! let mut loader = BackgroundLoader::spawn(store);
//!
//! // Each frame
//! if let Some(response) = loader.poll() {
//!     session.apply_worker_response(response);
//! }
//! session.tick(Instant::now());
//! session.render(&mut renderer);
//! ```
//!
//! Time only enters through [`EditorSession::tick`] and
//! [`EditorSession::drag_move`]. Everything else uses the last time seen.

use std::sync::Arc;
use std::time::Duration;

use glam::{DMat4, DVec2};
use web_time::Instant;

use crate::config::EditorConfig;
use crate::error::LoadError;
use crate::hierarchy::{BurstOutcome, NestOutcome, Point, PointHierarchy};
use crate::history::{History, HistoryControls};
use crate::loader::{initial_load, WorkerResponse};
use crate::math::to_gpu_matrix;
use crate::orientation::{Orientation, ZoomLimits};
use crate::status::StatusLine;
use crate::store::{KeyValueStore, PointStore};
use crate::transform::{TransformEngine, Viewport};
use crate::viewport::{ViewportLoader, MORE_POINTS_MESSAGE};

pub const NESTED_MESSAGE: &str = "Nested a dot";
pub const BURST_MESSAGE: &str = "Bursted a dot";
pub const UNDO_MESSAGE: &str = "Undo action performed";
pub const REDO_MESSAGE: &str = "Redo action performed";

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderFrame {
  /// Top-level positions, three floats per point.
  pub positions: Vec<[f32; 3]>,
  /// Column-major view * rotation matrix.
  pub matrix: [f32; 16],
  /// Index of the highlighted point.
  pub focused: Option<usize>,
}

/// Draw-call consumer.
pub trait Renderer {
  fn draw(&mut self, frame: &RenderFrame);
}

/// Keyboard nudge directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NudgeDirection {
  Up,
  Down,
  Left,
  Right,
}

impl NudgeDirection {
  fn delta(self, step: f64) -> DVec2 {
    match self {
      Self::Up => DVec2::new(0.0, step),
      Self::Down => DVec2::new(0.0, -step),
      Self::Left => DVec2::new(-step, 0.0),
      Self::Right => DVec2::new(step, 0.0),
    }
  }
}

#[derive(Clone, Copy, Debug)]
struct Drag {
  index: usize,
  // Captured at drag start; rotation does not change mid-drag.
  inverse: DMat4,
}

pub struct EditorSession {
  config: EditorConfig,
  hierarchy: PointHierarchy,
  history: History,
  orientation: Orientation,
  kv: Arc<dyn KeyValueStore>,
  focused: Option<usize>,
  drag: Option<Drag>,
  /// Deadline of the single outstanding nest check.
  pending_nest: Option<Instant>,
  status: StatusLine,
  viewport: ViewportLoader,
  /// Skip the position readout on the next render.
  custom_action: bool,
  now: Instant,
}

impl EditorSession {
  /// Start a session over `initial` using orientation persisted in `kv`.
  pub fn new(config: EditorConfig, kv: Arc<dyn KeyValueStore>, initial: Vec<Point>) -> Self {
    let orientation = Orientation::load(kv.as_ref(), ZoomLimits::from(&config));
    let focused = (!initial.is_empty()).then_some(0);
    let mut session = Self {
      history: History::with_limit(config.history_limit),
      viewport: ViewportLoader::with_config(initial.clone(), &config),
      hierarchy: PointHierarchy::from(initial),
      orientation,
      kv,
      focused,
      drag: None,
      pending_nest: None,
      status: StatusLine::new(),
      custom_action: false,
      now: Instant::now(),
      config,
    };
    session.refresh_viewport();
    session
  }

  /// Load the initial batch from `store` and start a session over it.
  pub fn open(config: EditorConfig, store: &dyn PointStore, kv: Arc<dyn KeyValueStore>) -> Result<Self, LoadError> {
    let initial = initial_load(store, config.initial_batch_size)?;
    Ok(Self::new(config, kv, initial))
  }

  // ===========================================================================
  // Accessors
  // ===========================================================================

  pub fn hierarchy(&self) -> &PointHierarchy {
    &self.hierarchy
  }

  pub fn orientation(&self) -> &Orientation {
    &self.orientation
  }

  pub fn focused(&self) -> Option<usize> {
    self.focused
  }

  pub fn is_dragging(&self) -> bool {
    self.drag.is_some()
  }

  pub fn has_pending_nest(&self) -> bool {
    self.pending_nest.is_some()
  }

  pub fn history_controls(&self) -> HistoryControls {
    self.history.controls()
  }

  pub fn status(&self) -> &str {
    self.status.text()
  }

  pub fn viewport(&self) -> &ViewportLoader {
    &self.viewport
  }

  pub fn config(&self) -> &EditorConfig {
    &self.config
  }

  // ===========================================================================
  // Drag and nest-on-hover
  // ===========================================================================

  /// Grab the first point under `device`. Returns whether a point was hit.
  pub fn start_drag(&mut self, device: DVec2, viewport: Viewport) -> bool {
    let inverse = TransformEngine::inverse_rotation(&self.orientation);
    let Some(world) = TransformEngine::pick(device, viewport, &self.orientation, inverse) else {
      return false;
    };
    let Some(index) = self.hierarchy.hit_test(world, self.config.nest_threshold) else {
      return false;
    };
    self.focused = Some(index);
    self.history.record_before_edit(&self.hierarchy);
    self.drag = Some(Drag { index, inverse });
    self.pending_nest = None;
    tracing::debug!(index, "drag started");
    true
  }

  /// Move the dragged point under `device` and restart the nest timer.
  ///
  /// Positions off the sphere leave the point where it was. Returns whether
  /// the point moved.
  pub fn drag_move(&mut self, device: DVec2, viewport: Viewport, now: Instant) -> bool {
    self.now = now;
    let Some(drag) = self.drag else {
      return false;
    };
    let moved = TransformEngine::screen_to_world(device, viewport, self.orientation.zoom_scale())
      .map(|v| TransformEngine::world_to_view(v, drag.inverse))
      .is_some_and(|world| self.hierarchy.set_position(drag.index, world));
    self.pending_nest = Some(now + self.config.nest_debounce());
    moved
  }

  /// Release the drag and cancel any pending nest.
  pub fn end_drag(&mut self) {
    self.drag = None;
    self.pending_nest = None;
  }

  /// Advance the clock; fires the pending nest once its deadline has passed.
  ///
  /// A successful nest ends the drag: the grabbed point now lives inside its
  /// parent, and later moves must not carry the parent along.
  pub fn tick(&mut self, now: Instant) -> Option<NestOutcome> {
    self.now = now;
    let deadline = self.pending_nest?;
    if now < deadline {
      return None;
    }
    self.pending_nest = None;
    let drag = self.drag?;
    // The snapshot taken at drag start already covers this edit.
    let outcome = self.hierarchy.nest(drag.index, self.config.nest_threshold)?;
    self.drag = None;
    self.after_nest(outcome);
    Some(outcome)
  }

  // ===========================================================================
  // Structural edits
  // ===========================================================================

  /// Nest the focused point into its first neighbor within the threshold.
  pub fn nest_focused(&mut self) -> Option<NestOutcome> {
    let index = self.focused?;
    self.hierarchy.nest_candidate(index, self.config.nest_threshold)?;
    self.history.record_before_edit(&self.hierarchy);
    let outcome = self.hierarchy.nest(index, self.config.nest_threshold)?;
    self.drag = None;
    self.pending_nest = None;
    self.after_nest(outcome);
    Some(outcome)
  }

  /// Release the direct children of the focused point.
  pub fn burst_focused(&mut self) -> Option<BurstOutcome> {
    self.burst_with(PointHierarchy::burst)
  }

  /// Flatten the whole subtree of the focused point.
  pub fn deep_burst_focused(&mut self) -> Option<BurstOutcome> {
    self.burst_with(PointHierarchy::deep_burst)
  }

  fn burst_with(&mut self, burst: impl FnOnce(&mut PointHierarchy, usize) -> Option<BurstOutcome>) -> Option<BurstOutcome> {
    let index = self.focused?;
    if !self.hierarchy.get(index)?.is_container() {
      return None;
    }
    self.history.record_before_edit(&self.hierarchy);
    let outcome = burst(&mut self.hierarchy, index)?;
    self.notify(BURST_MESSAGE);
    self.custom_action = true;
    Some(outcome)
  }

  fn after_nest(&mut self, outcome: NestOutcome) {
    self.focused = Some(outcome.parent_index);
    self.notify(NESTED_MESSAGE);
    self.custom_action = true;
  }

  /// Shift the focused point one step with history.
  pub fn nudge_focused(&mut self, direction: NudgeDirection) -> bool {
    let Some(index) = self.focused.filter(|&i| i < self.hierarchy.len()) else {
      return false;
    };
    self.history.record_before_edit(&self.hierarchy);
    self.hierarchy.nudge(index, direction.delta(self.config.nudge_step))
  }

  /// Move focus to the next (or previous) top-level point, wrapping.
  pub fn cycle_focus(&mut self, forward: bool) -> Option<usize> {
    let len = self.hierarchy.len();
    if len == 0 {
      self.focused = None;
      return None;
    }
    let current = self.focused.unwrap_or(0).min(len - 1);
    let next = if forward {
      (current + 1) % len
    } else {
      (current + len - 1) % len
    };
    self.focused = Some(next);
    Some(next)
  }

  // ===========================================================================
  // History
  // ===========================================================================

  pub fn undo(&mut self) -> bool {
    match self.history.undo(&self.hierarchy) {
      Some(previous) => {
        self.restore(previous, UNDO_MESSAGE);
        true
      }
      None => false,
    }
  }

  pub fn redo(&mut self) -> bool {
    match self.history.redo(&self.hierarchy) {
      Some(next) => {
        self.restore(next, REDO_MESSAGE);
        true
      }
      None => false,
    }
  }

  fn restore(&mut self, hierarchy: PointHierarchy, message: &str) {
    self.hierarchy = hierarchy;
    self.end_drag();
    self.clamp_focus();
    self.status.update(message, Duration::ZERO, self.now);
    self.custom_action = true;
  }

  // ===========================================================================
  // View
  // ===========================================================================

  /// Rotate the view, persist, and re-derive the live set if needed.
  pub fn rotate_by(&mut self, dx: f64, dy: f64) {
    self.orientation.rotate_by(dx, dy);
    self.orientation_changed();
  }

  /// Zoom the view (clamped), persist, and re-derive the live set if needed.
  pub fn set_zoom(&mut self, zoom: f64) {
    self.orientation.set_zoom(zoom);
    self.orientation_changed();
  }

  fn orientation_changed(&mut self) {
    if let Err(e) = self.orientation.save(self.kv.as_ref()) {
      tracing::warn!(error = %e, "could not persist orientation");
    }
    self.refresh_viewport();
  }

  /// Take over the result of a background pass.
  pub fn apply_worker_response(&mut self, response: WorkerResponse) {
    match response {
      WorkerResponse::ProcessedData { compartments, .. } => {
        self.viewport.install(compartments);
        self.refresh_viewport();
      }
      WorkerResponse::Failed { message } => {
        tracing::warn!(%message, "background load failed");
        self.status.update(message, Duration::ZERO, self.now);
      }
    }
  }

  fn refresh_viewport(&mut self) {
    let visible = self.viewport.visible_compartments(&self.orientation);
    if visible.notify {
      self.status.update(MORE_POINTS_MESSAGE, Duration::ZERO, self.now);
    }
    if let Some(points) = self.viewport.apply(&visible) {
      // Nesting inside the outgoing live set is not carried over.
      self.hierarchy.replace_all(points);
      self.end_drag();
      self.clamp_focus();
      self.custom_action = true;
    }
  }

  // ===========================================================================
  // Rendering
  // ===========================================================================

  /// Snapshot of what should be drawn now.
  pub fn frame(&self) -> RenderFrame {
    RenderFrame {
      positions: self.hierarchy.positions(),
      matrix: to_gpu_matrix(TransformEngine::render_matrix(&self.orientation)),
      focused: self.focused,
    }
  }

  /// Draw a frame and update the position readout.
  pub fn render(&mut self, renderer: &mut dyn Renderer) {
    renderer.draw(&self.frame());
    if std::mem::take(&mut self.custom_action) {
      return;
    }
    if let Some(text) = self.readout() {
      self.status.update(text, Duration::ZERO, self.now);
    }
  }

  /// `"Focused point index: i, moved to x, y, z"` for the focused point.
  pub fn readout(&self) -> Option<String> {
    let index = self.focused?;
    let p = self.hierarchy.get(index)?.position;
    Some(format!(
      "Focused point index: {index}, moved to {:.2}, {:.2}, {:.2}",
      p.x, p.y, p.z
    ))
  }

  fn notify(&mut self, message: &str) {
    self.status.update(message, self.config.status_lock(), self.now);
  }

  fn clamp_focus(&mut self) {
    let len = self.hierarchy.len();
    self.focused = match self.focused {
      _ if len == 0 => None,
      Some(i) => Some(i.min(len - 1)),
      None => Some(0),
    };
  }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
