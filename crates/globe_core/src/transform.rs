//! Transform engine: matrices and screen/world conversions.
//!
//! Stateless. Every value is derived from the `Orientation` passed in, so a
//! caller that changes the orientation simply asks again.
//!
//! ```text
//!   pixel ──► NDC [-1,1]² ──÷zoom──► front hemisphere ──inverse──► world
//!   world ──rotation──► view ──diag(zoom, zoom, 0.1)──► clip
//! ```

use glam::{DMat4, DVec2, DVec3, DVec4};

use crate::constants::VIEW_DEPTH_SCALE;
use crate::math::{apply_to_point, compose_rotation, invert, multiply, normalize};
use crate::orientation::Orientation;

/// Screen rectangle of the drawing surface, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
  pub left: f64,
  pub top: f64,
  pub width: f64,
  pub height: f64,
}

impl Viewport {
  pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
    Self {
      left,
      top,
      width,
      height,
    }
  }

  /// Pixel position to normalized device coordinates (y up).
  #[inline]
  pub fn to_ndc(&self, device: DVec2) -> DVec2 {
    DVec2::new(
      (device.x - self.left) / self.width * 2.0 - 1.0,
      -((device.y - self.top) / self.height * 2.0 - 1.0),
    )
  }

  /// Center of the rectangle in pixels.
  #[inline]
  pub fn center(&self) -> DVec2 {
    DVec2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
  }
}

/// Matrix and projection functions over an [`Orientation`].
pub struct TransformEngine;

impl TransformEngine {
  /// World to view rotation.
  #[inline]
  pub fn rotation_matrix(orientation: &Orientation) -> DMat4 {
    compose_rotation(orientation.rotation_x(), orientation.rotation_y())
  }

  /// View to world rotation. Recompute whenever the orientation changes.
  #[inline]
  pub fn inverse_rotation(orientation: &Orientation) -> DMat4 {
    invert(Self::rotation_matrix(orientation))
  }

  /// `diag(zoom, zoom, 0.1, 1)`.
  #[inline]
  pub fn view_matrix(zoom: f64) -> DMat4 {
    DMat4::from_diagonal(DVec4::new(zoom, zoom, VIEW_DEPTH_SCALE, 1.0))
  }

  /// Matrix handed to the renderer: view after rotation.
  pub fn render_matrix(orientation: &Orientation) -> DMat4 {
    multiply(
      Self::view_matrix(orientation.zoom_scale()),
      Self::rotation_matrix(orientation),
    )
  }

  /// Pixel to a unit point on the front hemisphere, still in view space.
  ///
  /// Returns `None` when the pixel lies outside the sphere's silhouette or
  /// the viewport is degenerate.
  pub fn screen_to_world(device: DVec2, viewport: Viewport, zoom: f64) -> Option<DVec3> {
    let ndc = viewport.to_ndc(device) / zoom;
    let r2 = ndc.length_squared();
    if !r2.is_finite() || r2 > 1.0 {
      return None;
    }
    let z = (1.0 - r2).sqrt();
    Some(normalize(ndc.extend(z)))
  }

  /// Undo the view rotation on a view-space point.
  #[inline]
  pub fn world_to_view(v: DVec3, inverse: DMat4) -> DVec3 {
    apply_to_point(v, inverse)
  }

  /// Pixel straight to a world-space point: projection then inverse rotation.
  pub fn pick(device: DVec2, viewport: Viewport, orientation: &Orientation, inverse: DMat4) -> Option<DVec3> {
    Self::screen_to_world(device, viewport, orientation.zoom_scale()).map(|v| Self::world_to_view(v, inverse))
  }

  /// Point the camera looks at, used to choose the detail compartment.
  ///
  /// The forward axis `(0, 0, -1)` rotated, scaled by zoom and clamped to
  /// `[-1, 1]` per axis.
  pub fn screen_center_world(orientation: &Orientation) -> DVec3 {
    let forward = apply_to_point(DVec3::NEG_Z, Self::rotation_matrix(orientation));
    (forward * orientation.zoom_scale()).clamp(DVec3::splat(-1.0), DVec3::splat(1.0))
  }
}

#[cfg(test)]
mod tests {
  use std::f64::consts::FRAC_PI_2;

  use super::*;
  use crate::orientation::ZoomLimits;
  use crate::sphere::sphere_from_record;

  fn viewport() -> Viewport {
    Viewport::new(10.0, 20.0, 800.0, 600.0)
  }

  fn orientation(rx: f64, ry: f64, zoom: f64) -> Orientation {
    Orientation::new(rx, ry, zoom, ZoomLimits::default())
  }

  #[test]
  fn center_pixel_hits_front_pole() {
    let vp = viewport();
    let v = TransformEngine::screen_to_world(vp.center(), vp, 1.0).unwrap();
    assert!(v.abs_diff_eq(DVec3::Z, 1e-12));
  }

  #[test]
  fn pixel_outside_silhouette_misses() {
    let vp = viewport();
    assert!(TransformEngine::screen_to_world(DVec2::new(10.0, 20.0), vp, 1.0).is_none());
    // Zooming in pushes the edge of the disc further out.
    let edge = DVec2::new(vp.left + vp.width * 0.95, vp.center().y);
    assert!(TransformEngine::screen_to_world(edge, vp, 1.0).is_some());
    assert!(TransformEngine::screen_to_world(edge, vp, 0.5).is_none());
  }

  #[test]
  fn degenerate_viewport_misses() {
    let vp = Viewport::new(0.0, 0.0, 0.0, 0.0);
    assert!(TransformEngine::screen_to_world(DVec2::new(1.0, 1.0), vp, 1.0).is_none());
  }

  #[test]
  fn screen_y_points_up() {
    let vp = viewport();
    let above = DVec2::new(vp.center().x, vp.top + vp.height * 0.25);
    let v = TransformEngine::screen_to_world(above, vp, 1.0).unwrap();
    assert!(v.y > 0.0);
  }

  #[test]
  fn pick_inverts_projection_of_visible_points() {
    let vp = viewport();
    for &(rx, ry, zoom) in &[(0.0, 0.0, 1.0), (0.4, -1.1, 2.0), (-1.2, 2.5, 0.7)] {
      let o = orientation(rx, ry, zoom);
      let rotation = TransformEngine::rotation_matrix(&o);
      let inverse = TransformEngine::inverse_rotation(&o);
      for &(x, y) in &[(0.1, 0.2), (-0.3, 0.05), (0.45, -0.2), (0.0, 0.0)] {
        let p = sphere_from_record(x, y);
        let view = apply_to_point(p, rotation);
        if view.z <= 0.01 {
          continue;
        }
        let ndc = DVec2::new(view.x, view.y) * o.zoom_scale();
        if ndc.length() >= 1.0 {
          continue;
        }
        let pixel = DVec2::new(
          vp.left + (ndc.x + 1.0) / 2.0 * vp.width,
          vp.top + (1.0 - ndc.y) / 2.0 * vp.height,
        );
        let back = TransformEngine::pick(pixel, vp, &o, inverse).unwrap();
        assert!(back.abs_diff_eq(p, 1e-9), "{:?} -> {:?}", p, back);
      }
    }
  }

  #[test]
  fn render_matrix_scales_rotation() {
    let o = orientation(0.3, 0.7, 2.0);
    let m = TransformEngine::render_matrix(&o);
    let r = TransformEngine::rotation_matrix(&o);
    let p = DVec3::new(0.2, -0.4, 0.8);
    let expected = apply_to_point(p, r) * DVec3::new(2.0, 2.0, VIEW_DEPTH_SCALE);
    assert!(apply_to_point(p, m).abs_diff_eq(expected, 1e-12));
  }

  #[test]
  fn screen_center_is_clamped() {
    let o = orientation(0.0, 0.0, 3.0);
    let c = TransformEngine::screen_center_world(&o);
    assert_eq!(c, DVec3::new(0.0, 0.0, -1.0));

    let o = orientation(FRAC_PI_2, 0.0, 1.0);
    let c = TransformEngine::screen_center_world(&o);
    assert!(c.abs_diff_eq(DVec3::new(0.0, -1.0, 0.0), 1e-12));
  }
}
