//! Vector and matrix helpers over glam's `f64` types.
//!
//! All matrices are column-major and act on column vectors (`M * v`), so
//! `multiply(a, b)` applies `b` first. Only the upper-left 3x3 block carries
//! rotation; the fourth row and column stay `[0, 0, 0, 1]`.

use glam::{DMat3, DMat4, DVec3, DVec4};

use crate::constants::DEGENERATE_DETERMINANT;

/// Unit-normalize, returning `DVec3::ZERO` for (near) zero-length input.
#[inline]
pub fn normalize(v: DVec3) -> DVec3 {
  v.normalize_or_zero()
}

/// Rotation about X by `angle_x` composed with rotation about Y by `angle_y`.
///
/// Non-finite angles are treated as zero.
pub fn compose_rotation(angle_x: f64, angle_y: f64) -> DMat4 {
  let (sin_x, cos_x) = finite_or_zero(angle_x).sin_cos();
  let (sin_y, cos_y) = finite_or_zero(angle_y).sin_cos();

  DMat4::from_cols(
    DVec4::new(cos_y, 0.0, sin_y, 0.0),
    DVec4::new(sin_x * sin_y, cos_x, -sin_x * cos_y, 0.0),
    DVec4::new(-cos_x * sin_y, sin_x, cos_x * cos_y, 0.0),
    DVec4::W,
  )
}

/// Matrix product `a * b`.
#[inline]
pub fn multiply(a: DMat4, b: DMat4) -> DMat4 {
  a * b
}

/// Invert the rotation block, or `None` if `|det| < 1e-6`.
pub fn try_invert(m: DMat4) -> Option<DMat4> {
  let block = DMat3::from_mat4(m);
  let det = block.determinant();
  if !det.is_finite() || det.abs() < DEGENERATE_DETERMINANT {
    return None;
  }
  // Cofactor inverse of the 3x3 block; translation/projection stays identity.
  Some(DMat4::from_mat3(block.inverse()))
}

/// Invert the rotation block, falling back to `m` itself when singular.
///
/// Callers get reduced-accuracy hit-testing instead of a failure.
pub fn invert(m: DMat4) -> DMat4 {
  try_invert(m).unwrap_or_else(|| {
    tracing::trace!("degenerate rotation matrix, returning it un-inverted");
    m
  })
}

/// Apply `m` to a point (the fourth column is added as translation).
#[inline]
pub fn apply_to_point(v: DVec3, m: DMat4) -> DVec3 {
  m.transform_point3(v)
}

/// Flatten to the column-major `f32` array a renderer uploads.
#[inline]
pub fn to_gpu_matrix(m: DMat4) -> [f32; 16] {
  m.as_mat4().to_cols_array()
}

#[inline]
fn finite_or_zero(angle: f64) -> f64 {
  if angle.is_finite() {
    angle
  } else {
    0.0
  }
}

#[cfg(test)]
#[path = "math_test.rs"]
mod math_test;
