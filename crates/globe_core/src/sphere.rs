//! Mapping from stored planar records to points on the unit sphere.

use std::f64::consts::PI;

use glam::DVec3;

/// Convert a stored `(x, y)` in `[-1, 1]²` to a unit-sphere point.
///
/// `lat = y * π`, `lng = x * 2π`. Inputs outside `[-1, 1]` wrap around the
/// sphere instead of failing.
#[inline]
pub fn sphere_from_record(x: f64, y: f64) -> DVec3 {
  let (sin_lat, cos_lat) = (y * PI).sin_cos();
  let (sin_lng, cos_lng) = (x * 2.0 * PI).sin_cos();
  DVec3::new(cos_lat * cos_lng, sin_lat, cos_lat * sin_lng)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn origin_maps_to_positive_x() {
    let p = sphere_from_record(0.0, 0.0);
    assert!(p.abs_diff_eq(DVec3::X, 1e-12));
  }

  #[test]
  fn results_are_unit_length() {
    for &(x, y) in &[(0.1, 0.2), (-1.0, -1.0), (1.0, 1.0), (0.37, -0.81), (3.0, 2.5)] {
      let p = sphere_from_record(x, y);
      assert!((p.length() - 1.0).abs() < 1e-12, "({}, {}) -> {:?}", x, y, p);
    }
  }

  #[test]
  fn quarter_latitude_is_north_pole() {
    let p = sphere_from_record(0.3, 0.5);
    assert!((p.y - 1.0).abs() < 1e-12);
  }

  #[test]
  fn nearby_records_stay_nearby() {
    let a = sphere_from_record(0.1, 0.2);
    let b = sphere_from_record(0.1, 0.21);
    assert!(a.distance(b) < 0.05, "distance {}", a.distance(b));
  }
}
