use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::constants::NEST_THRESHOLD;
use crate::sphere::sphere_from_record;

fn far_apart() -> PointHierarchy {
  [
    sphere_from_record(-0.5, -0.25),
    sphere_from_record(0.0, 0.0),
    sphere_from_record(0.5, 0.25),
  ]
  .into_iter()
  .collect()
}

// =========================================================================
// Nest
// =========================================================================

#[test]
fn test_scenario_nest_then_burst() {
  let mut h: PointHierarchy = [sphere_from_record(0.1, 0.2), sphere_from_record(0.1, 0.21)]
    .into_iter()
    .collect();

  let outcome = h.nest(0, NEST_THRESHOLD).expect("points are within threshold");
  assert_eq!(outcome.parent_index, 0, "parent shifts from 1 to 0");
  assert_eq!(h.len(), 1);
  assert_eq!(h.get(0).unwrap().children.len(), 1);

  let burst = h.burst(0).expect("container bursts");
  assert_eq!(burst.released, 1);
  assert_eq!(h.len(), 2);
  assert!(h.iter().all(Point::is_leaf));
}

#[test]
fn test_nest_parent_before_child_keeps_index() {
  let a = sphere_from_record(0.1, 0.2);
  let b = sphere_from_record(0.4, -0.3);
  let c = sphere_from_record(0.1, 0.205);
  let mut h: PointHierarchy = [a, b, c].into_iter().collect();

  let outcome = h.nest(2, NEST_THRESHOLD).unwrap();
  assert_eq!(outcome.parent_index, 0);
  assert_eq!(h.get(0).unwrap().children[0].position, c);
  assert_eq!(h.get(1).unwrap().position, b);
}

#[test]
fn test_nest_picks_first_candidate_in_index_order() {
  let target = sphere_from_record(0.1, 0.2);
  let near_a = sphere_from_record(0.1, 0.205);
  let near_b = sphere_from_record(0.1, 0.195);
  let mut h: PointHierarchy = [near_a, target, near_b].into_iter().collect();

  let outcome = h.nest(1, NEST_THRESHOLD).unwrap();
  assert_eq!(outcome.parent_index, 0);
  assert_eq!(h.get(0).unwrap().position, near_a);
  assert!(h.get(1).unwrap().is_leaf());
}

#[test]
fn test_nest_without_candidate_is_noop() {
  let mut h = far_apart();
  let before = h.clone();
  assert!(h.nest(1, NEST_THRESHOLD).is_none());
  assert_eq!(h, before, "hierarchy must be deep-equal after a failed nest");
}

#[test]
fn test_nest_out_of_range_is_noop() {
  let mut h = far_apart();
  let before = h.clone();
  assert!(h.nest(17, NEST_THRESHOLD).is_none());
  assert_eq!(h, before);
}

#[test]
fn test_nest_into_existing_container_appends() {
  let p = sphere_from_record(0.1, 0.2);
  let mut h = PointHierarchy::from(vec![
    Point {
      position: p,
      children: vec![Point::leaf(sphere_from_record(0.7, 0.1))],
    },
    Point::leaf(sphere_from_record(0.1, 0.201)),
  ]);
  h.nest(1, NEST_THRESHOLD).unwrap();
  assert_eq!(h.len(), 1);
  assert_eq!(h.get(0).unwrap().children.len(), 2);
}

#[test]
fn test_nest_container_keeps_its_subtree() {
  let p = sphere_from_record(0.1, 0.2);
  let mut h = PointHierarchy::from(vec![
    Point::leaf(p),
    Point {
      position: sphere_from_record(0.1, 0.2001),
      children: vec![Point::leaf(sphere_from_record(-0.3, 0.3))],
    },
  ]);
  h.nest(1, NEST_THRESHOLD).unwrap();
  assert_eq!(h.max_depth(), 2);
  assert_eq!(h.total_points(), 3);
}

// =========================================================================
// Burst
// =========================================================================

#[test]
fn test_burst_leaf_is_noop() {
  let mut h = far_apart();
  let before = h.clone();
  assert!(h.burst(0).is_none());
  assert!(h.deep_burst(0).is_none());
  assert!(h.burst(99).is_none());
  assert_eq!(h, before);
}

#[test]
fn test_burst_is_one_level() {
  let grandchild = Point::leaf(sphere_from_record(0.9, 0.1));
  let child = Point {
    position: sphere_from_record(0.8, 0.1),
    children: vec![grandchild.clone()],
  };
  let mut h = PointHierarchy::from(vec![
    Point::leaf(sphere_from_record(-0.9, 0.0)),
    Point {
      position: sphere_from_record(0.0, 0.0),
      children: vec![child, Point::leaf(sphere_from_record(0.2, 0.2))],
    },
  ]);

  let outcome = h.burst(1).unwrap();
  assert_eq!(outcome.released, 2);
  assert_eq!(outcome.first_index, 2);
  assert_eq!(h.len(), 4);
  assert!(h.get(1).unwrap().is_leaf(), "container reverts to leaf");
  assert_eq!(h.get(2).unwrap().children, vec![grandchild], "grandchild stays nested");
}

#[test]
fn test_deep_burst_flattens_everything() {
  let mut h = PointHierarchy::from(vec![Point {
    position: sphere_from_record(0.0, 0.0),
    children: vec![
      Point {
        position: sphere_from_record(0.1, 0.0),
        children: vec![Point {
          position: sphere_from_record(0.2, 0.0),
          children: vec![Point::leaf(sphere_from_record(0.3, 0.0))],
        }],
      },
      Point::leaf(sphere_from_record(0.4, 0.0)),
    ],
  }]);
  let total = h.total_points();

  let outcome = h.deep_burst(0).unwrap();
  assert_eq!(outcome.released, 4);
  assert_eq!(h.len(), 5);
  assert_eq!(h.total_points(), total);
  assert!(h.iter().all(Point::is_leaf));
  // Direct children first, then nested levels.
  assert_eq!(h.get(1).unwrap().position, sphere_from_record(0.1, 0.0));
  assert_eq!(h.get(2).unwrap().position, sphere_from_record(0.4, 0.0));
  assert_eq!(h.get(3).unwrap().position, sphere_from_record(0.2, 0.0));
  assert_eq!(h.get(4).unwrap().position, sphere_from_record(0.3, 0.0));
}

// =========================================================================
// Invariants under random edits
// =========================================================================

#[test]
fn test_random_nest_burst_preserves_point_count() {
  let mut rng = StdRng::seed_from_u64(11);
  // Clustered points so nesting actually happens.
  let mut h: PointHierarchy = (0..200)
    .map(|_| {
      sphere_from_record(
        rng.random_range(-0.05..0.05),
        rng.random_range(-0.05..0.05),
      )
    })
    .collect();
  let total = h.total_points();

  for _ in 0..400 {
    let n = h.len();
    let i = rng.random_range(0..n);
    if rng.random_bool(0.6) {
      if let Some(out) = h.nest(i, NEST_THRESHOLD) {
        assert_eq!(h.len(), n - 1);
        assert!(out.parent_index < h.len());
      }
    } else {
      let k = h.get(i).unwrap().children.len();
      if h.burst(i).is_some() {
        assert_eq!(h.len(), n + k);
        assert!(h.get(i).unwrap().is_leaf());
      }
    }
    assert_eq!(h.total_points(), total);
  }
}

// =========================================================================
// Positions and queries
// =========================================================================

#[test]
fn test_depth() {
  assert_eq!(Point::leaf(DVec3::X).depth(), 0);
  let nested = Point {
    position: DVec3::X,
    children: vec![
      Point::leaf(DVec3::Y),
      Point {
        position: DVec3::Z,
        children: vec![Point::leaf(DVec3::X)],
      },
    ],
  };
  assert_eq!(nested.depth(), 2);
  assert_eq!(nested.subtree_len(), 4);
}

#[test]
fn test_hit_test() {
  let h = far_apart();
  let target = sphere_from_record(0.0, 0.001);
  assert_eq!(h.hit_test(target, NEST_THRESHOLD), Some(1));
  assert_eq!(h.hit_test(-DVec3::Y, NEST_THRESHOLD), None);
}

#[test]
fn test_set_position_normalizes() {
  let mut h = far_apart();
  assert!(h.set_position(0, DVec3::new(0.0, 3.0, 4.0)));
  assert!((h.get(0).unwrap().position.length() - 1.0).abs() < 1e-12);
  assert!(!h.set_position(0, DVec3::ZERO), "zero direction rejected");
  assert!(!h.set_position(9, DVec3::X));
}

#[test]
fn test_nudge_moves_and_renormalizes() {
  let mut h: PointHierarchy = [DVec3::Z].into_iter().collect();
  assert!(h.nudge(0, DVec2::new(0.0, 0.05)));
  let p = h.get(0).unwrap().position;
  assert!(p.y > 0.0);
  assert!((p.length() - 1.0).abs() < 1e-12);
  assert!(!h.nudge(1, DVec2::X));
}

#[test]
fn test_positions_skip_children() {
  let h = PointHierarchy::from(vec![Point {
    position: DVec3::X,
    children: vec![Point::leaf(DVec3::Y)],
  }]);
  assert_eq!(h.positions(), vec![[1.0, 0.0, 0.0]]);
}

#[test]
fn test_serde_roundtrip_keeps_structure() {
  let h = PointHierarchy::from(vec![Point {
    position: DVec3::X,
    children: vec![Point::leaf(DVec3::Y)],
  }]);
  let json = serde_json::to_string(&h).unwrap();
  let back: PointHierarchy = serde_json::from_str(&json).unwrap();
  assert_eq!(back, h);
}
