use crate::geometry::{Point, ANGLE_EPSILON};
use crate::query::OcclusionProvider;
use crate::ray::{RayProbe, ViewCastSample};

/// Refined boundary points either side of a silhouette edge.
///
/// `None` means the bisection never moved that side; it is never a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeSample {
    /// Last midpoint that still looked like the min sample
    pub point_a: Option<Point>,
    /// Last midpoint that looked like the max sample
    pub point_b: Option<Point>,
}

impl EdgeSample {
    /// Set points in order (a before b)
    pub fn points(&self) -> impl Iterator<Item = Point> {
        self.point_a.into_iter().chain(self.point_b)
    }

    pub fn is_empty(&self) -> bool {
        self.point_a.is_none() && self.point_b.is_none()
    }
}

/// Localizes obstacle silhouettes between two adjacent view rays by bisection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRefiner {
    /// Distance jump between two hits that counts as a discontinuity
    pub edge_dist_threshold: f32,
    /// Number of bisection steps
    pub edge_resolution: u32,
}

impl EdgeRefiner {
    pub fn new(edge_dist_threshold: f32, edge_resolution: u32) -> Self {
        EdgeRefiner {
            edge_dist_threshold,
            edge_resolution,
        }
    }

    /// Whether two neighbouring samples straddle an edge
    pub fn is_discontinuity(&self, a: &ViewCastSample, b: &ViewCastSample) -> bool {
        let dist_exceeded = (a.distance - b.distance).abs() > self.edge_dist_threshold;
        a.hit != b.hit || (a.hit && b.hit && dist_exceeded)
    }

    /// Bisect between `min` and `max` sample angles.
    ///
    /// A midpoint that matches `min` (same hit status, distance within the
    /// threshold of `min`'s) moves the min side, anything else moves the max
    /// side. Stops early once the bracket is narrower than [`ANGLE_EPSILON`].
    pub fn refine<O: OcclusionProvider + ?Sized>(
        &self,
        probe: &RayProbe<'_, O>,
        min: &ViewCastSample,
        max: &ViewCastSample,
    ) -> EdgeSample {
        let mut min_angle = min.angle;
        let mut max_angle = max.angle;
        let mut edge = EdgeSample::default();

        for _ in 0..self.edge_resolution {
            if (max_angle - min_angle).abs() < ANGLE_EPSILON {
                break;
            }

            let angle = (min_angle + max_angle) / 2.0;
            let cast = probe.cast(angle);
            let dist_exceeded = (min.distance - cast.distance).abs() > self.edge_dist_threshold;

            if cast.hit == min.hit && !dist_exceeded {
                min_angle = angle;
                edge.point_a = Some(cast.point);
            } else {
                max_angle = angle;
                edge.point_b = Some(cast.point);
            }
        }

        edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::angle_of;
    use crate::layer::LayerMask;
    use crate::query::{QueryError, RayHit};
    use crate::world::{Obstacle, World};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Counts the rays cast through it
    struct Counting<'a> {
        world: &'a World,
        casts: AtomicU32,
    }

    impl OcclusionProvider for Counting<'_> {
        fn raycast(
            &self,
            origin: Point,
            direction: Point,
            max_distance: f32,
            mask: LayerMask,
        ) -> Result<Option<RayHit>, QueryError> {
            self.casts.fetch_add(1, Ordering::Relaxed);
            self.world.raycast(origin, direction, max_distance, mask)
        }
    }

    /// Wall along y=5 whose right end sits exactly at `edge_deg`
    fn edge_world(edge_deg: f32) -> World {
        let end_x = -5.0 * edge_deg.to_radians().tan();
        let mut world = World::new();
        world.add_obstacle(Obstacle::segment(
            Point::new(end_x, 5.0),
            Point::new(-40.0, 5.0),
            LayerMask::layer(0),
        ));
        world
    }

    #[test]
    fn test_discontinuity_rules() {
        let refiner = EdgeRefiner::new(1.0, 4);
        let miss = ViewCastSample { hit: false, point: Point::zero(), distance: 10.0, angle: 0.0 };
        let near = ViewCastSample { hit: true, point: Point::zero(), distance: 3.0, angle: 1.0 };
        let near2 = ViewCastSample { hit: true, point: Point::zero(), distance: 3.5, angle: 2.0 };
        let far = ViewCastSample { hit: true, point: Point::zero(), distance: 6.0, angle: 3.0 };
        assert!(refiner.is_discontinuity(&miss, &near));
        assert!(!refiner.is_discontinuity(&near, &near2));
        assert!(refiner.is_discontinuity(&near2, &far));
        // two misses never form an edge, whatever the distances
        let short_miss = ViewCastSample { distance: 2.0, ..miss };
        assert!(!refiner.is_discontinuity(&miss, &short_miss));
    }

    #[test]
    fn test_first_step_sets_only_one_side() {
        let world = edge_world(10.0);
        let probe = RayProbe::new(Point::zero(), 10.0, LayerMask::layer(0), &world);
        let a = probe.cast(0.0);
        let b = probe.cast(30.0);
        assert!(!a.hit && b.hit);

        // midpoint 15 degrees hits, so only the max side moves
        let edge = EdgeRefiner::new(0.5, 1).refine(&probe, &a, &b);
        assert!(edge.point_a.is_none());
        assert!(edge.point_b.is_some());
    }

    #[test]
    fn test_zero_iterations_leaves_both_unset() {
        let world = edge_world(10.0);
        let probe = RayProbe::new(Point::zero(), 10.0, LayerMask::layer(0), &world);
        let a = probe.cast(0.0);
        let b = probe.cast(30.0);
        let edge = EdgeRefiner::new(0.5, 0).refine(&probe, &a, &b);
        assert!(edge.is_empty());
        assert_eq!(edge.points().count(), 0);
    }

    #[test]
    fn test_converges_on_known_edge() {
        let edge_deg = 10.0;
        let world = edge_world(edge_deg);
        let probe = RayProbe::new(Point::zero(), 10.0, LayerMask::layer(0), &world);
        let a = probe.cast(0.0);
        let b = probe.cast(30.0);

        let mut last_error = f32::INFINITY;
        for resolution in 1..=12 {
            let edge = EdgeRefiner::new(0.5, resolution).refine(&probe, &a, &b);
            let bound = 30.0 / 2f32.powi(resolution as i32);

            let b_angle = angle_of(edge.point_b.expect("hit side always moves first")).unwrap();
            let error = (b_angle - edge_deg).abs();
            assert!(error <= bound + 1e-3, "resolution {}: error {} > {}", resolution, error, bound);
            assert!(error <= last_error + 1e-6, "error grew at resolution {}", resolution);
            last_error = error;

            if let Some(point_a) = edge.point_a {
                let a_angle = angle_of(point_a).unwrap();
                assert!(a_angle < edge_deg);
                assert!((a_angle - edge_deg).abs() <= bound + 1e-3);
            }
        }
        assert!(last_error < 0.01);
    }

    #[test]
    fn test_distance_jump_measured_from_min_sample() {
        // near wall on the left half of the cone, far wall behind it everywhere
        let mut world = World::new();
        world.add_obstacle(Obstacle::segment(Point::new(-0.5, 3.0), Point::new(-10.0, 3.0), LayerMask::layer(0)));
        world.add_obstacle(Obstacle::segment(Point::new(20.0, 8.0), Point::new(-20.0, 8.0), LayerMask::layer(0)));
        let probe = RayProbe::new(Point::zero(), 20.0, LayerMask::layer(0), &world);

        let far = probe.cast(-10.0);
        let near = probe.cast(10.0);
        let refiner = EdgeRefiner::new(1.0, 8);
        assert!(refiner.is_discontinuity(&far, &near));

        let edge = refiner.refine(&probe, &far, &near);
        let a = edge.point_a.unwrap();
        let b = edge.point_b.unwrap();
        assert!((a.y - 8.0).abs() < 1e-4, "min side stays on the far wall");
        assert!((b.y - 3.0).abs() < 1e-4, "max side lands on the near wall");

        let edge_deg = (0.5f32 / 3.0).atan().to_degrees();
        let a_angle = angle_of(a).unwrap();
        let b_angle = angle_of(b).unwrap();
        assert!(a_angle < edge_deg && edge_deg < b_angle);
        assert!(b_angle - a_angle <= 20.0 / 256.0 + 1e-4);
    }

    #[test]
    fn test_huge_resolution_stops_at_angle_epsilon() {
        let edge_deg = 10.3;
        let world = edge_world(edge_deg);
        let counting = Counting { world: &world, casts: AtomicU32::new(0) };
        let probe = RayProbe::new(Point::zero(), 10.0, LayerMask::layer(0), &counting);
        let a = probe.cast(10.0);
        let b = probe.cast(11.0);
        assert!(!a.hit && b.hit);

        counting.casts.store(0, Ordering::Relaxed);
        let edge = EdgeRefiner::new(0.5, u32::MAX).refine(&probe, &a, &b);
        // a one degree bracket halves below 1e-4 after 14 steps
        assert_eq!(counting.casts.load(Ordering::Relaxed), 14);

        let a_angle = angle_of(edge.point_a.unwrap()).unwrap();
        let b_angle = angle_of(edge.point_b.unwrap()).unwrap();
        assert!(a_angle < edge_deg && edge_deg < b_angle, "{} .. {}", a_angle, b_angle);
        assert!(b_angle - a_angle < ANGLE_EPSILON + 1e-5, "bracket {}", b_angle - a_angle);
    }

    #[test]
    fn test_coincident_samples_give_empty_edge() {
        let world = edge_world(10.0);
        let probe = RayProbe::new(Point::zero(), 10.0, LayerMask::layer(0), &world);
        let refiner = EdgeRefiner::new(0.5, u32::MAX);

        let same = probe.cast(10.0);
        assert!(refiner.refine(&probe, &same, &same).is_empty());

        let close = probe.cast(10.0 + ANGLE_EPSILON / 2.0);
        assert!(refiner.refine(&probe, &same, &close).is_empty());
    }
}
