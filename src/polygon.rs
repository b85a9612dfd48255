use crate::cone::ViewCone;
use crate::edge::EdgeRefiner;
use crate::geometry::Point;
use crate::query::OcclusionProvider;
use crate::ray::{RayProbe, ViewCastSample};

/// Visible region as a fan around the viewer.
///
/// `anchor` is vertex 0 (the viewer position) and closes the polygon;
/// `points` are the boundary points in increasing angle order.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityPolygon {
    pub anchor: Point,
    pub points: Vec<Point>,
    /// Rays cast along the cone (excludes refinement rays)
    pub sample_count: usize,
    /// Discontinuities that triggered refinement
    pub edge_count: usize,
}

impl VisibilityPolygon {
    /// Vertex count including the anchor
    pub fn vertex_count(&self) -> usize {
        self.points.len() + 1
    }

    /// Anchor followed by the boundary points
    pub fn vertices(&self) -> impl Iterator<Item = Point> + '_ {
        std::iter::once(self.anchor).chain(self.points.iter().copied())
    }
}

/// Walks the cone samples and stitches refined edge points between them
pub struct VisibilityPolygonBuilder<'p, 'a, O: OcclusionProvider + ?Sized> {
    probe: &'p RayProbe<'a, O>,
    refiner: EdgeRefiner,
}

impl<'p, 'a, O: OcclusionProvider + ?Sized> VisibilityPolygonBuilder<'p, 'a, O> {
    pub fn new(probe: &'p RayProbe<'a, O>, refiner: EdgeRefiner) -> Self {
        VisibilityPolygonBuilder { probe, refiner }
    }

    pub fn build(&self, cone: &ViewCone) -> VisibilityPolygon {
        let mut points = Vec::with_capacity(cone.step_count + 8);
        let mut edge_count = 0;
        let mut last: Option<ViewCastSample> = None;

        for angle in cone.angles() {
            let cast = self.probe.cast(angle);

            if let Some(prev) = &last {
                if self.refiner.is_discontinuity(prev, &cast) {
                    edge_count += 1;
                    let edge = self.refiner.refine(self.probe, prev, &cast);
                    points.extend(edge.points());
                }
            }

            points.push(cast.point);
            last = Some(cast);
        }

        VisibilityPolygon {
            anchor: self.probe.origin(),
            points,
            sample_count: cone.step_count,
            edge_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerMask;
    use crate::world::{Obstacle, World};

    #[test]
    fn test_open_space_has_one_point_per_sample() {
        let world = World::new();
        let probe = RayProbe::new(Point::zero(), 10.0, LayerMask::ALL, &world);
        let cone = ViewCone::new(0.0, 90.0, 1.0);
        let polygon = VisibilityPolygonBuilder::new(&probe, EdgeRefiner::new(0.5, 4)).build(&cone);
        assert_eq!(polygon.points.len(), 90);
        assert_eq!(polygon.vertex_count(), 91);
        assert_eq!(polygon.edge_count, 0);
        assert_eq!(polygon.vertices().next(), Some(Point::zero()));
    }

    #[test]
    fn test_each_edge_adds_at_most_two_points() {
        // a short wall straight ahead gives two silhouettes
        let mut world = World::new();
        world.add_obstacle(Obstacle::segment(
            Point::new(-1.0, 5.0),
            Point::new(1.0, 5.0),
            LayerMask::layer(0),
        ));
        let probe = RayProbe::new(Point::zero(), 10.0, LayerMask::layer(0), &world);
        let cone = ViewCone::new(0.0, 90.0, 1.0);
        let polygon = VisibilityPolygonBuilder::new(&probe, EdgeRefiner::new(0.5, 6)).build(&cone);

        assert_eq!(polygon.edge_count, 2);
        assert!(polygon.points.len() > 90);
        assert!(polygon.points.len() <= 90 + 2 * polygon.edge_count);
    }

    #[test]
    fn test_points_stay_in_angle_order() {
        let mut world = World::new();
        world.add_obstacle(Obstacle::circle(Point::new(2.0, 6.0), 1.5, LayerMask::layer(0)));
        let probe = RayProbe::new(Point::zero(), 10.0, LayerMask::layer(0), &world);
        let cone = ViewCone::new(0.0, 120.0, 0.5);
        let polygon = VisibilityPolygonBuilder::new(&probe, EdgeRefiner::new(0.5, 5)).build(&cone);

        let angles: Vec<f32> = polygon
            .points
            .iter()
            .map(|p| crate::geometry::angle_of(*p).unwrap())
            .collect();
        for pair in angles.windows(2) {
            assert!(pair[0] <= pair[1] + 1e-3, "{:?}", pair);
        }
    }
}
