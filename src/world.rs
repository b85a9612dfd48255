//! Reference arena: static obstacle shapes, an optional tile layer and point
//! entities. Implements both query providers.

use crate::geometry::Point;
use crate::grid::TileGrid;
use crate::layer::LayerMask;
use crate::query::{EntityHandle, EntityHit, OcclusionProvider, QueryError, RayHit, SpatialProvider};
use serde::{Deserialize, Serialize};

/// Below this a ray and a segment are treated as parallel
const PARALLEL_EPSILON: f32 = 1e-9;

/// Obstacle geometry.
///
/// Segments and polylines are thin walls and block from both sides. Circles
/// are solid, but a ray starting inside one passes out through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Segment { a: Point, b: Point },
    Polyline {
        points: Vec<Point>,
        #[serde(default)]
        closed: bool,
    },
    Circle { center: Point, radius: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub shape: Shape,
    #[serde(default = "default_obstacle_layer")]
    pub layer: LayerMask,
}

fn default_obstacle_layer() -> LayerMask {
    LayerMask::layer(0)
}

impl Obstacle {
    pub fn segment(a: Point, b: Point, layer: LayerMask) -> Self {
        Obstacle { shape: Shape::Segment { a, b }, layer }
    }

    pub fn circle(center: Point, radius: f32, layer: LayerMask) -> Self {
        Obstacle { shape: Shape::Circle { center, radius }, layer }
    }

    /// Closed axis-aligned box as a polyline
    pub fn rect(min: Point, max: Point, layer: LayerMask) -> Self {
        Obstacle {
            shape: Shape::Polyline {
                points: vec![
                    min,
                    Point::new(max.x, min.y),
                    max,
                    Point::new(min.x, max.y),
                ],
                closed: true,
            },
            layer,
        }
    }

    /// Nearest intersection distance along the ray, if within `max_distance`
    fn intersect(&self, origin: Point, dir: Point, max_distance: f32) -> Option<f32> {
        let t = match &self.shape {
            Shape::Segment { a, b } => ray_segment(origin, dir, *a, *b),
            Shape::Polyline { points, closed } => {
                let mut best: Option<f32> = None;
                let mut consider = |t: Option<f32>| {
                    if let Some(t) = t {
                        if best.map_or(true, |b| t < b) {
                            best = Some(t);
                        }
                    }
                };
                for pair in points.windows(2) {
                    consider(ray_segment(origin, dir, pair[0], pair[1]));
                }
                if *closed && points.len() > 2 {
                    consider(ray_segment(origin, dir, points[points.len() - 1], points[0]));
                }
                best
            }
            Shape::Circle { center, radius } => ray_circle(origin, dir, *center, *radius),
        };
        t.filter(|&t| t <= max_distance)
    }
}

fn cross(a: Point, b: Point) -> f32 {
    a.x * b.y - a.y * b.x
}

fn ray_segment(origin: Point, dir: Point, a: Point, b: Point) -> Option<f32> {
    let edge = b - a;
    let denom = cross(dir, edge);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let to_a = a - origin;
    let t = cross(to_a, edge) / denom;
    let u = cross(to_a, dir) / denom;
    if t >= 0.0 && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

fn ray_circle(origin: Point, dir: Point, center: Point, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let c = offset.magnitude_squared() - radius * radius;
    if c < 0.0 {
        return None; // starts inside
    }
    let b = offset.dot(dir);
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t >= 0.0 {
        Some(t)
    } else {
        None
    }
}

/// A point entity (boid) registered with the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub handle: EntityHandle,
    pub position: Point,
    pub layer: LayerMask,
}

#[derive(Debug, Clone, Default)]
pub struct World {
    pub obstacles: Vec<Obstacle>,
    pub tiles: Option<TileGrid>,
    entities: Vec<Entity>,
    next_handle: u64,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Register an entity and return its handle
    pub fn spawn_entity(&mut self, position: Point, layer: LayerMask) -> EntityHandle {
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        self.entities.push(Entity { handle, position, layer });
        handle
    }

    /// Move an entity. Returns false for unknown handles.
    pub fn set_entity_position(&mut self, handle: EntityHandle, position: Point) -> bool {
        match self.entities.iter_mut().find(|e| e.handle == handle) {
            Some(entity) => {
                entity.position = position;
                true
            }
            None => false,
        }
    }

    pub fn remove_entity(&mut self, handle: EntityHandle) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| e.handle != handle);
        self.entities.len() != before
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities.iter().find(|e| e.handle == handle)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

impl OcclusionProvider for World {
    fn raycast(
        &self,
        origin: Point,
        direction: Point,
        max_distance: f32,
        mask: LayerMask,
    ) -> Result<Option<RayHit>, QueryError> {
        if !origin.x.is_finite() || !origin.y.is_finite() {
            return Err(QueryError::InvalidQuery("non-finite ray origin"));
        }
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(QueryError::InvalidQuery("ray length must be finite and non-negative"));
        }

        let mut nearest = self
            .obstacles
            .iter()
            .filter(|o| o.layer.intersects(mask))
            .filter_map(|o| o.intersect(origin, direction, max_distance))
            .fold(None, |best: Option<f32>, t| Some(best.map_or(t, |b| b.min(t))));

        if let Some(tiles) = &self.tiles {
            if let Some(hit) = tiles.raycast(origin, direction, max_distance, mask)? {
                if nearest.map_or(true, |t| hit.distance < t) {
                    nearest = Some(hit.distance);
                }
            }
        }

        Ok(nearest.map(|t| RayHit {
            point: origin + direction * t,
            distance: t,
        }))
    }
}

impl SpatialProvider for World {
    fn query_radius(
        &self,
        center: Point,
        radius: f32,
        mask: LayerMask,
    ) -> Result<Vec<EntityHit>, QueryError> {
        if !center.x.is_finite() || !center.y.is_finite() || radius.is_nan() {
            return Err(QueryError::InvalidQuery("non-finite radius query"));
        }
        let radius_sq = radius * radius;
        Ok(self
            .entities
            .iter()
            .filter(|e| e.layer.intersects(mask))
            .filter(|e| e.position.distance_squared(center) <= radius_sq)
            .map(|e| EntityHit {
                handle: e.handle,
                position: e.position,
            })
            .collect())
    }
}
