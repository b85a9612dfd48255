use crate::geometry::{dir_from_angle, Point};
use crate::layer::LayerMask;
use crate::query::{OcclusionProvider, RayHit};
use std::cell::Cell;

/// Result of one view ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCastSample {
    /// Whether an obstacle stopped the ray
    pub hit: bool,
    /// Impact point, or the ray's end at full view radius on a miss
    pub point: Point,
    /// Distance travelled (view radius on a miss)
    pub distance: f32,
    /// Global angle of the ray in degrees
    pub angle: f32,
}

/// Issues view rays from a fixed origin against an obstacle layer.
///
/// Provider errors are treated as misses (open space) and counted, so the
/// caller can report them once per recompute instead of once per ray.
pub struct RayProbe<'a, O: OcclusionProvider + ?Sized> {
    origin: Point,
    view_radius: f32,
    mask: LayerMask,
    occlusion: &'a O,
    failures: Cell<u32>,
}

impl<'a, O: OcclusionProvider + ?Sized> RayProbe<'a, O> {
    pub fn new(origin: Point, view_radius: f32, mask: LayerMask, occlusion: &'a O) -> Self {
        RayProbe {
            origin,
            view_radius,
            mask,
            occlusion,
            failures: Cell::new(0),
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn view_radius(&self) -> f32 {
        self.view_radius
    }

    /// Cast a ray at a global angle, bounded by the view radius
    pub fn cast(&self, global_angle: f32) -> ViewCastSample {
        let dir = dir_from_angle(global_angle);
        match self.raycast(dir, self.view_radius) {
            Some(hit) => ViewCastSample {
                hit: true,
                point: hit.point,
                distance: hit.distance,
                angle: global_angle,
            },
            None => ViewCastSample {
                hit: false,
                point: self.origin + dir * self.view_radius,
                distance: self.view_radius,
                angle: global_angle,
            },
        }
    }

    /// Raw query along a unit direction; failures count as a miss
    pub fn raycast(&self, dir: Point, max_distance: f32) -> Option<RayHit> {
        match self.occlusion.raycast(self.origin, dir, max_distance, self.mask) {
            Ok(hit) => hit,
            Err(_) => {
                self.failures.set(self.failures.get() + 1);
                None
            }
        }
    }

    /// Number of provider failures absorbed so far
    pub fn failures(&self) -> u32 {
        self.failures.get()
    }
}
