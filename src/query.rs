//! Collaborator interfaces the visibility core queries.
//!
//! The core never knows what geometry sits behind these traits: the
//! in-crate [`World`](crate::world::World) and [`TileGrid`](crate::grid::TileGrid)
//! are just two implementations.

use crate::geometry::{Bounds, Point};
use crate::layer::LayerMask;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable handle identifying an entity (usually a boid) in a spatial provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityHandle(pub u64);

/// Nearest intersection reported by an occlusion provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Point,
    pub distance: f32,
}

/// Entity reported by a spatial overlap query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityHit {
    pub handle: EntityHandle,
    pub position: Point,
}

/// Errors a provider may report. The core absorbs all of them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    /// Provider cannot answer right now (e.g. geometry being rebuilt)
    #[error("query provider unavailable: {0}")]
    Unavailable(String),
    /// Query arguments the provider refuses (NaN origin, zero direction, ...)
    #[error("invalid query: {0}")]
    InvalidQuery(&'static str),
}

/// Nearest-intersection ray queries against obstacle geometry.
///
/// `direction` is a unit vector. Implementations report the closest hit with
/// `0 <= distance <= max_distance` on a layer in `mask`, or `Ok(None)`.
pub trait OcclusionProvider: Sync {
    fn raycast(
        &self,
        origin: Point,
        direction: Point,
        max_distance: f32,
        mask: LayerMask,
    ) -> Result<Option<RayHit>, QueryError>;
}

/// Radius queries over point entities.
///
/// Reports every entity on a layer in `mask` whose distance to `center` is
/// at most `radius`.
pub trait SpatialProvider: Sync {
    fn query_radius(
        &self,
        center: Point,
        radius: f32,
        mask: LayerMask,
    ) -> Result<Vec<EntityHit>, QueryError>;
}

/// Extent of the playable world, if the host defines one.
///
/// Agents that leave it are moved back in by [`Bounds::wrap`].
pub trait BoundsProvider {
    fn world_bounds(&self) -> Option<Bounds>;
}

impl BoundsProvider for Bounds {
    fn world_bounds(&self) -> Option<Bounds> {
        Some(*self)
    }
}

impl<T: OcclusionProvider + ?Sized> OcclusionProvider for &T {
    fn raycast(
        &self,
        origin: Point,
        direction: Point,
        max_distance: f32,
        mask: LayerMask,
    ) -> Result<Option<RayHit>, QueryError> {
        (**self).raycast(origin, direction, max_distance, mask)
    }
}

impl<T: SpatialProvider + ?Sized> SpatialProvider for &T {
    fn query_radius(
        &self,
        center: Point,
        radius: f32,
        mask: LayerMask,
    ) -> Result<Vec<EntityHit>, QueryError> {
        (**self).query_radius(center, radius, mask)
    }
}
