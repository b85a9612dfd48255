pub mod agent;
pub mod cone;
pub mod config;
pub mod edge;
pub mod field_of_view;
pub mod geometry;
pub mod grid;
pub mod layer;
pub mod logging;
pub mod mesh;
pub mod polygon;
pub mod query;
pub mod ray;
pub mod scene;
pub mod targets;
pub mod timer;
pub mod world;

pub use agent::Boid;
pub use cone::ViewCone;
pub use config::{Config, ConfigError};
pub use edge::{EdgeRefiner, EdgeSample};
pub use field_of_view::{FieldOfView, LayerFilters, ViewSettings, ViewerState};
pub use geometry::{Bounds, Point, Pose};
pub use grid::TileGrid;
pub use layer::LayerMask;
pub use mesh::{MeshTriangulator, ViewMesh};
pub use polygon::{VisibilityPolygon, VisibilityPolygonBuilder};
pub use query::{BoundsProvider, EntityHandle, EntityHit, OcclusionProvider, QueryError, RayHit, SpatialProvider};
pub use ray::{RayProbe, ViewCastSample};
pub use scene::{Scene, SceneError};
pub use targets::TargetDetector;
pub use timer::RepeatingTimer;
pub use world::{Obstacle, Shape, World};
