//! Per-agent field of view: the view mesh recomputed every frame and the
//! visible target set refreshed on a slower timer.

use crate::cone::ViewCone;
use crate::edge::EdgeRefiner;
use crate::geometry::{Point, Pose};
use crate::layer::LayerMask;
use crate::mesh::{MeshTriangulator, ViewMesh};
use crate::polygon::{VisibilityPolygon, VisibilityPolygonBuilder};
use crate::query::{EntityHandle, OcclusionProvider, SpatialProvider};
use crate::ray::RayProbe;
use crate::targets::TargetDetector;
use crate::timer::RepeatingTimer;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_DETECTION_INTERVAL: f32 = 0.2;

/// Tunables of a field of view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Full cone angle in degrees, 0..=360
    #[serde(default = "default_view_angle")]
    pub view_angle: f32,
    #[serde(default = "default_view_radius")]
    pub view_radius: f32,
    /// Rays per degree
    #[serde(default = "default_mesh_resolution")]
    pub mesh_resolution: f32,
    /// Distance jump between neighbouring hits that counts as an edge
    #[serde(default = "default_edge_dist_threshold")]
    pub edge_dist_threshold: f32,
    /// Bisection steps per edge
    #[serde(default = "default_edge_resolution")]
    pub edge_resolution: u32,
    /// Seconds between target detections
    #[serde(default = "default_detection_interval")]
    pub detection_interval: f32,
}

fn default_view_angle() -> f32 { 90.0 }
fn default_view_radius() -> f32 { 10.0 }
fn default_mesh_resolution() -> f32 { 1.0 }
fn default_edge_dist_threshold() -> f32 { 0.5 }
fn default_edge_resolution() -> u32 { 4 }
fn default_detection_interval() -> f32 { DEFAULT_DETECTION_INTERVAL }

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            view_angle: default_view_angle(),
            view_radius: default_view_radius(),
            mesh_resolution: default_mesh_resolution(),
            edge_dist_threshold: default_edge_dist_threshold(),
            edge_resolution: default_edge_resolution(),
            detection_interval: default_detection_interval(),
        }
    }
}

/// Replace a non-positive or NaN value, logging the substitution
fn positive_or(name: &'static str, value: f32, fallback: f32) -> f32 {
    if value > 0.0 && value.is_finite() {
        value
    } else {
        warn!(setting = name, value, fallback, "invalid view setting clamped");
        fallback
    }
}

impl ViewSettings {
    /// Clamp every value into its valid range. Never fails.
    pub fn sanitized(self) -> Self {
        let view_angle = if self.view_angle.is_nan() {
            warn!(setting = "view_angle", "NaN view angle clamped to 0");
            0.0
        } else if !(0.0..=360.0).contains(&self.view_angle) {
            let clamped = self.view_angle.clamp(0.0, 360.0);
            warn!(setting = "view_angle", value = self.view_angle, clamped, "view angle out of range");
            clamped
        } else {
            self.view_angle
        };

        let edge_resolution = if self.edge_resolution == 0 {
            warn!(setting = "edge_resolution", "zero edge resolution clamped to 1");
            1
        } else {
            self.edge_resolution
        };

        ViewSettings {
            view_angle,
            view_radius: positive_or("view_radius", self.view_radius, 1.0),
            mesh_resolution: positive_or("mesh_resolution", self.mesh_resolution, 1.0),
            edge_dist_threshold: positive_or("edge_dist_threshold", self.edge_dist_threshold, 1.0),
            edge_resolution,
            detection_interval: positive_or(
                "detection_interval",
                self.detection_interval,
                DEFAULT_DETECTION_INTERVAL,
            ),
        }
    }
}

/// Layers a field of view looks through and looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerFilters {
    pub obstacles: LayerMask,
    pub targets: LayerMask,
}

impl Default for LayerFilters {
    fn default() -> Self {
        LayerFilters {
            obstacles: LayerMask::layer(0),
            targets: LayerMask::layer(1),
        }
    }
}

/// Everything one visibility recompute reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerState {
    pub pose: Pose,
    pub settings: ViewSettings,
}

impl ViewerState {
    pub fn position(&self) -> Point {
        self.pose.position
    }

    /// Unit forward direction
    pub fn forward(&self) -> Point {
        self.pose.forward()
    }

    pub fn cone(&self) -> ViewCone {
        ViewCone::new(self.pose.heading, self.settings.view_angle, self.settings.mesh_resolution)
    }

    pub fn refiner(&self) -> EdgeRefiner {
        EdgeRefiner::new(self.settings.edge_dist_threshold, self.settings.edge_resolution)
    }

    /// Cast the cone and refine its edges into a visibility polygon
    pub fn visibility_polygon<O: OcclusionProvider + ?Sized>(
        &self,
        obstacles: LayerMask,
        occlusion: &O,
    ) -> VisibilityPolygon {
        let probe = RayProbe::new(self.pose.position, self.settings.view_radius, obstacles, occlusion);
        let polygon = VisibilityPolygonBuilder::new(&probe, self.refiner()).build(&self.cone());
        if probe.failures() > 0 {
            warn!(failures = probe.failures(), "occlusion queries failed, treated as open space");
        }
        polygon
    }
}

/// Field of view component owned by one agent
#[derive(Debug, Clone)]
pub struct FieldOfView {
    settings: ViewSettings,
    layers: LayerFilters,
    owner: Option<EntityHandle>,
    mesh: ViewMesh,
    visible_targets: Vec<EntityHandle>,
    detection_timer: RepeatingTimer,
}

impl FieldOfView {
    pub fn new(settings: ViewSettings, layers: LayerFilters) -> Self {
        let settings = settings.sanitized();
        FieldOfView {
            settings,
            layers,
            owner: None,
            mesh: ViewMesh {
                name: "ViewMesh".to_string(),
                ..ViewMesh::default()
            },
            visible_targets: Vec::new(),
            detection_timer: RepeatingTimer::new(settings.detection_interval, DEFAULT_DETECTION_INTERVAL),
        }
    }

    /// Never report this entity as a target (the agent itself)
    pub fn with_owner(mut self, owner: EntityHandle) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn layers(&self) -> LayerFilters {
        self.layers
    }

    /// Apply new settings; invalid values are clamped
    pub fn configure(&mut self, settings: ViewSettings) {
        self.settings = settings.sanitized();
        self.detection_timer.set_interval(self.settings.detection_interval);
    }

    /// Takes effect at the next mesh rebuild or detection
    pub fn set_layers(&mut self, layers: LayerFilters) {
        self.layers = layers;
    }

    pub fn viewer_state(&self, pose: Pose) -> ViewerState {
        ViewerState {
            pose,
            settings: self.settings,
        }
    }

    pub fn detector(&self) -> TargetDetector {
        TargetDetector {
            view_radius: self.settings.view_radius,
            view_angle: self.settings.view_angle,
            obstacle_mask: self.layers.obstacles,
            target_mask: self.layers.targets,
            owner: self.owner,
        }
    }

    /// Rebuild the view mesh for this frame. Call after movement.
    pub fn late_update<O: OcclusionProvider + ?Sized>(&mut self, pose: &Pose, occlusion: &O) -> &ViewMesh {
        let polygon = self.viewer_state(*pose).visibility_polygon(self.layers.obstacles, occlusion);
        MeshTriangulator::triangulate_into(pose, &polygon, &mut self.mesh);
        debug!(
            samples = polygon.sample_count,
            edges = polygon.edge_count,
            vertices = self.mesh.vertices.len(),
            "view mesh rebuilt"
        );
        &self.mesh
    }

    /// Advance the detection timer; runs detection when it fires.
    /// Returns whether detection ran.
    pub fn tick<O, S>(&mut self, delta_time: f32, pose: &Pose, occlusion: &O, spatial: &S) -> bool
    where
        O: OcclusionProvider + ?Sized,
        S: SpatialProvider + ?Sized,
    {
        if !self.detection_timer.tick(delta_time) {
            return false;
        }
        self.find_visible_targets(pose, occlusion, spatial);
        true
    }

    /// Replace the visible set with a fresh detection
    pub fn find_visible_targets<O, S>(&mut self, pose: &Pose, occlusion: &O, spatial: &S) -> &[EntityHandle]
    where
        O: OcclusionProvider + ?Sized,
        S: SpatialProvider + ?Sized,
    {
        self.visible_targets = self.detector().detect(pose, occlusion, spatial);
        &self.visible_targets
    }

    /// Mesh from the last [`late_update`](FieldOfView::late_update)
    pub fn visibility_mesh(&self) -> &ViewMesh {
        &self.mesh
    }

    /// Targets from the last detection
    pub fn visible_targets(&self) -> &[EntityHandle] {
        &self.visible_targets
    }

    /// Whether `target` was in the last detection
    pub fn can_see(&self, target: EntityHandle) -> bool {
        self.visible_targets.contains(&target)
    }

    /// Stop detection for good and drop the last results
    pub fn shutdown(&mut self) {
        self.detection_timer.cancel();
        self.visible_targets.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.detection_timer.is_cancelled()
    }
}
