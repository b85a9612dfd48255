use crate::geometry::{angle_between, normalize_or_none, Pose};
use crate::layer::LayerMask;
use crate::query::{EntityHandle, OcclusionProvider, SpatialProvider};
use crate::ray::RayProbe;
use tracing::{debug, warn};

/// Finds the target-layer entities an agent can currently see
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetDetector {
    pub view_radius: f32,
    /// Full cone angle in degrees
    pub view_angle: f32,
    pub obstacle_mask: LayerMask,
    pub target_mask: LayerMask,
    /// Entity never reported (the viewer itself)
    pub owner: Option<EntityHandle>,
}

impl TargetDetector {
    /// Candidates within the radius, inside the half-angle and with no
    /// obstacle hit on the straight line to them.
    ///
    /// A failing spatial query yields an empty set; a failing ray query
    /// counts as unoccluded.
    pub fn detect<O, S>(&self, pose: &Pose, occlusion: &O, spatial: &S) -> Vec<EntityHandle>
    where
        O: OcclusionProvider + ?Sized,
        S: SpatialProvider + ?Sized,
    {
        let candidates = match spatial.query_radius(pose.position, self.view_radius, self.target_mask) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "target query failed, reporting no visible targets");
                return Vec::new();
            }
        };

        let probe = RayProbe::new(pose.position, self.view_radius, self.obstacle_mask, occlusion);
        let forward = pose.forward();
        let half_angle = self.view_angle / 2.0;
        let mut visible = Vec::new();

        for candidate in &candidates {
            if Some(candidate.handle) == self.owner || visible.contains(&candidate.handle) {
                continue;
            }
            let offset = candidate.position - pose.position;
            let Some(dir) = normalize_or_none(offset) else {
                continue;
            };
            if angle_between(forward, dir) > half_angle {
                continue;
            }
            if probe.raycast(dir, offset.magnitude()).is_none() {
                visible.push(candidate.handle);
            }
        }

        if probe.failures() > 0 {
            warn!(failures = probe.failures(), "occlusion queries failed during detection, treated as clear");
        }
        debug!(candidates = candidates.len(), visible = visible.len(), "target detection");

        visible
    }
}
