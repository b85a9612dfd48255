/// Upper bound on rays per recompute, so a runaway resolution cannot exhaust memory
pub const MAX_STEP_COUNT: usize = 1 << 16;

/// Angular sampling of a view cone.
///
/// The cone is centered on `forward_angle` and spans `view_angle` degrees;
/// `step_count` rays are spread from the clockwise edge counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCone {
    /// Global heading of the cone center in degrees
    pub forward_angle: f32,
    /// Full opening angle in degrees
    pub view_angle: f32,
    /// Number of samples (always >= 1)
    pub step_count: usize,
    /// Angle between consecutive samples (0 when degenerate)
    pub step_angle: f32,
    /// Angle of sample 0
    pub start_angle: f32,
}

impl ViewCone {
    /// Build the sampling for a cone.
    ///
    /// `step_count = round(view_angle * mesh_resolution)` with ties to even.
    /// When that rounds below 1 (e.g. a zero-width cone) a single ray is cast
    /// straight along `forward_angle`.
    pub fn new(forward_angle: f32, view_angle: f32, mesh_resolution: f32) -> Self {
        let raw = (view_angle * mesh_resolution).round_ties_even();

        if !raw.is_finite() || raw < 1.0 {
            return ViewCone {
                forward_angle,
                view_angle,
                step_count: 1,
                step_angle: 0.0,
                start_angle: forward_angle,
            };
        }

        let step_count = (raw as usize).min(MAX_STEP_COUNT);
        let step_angle = view_angle / step_count as f32;

        ViewCone {
            forward_angle,
            view_angle,
            step_count,
            step_angle,
            start_angle: forward_angle - view_angle / 2.0,
        }
    }

    /// True when the cone collapsed to the single forward ray
    pub fn is_degenerate(&self) -> bool {
        self.step_angle == 0.0
    }

    /// Angle of sample `i`
    pub fn angle(&self, i: usize) -> f32 {
        self.start_angle + self.step_angle * i as f32
    }

    /// All sample angles in increasing order
    pub fn angles(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.step_count).map(move |i| self.angle(i))
    }
}
