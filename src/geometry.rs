use serde::{Deserialize, Serialize};
use vek::Vec2;

/// World or local 2D position
pub type Point = Vec2<f32>;

/// Smallest angle delta (degrees) treated as distinct
pub const ANGLE_EPSILON: f32 = 1e-4;

/// Squared length below which a direction vector is considered degenerate
pub const DIRECTION_EPSILON_SQ: f32 = 1e-12;

/// Unit direction for an angle in degrees.
///
/// Angle 0 points along +Y and angles grow counter-clockwise, so the result
/// is `(-sin a, cos a)`.
pub fn dir_from_angle(angle_deg: f32) -> Point {
    let rad = angle_deg.to_radians();
    Point::new(-rad.sin(), rad.cos())
}

/// Inverse of [`dir_from_angle`]; returns `None` for a zero-length vector.
pub fn angle_of(dir: Point) -> Option<f32> {
    if dir.magnitude_squared() < DIRECTION_EPSILON_SQ {
        return None;
    }
    Some((-dir.x).atan2(dir.y).to_degrees())
}

/// Normalize, refusing zero-length input instead of producing NaN
pub fn normalize_or_none(v: Point) -> Option<Point> {
    let len_sq = v.magnitude_squared();
    if len_sq < DIRECTION_EPSILON_SQ {
        return None;
    }
    Some(v / len_sq.sqrt())
}

/// Unsigned angle between two vectors in degrees, in [0, 180].
/// Degenerate input yields 0.
pub fn angle_between(a: Point, b: Point) -> f32 {
    let denom = (a.magnitude_squared() * b.magnitude_squared()).sqrt();
    if denom < DIRECTION_EPSILON_SQ {
        return 0.0;
    }
    let cos = (a.dot(b) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Rotate counter-clockwise by `angle_deg`
pub fn rotate(v: Point, angle_deg: f32) -> Point {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    Point::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Wrap an angle into (-180, 180]
pub fn wrap_degrees(mut angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    angle %= 360.0;
    if angle <= -180.0 {
        angle += 360.0;
    } else if angle > 180.0 {
        angle -= 360.0;
    }
    angle
}

/// Position and heading of an agent in the arena.
///
/// The heading is the rotation about Z in degrees: a heading of 0 faces +Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    pub heading: f32,
}

impl Pose {
    pub fn new(position: Point, heading: f32) -> Self {
        Pose { position, heading }
    }

    /// Build a pose from a forward vector. A zero vector keeps heading 0.
    pub fn facing(position: Point, forward: Point) -> Self {
        Pose {
            position,
            heading: angle_of(forward).unwrap_or(0.0),
        }
    }

    /// Unit vector the agent is facing ("up" of its transform)
    pub fn forward(&self) -> Point {
        dir_from_angle(self.heading)
    }

    /// Direction for an angle, either global or relative to this pose's heading
    pub fn dir_from_angle(&self, angle_deg: f32, angle_is_global: bool) -> Point {
        if angle_is_global {
            dir_from_angle(angle_deg)
        } else {
            dir_from_angle(angle_deg + self.heading)
        }
    }

    /// World point into this pose's local frame (pose position → origin, forward → +Y)
    pub fn inverse_transform_point(&self, world: Point) -> Point {
        rotate(world - self.position, -self.heading)
    }

    /// Local point back into world space
    pub fn transform_point(&self, local: Point) -> Point {
        rotate(local, self.heading) + self.position
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::new(Point::zero(), 0.0)
    }
}

/// Axis-aligned world rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Rectangle spanned by two opposite corners, in any order
    pub fn from_corners(a: Point, b: Point) -> Self {
        Bounds {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// A point past one side re-enters at the opposite side. Each axis wraps
    /// on its own; points inside are returned unchanged.
    pub fn wrap(&self, p: Point) -> Point {
        Point::new(
            wrap_axis(p.x, self.min.x, self.max.x),
            wrap_axis(p.y, self.min.y, self.max.y),
        )
    }
}

fn wrap_axis(v: f32, min: f32, max: f32) -> f32 {
    if v > max {
        min
    } else if v < min {
        max
    } else {
        v
    }
}
