use crate::field_of_view::FieldOfView;
use crate::geometry::{Point, Pose};
use crate::mesh::ViewMesh;
use crate::query::{BoundsProvider, EntityHandle, OcclusionProvider, SpatialProvider};

/// Boid: moves straight ahead and carries its own field of view
#[derive(Clone, Debug)]
pub struct Boid {
    pub pose: Pose,

    /// World units per second along the forward direction
    pub move_speed: f32,

    /// Handle of the boid's entity in the spatial provider, if registered
    pub handle: Option<EntityHandle>,

    /// Flocking toggles. Stored only; no rule acts on them.
    pub separation: bool,
    pub alignment: bool,
    pub cohesion: bool,

    /// Whether the last detection saw anything
    pub has_target: bool,

    fov: FieldOfView,
    destroyed: bool,
}

impl Boid {
    pub fn new(pose: Pose, move_speed: f32, fov: FieldOfView) -> Self {
        Boid {
            pose,
            move_speed,
            handle: None,
            separation: false,
            alignment: false,
            cohesion: false,
            has_target: false,
            fov,
            destroyed: false,
        }
    }

    /// Attach the boid's own entity so detection never reports it
    pub fn with_handle(mut self, handle: EntityHandle) -> Self {
        self.handle = Some(handle);
        self.fov = self.fov.with_owner(handle);
        self
    }

    pub fn position(&self) -> Point {
        self.pose.position
    }

    pub fn forward(&self) -> Point {
        self.pose.forward()
    }

    pub fn field_of_view(&self) -> &FieldOfView {
        &self.fov
    }

    pub fn field_of_view_mut(&mut self) -> &mut FieldOfView {
        &mut self.fov
    }

    /// Move forward for `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        if self.destroyed || !(delta_time > 0.0) {
            return;
        }
        let step = self.pose.forward() * (self.move_speed * delta_time);
        self.pose.position += step;
    }

    /// Bring the boid back in at the opposite side once it leaves the world.
    /// Returns whether it moved.
    pub fn wrap_within<B: BoundsProvider + ?Sized>(&mut self, bounds: &B) -> bool {
        let Some(bounds) = bounds.world_bounds() else {
            return false;
        };
        if self.destroyed || bounds.contains(self.pose.position) {
            return false;
        }
        self.pose.position = bounds.wrap(self.pose.position);
        true
    }

    /// Rebuild the view mesh. Run after every boid has moved this frame.
    pub fn late_update<O: OcclusionProvider + ?Sized>(&mut self, occlusion: &O) -> &ViewMesh {
        self.fov.late_update(&self.pose, occlusion)
    }

    /// Advance target detection; returns whether it ran
    pub fn tick<O, S>(&mut self, delta_time: f32, occlusion: &O, spatial: &S) -> bool
    where
        O: OcclusionProvider + ?Sized,
        S: SpatialProvider + ?Sized,
    {
        let pose = self.pose;
        let ran = self.fov.tick(delta_time, &pose, occlusion, spatial);
        if ran {
            self.has_target = !self.fov.visible_targets().is_empty();
        }
        ran
    }

    pub fn visible_targets(&self) -> &[EntityHandle] {
        self.fov.visible_targets()
    }

    pub fn visibility_mesh(&self) -> &ViewMesh {
        self.fov.visibility_mesh()
    }

    /// Stop the boid and its detection timer
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.has_target = false;
        self.fov.shutdown();
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_of_view::{LayerFilters, ViewSettings};
    use crate::geometry::Bounds;
    use crate::world::World;

    fn boid(heading: f32, speed: f32) -> Boid {
        let fov = FieldOfView::new(ViewSettings::default(), LayerFilters::default());
        Boid::new(Pose::new(Point::zero(), heading), speed, fov)
    }

    #[test]
    fn test_moves_along_heading() {
        let mut b = boid(90.0, 2.0);
        b.update(0.5);
        assert!((b.position() - Point::new(-1.0, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_negative_delta_does_not_move() {
        let mut b = boid(0.0, 2.0);
        b.update(-1.0);
        b.update(f32::NAN);
        assert_eq!(b.position(), Point::zero());
    }

    #[test]
    fn test_destroyed_boid_is_inert() {
        let mut world = World::new();
        let mut b = boid(0.0, 1.0);
        b.destroy();
        b.update(1.0);
        assert_eq!(b.position(), Point::zero());
        assert!(!b.tick(10.0, &world, &world));
        world.spawn_entity(Point::new(0.0, 2.0), LayerFilters::default().targets);
        assert!(!b.tick(10.0, &world, &world));
        assert!(b.visible_targets().is_empty());
        assert!(!b.field_of_view().is_active());
    }

    #[test]
    fn test_with_handle_sets_owner() {
        let mut world = World::new();
        let targets = LayerFilters::default().targets;
        let me = world.spawn_entity(Point::zero(), targets);
        let other = world.spawn_entity(Point::new(0.0, 3.0), targets);
        let mut b = boid(0.0, 0.0).with_handle(me);
        assert!(b.tick(0.2, &world, &world));
        assert_eq!(b.visible_targets(), &[other]);
    }

    #[test]
    fn test_has_target_follows_detection() {
        let mut world = World::new();
        let targets = LayerFilters::default().targets;
        let other = world.spawn_entity(Point::new(0.0, 3.0), targets);
        let mut b = boid(0.0, 0.0);
        assert!(!b.has_target);

        assert!(b.tick(0.2, &world, &world));
        assert!(b.has_target);

        // unchanged between detections
        world.set_entity_position(other, Point::new(0.0, -3.0));
        assert!(!b.tick(0.1, &world, &world));
        assert!(b.has_target);

        assert!(b.tick(0.1, &world, &world));
        assert!(!b.has_target);

        world.set_entity_position(other, Point::new(0.0, 3.0));
        assert!(b.tick(0.2, &world, &world));
        b.destroy();
        assert!(!b.has_target);
    }

    #[test]
    fn test_wrap_within_bounds() {
        let bounds = Bounds::from_corners(Point::new(-5.0, -5.0), Point::new(5.0, 5.0));
        let mut b = boid(0.0, 4.0);
        b.update(1.0);
        assert!(!b.wrap_within(&bounds));
        assert_eq!(b.position(), Point::new(0.0, 4.0));

        b.update(0.5);
        assert!(b.wrap_within(&bounds));
        assert_eq!(b.position(), Point::new(0.0, -5.0));
        assert_eq!(b.pose.heading, 0.0);

        // no bounds, no wrap
        let mut far = boid(90.0, 1.0);
        far.pose.position = Point::new(-100.0, 0.0);
        assert!(!far.wrap_within(&NoBounds));
        far.destroy();
        assert!(!far.wrap_within(&bounds));
        assert_eq!(far.position(), Point::new(-100.0, 0.0));
    }

    struct NoBounds;

    impl BoundsProvider for NoBounds {
        fn world_bounds(&self) -> Option<Bounds> {
            None
        }
    }
}
