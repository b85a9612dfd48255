#![allow(dead_code)]

use boidsight::scene::{BoidSpawn, TileLayout};
use boidsight::{
    Boid, EntityHandle, FieldOfView, LayerFilters, Obstacle, Point, Pose, Scene, Shape, ViewSettings, World,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Scene fixture with the targets each listed boid should see
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneFixture {
    #[serde(rename = "testName")]
    pub test_name: String,
    pub scene: Scene,
    pub expected: Vec<ExpectedView>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExpectedView {
    /// Index into `scene.boids`
    pub boid: usize,
    /// Indices of the boids it sees
    pub visible: Vec<usize>,
    #[serde(rename = "triangleCount", default)]
    pub triangle_count: Option<usize>,
}

/// Load a fixture from JSON file
pub fn load_fixture(path: &Path) -> Result<SceneFixture, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    let fixture: SceneFixture = serde_json::from_str(&contents)?;
    Ok(fixture)
}

pub fn fixture_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test_data")
}

fn mirror_point(p: Point) -> Point {
    Point::new(-p.x, p.y)
}

/// Mirror a fixture across the Y axis (x -> -x). Visibility must not change.
pub fn mirror_fixture(fixture: &SceneFixture) -> SceneFixture {
    let scene = &fixture.scene;
    let obstacles = scene
        .obstacles
        .iter()
        .map(|o| {
            let shape = match &o.shape {
                Shape::Segment { a, b } => Shape::Segment {
                    a: mirror_point(*a),
                    b: mirror_point(*b),
                },
                Shape::Polyline { points, closed } => Shape::Polyline {
                    points: points.iter().copied().map(mirror_point).collect(),
                    closed: *closed,
                },
                Shape::Circle { center, radius } => Shape::Circle {
                    center: mirror_point(*center),
                    radius: *radius,
                },
            };
            Obstacle { shape, layer: o.layer }
        })
        .collect();

    let tiles = scene.tiles.as_ref().map(|t| TileLayout {
        origin: Point::new(-(t.origin.x + t.cols as f32 * t.cell_size), t.origin.y),
        blocked: t
            .blocked
            .iter()
            .map(|&id| {
                let (x, y) = (id % t.cols, id / t.cols);
                (t.cols - 1 - x) + y * t.cols
            })
            .collect(),
        ..t.clone()
    });

    let boids = scene
        .boids
        .iter()
        .map(|b| BoidSpawn {
            position: mirror_point(b.position),
            heading: -b.heading,
            speed: b.speed,
        })
        .collect();

    SceneFixture {
        test_name: format!("{}_mirror", fixture.test_name),
        scene: Scene {
            name: scene.name.clone(),
            view: scene.view,
            obstacles,
            tiles,
            boids,
        },
        expected: fixture.expected.clone(),
    }
}

/// Run one fixture variant. Returns a description of the first mismatch.
pub fn run_single_fixture(fixture: &SceneFixture) -> Result<(), String> {
    boidsight::logging::init_for_tests();
    let mut world = fixture.scene.build_world();
    let mut boids = fixture
        .scene
        .build_boids(&mut world, ViewSettings::default(), LayerFilters::default(), 0.0);

    let index_of = |handle: EntityHandle, boids: &[Boid]| boids.iter().position(|b| b.handle == Some(handle));

    for expected in &fixture.expected {
        let boid = boids
            .get_mut(expected.boid)
            .ok_or_else(|| format!("no boid {}", expected.boid))?;
        let pose = boid.pose;
        let handles = boid.field_of_view_mut().find_visible_targets(&pose, &world, &world).to_vec();
        let triangles = boid.late_update(&world).triangle_count();

        let actual: BTreeSet<usize> = handles.iter().filter_map(|&h| index_of(h, &boids)).collect();
        let wanted: BTreeSet<usize> = expected.visible.iter().copied().collect();
        if actual != wanted {
            return Err(format!(
                "boid {} sees {:?}, expected {:?}",
                expected.boid, actual, wanted
            ));
        }
        if let Some(count) = expected.triangle_count {
            if triangles != count {
                return Err(format!(
                    "boid {} mesh has {} triangles, expected {}",
                    expected.boid, triangles, count
                ));
            }
        }
    }
    Ok(())
}

/// Run a fixture and its mirrored variant
pub fn run_fixture(fixture: &SceneFixture) -> Result<(), String> {
    run_single_fixture(fixture).map_err(|e| format!("[original] {}", e))?;
    run_single_fixture(&mirror_fixture(fixture)).map_err(|e| format!("[mirror] {}", e))
}

/// Field of view with default layers
pub fn fov(view_angle: f32, view_radius: f32) -> FieldOfView {
    FieldOfView::new(
        ViewSettings {
            view_angle,
            view_radius,
            ..ViewSettings::default()
        },
        LayerFilters::default(),
    )
}

/// Register a stationary boid with `world`
pub fn spawn_boid(world: &mut World, position: Point, heading: f32, fov: FieldOfView) -> Boid {
    let handle = world.spawn_entity(position, LayerFilters::default().targets);
    Boid::new(Pose::new(position, heading), 0.0, fov).with_handle(handle)
}

pub fn wall(a: (f32, f32), b: (f32, f32)) -> Obstacle {
    Obstacle::segment(
        Point::new(a.0, a.1),
        Point::new(b.0, b.1),
        LayerFilters::default().obstacles,
    )
}

pub fn assert_close(actual: f32, expected: f32, eps: f32) {
    assert!(
        (actual - expected).abs() <= eps,
        "expected {} within {} of {}",
        actual,
        eps,
        expected
    );
}

pub fn assert_point_close(actual: Point, expected: Point, eps: f32) {
    assert!(
        actual.distance(expected) <= eps,
        "expected {:?} within {} of {:?}",
        actual,
        eps,
        expected
    );
}
