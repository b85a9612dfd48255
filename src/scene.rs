use crate::agent::Boid;
use crate::field_of_view::{FieldOfView, LayerFilters, ViewSettings};
use crate::geometry::{wrap_degrees, Point, Pose};
use crate::grid::{cell_count, TileGrid, MAX_TILE_CELLS};
use crate::layer::LayerMask;
use crate::world::{Obstacle, World};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write scene file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scene: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to serialize scene: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("tile {id} lies outside the {cols}x{rows} grid")]
    TileOutOfGrid { id: i32, rows: i32, cols: i32 },
    #[error("{cols}x{rows} tile grid exceeds {max} cells")]
    GridTooLarge { rows: i32, cols: i32, max: i32 },
}

/// Arena description: static obstacles, an optional tile layer and boids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub name: String,
    /// View settings for every boid; the config file's `[view]` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewSettings>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<TileLayout>,
    #[serde(default)]
    pub boids: Vec<BoidSpawn>,
}

/// Tile grid stored as blocked cell IDs (`x + y * cols`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayout {
    pub rows: i32,
    pub cols: i32,
    #[serde(default = "default_origin")]
    pub origin: Point,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    #[serde(default)]
    pub blocked: Vec<i32>,
    #[serde(default = "default_tile_layer")]
    pub layer: LayerMask,
}

/// Where a boid starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoidSpawn {
    pub position: Point,
    #[serde(default)]
    pub heading: f32,
    /// Overrides the configured move speed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

fn default_origin() -> Point {
    Point::zero()
}

fn default_cell_size() -> f32 {
    1.0
}

fn default_tile_layer() -> LayerMask {
    LayerMask::layer(0)
}

impl TileLayout {
    fn from_grid(grid: &TileGrid) -> Self {
        TileLayout {
            rows: grid.rows,
            cols: grid.cols,
            origin: grid.origin,
            cell_size: grid.cell_size,
            blocked: grid.blocked_ids(),
            layer: grid.layer,
        }
    }

    fn to_grid(&self) -> TileGrid {
        TileGrid::with_blocked(self.rows, self.cols, self.origin, self.cell_size, self.layer, &self.blocked)
    }
}

impl Scene {
    /// Snapshot of a running arena. Boids keep their current pose and speed.
    pub fn from_world(name: &str, world: &World, boids: &[Boid]) -> Self {
        Scene {
            name: name.to_string(),
            view: boids.first().map(|b| *b.field_of_view().settings()),
            obstacles: world.obstacles.clone(),
            tiles: world.tiles.as_ref().map(TileLayout::from_grid),
            boids: boids
                .iter()
                .filter(|b| !b.is_destroyed())
                .map(|b| BoidSpawn {
                    position: b.pose.position,
                    heading: wrap_degrees(b.pose.heading),
                    speed: Some(b.move_speed),
                })
                .collect(),
        }
    }

    /// Reject oversized grids and tiles that do not fit the declared grid
    pub fn validate(&self) -> Result<(), SceneError> {
        if let Some(tiles) = &self.tiles {
            let cells = cell_count(tiles.rows, tiles.cols).ok_or(SceneError::GridTooLarge {
                rows: tiles.rows,
                cols: tiles.cols,
                max: MAX_TILE_CELLS,
            })?;
            if let Some(&id) = tiles.blocked.iter().find(|&&id| id < 0 || id >= cells) {
                return Err(SceneError::TileOutOfGrid {
                    id,
                    rows: tiles.rows,
                    cols: tiles.cols,
                });
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let scene: Scene = serde_json::from_str(json).map_err(SceneError::Parse)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn to_json(&self) -> Result<String, SceneError> {
        serde_json::to_string_pretty(self).map_err(SceneError::Serialize)
    }

    /// Save to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| SceneError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load from file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SceneError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Static geometry only; boids are added by [`build_boids`](Scene::build_boids)
    pub fn build_world(&self) -> World {
        let mut world = World::new();
        for obstacle in &self.obstacles {
            world.add_obstacle(obstacle.clone());
        }
        world.tiles = self.tiles.as_ref().map(TileLayout::to_grid);
        world
    }

    /// Register every boid with `world` on the target layer and give it a
    /// field of view. `settings` applies unless the scene carries its own.
    pub fn build_boids(
        &self,
        world: &mut World,
        settings: ViewSettings,
        layers: LayerFilters,
        move_speed: f32,
    ) -> Vec<Boid> {
        let settings = self.view.unwrap_or(settings);
        self.boids
            .iter()
            .map(|spawn| {
                let handle = world.spawn_entity(spawn.position, layers.targets);
                let fov = FieldOfView::new(settings, layers);
                Boid::new(
                    Pose::new(spawn.position, spawn.heading),
                    spawn.speed.unwrap_or(move_speed),
                    fov,
                )
                .with_handle(handle)
            })
            .collect()
    }
}
