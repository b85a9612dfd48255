use crate::geometry::Point;
use crate::layer::LayerMask;
use crate::query::{OcclusionProvider, QueryError, RayHit};
use tracing::warn;

/// Largest number of cells a grid may hold
pub const MAX_TILE_CELLS: i32 = 1 << 24;

/// `rows * cols`, or `None` when it overflows or exceeds [`MAX_TILE_CELLS`].
/// Negative dimensions count as zero.
pub fn cell_count(rows: i32, cols: i32) -> Option<i32> {
    rows.max(0)
        .checked_mul(cols.max(0))
        .filter(|&cells| cells <= MAX_TILE_CELLS)
}

/// Tile grid obstacle layer.
/// Cell values: 0=free, 1=blocked (solid square). Cells outside the grid are free.
#[derive(Clone, Debug)]
pub struct TileGrid {
    pub rows: i32,
    pub cols: i32,
    pub cells: Vec<i32>,
    /// World position of the lower-left corner of cell (0, 0)
    pub origin: Point,
    /// Edge length of one square cell in world units
    pub cell_size: f32,
    /// Layer the blocked tiles live on
    pub layer: LayerMask,
    /// Revision number - incremented whenever grid cells change
    pub revision: u64,
}

impl TileGrid {
    /// Create a new grid with all cells free. A grid too large to allocate
    /// comes back empty.
    pub fn new(rows: i32, cols: i32, origin: Point, cell_size: f32, layer: LayerMask) -> Self {
        let (rows, cols, cells) = match cell_count(rows, cols) {
            Some(cells) => (rows.max(0), cols.max(0), cells),
            None => {
                warn!(rows, cols, "tile grid too large, leaving it empty");
                (0, 0, 0)
            }
        };
        TileGrid {
            rows,
            cols,
            cells: vec![0; cells as usize],
            origin,
            cell_size: if cell_size > 0.0 { cell_size } else { 1.0 },
            layer,
            revision: 0,
        }
    }

    /// Create a grid with specific blocked cells
    pub fn with_blocked(
        rows: i32,
        cols: i32,
        origin: Point,
        cell_size: f32,
        layer: LayerMask,
        blocked: &[i32],
    ) -> Self {
        let mut grid = Self::new(rows, cols, origin, cell_size, layer);
        for &cell_id in blocked {
            if cell_id >= 0 && (cell_id as usize) < grid.cells.len() {
                grid.cells[cell_id as usize] = 1;
            }
        }
        grid
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.cols && y >= 0 && y < self.rows
    }

    /// Check if a cell at (x, y) is blocked
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.cells[self.get_id(x, y) as usize] == 1
    }

    /// Convert (x, y) coordinates to cell ID
    pub fn get_id(&self, x: i32, y: i32) -> i32 {
        x + y * self.cols
    }

    /// Convert cell ID to (x, y) coordinates
    pub fn get_coords(&self, id: i32) -> (i32, i32) {
        (id % self.cols, id / self.cols)
    }

    /// Set cell value at (x, y)
    pub fn set_cell(&mut self, x: i32, y: i32, value: i32) {
        if self.in_bounds(x, y) {
            let id = self.get_id(x, y);
            if self.cells[id as usize] != value {
                self.cells[id as usize] = value;
                self.revision += 1;
            }
        }
    }

    /// IDs of all blocked cells, in ascending order
    pub fn blocked_ids(&self) -> Vec<i32> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 1)
            .map(|(i, _)| i as i32)
            .collect()
    }

    /// Cell containing a world point (may lie outside the grid)
    pub fn cell_at(&self, world: Point) -> (i32, i32) {
        let local = (world - self.origin) / self.cell_size;
        (local.x.floor() as i32, local.y.floor() as i32)
    }

    /// Lower-left world corner of a cell
    pub fn cell_corner(&self, x: i32, y: i32) -> Point {
        self.origin + Point::new(x as f32, y as f32) * self.cell_size
    }
}

impl OcclusionProvider for TileGrid {
    /// Grid traversal (Amanatides & Woo). The tile the ray starts in never
    /// occludes, so a viewer standing on a blocked tile still sees out.
    fn raycast(
        &self,
        origin: Point,
        direction: Point,
        max_distance: f32,
        mask: LayerMask,
    ) -> Result<Option<RayHit>, QueryError> {
        if !self.layer.intersects(mask) || self.cells.is_empty() {
            return Ok(None);
        }
        if !origin.x.is_finite() || !origin.y.is_finite() {
            return Err(QueryError::InvalidQuery("non-finite ray origin"));
        }
        if direction.x == 0.0 && direction.y == 0.0 {
            return Err(QueryError::InvalidQuery("zero-length ray direction"));
        }
        if !max_distance.is_finite() {
            return Err(QueryError::InvalidQuery("ray length must be finite"));
        }

        // Work in cell units: the grid spans [0, cols] x [0, rows]
        let local = (origin - self.origin) / self.cell_size;
        let dir = direction / self.cell_size;

        // Clip the ray to the grid box so the traversal only ever visits
        // cells that exist
        let Some((t_x0, t_x1)) = slab(local.x, dir.x, self.cols as f32) else {
            return Ok(None);
        };
        let Some((t_y0, t_y1)) = slab(local.y, dir.y, self.rows as f32) else {
            return Ok(None);
        };
        let t_enter = t_x0.max(t_y0).max(0.0);
        let t_exit = t_x1.min(t_y1);
        if !t_enter.is_finite() || t_enter > t_exit || t_enter > max_distance {
            return Ok(None);
        }

        let (cols, rows) = (self.cols as i64, self.rows as i64);
        let entry = local + dir * t_enter;
        let mut cx = (entry.x.floor() as i64).clamp(0, cols - 1);
        let mut cy = (entry.y.floor() as i64).clamp(0, rows - 1);

        let starts_inside =
            local.x >= 0.0 && local.x < self.cols as f32 && local.y >= 0.0 && local.y < self.rows as f32;
        if !starts_inside && self.is_blocked(cx as i32, cy as i32) {
            return Ok(Some(RayHit {
                point: origin + direction * t_enter,
                distance: t_enter,
            }));
        }

        let (step_x, mut t_max_x, t_delta_x) = axis_setup(entry.x, cx, dir.x, t_enter);
        let (step_y, mut t_max_y, t_delta_y) = axis_setup(entry.y, cy, dir.y, t_enter);

        loop {
            let t = if t_max_x < t_max_y {
                cx += step_x;
                let t = t_max_x;
                t_max_x += t_delta_x;
                t
            } else {
                cy += step_y;
                let t = t_max_y;
                t_max_y += t_delta_y;
                t
            };

            // a ray that leaves the box never comes back
            if cx < 0 || cx >= cols || cy < 0 || cy >= rows {
                return Ok(None);
            }
            if !t.is_finite() || t > max_distance {
                return Ok(None);
            }
            if self.is_blocked(cx as i32, cy as i32) {
                return Ok(Some(RayHit {
                    point: origin + direction * t,
                    distance: t,
                }));
            }
        }
    }
}

/// Parameter range in which the ray lies inside `[0, extent]` along one axis
fn slab(local: f32, dir: f32, extent: f32) -> Option<(f32, f32)> {
    if dir == 0.0 {
        return (local >= 0.0 && local < extent).then_some((f32::NEG_INFINITY, f32::INFINITY));
    }
    let (a, b) = (-local / dir, (extent - local) / dir);
    Some((a.min(b), a.max(b)))
}

/// Step sign, parameter of the first boundary crossing and parameter between
/// crossings along one axis, starting from `entry` at `t_enter`
fn axis_setup(entry: f32, cell: i64, dir: f32, t_enter: f32) -> (i64, f32, f32) {
    if dir > 0.0 {
        let t_max = t_enter + ((cell + 1) as f32 - entry) / dir;
        (1, t_max, 1.0 / dir)
    } else if dir < 0.0 {
        let t_max = t_enter + (entry - cell as f32) / -dir;
        (-1, t_max, 1.0 / -dir)
    } else {
        (0, f32::INFINITY, f32::INFINITY)
    }
}
