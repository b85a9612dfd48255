use arboard::Clipboard;
use boidsight::{logging, Boid, Bounds, Config, Point, Pose, Scene, Shape, World};
use macroquad::prelude::*;
use tracing::{error, info, warn};

const CONFIG_PATH: &str = "config.toml";

fn window_conf() -> Conf {
    let config = Config::load_or_default(CONFIG_PATH);
    Conf {
        window_title: config.visual.window_title,
        window_width: 1200,
        window_height: 800,
        ..Default::default()
    }
}

/// Visualization state
struct VisState {
    config: Config,
    scene: Scene,
    world: World,
    boids: Vec<Boid>,
    paused: bool,
}

impl VisState {
    fn new(config: Config) -> Self {
        let scene = match Scene::load_from_file(&config.scene.path) {
            Ok(scene) => {
                info!(path = %config.scene.path, boids = scene.boids.len(), "loaded scene");
                scene
            }
            Err(e) => {
                warn!(error = %e, "using empty scene");
                Scene::default()
            }
        };
        let (world, boids) = Self::build(&config, &scene);
        VisState {
            config,
            scene,
            world,
            boids,
            paused: false,
        }
    }

    fn build(config: &Config, scene: &Scene) -> (World, Vec<Boid>) {
        let mut world = scene.build_world();
        let boids = scene.build_boids(
            &mut world,
            config.view,
            config.layers.filters(),
            config.boids.move_speed,
        );
        (world, boids)
    }

    fn reset(&mut self) {
        let (world, boids) = Self::build(&self.config, &self.scene);
        self.world = world;
        self.boids = boids;
    }

    fn to_screen(&self, p: Point) -> Vec2 {
        let ppu = self.config.visual.pixels_per_unit;
        vec2(screen_width() / 2.0 + p.x * ppu, screen_height() / 2.0 - p.y * ppu)
    }

    fn to_world(&self, x: f32, y: f32) -> Point {
        let ppu = self.config.visual.pixels_per_unit;
        Point::new((x - screen_width() / 2.0) / ppu, (screen_height() / 2.0 - y) / ppu)
    }

    /// World rectangle currently on screen
    fn screen_bounds(&self) -> Bounds {
        Bounds::from_corners(self.to_world(0.0, screen_height()), self.to_world(screen_width(), 0.0))
    }

    fn handle_mouse(&mut self) {
        let (mouse_x, mouse_y) = mouse_position();
        let target = self.to_world(mouse_x, mouse_y);
        let Some(boid) = self.boids.first_mut() else {
            return;
        };

        // Left drag: move the first boid
        if is_mouse_button_down(MouseButton::Left) {
            boid.pose.position = target;
        }
        // Right click: turn it towards the cursor
        else if is_mouse_button_pressed(MouseButton::Right) {
            boid.pose = Pose::facing(boid.pose.position, target - boid.pose.position);
        }
    }

    fn update(&mut self, dt: f32) {
        let dt = if self.paused { 0.0 } else { dt };
        let bounds = self.screen_bounds();

        for boid in &mut self.boids {
            boid.update(dt);
            boid.wrap_within(&bounds);
            if let Some(handle) = boid.handle {
                self.world.set_entity_position(handle, boid.position());
            }
        }
        for boid in &mut self.boids {
            boid.late_update(&self.world);
            boid.tick(dt, &self.world, &self.world);
        }
    }

    fn copy_to_clipboard(&self) {
        let json = match Scene::from_world(&self.scene.name, &self.world, &self.boids).to_json() {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialize scene");
                return;
            }
        };
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(json) {
                    warn!(error = %e, "failed to copy to clipboard");
                } else {
                    info!("scene copied to clipboard");
                    // Keep clipboard alive for a moment to ensure clipboard managers can capture it
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to access clipboard");
            }
        }
    }

    fn save_scene(&self) {
        let snapshot = Scene::from_world(&self.scene.name, &self.world, &self.boids);
        match snapshot.save_to_file(&self.config.scene.path) {
            Ok(()) => info!(path = %self.config.scene.path, "scene saved"),
            Err(e) => error!(error = %e, "failed to save scene"),
        }
    }

    fn draw_obstacles(&self) {
        let wall = Color::from_rgba(200, 80, 80, 255);
        for obstacle in &self.world.obstacles {
            match &obstacle.shape {
                Shape::Segment { a, b } => {
                    let (a, b) = (self.to_screen(*a), self.to_screen(*b));
                    draw_line(a.x, a.y, b.x, b.y, 2.0, wall);
                }
                Shape::Polyline { points, closed } => {
                    let mut edges: Vec<(Point, Point)> = points.windows(2).map(|w| (w[0], w[1])).collect();
                    if *closed && points.len() > 2 {
                        edges.push((points[points.len() - 1], points[0]));
                    }
                    for (a, b) in edges {
                        let (a, b) = (self.to_screen(a), self.to_screen(b));
                        draw_line(a.x, a.y, b.x, b.y, 2.0, wall);
                    }
                }
                Shape::Circle { center, radius } => {
                    let c = self.to_screen(*center);
                    draw_circle_lines(c.x, c.y, radius * self.config.visual.pixels_per_unit, 2.0, wall);
                }
            }
        }

        if let Some(tiles) = &self.world.tiles {
            let size = tiles.cell_size * self.config.visual.pixels_per_unit;
            for id in tiles.blocked_ids() {
                let (x, y) = tiles.get_coords(id);
                // top-left corner on screen is the world corner of the row above
                let corner = self.to_screen(tiles.cell_corner(x, y + 1));
                draw_rectangle(corner.x, corner.y, size, size, wall);
            }
        }
    }

    fn draw_boid(&self, boid: &Boid, color: Color) {
        let pose = boid.pose;
        let tip = self.to_screen(pose.transform_point(Point::new(0.0, 0.6)));
        let left = self.to_screen(pose.transform_point(Point::new(-0.3, -0.3)));
        let right = self.to_screen(pose.transform_point(Point::new(0.3, -0.3)));
        draw_triangle(tip, left, right, color);
    }

    fn draw(&self) {
        let [r, g, b] = self.config.visual.background;
        clear_background(Color::from_rgba(r, g, b, 255));

        let [r, g, b, a] = self.config.visual.mesh_color;
        let mesh_color = Color::from_rgba(r, g, b, a);
        for boid in &self.boids {
            let mesh = boid.visibility_mesh();
            for tri in &mesh.triangles {
                let [p0, p1, p2] = tri.map(|i| self.to_screen(boid.pose.transform_point(mesh.vertices[i as usize])));
                draw_triangle(p0, p1, p2, mesh_color);
            }
        }

        self.draw_obstacles();

        let first = self.boids.first();
        for (i, boid) in self.boids.iter().enumerate() {
            let seen_by_first = match (first, boid.handle) {
                (Some(first), Some(handle)) => first.field_of_view().can_see(handle),
                _ => false,
            };
            let color = if i == 0 {
                SKYBLUE
            } else if seen_by_first {
                GOLD
            } else {
                LIGHTGRAY
            };
            self.draw_boid(boid, color);

            // Lines to visible targets
            let from = self.to_screen(boid.position());
            for target in boid.visible_targets() {
                if let Some(entity) = self.world.entity(*target) {
                    let to = self.to_screen(entity.position);
                    draw_line(from.x, from.y, to.x, to.y, 1.0, GREEN);
                }
            }
        }

        let seen = self.boids.first().map_or(0, |b| b.visible_targets().len());
        let info = format!(
            "Boids: {}\nFirst boid sees: {} (gold)\nLeft drag: move first boid\nRight click: turn first boid\nSpace: pause\nR: reset scene\nS: save scene\nC: copy scene to clipboard\nEsc: close window",
            self.boids.len(),
            seen
        );
        for (i, line) in info.lines().enumerate() {
            draw_text(line, 10.0, 20.0 + i as f32 * 20.0, 20.0, WHITE);
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let config = Config::load_or_default(CONFIG_PATH);
    logging::init(&config.logging.filter);

    let mut state = VisState::new(config);

    loop {
        // Handle input
        state.handle_mouse();

        if is_key_pressed(KeyCode::Space) {
            state.paused = !state.paused;
        }

        if is_key_pressed(KeyCode::R) {
            state.reset();
        }

        if is_key_pressed(KeyCode::S) {
            state.save_scene();
        }

        // Copy scene to clipboard on C key
        if is_key_pressed(KeyCode::C) {
            state.copy_to_clipboard();
        }

        // Close window on Escape
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        state.update(get_frame_time());
        state.draw();

        next_frame().await
    }
}
