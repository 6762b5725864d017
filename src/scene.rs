//! Terminal globe: the point field, arc tubes with travelling markers and the
//! location markers, drawn with braille dots through an orbiting camera.

use crate::animation::ArcDriver;
use crate::arc::{ArcCurve, ARC_SEGMENTS};
use crate::camera::{globe_rotation, OrbitCamera};
use crate::catalog::{self, Arc, Location};
use crate::config::GlobeConfig;
use crate::help::render_help_overlay;
use crate::point_field::PointField;
use crate::terminal::Terminal;
use crate::texture::{self, PointFieldLoader, PointFieldRequest};
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::style::Color;
use glam::{DMat3, DVec3};
use rand::prelude::*;
use std::io;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

const POINT_COLOR: Color = Color::Rgb { r: 0x60, g: 0xa5, b: 0xfa };
const LOCATION_COLOR: Color = Color::White;
const LABEL_COLOR: Color = Color::Grey;
const STATUS_COLOR: Color = Color::DarkGrey;

/// Gap between the point shell and the opaque inner sphere.
const INNER_SPHERE_GAP: f64 = 0.05;
const MARKER_RADIUS: f64 = 0.02;
const LOCATION_RADIUS: f64 = 0.03;
const TUBE_ALPHA: f32 = 0.35;
/// Largest marker drawn, in dots.
const MAX_DISC_RADIUS: i32 = 16;

const ORBIT_STEP: f64 = 0.05;
const SCROLL_STEP: f64 = 0.05;

/// Help text for the globe
const HELP: &str = "\
GLOBE
─────────────────
←/→    Orbit
↑/↓    Tilt
j/k    Scroll (zoom)
l      Toggle labels
r      Toggle auto-rotate
1-9    Frame delay
Space  Pause
?      Close help
q      Quit";

/// Draw order of braille dots; a dot keeps the highest layer plotted on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Layer {
    Point,
    Tube,
    Location,
    Marker,
}

#[derive(Clone, Copy)]
struct Dot {
    layer: Layer,
    color: Color,
}

/// Braille dot grid, two dots wide and four tall per terminal cell.
struct Canvas {
    width: usize,
    height: usize,
    dots: Vec<Option<Dot>>,
}

impl Canvas {
    fn new(cols: u16, rows: u16) -> Self {
        let width = cols as usize * 2;
        let height = rows as usize * 4;
        Self { width, height, dots: vec![None; width * height] }
    }

    fn plot(&mut self, x: i32, y: i32, layer: Layer, color: Color) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let slot = &mut self.dots[y as usize * self.width + x as usize];
        if slot.map_or(true, |d| d.layer <= layer) {
            *slot = Some(Dot { layer, color });
        }
    }

    fn disc(&mut self, x: i32, y: i32, radius: i32, layer: Layer, color: Color) {
        let radius = radius.clamp(0, MAX_DISC_RADIUS);
        let (w, h) = (self.width as i32, self.height as i32);
        if x < -radius || y < -radius || x >= w + radius || y >= h + radius {
            return;
        }
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.plot(x + dx, y + dy, layer, color);
                }
            }
        }
    }

    /// Segment clipped to the canvas, so steps never exceed its size.
    fn line(&mut self, from: (i32, i32), to: (i32, i32), layer: Layer, color: Color) {
        let Some(((x0, y0), (x1, y1))) = self.clip(from, to) else {
            return;
        };
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        for s in 0..=steps {
            let f = s as f64 / steps as f64;
            let x = x0 + (x1 - x0) * f;
            let y = y0 + (y1 - y0) * f;
            self.plot(x.round() as i32, y.round() as i32, layer, color);
        }
    }

    /// Liang-Barsky clip of a segment against the dot grid.
    fn clip(&self, from: (i32, i32), to: (i32, i32)) -> Option<((f64, f64), (f64, f64))> {
        let (x0, y0) = (from.0 as f64, from.1 as f64);
        let (dx, dy) = (to.0 as f64 - x0, to.1 as f64 - y0);
        let (max_x, max_y) = (self.width as f64 - 1.0, self.height as f64 - 1.0);

        let mut t0: f64 = 0.0;
        let mut t1: f64 = 1.0;
        for (p, q) in [(-dx, x0), (dx, max_x - x0), (-dy, y0), (dy, max_y - y0)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }
        Some(((x0 + dx * t0, y0 + dy * t0), (x0 + dx * t1, y0 + dy * t1)))
    }

    fn blit(&self, term: &mut Terminal) {
        const DOT_BITS: [u8; 8] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];
        let rows = self.height / 4;
        let cols = self.width / 2;

        for cy in 0..rows {
            let by = cy * 4;
            for cx in 0..cols {
                let bx = cx * 2;
                let positions = [
                    (by, bx), (by + 1, bx), (by + 2, bx),
                    (by, bx + 1), (by + 1, bx + 1), (by + 2, bx + 1),
                    (by + 3, bx), (by + 3, bx + 1),
                ];

                let mut bits: u8 = 0;
                let mut top: Option<Dot> = None;
                for (i, &(py, px)) in positions.iter().enumerate() {
                    if let Some(dot) = self.dots[py * self.width + px] {
                        bits |= DOT_BITS[i];
                        if top.map_or(true, |t| dot.layer > t.layer) {
                            top = Some(dot);
                        }
                    }
                }

                if let Some(dot) = top {
                    let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
                    term.set(cx as i32, cy as i32, ch, Some(dot.color), dot.layer == Layer::Marker);
                }
            }
        }
    }
}

struct SceneArc {
    arc: Arc,
    curve: ArcCurve,
    path: Vec<DVec3>,
}

pub struct Scene {
    radius: f64,
    field: Option<PointField>,
    loader: Option<PointFieldLoader>,
    locations: Vec<Location>,
    anchors: Vec<DVec3>,
    arcs: Vec<SceneArc>,
    driver: ArcDriver,
    camera: OrbitCamera,
    labels: bool,
}

impl Scene {
    /// Scene with a point field already in hand (or none at all).
    pub fn new(config: &GlobeConfig, field: Option<PointField>) -> Self {
        let mut rng = StdRng::seed_from_u64(config.arc_seed());
        let arcs: Vec<SceneArc> = catalog::build_arcs(&config.locations, &mut rng)
            .into_iter()
            .map(|arc| {
                let curve = arc.curve(config.radius);
                let path = curve.points(ARC_SEGMENTS);
                SceneArc { arc, curve, path }
            })
            .collect();
        let driver = ArcDriver::new(arcs.iter().map(|a| a.arc.phase_offset).collect(), config.arc_rate);

        Self {
            radius: config.radius,
            field,
            loader: None,
            anchors: config.locations.iter().map(|l| l.coordinate.to_cartesian(config.radius)).collect(),
            locations: config.locations.clone(),
            arcs,
            driver,
            camera: OrbitCamera::new(config.zoom),
            labels: config.labels,
        }
    }

    /// Scene whose point field is generated in the background.
    pub fn loading(config: &GlobeConfig) -> Self {
        let mut scene = Self::new(config, None);
        scene.loader = Some(PointFieldLoader::spawn(point_field_request(config)));
        scene
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left => self.camera.orbit(-ORBIT_STEP, 0.0),
            KeyCode::Right => self.camera.orbit(ORBIT_STEP, 0.0),
            KeyCode::Up => self.camera.orbit(0.0, -ORBIT_STEP),
            KeyCode::Down => self.camera.orbit(0.0, ORBIT_STEP),
            KeyCode::Char('j') | KeyCode::PageDown => self.camera.scroll_by(SCROLL_STEP),
            KeyCode::Char('k') | KeyCode::PageUp => self.camera.scroll_by(-SCROLL_STEP),
            KeyCode::Char('l') => self.labels = !self.labels,
            KeyCode::Char('r') => self.camera.auto_rotate = !self.camera.auto_rotate,
            _ => {}
        }
    }

    /// Advance by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        if let Some(loader) = self.loader.as_mut() {
            if let Some(field) = loader.poll() {
                self.field = Some(field);
                self.loader = None;
            }
        }
        self.camera.update(dt);
        self.driver.tick(dt);
    }

    pub fn render(&self, term: &mut Terminal) {
        let (cols, rows) = term.size();
        let mut canvas = Canvas::new(cols, rows);
        let model = globe_rotation();
        let inner = self.radius - INNER_SPHERE_GAP;

        if let Some(field) = &self.field {
            for &p in field.points() {
                if let Some((x, y, _)) = self.to_canvas(&canvas, model, p, inner) {
                    canvas.plot(x, y, Layer::Point, POINT_COLOR);
                }
            }
        }

        for (i, scene_arc) in self.arcs.iter().enumerate() {
            let color = scene_arc.arc.color;
            let projected: Vec<_> = scene_arc
                .path
                .iter()
                .map(|&p| self.to_canvas(&canvas, model, p, inner))
                .collect();
            for pair in projected.windows(2) {
                if let (Some(a), Some(b)) = (pair[0], pair[1]) {
                    canvas.line((a.0, a.1), (b.0, b.1), Layer::Tube, color.color(TUBE_ALPHA));
                }
            }

            let sample = scene_arc.curve.sample(self.driver.t(i));
            if let Some((x, y, depth)) = self.to_canvas(&canvas, model, sample.position, inner) {
                let r = self.dot_radius(&canvas, MARKER_RADIUS * sample.scale, depth);
                canvas.disc(x, y, r, Layer::Marker, color.color(1.0));
            }
        }

        let mut labels = Vec::new();
        for (loc, &anchor) in self.locations.iter().zip(&self.anchors) {
            if let Some((x, y, depth)) = self.to_canvas(&canvas, model, anchor, inner) {
                let r = self.dot_radius(&canvas, LOCATION_RADIUS, depth);
                canvas.disc(x, y, r, Layer::Location, LOCATION_COLOR);
                labels.push((x / 2 + 1, y / 4, loc.name.as_str()));
            }
        }

        canvas.blit(term);

        if self.labels {
            for (x, y, name) in labels {
                term.set_str(x, y, name, Some(LABEL_COLOR), false);
            }
        }

        let status = match &self.field {
            Some(field) => format!("points {}/{}  arcs {}", field.len(), field.requested(), self.arcs.len()),
            None => format!("points loading  arcs {}", self.arcs.len()),
        };
        term.set_str(0, rows as i32 - 1, &status, Some(STATUS_COLOR), false);
    }

    /// Dot coordinates and depth of a model-space point, or `None` when it
    /// is behind the camera or hidden by the inner sphere.
    fn to_canvas(&self, canvas: &Canvas, model: DMat3, p: DVec3, inner: f64) -> Option<(i32, i32, f64)> {
        let world = model * p;
        if self.camera.occluded(world, inner) {
            return None;
        }
        let (x, y, depth) = self.camera.project(world)?;
        let half_h = canvas.height as f64 / 2.0;
        let px = canvas.width as f64 / 2.0 + x * half_h;
        let py = half_h - y * half_h;
        Some((px.round() as i32, py.round() as i32, depth))
    }

    fn dot_radius(&self, canvas: &Canvas, world_radius: f64, depth: f64) -> i32 {
        let half_h = canvas.height as f64 / 2.0;
        (world_radius * OrbitCamera::focal() / depth * half_h).round() as i32
    }
}

fn point_field_request(config: &GlobeConfig) -> PointFieldRequest {
    PointFieldRequest {
        texture: config.texture.clone(),
        count: config.point_count,
        radius: config.radius,
        seed: config.seed,
    }
}

/// Frame pacing and global keys.
struct Controls {
    speed: f32,
    paused: bool,
    show_help: bool,
}

impl Controls {
    fn new(initial_speed: f32) -> Self {
        Self { speed: initial_speed, paused: false, show_help: false }
    }

    /// Handle keypress, returns true if should quit
    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('?') => self.show_help = !self.show_help,
            // Number keys: frame delay (1=fastest, 9=slowest)
            KeyCode::Char(c @ '1'..='9') => {
                self.speed = match c {
                    '1' => 0.005,
                    '2' => 0.01,
                    '3' => 0.02,
                    '4' => 0.03,
                    '5' => 0.05,
                    '6' => 0.07,
                    '7' => 0.1,
                    '8' => 0.15,
                    _ => 0.2,
                };
            }
            _ => {}
        }
        false
    }
}

/// Run the interactive globe until the user quits.
pub fn run(config: &GlobeConfig) -> io::Result<()> {
    let mut term = Terminal::new()?;
    term.clear_screen()?;

    let mut scene = Scene::loading(config);
    let mut controls = Controls::new(config.time_step);
    let mut last = Instant::now();

    loop {
        let (width, height) = term.poll_size();
        if (width, height) != term.size() {
            term.resize(width, height);
            term.clear_screen()?;
        }

        if let Some((code, mods)) = term.check_key()? {
            if controls.handle_key(code, mods) {
                break;
            }
            scene.handle_key(code);
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        if controls.paused {
            term.sleep(0.1);
            continue;
        }

        scene.update(dt);
        term.clear();
        scene.render(&mut term);
        if controls.show_help {
            render_help_overlay(&mut term, HELP);
        }
        term.present()?;
        term.sleep(controls.speed);
    }

    Ok(())
}

/// Render a single frame `at` seconds into the animation, as ANSI text.
pub fn snapshot(config: &GlobeConfig, width: u16, height: u16, at: f64) -> String {
    let field = texture::build_point_field(&point_field_request(config), &AtomicBool::new(true));
    let mut scene = Scene::new(config, field);
    scene.update(at);

    let mut term = Terminal::headless(width, height);
    scene.render(&mut term);
    term.to_ansi()
}
