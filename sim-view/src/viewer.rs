//! Interactive differential growth viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a growth [`World`] together
//! with the settings used to seed new paths, and implements [`eframe::App`]
//! to render and control the simulation through an egui UI.

use std::sync::Arc;

use eframe::App;
use glam::Vec2;
use growth_core::{
    bound::Bound,
    config::{Config, RepulsionMode},
    error::GrowthResult,
    path::Path,
    seed,
    world::{Canvas, World},
};
use rand::{SeedableRng, rngs::StdRng};
use tracing::{info, warn};

/// What a click in the central panel creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnTool {
    /// A new closed path seeded as a jittered ring.
    Ring,
    /// A rectangle that every path must stay inside.
    KeepInRect,
    /// A rectangle that every path must stay out of.
    KeepOutRect,
}

/// Maps world coordinates into a screen rectangle.
///
/// World coordinates are scaled by `zoom`, offset by `pan`, and then
/// centered inside `rect`. The y-axis is flipped so that positive y goes
/// up in world space.
fn to_screen(p: Vec2, rect: egui::Rect, zoom: f32, pan: egui::Vec2) -> egui::Pos2 {
    let center = rect.center();
    egui::pos2(center.x + p.x * zoom + pan.x, center.y - p.y * zoom + pan.y)
}

/// [`Canvas`] that strokes paths and bounds onto an egui painter.
struct PainterCanvas<'a> {
    painter: &'a egui::Painter,
    rect: egui::Rect,
    zoom: f32,
    pan: egui::Vec2,
}

impl PainterCanvas<'_> {
    fn project(&self, points: &[Vec2]) -> Vec<egui::Pos2> {
        points
            .iter()
            .map(|&p| to_screen(p, self.rect, self.zoom, self.pan))
            .collect()
    }
}

impl Canvas for PainterCanvas<'_> {
    fn path(&mut self, points: &[Vec2], closed: bool) {
        let stroke = egui::Stroke::new(1.5, egui::Color32::LIGHT_GREEN);
        let points = self.project(points);
        let shape = if closed {
            egui::Shape::closed_line(points, stroke)
        } else {
            egui::Shape::line(points, stroke)
        };
        self.painter.add(shape);
    }

    fn bound(&mut self, polygon: &[Vec2], reverse: bool) {
        let color = if reverse {
            egui::Color32::LIGHT_RED
        } else {
            egui::Color32::GRAY
        };
        let points = self.project(polygon);
        self.painter
            .add(egui::Shape::closed_line(points, egui::Stroke::new(1.0, color)));
    }
}

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If the world is not paused and enough time has passed, call
///    [`Viewer::step_once`].
/// 3. Render bounds, paths and nodes.
///
/// ### Fields
/// - `world` - Paths being grown.
/// - `cfg` - Settings for paths created from now on. Existing paths keep
///   the config they were built with.
/// - `bounds` - Bounds attached to every path, including paths spawned later.
/// - `seed_nodes`, `seed_radius` - Shape of newly seeded rings.
/// - `bound_half_extents` - Size of rectangles placed by the bound tools.
/// - `rng` - Random source for jitter, seeding and node injection.
///
/// - `tool` - What a click in the central panel creates.
/// - `zoom` - Zoom factor for world-to-screen coordinate mapping.
/// - `pan` - Screen-space pan offset in pixels.
/// - `show_nodes` - Whether node dots are drawn on top of the paths.
/// - `cfg_error` - Last config validation failure, shown in the side panel.
///
/// - `step_interval` - Target time step between automatic ticks (seconds).
/// - `last_step_time` - Time stamp of the last tick (egui time).
/// - `last_step_dt` - Actual time delta between the last two ticks.
pub struct Viewer {
    world: World,
    cfg: Config,
    bounds: Vec<Arc<Bound>>,
    seed_nodes: usize,
    seed_radius: f32,
    bound_half_extents: Vec2,
    rng: StdRng,

    tool: SpawnTool,
    zoom: f32,
    pan: egui::Vec2,
    show_nodes: bool,
    cfg_error: Option<String>,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a paused viewer with one seeded ring at the origin.
    ///
    /// ### Parameters
    /// - `cfg` - Growth settings for the seed ring and later paths.
    /// - `seed` - Random seed; a fresh one is drawn from the OS when `None`.
    /// - `seed_nodes` - Number of nodes in each seeded ring.
    /// - `seed_radius` - Radius of each seeded ring.
    ///
    /// ### Returns
    /// - `Ok(Viewer)` ready to be passed to `eframe::run_native`.
    /// - `Err` if `cfg` is invalid.
    pub fn new(
        cfg: Config,
        seed: Option<u64>,
        seed_nodes: usize,
        seed_radius: f32,
    ) -> GrowthResult<Self> {
        cfg.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut viewer = Self {
            world: World::new(),
            cfg,
            bounds: Vec::new(),
            seed_nodes,
            seed_radius,
            bound_half_extents: Vec2::new(120.0, 120.0),
            rng,
            tool: SpawnTool::Ring,
            zoom: 3.0,
            pan: egui::vec2(0.0, 0.0),
            show_nodes: true,
            cfg_error: None,
            step_interval: 0.03,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        };
        viewer.reset()?;
        Ok(viewer)
    }

    /// Replaces the world with a single ring at the origin built from the
    /// current `cfg`. Bounds are dropped and the world starts paused.
    fn reset(&mut self) -> GrowthResult<()> {
        let ring = self.seed_ring(Vec2::ZERO)?;
        self.bounds.clear();
        self.world = World::with_paths(vec![ring]);
        self.world.pause();
        self.cfg_error = None;
        info!(nodes = self.world.node_count(), "viewer reset");
        Ok(())
    }

    /// Removes every path and bound.
    ///
    /// This is mainly useful as a blank canvas for manual spawning.
    fn clear(&mut self) {
        self.world.clear_paths();
        self.bounds.clear();
    }

    /// Advances the world by one tick, even while paused.
    fn step_once(&mut self) {
        self.world.advance(&mut self.rng);
    }

    fn seed_ring(&mut self, center: Vec2) -> GrowthResult<Path> {
        let positions = seed::jittered_ring(center, self.seed_radius, self.seed_nodes, &mut self.rng);
        Path::from_positions(positions, self.cfg, true)
    }

    /// Adds a ring path at `center` with every current bound attached.
    fn spawn_ring(&mut self, center: Vec2) {
        match self.seed_ring(center) {
            Ok(mut path) => {
                for bound in &self.bounds {
                    path.attach_bound(Arc::clone(bound));
                }
                self.world.add_path(path);
                self.cfg_error = None;
            }
            Err(err) => {
                warn!(%err, "cannot spawn ring");
                self.cfg_error = Some(err.to_string());
            }
        }
    }

    /// Adds a rectangular bound around `center` to every path.
    fn spawn_bound(&mut self, center: Vec2, reverse: bool) {
        let bound = Arc::new(Bound::rect(
            center - self.bound_half_extents,
            center + self.bound_half_extents,
            reverse,
        ));
        self.world.attach_bound_to_all(&bound);
        self.bounds.push(bound);
    }

    /// Applies the edited config by validating it and resetting the world.
    fn apply_config(&mut self) {
        if let Err(err) = self.reset() {
            warn!(%err, "rejected config");
            self.cfg_error = Some(err.to_string());
        }
    }

    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        to_screen(p, rect, self.zoom, self.pan)
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding), using the same `zoom`, `pan`, and `rect` center.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let paused = self.world.is_paused();
                if ui.button(if paused { "▶ Run" } else { "⏸ Pause" }).clicked() {
                    self.world.toggle_pause();
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Inject").clicked() {
                    self.world.inject_nodes(&mut self.rng);
                }

                if ui.button("Reset").clicked() {
                    self.apply_config();
                }

                if ui.button("Clear").clicked() {
                    self.clear();
                }

                ui.separator();
                ui.checkbox(&mut self.show_nodes, "Nodes");
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (timing, ticks, node and path counts).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt target = {:.3} s", self.step_interval));
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("ticks = {}", self.world.ticks()));
                ui.label(format!("nodes = {}", self.world.node_count()));
                ui.label(format!("paths = {}", self.world.paths().len()));
                if self.world.is_done() {
                    ui.colored_label(egui::Color32::YELLOW, "node cap reached");
                }
            });
        });
    }

    /// Builds the right-hand panel for growth settings.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Distances");
                Self::labeled_drag_f32(ui, "min_distance:", &mut self.cfg.min_distance, 0.0..=100.0, 0.1);
                Self::labeled_drag_f32(ui, "max_distance:", &mut self.cfg.max_distance, 0.0..=100.0, 0.1);
                Self::labeled_drag_f32(
                    ui,
                    "repulsion_radius:",
                    &mut self.cfg.repulsion_radius,
                    0.0..=200.0,
                    0.5,
                );

                ui.separator();
                ui.label("Forces");
                Self::labeled_drag_f32(ui, "max_velocity:", &mut self.cfg.max_velocity, 0.0..=1.0, 0.01);
                Self::labeled_drag_f32(
                    ui,
                    "attraction_force:",
                    &mut self.cfg.attraction_force,
                    0.0..=2.0,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "repulsion_force:",
                    &mut self.cfg.repulsion_force,
                    0.0..=2.0,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "alignment_force:",
                    &mut self.cfg.alignment_force,
                    0.0..=2.0,
                    0.01,
                );
                egui::ComboBox::from_label("repulsion")
                    .selected_text(match self.cfg.repulsion_mode {
                        RepulsionMode::LastWins => "last wins",
                        RepulsionMode::Accumulate => "accumulate",
                    })
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.cfg.repulsion_mode, RepulsionMode::LastWins, "last wins");
                        ui.selectable_value(
                            &mut self.cfg.repulsion_mode,
                            RepulsionMode::Accumulate,
                            "accumulate",
                        );
                    });

                ui.separator();
                ui.label("Brownian motion");
                ui.checkbox(&mut self.cfg.use_brownian_motion, "enabled");
                Self::labeled_drag_f32(
                    ui,
                    "range:",
                    &mut self.cfg.brownian_motion_range,
                    0.0..=5.0,
                    0.01,
                );

                ui.separator();
                ui.label("Seeding");
                Self::labeled_drag_usize(ui, "max_nodes:", &mut self.cfg.max_nodes, 1..=100_000, 10.0);
                Self::labeled_drag_usize(ui, "ring nodes:", &mut self.seed_nodes, 0..=500, 1.0);
                Self::labeled_drag_f32(ui, "ring radius:", &mut self.seed_radius, 0.0..=500.0, 0.5);
                Self::labeled_drag_f32(
                    ui,
                    "bound hx:",
                    &mut self.bound_half_extents.x,
                    0.0..=1000.0,
                    1.0,
                );
                Self::labeled_drag_f32(
                    ui,
                    "bound hy:",
                    &mut self.bound_half_extents.y,
                    0.0..=1000.0,
                    1.0,
                );

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Apply (reset)").clicked() {
                        self.apply_config();
                    }
                    if ui.button("Defaults").clicked() {
                        self.cfg = Config::default();
                    }
                });
                if let Some(err) = &self.cfg_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err.as_str());
                }
            });
    }

    /// Builds the small floating toolbar for choosing the spawn tool.
    fn ui_toolbar(&mut self, ctx: &egui::Context) {
        egui::Area::new("toolbar".into())
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 100.0))
            .movable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 32))
                    .show(ui, |ui| {
                        ui.vertical(|ui| {
                            for (tool, label) in [
                                (SpawnTool::Ring, "○ Ring"),
                                (SpawnTool::KeepInRect, "□ Keep in"),
                                (SpawnTool::KeepOutRect, "■ Keep out"),
                            ] {
                                if ui.selectable_label(self.tool == tool, label).clicked() {
                                    self.tool = tool;
                                }
                            }
                        });
                    });
            });
    }

    /// Draws an outline of what a click would create at the hovered position.
    fn ui_tool_hint(&self, painter: &egui::Painter, rect: egui::Rect, hover_world: Option<Vec2>) {
        let Some(center) = hover_world else {
            return;
        };

        let stroke = egui::Stroke::new(1.0, egui::Color32::YELLOW);
        let outline = match self.tool {
            SpawnTool::Ring => seed::ring(center, self.seed_radius, 48),
            SpawnTool::KeepInRect | SpawnTool::KeepOutRect => {
                seed::rect(center, self.bound_half_extents)
            }
        };
        let points: Vec<egui::Pos2> = outline
            .into_iter()
            .map(|p| self.world_to_screen(p, rect))
            .collect();
        painter.add(egui::Shape::closed_line(points, stroke));
    }

    /// Draws node dots. Fixed nodes are grey, nodes inserted by the last
    /// tick are red.
    fn draw_nodes(&self, painter: &egui::Painter, rect: egui::Rect) {
        let r = (0.8 * self.zoom).clamp(1.0, 3.0);
        for path in self.world.paths() {
            for node in path.nodes() {
                let color = if node.fixed {
                    egui::Color32::GRAY
                } else {
                    egui::Color32::LIGHT_BLUE
                };
                painter.circle_filled(self.world_to_screen(node.pos, rect), r, color);
            }
        }

        for (path, id) in self.world.last_inserted() {
            if let Some(node) = self.world.path(path).and_then(|p| p.node(id)) {
                painter.circle_filled(self.world_to_screen(node.pos, rect), r, egui::Color32::RED);
            }
        }
    }

    /// Builds the central panel where the world is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            if response.dragged() {
                self.pan += response.drag_delta();
            }

            let hover_world = response.hover_pos().map(|p| self.screen_to_world(p, rect));

            if response.clicked()
                && let Some(center) = hover_world
            {
                match self.tool {
                    SpawnTool::Ring => self.spawn_ring(center),
                    SpawnTool::KeepInRect => self.spawn_bound(center, false),
                    SpawnTool::KeepOutRect => self.spawn_bound(center, true),
                }
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.1, 10.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
                self.world.toggle_pause();
            }
            if ctx.input(|i| i.key_pressed(egui::Key::S)) {
                self.step_once();
            }

            let mut canvas = PainterCanvas {
                painter: &painter,
                rect,
                zoom: self.zoom,
                pan: self.pan,
            };
            self.world.draw(&mut canvas);
            if self.show_nodes {
                self.draw_nodes(&painter, rect);
            }

            self.ui_tool_hint(&painter, rect, hover_world);

            // Auto-run the simulation while unpaused.
            if !self.world.is_paused() && !self.world.is_done() {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.world.update(&mut self.rng);
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
        self.ui_toolbar(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn viewer() -> Viewer {
        Viewer::new(Config::default(), Some(7), 12, 20.0).unwrap()
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = viewer();
        viewer.zoom = 2.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let eps = 1e-5;
        for p in [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, -5.0),
            Vec2::new(-3.5, 8.25),
        ] {
            let back = viewer.screen_to_world(viewer.world_to_screen(p, rect), rect);
            assert!(
                (back.x - p.x).abs() < eps && (back.y - p.y).abs() < eps,
                "roundtrip mismatch: p={p:?}, back={back:?}"
            );
        }
    }

    #[test]
    fn starts_paused_with_one_ring() {
        let viewer = viewer();
        assert!(viewer.world.is_paused());
        assert_eq!(viewer.world.paths().len(), 1);
        assert_eq!(viewer.world.node_count(), 12);
        assert!(viewer.world.paths()[0].is_closed());
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = Config {
            min_distance: 20.0,
            ..Config::default()
        };
        assert!(Viewer::new(cfg, Some(1), 12, 20.0).is_err());
    }

    #[test]
    fn reset_restores_basic_state() {
        let mut viewer = viewer();
        viewer.spawn_ring(Vec2::new(100.0, 0.0));
        viewer.spawn_bound(Vec2::ZERO, false);
        viewer.world.resume();
        viewer.step_once();

        viewer.reset().unwrap();

        assert_eq!(viewer.world.paths().len(), 1);
        assert!(viewer.world.paths()[0].bounds().is_empty());
        assert!(viewer.bounds.is_empty());
        assert_eq!(viewer.world.ticks(), 0);
        assert!(viewer.world.is_paused());
    }

    #[test]
    fn bad_edit_keeps_world_and_reports_error() {
        let mut viewer = viewer();
        viewer.spawn_ring(Vec2::new(100.0, 0.0));
        viewer.cfg.max_velocity = 3.0;

        viewer.apply_config();

        assert_eq!(viewer.world.paths().len(), 2);
        assert!(viewer.cfg_error.is_some());
    }

    #[test]
    fn clear_removes_all_content() {
        let mut viewer = viewer();
        viewer.spawn_bound(Vec2::ZERO, true);

        viewer.clear();

        assert!(viewer.world.paths().is_empty());
        assert_eq!(viewer.world.node_count(), 0);
        assert!(viewer.bounds.is_empty());
    }

    #[test]
    fn step_once_ticks_while_paused() {
        let mut viewer = viewer();
        assert!(viewer.world.is_paused());

        viewer.step_once();
        viewer.step_once();

        assert_eq!(viewer.world.ticks(), 2);
        assert!(viewer.world.is_paused());
    }

    #[test]
    fn spawned_rings_inherit_existing_bounds() {
        let mut viewer = viewer();
        viewer.spawn_bound(Vec2::ZERO, false);
        assert_eq!(viewer.world.paths()[0].bounds().len(), 1);

        viewer.spawn_ring(Vec2::new(30.0, 30.0));

        let spawned = &viewer.world.paths()[1];
        assert_eq!(spawned.len(), 12);
        assert_eq!(spawned.bounds().len(), 1);
        assert!(Arc::ptr_eq(&spawned.bounds()[0], &viewer.bounds[0]));
    }
}
