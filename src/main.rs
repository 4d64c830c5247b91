use std::ops::RangeInclusive;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

/// The `egui` re-export for building native GUIs with the eframe framework.
use eframe::egui::{self, Color32};
/// Additional 2D geometric tools from eframe, e.g. `Vec2`.
use eframe::epaint::Vec2;
/// The `egui_plot` crate for plotting data in an egui-based app.
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use coin_sim::body::clamp_speed;
use coin_sim::{EstimateMode, ExchangePolicy, MIN_SPEED_MULTIPLIER, Simulation, SimulationParams};

// ===================================================================================
// Viewer Constants
// ===================================================================================

const DEFAULT_DT: f32 = 1.0 / 60.0;
/// Longest frame time fed to the simulation, so a stalled window does not teleport disks.
const MAX_FRAME_DT: f32 = 0.1;
const SPEED_STEP: f32 = 0.1;
const MAX_SPEED: f32 = 10.0;

const DISK_COLOR: Color32 = Color32::from_rgb(0, 128, 255);
const SERIES_COLORS: [Color32; 9] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(23, 190, 207),
    Color32::from_rgb(188, 50, 188),
    Color32::from_rgb(230, 200, 30),
    Color32::from_rgb(200, 200, 200),
    Color32::from_rgb(127, 127, 127),
    Color32::from_rgb(255, 127, 14),
];

// ===================================================================================
// Command Line
// ===================================================================================

/// Disks trading coins on collision, converging to a Boltzmann-like distribution.
#[derive(Parser, Debug)]
struct Args {
    /// TOML file with simulation parameters; omitted keys keep their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed, overriding the config file.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    #[arg(long, value_enum)]
    estimate: Option<EstimateArg>,

    /// Run this many ticks without a window and print the final distribution.
    #[arg(long)]
    headless: Option<u64>,

    /// Fixed tick length for headless runs, in seconds.
    #[arg(long, default_value_t = DEFAULT_DT)]
    dt: f32,

    /// Initial speed multiplier.
    #[arg(long, default_value_t = 1.0)]
    speed: f32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    Independent,
    Uniform,
}

impl From<PolicyArg> for ExchangePolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Independent => ExchangePolicy::IndependentTrial,
            PolicyArg::Uniform => ExchangePolicy::UniformRedistribution,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EstimateArg {
    Fraction,
    Average,
}

impl From<EstimateArg> for EstimateMode {
    fn from(e: EstimateArg) -> Self {
        match e {
            EstimateArg::Fraction => EstimateMode::FractionOfDisks,
            EstimateArg::Average => EstimateMode::AverageCount,
        }
    }
}

impl Args {
    fn params(&self) -> anyhow::Result<SimulationParams> {
        let mut params = match &self.config {
            Some(path) => SimulationParams::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SimulationParams::default(),
        };
        if self.seed.is_some() {
            params.seed = self.seed;
        }
        if let Some(p) = self.policy {
            params.policy = p.into();
        }
        if let Some(e) = self.estimate {
            params.estimate = e.into();
        }
        params.validate()?;
        Ok(params)
    }
}

fn series_color(k: usize) -> Color32 {
    SERIES_COLORS[k % SERIES_COLORS.len()]
}

fn coin_label(k: usize) -> String {
    if k == 1 {
        "1 coin".to_string()
    } else {
        format!("{k} coins")
    }
}

/// Labelled slider; returns whether the value changed this frame.
fn slider<N: egui::emath::Numeric>(
    ui: &mut egui::Ui,
    value: &mut N,
    range: RangeInclusive<N>,
    text: &str,
) -> bool {
    ui.add(egui::Slider::new(value, range).text(text)).changed()
}

// ===================================================================================
// Main Application
// ===================================================================================

/// The viewer state:
/// - parameter sliders used to set up the next run
/// - the "running" flag and a pending reset request
/// - the live `Simulation`, if the last reset succeeded
///
/// The simulation is only touched from `update`, between frames, so everything
/// drawn belongs to a completed tick.
struct CoinApp {
    // -------------- Config / UI --------------
    params: SimulationParams,
    running: bool,
    needs_reset: bool,
    speed: f32,
    seeded_disks: usize,
    seeded_coins: u32,

    // -------------- Simulation Data --------------
    sim: Option<Simulation>,
    last_error: Option<String>,
}

impl CoinApp {
    fn new(params: SimulationParams, speed: f32) -> Self {
        let seeded_disks = params.initial_coins.len();
        let seeded_coins = params.initial_coins.first().copied().unwrap_or(0);
        Self {
            params,
            running: false,
            needs_reset: true,
            speed: clamp_speed(speed),
            seeded_disks,
            seeded_coins,
            sim: None,
            last_error: None,
        }
    }

    /// Builds a fresh simulation from the current `params`.
    fn reset_simulation(&mut self) {
        match Simulation::new(self.params.clone()) {
            Ok(sim) => {
                self.sim = Some(sim);
                self.last_error = None;
            }
            Err(e) => {
                log::error!("reset failed: {e}");
                self.sim = None;
                self.last_error = Some(e.to_string());
                self.running = false;
            }
        }
        self.needs_reset = false;
    }

    /// Arrow keys nudge the speed multiplier, never below the simulation's floor.
    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (up, down) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::ArrowDown),
            )
        });
        if up {
            self.speed = (self.speed + SPEED_STEP).min(MAX_SPEED);
        }
        if down {
            self.speed = clamp_speed(self.speed - SPEED_STEP);
        }
    }

    fn config_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Simulation Controls");

        if !self.running {
            let p = &mut self.params;
            let mut changed = false;
            changed |= slider(ui, &mut p.num_disks, 2..=200, "Disks");
            changed |= slider(ui, &mut p.radius, 2.0..=80.0, "Disk Radius");
            changed |= slider(ui, &mut p.arena_width, 200.0..=2000.0, "Arena Width");
            changed |= slider(ui, &mut p.arena_height, 200.0..=2000.0, "Arena Height");
            changed |= slider(ui, &mut p.max_coins, 1..=32, "Max Coins");
            changed |= slider(ui, &mut p.max_initial_speed, 0.0..=1000.0, "Initial Speed");
            changed |= slider(ui, &mut p.sample_interval, 0.01..=1.0, "Sample Interval");

            let seeded = slider(ui, &mut self.seeded_disks, 0..=p.num_disks, "Seeded Disks");
            let coins = slider(ui, &mut self.seeded_coins, 0..=p.max_coins, "Coins Each");
            if seeded || coins || changed {
                let count = self.seeded_disks.min(p.num_disks);
                p.initial_coins = vec![self.seeded_coins.min(p.max_coins); count];
                changed = true;
            }

            let policies = [
                ExchangePolicy::IndependentTrial,
                ExchangePolicy::UniformRedistribution,
            ];
            egui::ComboBox::from_label("Exchange")
                .selected_text(p.policy.label())
                .show_ui(ui, |ui| {
                    for policy in policies {
                        let label = policy.label();
                        changed |= ui.selectable_value(&mut p.policy, policy, label).changed();
                    }
                });
            let modes = [EstimateMode::FractionOfDisks, EstimateMode::AverageCount];
            egui::ComboBox::from_label("Estimate")
                .selected_text(p.estimate.label())
                .show_ui(ui, |ui| {
                    for mode in modes {
                        let label = mode.label();
                        changed |= ui.selectable_value(&mut p.estimate, mode, label).changed();
                    }
                });

            if changed {
                self.needs_reset = true;
            }
        } else {
            ui.label("Parameters locked while running. Stop to change.");
        }

        ui.separator();
        let speeds = MIN_SPEED_MULTIPLIER..=MAX_SPEED;
        slider(ui, &mut self.speed, speeds, "Speed (Up/Down)");
        ui.separator();

        // Start / Stop
        if self.running {
            if ui.button("Stop").clicked() {
                self.running = false;
            }
        } else if ui.button("Start").clicked() {
            if self.needs_reset || self.sim.is_none() {
                self.reset_simulation();
            }
            self.running = self.sim.is_some();
        }

        if ui.button("Reset").clicked() {
            self.reset_simulation();
            self.running = false;
        }

        if let Some(err) = &self.last_error {
            ui.separator();
            ui.colored_label(Color32::LIGHT_RED, err);
        }
    }

    fn plot_panel(&self, ui: &mut egui::Ui) {
        let Some(sim) = &self.sim else {
            return;
        };
        let stats = sim.stats();
        let bins = stats.cumulative_counts().len();

        ui.label(format!("Running estimate ({})", stats.mode().label()));
        Plot::new("coin_estimates")
            .legend(Legend::default())
            .width(360.0)
            .height(320.0)
            .include_y(0.0)
            .x_axis_label("Collision Count")
            .show(ui, |plot_ui| {
                for k in 0..bins {
                    let points = stats.series(k).to_vec();
                    let line = Line::new(PlotPoints::from(points))
                        .color(series_color(k))
                        .name(coin_label(k));
                    plot_ui.line(line);
                }
            });

        ui.separator();
        ui.label("Disks per coin value (recent samples)");
        Plot::new("rolling_histogram")
            .width(360.0)
            .height(200.0)
            .include_y(0.0)
            .show(ui, |plot_ui| {
                let bars = stats
                    .rolling_histogram()
                    .iter()
                    .enumerate()
                    .map(|(k, &v)| Bar::new(k as f64, v).fill(series_color(k)))
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars));
            });
    }

    fn draw_disks(&self, ui: &mut egui::Ui) {
        let Some(sim) = &self.sim else {
            return;
        };
        let painter = ui.painter();
        let rect = ui.max_rect();
        let arena = sim.population().arena();

        // Scale from the arena to the drawing area:
        let scale = (rect.width() / arena.width).min(rect.height() / arena.height);
        painter.rect_stroke(
            egui::Rect::from_min_size(rect.min, Vec2::new(arena.width, arena.height) * scale),
            0.0,
            egui::Stroke::new(1.0, Color32::GRAY),
        );

        for b in sim.population().bodies() {
            let pos = rect.min + Vec2::new(b.x, b.y) * scale;
            let radius = b.radius * scale;
            painter.circle_filled(pos, radius, DISK_COLOR);
            painter.text(
                pos,
                egui::Align2::CENTER_CENTER,
                b.coins.to_string(),
                egui::FontId::proportional((radius * 0.8).clamp(8.0, 32.0)),
                Color32::WHITE,
            );
        }
    }
}

impl eframe::App for CoinApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        egui::SidePanel::left("config_panel").show(ctx, |ui| self.config_panel(ui));

        if self.needs_reset && !self.running {
            self.reset_simulation();
        }

        // ------------------------------------
        // If we're running, advance one tick per frame
        // ------------------------------------
        if self.running {
            let dt = ctx.input(|i| i.stable_dt).min(MAX_FRAME_DT);
            if let Some(sim) = &mut self.sim {
                sim.advance(dt, self.speed);
            }
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.heading("Coin Exchange Between Colliding Disks");
            if let Some(sim) = &self.sim {
                ui.label(format!(
                    "Collisions: {}   Coins: {}   Speed: x{:.1}   Seed: {}",
                    sim.stats().total_collisions(),
                    sim.population().total_coins(),
                    self.speed,
                    sim.seed()
                ));
            }
        });

        egui::SidePanel::right("right_panel")
            .resizable(true)
            .show(ctx, |ui| self.plot_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_disks(ui));

        // Request another frame to keep animating (or remain static if stopped).
        ctx.request_repaint();
    }
}

// ===================================================================================
// Headless
// ===================================================================================

fn run_headless(params: SimulationParams, ticks: u64, dt: f32, speed: f32) -> anyhow::Result<()> {
    let mut sim = Simulation::new(params)?;
    let mut degenerate = 0;
    for _ in 0..ticks {
        degenerate += sim.advance(dt, speed).degenerate;
    }

    let stats = sim.stats();
    log::info!(
        "{ticks} ticks, {} collisions, {degenerate} degenerate pairs skipped, {} samples",
        stats.total_collisions(),
        stats.sample_count()
    );
    println!("seed {}", sim.seed());
    println!("coins remaining {}", sim.population().total_coins());
    println!("{:>5}  {:>10}", "coins", "estimate");
    for (k, e) in stats.current_distribution_estimate().iter().enumerate() {
        println!("{k:>5}  {e:>10.5}");
    }
    Ok(())
}

// ===================================================================================
// main
// ===================================================================================

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let params = args.params()?;

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get_physical())
        .build_global()
    {
        log::warn!("using default rayon pool: {e}");
    }

    if let Some(ticks) = args.headless {
        return run_headless(params, ticks, args.dt, args.speed);
    }

    let native_options = eframe::NativeOptions {
        ..Default::default()
    };
    eframe::run_native(
        "Coin Exchange Simulation",
        native_options,
        Box::new(move |_cc| Ok(Box::new(CoinApp::new(params, args.speed)))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}
