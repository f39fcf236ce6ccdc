use crate::cli::Cli;
use crate::display::{draw_text, pixels_to_cells, Terminal};
use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use anyhow::{Context, Result};
use chrono::Local;
use crossterm::style::Color;
use rand::{rngs::StdRng, SeedableRng};
use rdsketch::config::{
    load_settings, project_paths, save_settings_atomic, Paths, Settings, MAX_COMPLEXITY,
};
use rdsketch::export::{export_file_name, save_png};
use rdsketch::{Engine, FieldRenderer, InteractionInput};
use std::f32::consts::TAU;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PULSE_PERIOD_SECS: f32 = 4.0;
const STATUS_TTL: Duration = Duration::from_secs(3);
const RATE_RANGE: (f32, f32) = (0.001, 0.1);
const TIME_STEP_RANGE: (f32, f32) = (0.1, 2.0);

/// Synthetic excitation: a slow sine in `[0, 1]` starting at 0.
pub(crate) fn pulse_level(t_secs: f32) -> f32 {
    0.5 - 0.5 * (TAU * t_secs / PULSE_PERIOD_SECS).cos()
}

fn nudge(value: f32, delta: f32, (lo, hi): (f32, f32)) -> f32 {
    // snap to 4 decimals so repeated steps do not drift
    let v = ((value + delta) * 10_000.0).round() / 10_000.0;
    v.clamp(lo, hi)
}

fn nudge_int(value: u32, delta: i32, lo: i32, hi: i32) -> u32 {
    (value as i32 + delta).clamp(lo, hi) as u32
}

struct App {
    settings: Settings,
    paths: Paths,
    engine: Engine,
    renderer: FieldRenderer,
    term: Terminal,
    rng: StdRng,
    paused: bool,
    pulse: bool,
    started: Instant,
    pointer: Option<(f32, f32)>,
    status: Option<(String, Instant)>,
    fps: f32,
    should_quit: bool,
}

impl App {
    fn init(cli: &Cli) -> Result<Self> {
        let paths = project_paths()?;
        init_tracing_to_file(&paths.log_path)?;

        let mut settings = load_settings(&paths.settings_path);
        cli.apply(&mut settings);

        let term = Terminal::begin()?;
        let (width, height) = term.field_pixels();
        let engine = Engine::new(
            width,
            height,
            settings.sim_params(),
            settings.pattern_spec(),
            settings.seed,
        );
        let renderer = FieldRenderer::new(settings.resolve_palette());
        info!(
            width,
            height,
            pattern = %settings.pattern,
            palette = %settings.palette,
            "starting interactive session"
        );

        Ok(Self {
            rng: StdRng::seed_from_u64(settings.seed),
            settings,
            paths,
            engine,
            renderer,
            term,
            paused: false,
            pulse: cli.pulse,
            started: Instant::now(),
            pointer: None,
            status: None,
            fps: 0.0,
            should_quit: false,
        })
    }

    fn run(&mut self) -> Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.settings.fps_cap as f32);
        let mut fps_timer = Instant::now();
        let mut frames: u32 = 0;

        while !self.should_quit {
            let frame_start = Instant::now();

            if self.term.resize_if_needed()? {
                let (w, h) = self.term.field_pixels();
                self.engine.resize(w, h);
                self.pointer = None;
            }

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(ev) {
                    self.apply(action);
                }
                if self.should_quit {
                    break;
                }
            }

            if !self.paused {
                let input = self.interaction();
                for _ in 0..self.settings.steps_per_frame {
                    self.engine.step(input);
                }
            }

            self.render_frame()?;

            frames += 1;
            if fps_timer.elapsed() >= Duration::from_millis(500) {
                self.fps = frames as f32 / fps_timer.elapsed().as_secs_f32();
                fps_timer = Instant::now();
                frames = 0;
            }

            spin_sleep(frame_dt, frame_start);
        }

        self.term.end()?;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        info!(steps = self.engine.stats().steps, "session ended");
        Ok(())
    }

    fn interaction(&self) -> InteractionInput {
        let input = match self.pointer {
            Some((x, y)) => InteractionInput::pointer(x, y),
            None => InteractionInput::idle(),
        };
        let excitation = self
            .pulse
            .then(|| pulse_level(self.started.elapsed().as_secs_f32()));
        input.with_excitation(excitation)
    }

    fn apply(&mut self, action: Action) {
        let s = &mut self.settings;
        match action {
            Action::Quit => self.should_quit = true,
            Action::TogglePause => self.paused = !self.paused,
            Action::Reset => {
                self.engine.set_pattern(s.pattern_spec());
                self.engine.reset();
            }
            Action::NextPattern => {
                s.pattern = s.pattern.next();
                self.engine.set_pattern(s.pattern_spec());
            }
            Action::NextMode => s.mode = s.mode.next(),
            Action::NextPalette => {
                s.cycle_palette();
                self.renderer.set_palette(s.resolve_palette());
            }
            Action::ToggleHorizontal => {
                s.symmetry.horizontal = !s.symmetry.horizontal;
                self.engine.set_symmetry(s.symmetry);
            }
            Action::ToggleVertical => {
                s.symmetry.vertical = !s.symmetry.vertical;
                self.engine.set_symmetry(s.symmetry);
            }
            Action::ToggleRadial => {
                s.symmetry.radial = !s.symmetry.radial;
                self.engine.set_symmetry(s.symmetry);
            }
            Action::Feed(d) => {
                s.feed = nudge(s.feed, d, RATE_RANGE);
                self.engine.set_params(s.sim_params());
            }
            Action::Kill(d) => {
                s.kill = nudge(s.kill, d, RATE_RANGE);
                self.engine.set_params(s.sim_params());
            }
            Action::TimeStep(d) => {
                s.time_step = nudge(s.time_step, d, TIME_STEP_RANGE);
                self.engine.set_params(s.sim_params());
            }
            Action::Complexity(d) => {
                s.complexity = nudge_int(s.complexity, d, 1, MAX_COMPLEXITY as i32);
                self.engine.set_pattern(s.pattern_spec());
                let msg = format!("complexity {}, takes effect on reset (r)", s.complexity);
                self.status = Some((msg, Instant::now()));
            }
            Action::StepsPerFrame(d) => {
                s.steps_per_frame = nudge_int(s.steps_per_frame, d, 1, 50)
            }
            Action::TogglePulse => self.pulse = !self.pulse,
            Action::Randomize => {
                s.randomize(&mut self.rng);
                self.engine.reshuffle_noise();
                self.engine.set_params(s.sim_params());
                self.engine.set_pattern(s.pattern_spec());
                self.engine.reset();
                self.renderer.set_palette(s.resolve_palette());
            }
            Action::Export => self.export(),
            Action::Pointer { x, y } => self.pointer = Some((x, y)),
            Action::PointerUp => self.pointer = None,
        }
    }

    fn export(&mut self) {
        let dir = std::env::current_dir().unwrap_or_else(|_| self.paths.data_dir.clone());
        let msg = match export_frame(&self.renderer, &dir) {
            Ok(path) => format!("saved {}", path.display()),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "export failed");
                format!("export failed: {err}")
            }
        };
        self.status = Some((msg, Instant::now()));
    }

    fn render_frame(&mut self) -> Result<()> {
        let (w, h) = (self.engine.width(), self.engine.height());
        let pixels = self.renderer.render(&self.engine, self.settings.mode);
        pixels_to_cells(pixels, w, h, &mut self.term.cur);

        let [line1, line2] = self.hud_lines();
        draw_text(&mut self.term.cur, 0, 0, &line1, Color::White, Color::Black);
        draw_text(&mut self.term.cur, 0, 1, &line2, Color::Grey, Color::Black);

        self.term.present()
    }

    fn hud_lines(&self) -> [String; 2] {
        let s = &self.settings;
        let stats = self.engine.stats();
        let line1 = format!(
            "reaction-diffusion  pattern:{} x{}  mode:{}  palette:{}  sym:{}  steps/frame:{}  fps:{:>5.1}{}{}",
            s.pattern,
            s.complexity,
            s.mode,
            self.renderer.palette().name,
            s.symmetry.label(),
            s.steps_per_frame,
            self.fps,
            if self.paused { "  [paused]" } else { "" },
            if self.pulse { "  [pulse]" } else { "" },
        );

        let fresh = self
            .status
            .as_ref()
            .filter(|(_, at)| at.elapsed() < STATUS_TTL);
        let line2 = match fresh {
            Some((msg, _)) => msg.clone(),
            None => format!(
                "F:{:.4} k:{:.4} dt:{:.1}  B[min:{:.3} max:{:.3} mean:{:.3}]  step:{}  keys: q quit  space pause  r reset  p pattern  m mode  c palette  h/v/o symmetry  arrows F/k  [ ] dt  , . complexity  - = speed  a pulse  x random  s save",
                s.feed,
                s.kill,
                s.time_step,
                stats.min_b,
                stats.max_b,
                stats.mean_b,
                stats.steps,
            ),
        };
        [line1, line2]
    }
}

pub(crate) fn run(cli: &Cli) -> Result<()> {
    let mut app = App::init(cli)?;
    app.run()?;
    Ok(())
}

/// Simulates `--frames` frames off-screen and writes one PNG.
pub(crate) fn run_headless(cli: &Cli) -> Result<()> {
    init_tracing_to_stderr();

    let mut settings = match project_paths() {
        Ok(paths) => load_settings(&paths.settings_path),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "no settings directory, using defaults");
            Settings::default()
        }
    };
    cli.apply(&mut settings);

    let mut engine = Engine::new(
        cli.width,
        cli.height,
        settings.sim_params(),
        settings.pattern_spec(),
        settings.seed,
    );
    let mut renderer = FieldRenderer::new(settings.resolve_palette());
    info!(
        width = cli.width,
        height = cli.height,
        frames = cli.frames,
        pattern = %settings.pattern,
        "headless run"
    );

    let frame_secs = 1.0 / settings.fps_cap as f32;
    for frame in 0..cli.frames {
        let excitation = cli.pulse.then(|| pulse_level(frame as f32 * frame_secs));
        let input = InteractionInput::idle().with_excitation(excitation);
        for _ in 0..settings.steps_per_frame {
            engine.step(input);
        }
    }

    let pixels = renderer.render(&engine, settings.mode);
    let path = match &cli.out {
        Some(p) => p.clone(),
        None => default_export_path()?,
    };
    save_png(&path, engine.width(), engine.height(), pixels)?;

    let stats = engine.stats();
    info!(
        steps = stats.steps,
        mean_b = stats.mean_b,
        path = %path.display(),
        "headless run finished"
    );
    println!("{}", path.display());
    Ok(())
}

/// Saves the frame on screen. Uses the renderer's own size, which can lag the
/// engine by one frame after a resize.
fn export_frame(renderer: &FieldRenderer, dir: &Path) -> Result<PathBuf> {
    let (width, height) = renderer.size();
    let path = export_file_name(dir, Local::now());
    save_png(&path, width, height, renderer.pixels())?;
    Ok(path)
}

fn default_export_path() -> Result<PathBuf> {
    let dir = std::env::current_dir().context("could not resolve current directory")?;
    Ok(export_file_name(&dir, Local::now()))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// The alternate screen owns stdout, so interactive logs go to a file.
fn init_tracing_to_file(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

fn init_tracing_to_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rdsketch::VisualizationMode;

    #[test]
    fn pulse_runs_between_zero_and_one() {
        assert_abs_diff_eq!(pulse_level(0.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(pulse_level(PULSE_PERIOD_SECS / 2.0), 1.0, epsilon = 1e-6);
        for i in 0..100 {
            let v = pulse_level(i as f32 * 0.37);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn export_after_resize_writes_the_shown_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = Engine::new(
            24,
            16,
            Settings::default().sim_params(),
            Settings::default().pattern_spec(),
            5,
        );
        let mut renderer = FieldRenderer::new(Settings::default().resolve_palette());
        renderer.render(&engine, VisualizationMode::ChemicalB);

        // resize lands before the next render
        engine.resize(40, 30);
        let path = export_frame(&renderer, dir.path()).unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (24, 16));
    }

    #[test]
    fn nudges_stay_in_range() {
        assert_abs_diff_eq!(nudge(0.0367, 0.0005, RATE_RANGE), 0.0372, epsilon = 1e-6);
        assert_eq!(nudge(0.0995, 0.002, RATE_RANGE), 0.1);
        assert_abs_diff_eq!(nudge(0.0015, -0.002, RATE_RANGE), 0.001, epsilon = 1e-7);
        assert_abs_diff_eq!(nudge(1.0, 0.1, TIME_STEP_RANGE), 1.1, epsilon = 1e-6);
        assert_eq!(nudge_int(1, -1, 1, 50), 1);
        assert_eq!(nudge_int(50, 1, 1, 50), 50);
        assert_eq!(nudge_int(5, 1, 1, MAX_COMPLEXITY as i32), 6);
    }
}
