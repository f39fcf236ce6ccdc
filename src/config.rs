use crate::engine::SimulationParams;
use crate::palette::Palette;
use crate::render::VisualizationMode;
use crate::seed::{PatternKind, PatternSpec};
use crate::symmetry::Symmetry;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

/// Highest pattern complexity; spot count grows linearly with it.
pub const MAX_COMPLEXITY: u32 = 20;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub feed: f32,
    pub kill: f32,
    pub diff_a: f32,
    pub diff_b: f32,
    pub time_step: f32,
    pub complexity: u32,
    pub pattern: PatternKind,
    pub mode: VisualizationMode,
    pub palette: String,
    /// User palettes by name, as hex strings. Shadow builtins of the same name.
    pub custom_palettes: BTreeMap<String, Vec<String>>,
    pub symmetry: Symmetry,
    pub fps_cap: u32,
    pub steps_per_frame: u32,
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let p = SimulationParams::default();
        Self {
            feed: p.feed,
            kill: p.kill,
            diff_a: p.diff_a,
            diff_b: p.diff_b,
            time_step: p.time_step,
            complexity: 5,
            pattern: PatternKind::Spots,
            mode: VisualizationMode::ChemicalB,
            palette: "ocean".to_string(),
            custom_palettes: BTreeMap::new(),
            symmetry: Symmetry::default(),
            fps_cap: 30,
            steps_per_frame: 1,
            seed: 0xC0FFEE_u64,
        }
    }
}

impl Settings {
    /// Replaces out-of-range values with something the engine can run.
    pub fn normalized(mut self) -> Self {
        let d = Settings::default();
        let positive = |v: f32, fallback: f32| {
            if v.is_finite() && v > 0.0 {
                v
            } else {
                fallback
            }
        };
        self.feed = positive(self.feed, d.feed);
        self.kill = positive(self.kill, d.kill);
        self.diff_a = positive(self.diff_a, d.diff_a);
        self.diff_b = positive(self.diff_b, d.diff_b);
        self.time_step = positive(self.time_step, d.time_step);
        self.complexity = self.complexity.clamp(1, MAX_COMPLEXITY);
        self.fps_cap = self.fps_cap.clamp(10, 240);
        self.steps_per_frame = self.steps_per_frame.clamp(1, 50);
        self
    }

    pub fn sim_params(&self) -> SimulationParams {
        SimulationParams {
            feed: self.feed,
            kill: self.kill,
            diff_a: self.diff_a,
            diff_b: self.diff_b,
            time_step: self.time_step,
        }
    }

    pub fn pattern_spec(&self) -> PatternSpec {
        PatternSpec {
            kind: self.pattern,
            complexity: self.complexity.clamp(1, MAX_COMPLEXITY),
            symmetry: self.symmetry,
        }
    }

    /// Custom palettes first, then builtins, then grayscale.
    pub fn resolve_palette(&self) -> Palette {
        if let Some(hex) = self.custom_palettes.get(&self.palette) {
            match Palette::custom(&self.palette, hex.as_slice()) {
                Ok(p) => return p,
                Err(err) => {
                    warn!(%err, palette = %self.palette, "bad custom palette, using grayscale")
                }
            }
            return Palette::grayscale();
        }
        Palette::named(&self.palette)
    }

    /// All selectable palette names: builtins followed by custom ones.
    pub fn palette_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Palette::builtin_names().map(str::to_string).collect();
        for name in self.custom_palettes.keys() {
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        }
        names
    }

    pub fn cycle_palette(&mut self) {
        let names = self.palette_names();
        let i = names.iter().position(|n| *n == self.palette);
        self.palette = match i {
            Some(i) => names[(i + 1) % names.len()].clone(),
            None => names[0].clone(),
        };
    }

    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.pattern = PatternKind::ALL[rng.gen_range(0..PatternKind::ALL.len())];
        self.mode = VisualizationMode::ALL[rng.gen_range(0..VisualizationMode::ALL.len())];
        let names = self.palette_names();
        self.palette = names[rng.gen_range(0..names.len())].clone();
        self.complexity = rng.gen_range(1..=10);
        self.feed = round_to(rng.gen_range(0.01..0.10), 3);
        self.kill = round_to(rng.gen_range(0.01..0.10), 3);
        self.time_step = round_to(rng.gen_range(0.1..2.0), 1).max(0.1);
        self.symmetry = Symmetry {
            horizontal: rng.gen_bool(0.5),
            vertical: rng.gen_bool(0.5),
            radial: rng.gen_bool(0.5),
        };
    }
}

fn round_to(v: f32, digits: i32) -> f32 {
    let k = 10f32.powi(digits);
    (v * k).round() / k
}

pub struct Paths {
    pub data_dir: PathBuf,
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

pub fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "rdsketch", "RdSketch")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).with_context(|| format!("could not create {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("rdsketch.log"),
        data_dir: dir,
    })
}

/// Missing or malformed files yield defaults.
pub fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Settings>(&s) {
            Ok(v) => v.normalized(),
            Err(err) => {
                warn!(%err, path = %path.display(), "ignoring malformed settings");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("could not write {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename over an existing file fails on some platforms
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
        .with_context(|| format!("could not move {} to {}", from.display(), to.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut s = Settings::default();
        s.pattern = PatternKind::Maze;
        s.mode = VisualizationMode::Contour;
        s.symmetry.radial = true;
        s.custom_palettes
            .insert("mine".into(), vec!["#101010".into(), "#f0f0f0".into()]);
        save_settings_atomic(&path, &s).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(load_settings(&path), s);
    }

    #[test]
    fn serialized_enums_use_kebab_case() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("\"chemical-b\""));
        assert!(json.contains("\"spots\""));
    }

    #[test]
    fn missing_or_broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(load_settings(&path), Settings::default());
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn partial_file_fills_defaults_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"feed": -1.0, "complexity": 0, "pattern": "waves", "fps_cap": 999}"#)
            .unwrap();
        let s = load_settings(&path);
        assert_eq!(s.feed, Settings::default().feed);
        assert_eq!(s.complexity, 1);
        assert_eq!(s.pattern, PatternKind::Waves);
        assert_eq!(s.fps_cap, 240);
    }

    #[test]
    fn huge_complexity_is_capped() {
        let s = Settings {
            complexity: 4_000_000_000,
            ..Settings::default()
        };
        assert_eq!(s.pattern_spec().complexity, MAX_COMPLEXITY);
        assert_eq!(s.normalized().complexity, MAX_COMPLEXITY);
    }

    #[test]
    fn palette_resolution_prefers_custom() {
        let mut s = Settings::default();
        assert_eq!(s.resolve_palette().name, "ocean");

        s.custom_palettes
            .insert("ocean".into(), vec!["#000".into(), "#fff".into()]);
        assert_eq!(s.resolve_palette().colors.len(), 2);

        s.custom_palettes.insert("broken".into(), vec!["nope".into()]);
        s.palette = "broken".into();
        assert_eq!(s.resolve_palette(), Palette::grayscale());

        s.palette = "unheard-of".into();
        assert_eq!(s.resolve_palette(), Palette::grayscale());
    }

    #[test]
    fn cycling_visits_custom_palettes() {
        let mut s = Settings::default();
        s.custom_palettes.insert("zz".into(), vec!["#123".into()]);
        let names = s.palette_names();
        assert_eq!(names.last().map(String::as_str), Some("zz"));
        s.palette = "grayscale".into();
        s.cycle_palette();
        assert_eq!(s.palette, "zz");
        s.cycle_palette();
        assert_eq!(s.palette, "ocean");
    }

    #[test]
    fn randomize_stays_in_documented_ranges() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut s = Settings::default();
        for _ in 0..200 {
            s.randomize(&mut rng);
            assert!((1..=10).contains(&s.complexity));
            assert!((0.01..=0.10).contains(&s.feed));
            assert!((0.01..=0.10).contains(&s.kill));
            assert!((0.1..=2.0).contains(&s.time_step));
            assert!(s.palette_names().contains(&s.palette));
            assert_eq!(s.clone().normalized(), s);
        }
    }

    #[test]
    fn converts_to_engine_types() {
        let s = Settings {
            complexity: 7,
            pattern: PatternKind::Fingerprints,
            ..Settings::default()
        };
        assert_eq!(s.sim_params(), SimulationParams::default());
        let spec = s.pattern_spec();
        assert_eq!(spec.kind, PatternKind::Fingerprints);
        assert_eq!(spec.complexity, 7);
    }
}
