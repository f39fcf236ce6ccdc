use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Number of samples in a color map unless asked otherwise.
pub const DEFAULT_STEPS: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    pub fn scale(self, k: f32) -> Rgb {
        let s = |c: u8| (c as f32 * k).round().clamp(0.0, 255.0) as u8;
        Rgb {
            r: s(self.r),
            g: s(self.g),
            b: s(self.b),
        }
    }

    /// Hue, saturation and lightness, each in `[0, 1]`.
    pub fn to_hsl(self) -> (f32, f32, f32) {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return (0.0, 0.0, l);
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        (h / 6.0, s, l)
    }

    pub fn from_hsl(h: f32, s: f32, l: f32) -> Rgb {
        let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        if s == 0.0 {
            let v = to_u8(l);
            return Rgb::new(v, v, v);
        }

        let hue_to_rgb = |p: f32, q: f32, mut t: f32| -> f32 {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                return p + (q - p) * 6.0 * t;
            }
            if t < 0.5 {
                return q;
            }
            if t < 2.0 / 3.0 {
                return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
            }
            p
        };

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Rgb::new(
            to_u8(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            to_u8(hue_to_rgb(p, q, h)),
            to_u8(hue_to_rgb(p, q, h - 1.0 / 3.0)),
        )
    }

    fn rotate_hue(self, turns: f32) -> Rgb {
        let (h, s, l) = self.to_hsl();
        Rgb::from_hsl((h + turns).rem_euclid(1.0), s, l)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
    #[error("invalid hex color {0:?}")]
    InvalidHex(String),
    #[error("palette {0:?} has no colors")]
    Empty(String),
}

/// Parses `#rrggbb`, `rrggbb`, `#rgb` or `rgb`.
pub fn parse_hex(s: &str) -> Result<Rgb, PaletteError> {
    let bad = || PaletteError::InvalidHex(s.to_string());
    let hex = s.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| bad());
    match hex.len() {
        3 => {
            let d: Vec<String> = hex.chars().map(|c| format!("{c}{c}")).collect();
            Ok(Rgb::new(channel(&d[0])?, channel(&d[1])?, channel(&d[2])?))
        }
        6 => Ok(Rgb::new(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => Err(bad()),
    }
}

const BUILTINS: &[(&str, &[&str])] = &[
    ("ocean", &["#05668D", "#028090", "#00A896", "#02C39A", "#F0F3BD"]),
    ("sunset", &["#FF6B6B", "#FF8E72", "#FFA69E", "#FFD93D", "#FFE66D"]),
    ("forest", &["#2D5A27", "#3A7D44", "#4CAF50", "#81C784", "#A5D6A7"]),
    ("desert", &["#D4A373", "#E9EDC9", "#CCD5AE", "#FAEDCD", "#FEFAE0"]),
    ("arctic", &["#A8E6CF", "#DCEDC1", "#FFD3B6", "#FFAAA5", "#FF8B94"]),
    ("neon", &["#FF00FF", "#00FFFF", "#FFFF00", "#FF00FF", "#00FFFF"]),
    ("grayscale", &["#000000", "#333333", "#666666", "#999999", "#CCCCCC", "#FFFFFF"]),
];

/// Named ordered list of color stops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pub name: String,
    pub colors: Vec<Rgb>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Harmony {
    Complementary,
    Triadic,
    Analogous,
}

impl Palette {
    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        BUILTINS.iter().map(|(name, _)| *name)
    }

    pub fn builtin(name: &str) -> Option<Palette> {
        let (key, stops) = BUILTINS
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name.trim()))?;
        let colors = stops.iter().filter_map(|s| parse_hex(s).ok()).collect();
        Some(Palette {
            name: (*key).to_string(),
            colors,
        })
    }

    pub fn grayscale() -> Palette {
        Palette {
            name: "grayscale".to_string(),
            colors: [0x00u8, 0x33, 0x66, 0x99, 0xCC, 0xFF]
                .iter()
                .map(|&v| Rgb::new(v, v, v))
                .collect(),
        }
    }

    /// Builtin lookup that never fails; unknown names fall back to grayscale.
    pub fn named(name: &str) -> Palette {
        Self::builtin(name).unwrap_or_else(|| {
            warn!(palette = name, "unknown palette, using grayscale");
            Self::grayscale()
        })
    }

    pub fn custom<S: AsRef<str>>(name: &str, hex: &[S]) -> Result<Palette, PaletteError> {
        if hex.is_empty() {
            return Err(PaletteError::Empty(name.to_string()));
        }
        let colors = hex
            .iter()
            .map(|s| parse_hex(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Palette {
            name: name.to_string(),
            colors,
        })
    }

    /// Palette derived from one base color.
    pub fn from_harmony(base: Rgb, harmony: Harmony) -> Palette {
        let colors = match harmony {
            Harmony::Complementary => {
                let comp = base.rotate_hue(0.5);
                vec![base, base.scale(0.8), base.scale(0.6), comp, comp.scale(0.8)]
            }
            Harmony::Triadic => {
                let t1 = base.rotate_hue(1.0 / 3.0);
                let t2 = base.rotate_hue(2.0 / 3.0);
                vec![base, t1, t2, base.scale(0.7), t1.scale(0.7)]
            }
            Harmony::Analogous => analogous(base, 5, 30.0),
        };
        let tag = match harmony {
            Harmony::Complementary => "complementary",
            Harmony::Triadic => "triadic",
            Harmony::Analogous => "analogous",
        };
        Palette {
            name: format!("{tag}-{base}"),
            colors,
        }
    }

    pub fn to_hex(&self) -> Vec<String> {
        self.colors.iter().map(|c| c.to_string()).collect()
    }
}

/// `count` colors spaced `angle_deg` apart in hue, centred on `base`.
pub fn analogous(base: Rgb, count: usize, angle_deg: f32) -> Vec<Rgb> {
    let (h, s, l) = base.to_hsl();
    let step = angle_deg / 360.0;
    let start = h - step * count.saturating_sub(1) as f32 / 2.0;
    (0..count)
        .map(|i| Rgb::from_hsl((start + step * i as f32).rem_euclid(1.0), s, l))
        .collect()
}

/// Fixed-size lookup table sampled from a palette.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ColorMap {
    samples: Vec<Rgb>,
}

impl ColorMap {
    /// Splits `steps` into `N - 1` linear segments between consecutive stops.
    /// The last segment absorbs the remainder so the map has exactly `steps` entries.
    pub fn build(palette: &Palette, steps: usize) -> ColorMap {
        let grayscale;
        let colors = if palette.colors.is_empty() {
            grayscale = Palette::grayscale();
            &grayscale.colors
        } else {
            &palette.colors
        };

        if colors.len() == 1 {
            return ColorMap {
                samples: vec![colors[0]; steps],
            };
        }

        let segments = colors.len() - 1;
        let per_segment = steps / segments;
        let mut samples = Vec::with_capacity(steps);
        for i in 0..segments {
            let n = if i == segments - 1 {
                steps - per_segment * i
            } else {
                per_segment
            };
            for j in 0..n {
                let t = if n > 1 { j as f32 / (n - 1) as f32 } else { 0.0 };
                samples.push(colors[i].lerp(colors[i + 1], t));
            }
        }
        ColorMap { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Rgb] {
        &self.samples
    }

    /// Color at normalized `value`; an empty map yields black.
    pub fn sample_at(&self, value: f32) -> Rgb {
        if self.samples.is_empty() {
            return Rgb::BLACK;
        }
        let v = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        let i = (v * (self.samples.len() - 1) as f32).floor() as usize;
        self.samples[i.min(self.samples.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(parse_hex("#05668D").unwrap(), Rgb::new(0x05, 0x66, 0x8d));
        assert_eq!(parse_hex("fff").unwrap(), Rgb::WHITE);
        assert_eq!(parse_hex(" #a0B ").unwrap(), Rgb::new(0xaa, 0x00, 0xbb));
        assert!(matches!(parse_hex("#12345"), Err(PaletteError::InvalidHex(_))));
        assert!(parse_hex("#zzzzzz").is_err());
        assert!(parse_hex("").is_err());
    }

    #[test]
    fn hex_display_round_trips() {
        let c = Rgb::new(2, 195, 154);
        assert_eq!(c.to_string(), "#02c39a");
        assert_eq!(parse_hex(&c.to_string()).unwrap(), c);
    }

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        let p = Palette::builtin("OCEAN").unwrap();
        assert_eq!(p.name, "ocean");
        assert_eq!(p.colors.len(), 5);
        assert_eq!(Palette::builtin_names().count(), 7);
    }

    #[test]
    fn unknown_palette_falls_back_to_grayscale() {
        assert_eq!(Palette::named("no-such-thing"), Palette::grayscale());
        assert_eq!(Palette::builtin("grayscale").unwrap(), Palette::grayscale());
    }

    #[test]
    fn custom_palette_rejects_bad_input() {
        assert!(Palette::custom("mine", &["#000", "#fff"]).is_ok());
        assert_eq!(
            Palette::custom::<&str>("void", &[]),
            Err(PaletteError::Empty("void".into()))
        );
        assert_eq!(
            Palette::custom("oops", &["#000", "blue"]),
            Err(PaletteError::InvalidHex("blue".into()))
        );
    }

    #[test]
    fn two_stop_map_spans_both_colors() {
        let p = Palette::custom("bw", &["#000000", "#ffffff"]).unwrap();
        let map = ColorMap::build(&p, 256);
        assert_eq!(map.len(), 256);
        assert_eq!(map.samples()[0], Rgb::BLACK);
        assert_eq!(map.samples()[255], Rgb::WHITE);
        assert_eq!(map.sample_at(0.0), Rgb::BLACK);
        assert_eq!(map.sample_at(1.0), Rgb::WHITE);
    }

    #[test]
    fn last_segment_absorbs_remainder() {
        let p = Palette::named("ocean");
        let map = ColorMap::build(&p, 10);
        // 4 segments of 2, the last one gets 10 - 6 = 4.
        assert_eq!(map.len(), 10);
        assert_eq!(map.samples()[9], p.colors[4]);
        assert_eq!(ColorMap::build(&Palette::grayscale(), 256).len(), 256);
    }

    #[test]
    fn single_color_palette_repeats() {
        let p = Palette::custom("one", &["#123456"]).unwrap();
        let map = ColorMap::build(&p, 256);
        assert_eq!(map.len(), 256);
        assert!(map.samples().iter().all(|&c| c == Rgb::new(0x12, 0x34, 0x56)));
    }

    #[test]
    fn sampling_clamps_and_handles_empty() {
        let map = ColorMap::build(&Palette::grayscale(), 256);
        assert_eq!(map.sample_at(-3.0), map.sample_at(0.0));
        assert_eq!(map.sample_at(7.0), map.sample_at(1.0));
        assert_eq!(map.sample_at(0.42), map.sample_at(0.42));
        assert_eq!(ColorMap::default().sample_at(0.5), Rgb::BLACK);
        assert_eq!(ColorMap::build(&Palette::grayscale(), 0).sample_at(0.5), Rgb::BLACK);
    }

    #[test]
    fn empty_palette_builds_grayscale_map() {
        let empty = Palette {
            name: "empty".into(),
            colors: vec![],
        };
        assert_eq!(
            ColorMap::build(&empty, 64),
            ColorMap::build(&Palette::grayscale(), 64)
        );
    }

    #[test]
    fn hsl_round_trip_is_close() {
        for c in [Rgb::new(255, 0, 0), Rgb::new(5, 102, 141), Rgb::new(120, 120, 120)] {
            let (h, s, l) = c.to_hsl();
            let back = Rgb::from_hsl(h, s, l);
            assert!((back.r as i32 - c.r as i32).abs() <= 1);
            assert!((back.g as i32 - c.g as i32).abs() <= 1);
            assert!((back.b as i32 - c.b as i32).abs() <= 1);
        }
    }

    #[test]
    fn complementary_of_red_is_cyan() {
        let p = Palette::from_harmony(Rgb::new(255, 0, 0), Harmony::Complementary);
        assert_eq!(p.colors.len(), 5);
        assert_eq!(p.colors[3], Rgb::new(0, 255, 255));
        assert_eq!(p.colors[1], Rgb::new(204, 0, 0));
    }

    #[test]
    fn analogous_is_centred_on_base() {
        let base = Rgb::new(0, 0, 255);
        let colors = analogous(base, 3, 30.0);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[1], base);
    }
}
