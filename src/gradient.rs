//! Gradient presets and the 256-entry colour lookup table built from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const LUT_SIZE: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f32,
    /// `[r, g, b]` or `[r, g, b, a]`; alpha is carried but never sampled.
    pub color: Vec<u8>,
}

impl ColorStop {
    pub fn new(position: f32, rgba: [u8; 4]) -> Self {
        Self {
            position,
            color: rgba.to_vec(),
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        let c = |i: usize| self.color.get(i).copied().unwrap_or(0);
        [c(0), c(1), c(2)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientPreset {
    pub name: String,
    pub stops: Vec<ColorStop>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GradientError {
    Io(String),
    Parse { path: PathBuf, message: String },
    InvalidStop { index: usize, message: String },
    Encode(String),
}

impl fmt::Display for GradientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { path, message } => {
                write!(f, "parse error in {}: {message}", path.display())
            }
            Self::InvalidStop { index, message } => write!(f, "invalid stop {index}: {message}"),
            Self::Encode(msg) => write!(f, "encode error: {msg}"),
        }
    }
}

impl std::error::Error for GradientError {}

impl GradientPreset {
    /// Parse a preset from its JSON text. Stops are sorted by position.
    pub fn from_json(text: &str) -> Result<Self, GradientError> {
        let mut preset: Self = serde_json::from_str(text).map_err(|e| GradientError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        preset.normalize()?;
        Ok(preset)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GradientError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| GradientError::Io(e.to_string()))?;
        Self::from_json(&text).map_err(|err| match err {
            GradientError::Parse { message, .. } => GradientError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn to_json(&self) -> Result<String, GradientError> {
        serde_json::to_string_pretty(self).map_err(|e| GradientError::Encode(e.to_string()))
    }

    fn normalize(&mut self) -> Result<(), GradientError> {
        for (index, stop) in self.stops.iter().enumerate() {
            if !stop.position.is_finite() {
                return Err(GradientError::InvalidStop {
                    index,
                    message: "position must be finite".to_string(),
                });
            }
            if !(3..=4).contains(&stop.color.len()) {
                return Err(GradientError::InvalidStop {
                    index,
                    message: format!("expected 3 or 4 colour channels, got {}", stop.color.len()),
                });
            }
        }
        sort_stops(&mut self.stops);
        Ok(())
    }

    pub fn lut(&self) -> GradientLut {
        GradientLut::build(&self.stops)
    }
}

/// Order stops by position. The sort is stable, so coincident stops keep
/// their relative order.
pub fn sort_stops(stops: &mut [ColorStop]) {
    stops.sort_by(|a, b| a.position.total_cmp(&b.position));
}

fn is_sorted(stops: &[ColorStop]) -> bool {
    stops.windows(2).all(|w| w[0].position <= w[1].position)
}

/// Piecewise-linear colour at `position` (clamped to `[0, 1]`).
///
/// Stops are walked in position order whatever order they are given in.
/// Beyond the last stop the last colour is returned; an empty slice yields
/// black.
pub fn interpolate(stops: &[ColorStop], position: f32) -> [u8; 3] {
    if is_sorted(stops) {
        return interpolate_sorted(stops, position);
    }
    let mut sorted = stops.to_vec();
    sort_stops(&mut sorted);
    interpolate_sorted(&sorted, position)
}

fn interpolate_sorted(stops: &[ColorStop], position: f32) -> [u8; 3] {
    let position = if position.is_nan() {
        0.0
    } else {
        position.clamp(0.0, 1.0)
    };
    let Some(last) = stops.last() else {
        return [0, 0, 0];
    };

    for pair in stops.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if position <= b.position {
            if a.position == b.position {
                return a.rgb();
            }
            let t = ((position - a.position) / (b.position - a.position)).clamp(0.0, 1.0);
            let (ca, cb) = (a.rgb(), b.rgb());
            let mut out = [0u8; 3];
            for ch in 0..3 {
                let v = ca[ch] as f32 + t * (cb[ch] as f32 - ca[ch] as f32);
                out[ch] = v.round().clamp(0.0, 255.0) as u8;
            }
            return out;
        }
    }
    last.rgb()
}

/// Maps an 8-bit luminance (or depth) to an RGB colour.
#[derive(Clone, PartialEq, Eq)]
pub struct GradientLut {
    table: [[u8; 3]; LUT_SIZE],
}

impl fmt::Debug for GradientLut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradientLut")
            .field("first", &self.table[0])
            .field("last", &self.table[LUT_SIZE - 1])
            .finish()
    }
}

impl GradientLut {
    pub fn build(stops: &[ColorStop]) -> Self {
        let mut sorted = stops.to_vec();
        sort_stops(&mut sorted);
        let mut table = [[0u8; 3]; LUT_SIZE];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = interpolate_sorted(&sorted, i as f32 / 255.0);
        }
        Self { table }
    }

    #[inline(always)]
    pub fn get(&self, index: u8) -> [u8; 3] {
        self.table[index as usize]
    }

    pub fn as_slice(&self) -> &[[u8; 3]] {
        &self.table
    }
}

/// The presets an effect instance cycles through, plus the LUT of the
/// selected one. Each effect owns its own library.
#[derive(Debug, Clone, Default)]
pub struct GradientLibrary {
    presets: Vec<GradientPreset>,
    index: usize,
    lut: Option<GradientLut>,
}

impl GradientLibrary {
    pub fn new(presets: Vec<GradientPreset>) -> Self {
        let mut lib = Self {
            presets: presets
                .into_iter()
                .filter(|p| !p.stops.is_empty())
                .map(|mut p| {
                    sort_stops(&mut p.stops);
                    p
                })
                .collect(),
            index: 0,
            lut: None,
        };
        lib.regenerate();
        lib
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&GradientPreset> {
        self.presets.get(self.index)
    }

    pub fn current_name(&self) -> &str {
        self.current().map(|p| p.name.as_str()).unwrap_or("None")
    }

    pub fn lut(&self) -> Option<&GradientLut> {
        self.lut.as_ref()
    }

    pub fn next(&mut self) {
        if self.presets.is_empty() {
            return;
        }
        self.index = (self.index + 1) % self.presets.len();
        self.regenerate();
    }

    pub fn prev(&mut self) {
        if self.presets.is_empty() {
            return;
        }
        self.index = (self.index + self.presets.len() - 1) % self.presets.len();
        self.regenerate();
    }

    pub fn select(&mut self, index: usize) {
        if index < self.presets.len() && index != self.index {
            self.index = index;
            self.regenerate();
        }
    }

    fn regenerate(&mut self) {
        self.lut = self.current().map(GradientPreset::lut);
        if let Some(p) = self.current() {
            tracing::debug!(gradient = %p.name, index = self.index, "gradient LUT regenerated");
        }
    }
}

/// Load every `*.json` preset in `dir`, sorted by file name.
///
/// A missing directory yields an empty list; unreadable or malformed files
/// are skipped with a warning so one bad preset cannot take down the player.
pub fn load_presets_dir(dir: impl AsRef<Path>) -> Result<Vec<GradientPreset>, GradientError> {
    let dir = dir.as_ref();
    let entries = match std::fs::read_dir(dir) {
        Ok(v) => v,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(dir = %dir.display(), "gradients folder not found");
            return Ok(Vec::new());
        }
        Err(err) => return Err(GradientError::Io(err.to_string())),
    };

    let mut paths = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect::<Vec<_>>();
    paths.sort();

    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        match GradientPreset::load(&path) {
            Ok(p) if p.stops.is_empty() => {
                tracing::warn!(path = %path.display(), "gradient has no stops; skipped");
            }
            Ok(p) => out.push(p),
            Err(err) => tracing::warn!(path = %path.display(), %err, "skipping gradient"),
        }
    }
    tracing::info!(count = out.len(), dir = %dir.display(), "loaded gradients");
    Ok(out)
}
