use crate::engine::EffectKind;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerPrefs {
    pub effect: Option<EffectKind>,
    pub show_hud: bool,
    pub flip: bool,
}

impl Default for PlayerPrefs {
    fn default() -> Self {
        Self {
            effect: None,
            show_hud: true,
            flip: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefsError {
    Io(String),
    Parse { line: usize, message: String },
}

impl fmt::Display for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
        }
    }
}

impl std::error::Error for PrefsError {}

impl PlayerPrefs {
    pub fn parse(text: &str) -> Result<Self, PrefsError> {
        let mut prefs = Self::default();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(PrefsError::Parse {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            let value = value.trim();
            let bad = |message: &str| PrefsError::Parse {
                line: line_no,
                message: message.to_string(),
            };
            match key.trim() {
                "effect" => {
                    prefs.effect = match value {
                        "" | "none" => None,
                        other => Some(
                            EffectKind::parse(other).ok_or_else(|| bad("unknown effect name"))?,
                        ),
                    };
                }
                "show_hud" => {
                    prefs.show_hud = parse_bool(value).ok_or_else(|| bad("show_hud must be true/false"))?;
                }
                "flip" => {
                    prefs.flip = parse_bool(value).ok_or_else(|| bad("flip must be true/false"))?;
                }
                // Unknown keys are tolerated so older builds can read newer files.
                _ => {}
            }
        }
        Ok(prefs)
    }

    pub fn to_text(&self) -> String {
        format!(
            "# ki_player prefs v1\neffect={}\nshow_hud={}\nflip={}\n",
            self.effect.map(EffectKind::label).unwrap_or("none"),
            self.show_hud,
            self.flip
        )
    }

    pub fn load(path: Option<&Path>) -> Result<Self, PrefsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(PrefsError::Io(err.to_string())),
        };
        Self::parse(&text)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<(), PrefsError> {
        let Some(path) = path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PrefsError::Io(e.to_string()))?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.to_text()).map_err(|e| PrefsError::Io(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| PrefsError::Io(e.to_string()))
    }
}

pub fn prefs_storage_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Some(PathBuf::from(xdg).join("ki_player").join("prefs.txt"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".config").join("ki_player").join("prefs.txt"))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
