use crate::engine::EffectKind;
use crate::source::PatternKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ki-player",
    version,
    about = "Real-time tessellation effects player (Ki / KiAlt lattice masks) for the terminal"
)]
pub struct Config {
    /// Effect to start with; omit to start on raw input.
    #[arg(long, value_enum)]
    pub effect: Option<EffectKind>,

    #[arg(long, value_enum, default_value_t = PatternKind::Bars)]
    pub source: PatternKind,

    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Directory of gradient preset JSON files.
    #[arg(long, default_value = "gradients")]
    pub gradients: PathBuf,

    /// Blend of each effect stage over its input, 0..1.
    #[arg(long, default_value_t = 1.0)]
    pub mix: f32,

    #[arg(long, value_enum, default_value_t = AudioMode::Off)]
    pub audio: AudioMode,

    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    #[arg(long, default_value_t = 0x4B49_2025)]
    pub seed: u64,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Ignore and do not write persisted preferences.
    #[arg(long, default_value_t = false)]
    pub no_prefs: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AudioMode {
    Off,
    #[value(alias = "microphone")]
    Mic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
