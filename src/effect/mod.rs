mod flippy;
mod gradient_overlay;
mod ki;
mod ki_alt;
mod stutter;

use crate::audio::AudioSnapshot;
use crate::frame::{FrameError, RgbFrame};

pub use flippy::Flippy;
pub use gradient_overlay::GradientOverlay;
pub use ki::Ki;
pub use ki_alt::KiAlt;
pub use stutter::Stutter;

/// Named operations from the key/command dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlOp {
    Toggle,
    ResetClock,
    PitchUp,
    PitchDown,
    SpeedUp,
    SpeedDown,
    NextGradient,
    PrevGradient,
    OpacityUp,
    OpacityDown,
    /// Switch between timed and beat-driven behaviour.
    ToggleSync,
}

impl ControlOp {
    pub const fn all() -> [Self; 11] {
        [
            Self::Toggle,
            Self::ResetClock,
            Self::PitchUp,
            Self::PitchDown,
            Self::SpeedUp,
            Self::SpeedDown,
            Self::NextGradient,
            Self::PrevGradient,
            Self::OpacityUp,
            Self::OpacityDown,
            Self::ToggleSync,
        ]
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "toggle" => Some(Self::Toggle),
            "reset" | "reset_clock" => Some(Self::ResetClock),
            "pitch_up" | "width_up" => Some(Self::PitchUp),
            "pitch_down" | "width_down" => Some(Self::PitchDown),
            "speed_up" => Some(Self::SpeedUp),
            "speed_down" => Some(Self::SpeedDown),
            "next_gradient" => Some(Self::NextGradient),
            "prev_gradient" => Some(Self::PrevGradient),
            "opacity_up" => Some(Self::OpacityUp),
            "opacity_down" => Some(Self::OpacityDown),
            "toggle_sync" | "beat_sync" => Some(Self::ToggleSync),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::ResetClock => "reset_clock",
            Self::PitchUp => "pitch_up",
            Self::PitchDown => "pitch_down",
            Self::SpeedUp => "speed_up",
            Self::SpeedDown => "speed_down",
            Self::NextGradient => "next_gradient",
            Self::PrevGradient => "prev_gradient",
            Self::OpacityUp => "opacity_up",
            Self::OpacityDown => "opacity_down",
            Self::ToggleSync => "toggle_sync",
        }
    }
}

/// A per-frame pixel transform with its own clock and caches.
///
/// Instances are driven from one thread at a time; nothing is shared between
/// instances.
pub trait Effect {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn is_active(&self) -> bool;
    /// Transform `frame` in place. On error the caller discards the output.
    fn process(&mut self, frame: &mut RgbFrame, audio: &AudioSnapshot) -> Result<(), FrameError>;
    /// Returns `false` when the operation means nothing to this effect.
    fn control(&mut self, op: ControlOp) -> bool;
    /// One-line parameter readout for the HUD.
    fn status(&self) -> String;
    /// Return to the freshly built state: on, default parameters, clock at
    /// zero, caches dropped, first gradient selected. Loaded presets stay.
    fn reset(&mut self);
}

/// Signed blend control in `[-100, 100]`.
///
/// The magnitude is the gradient opacity of masked pixels, its complement
/// `100 - |v|` that of unmasked pixels. Stepping past either end wraps to the
/// other, which looks identical and keeps the see-saw continuous.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeeSawOpacity(i16);

impl SeeSawOpacity {
    pub const MAX: i16 = 100;

    pub fn new(value: i16) -> Self {
        Self(value.clamp(-Self::MAX, Self::MAX))
    }

    pub fn value(self) -> i16 {
        self.0
    }

    pub fn increment(&mut self) {
        self.0 += 1;
        if self.0 > Self::MAX {
            self.0 = -Self::MAX;
        }
    }

    pub fn decrement(&mut self) {
        self.0 -= 1;
        if self.0 < -Self::MAX {
            self.0 = Self::MAX;
        }
    }

    pub fn masked_percent(self) -> i16 {
        self.0.abs()
    }

    pub fn unmasked_percent(self) -> i16 {
        Self::MAX - self.0.abs()
    }

    pub fn weights(self) -> crate::compositor::RegionOpacity {
        crate::compositor::RegionOpacity {
            masked: self.masked_percent() as f32 / 100.0,
            unmasked: self.unmasked_percent() as f32 / 100.0,
        }
    }
}

/// Clamped, stepped integer parameter (pitch, diamond width, opacity).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl StepRange {
    pub fn clamp(&self, v: i64) -> u32 {
        v.clamp(i64::from(self.min), i64::from(self.max)) as u32
    }

    pub fn up(&self, v: u32) -> u32 {
        self.clamp(i64::from(v) + i64::from(self.step))
    }

    pub fn down(&self, v: u32) -> u32 {
        self.clamp(i64::from(v) - i64::from(self.step))
    }
}
