use crate::audio::AudioSnapshot;
use crate::effect::{ControlOp, Effect, StepRange};
use crate::frame::{FrameError, RgbFrame};

pub const DEFAULT_FRAMES_PER_FLIP: u32 = 120;
pub const FLIP_RANGE: StepRange = StepRange {
    min: 1,
    max: 120,
    step: 1,
};

/// Mirrors the picture on a timer, or on every detected beat in sync mode.
#[derive(Debug)]
pub struct Flippy {
    active: bool,
    frames_per_flip: u32,
    beat_sync: bool,
    flipped: bool,
    counter: u32,
    beat_held: bool,
}

impl Flippy {
    pub fn new() -> Self {
        Self {
            active: true,
            frames_per_flip: DEFAULT_FRAMES_PER_FLIP,
            beat_sync: false,
            flipped: false,
            counter: 0,
            beat_held: false,
        }
    }

    pub fn frames_per_flip(&self) -> u32 {
        self.frames_per_flip
    }

    pub fn set_frames_per_flip(&mut self, frames: u32) {
        self.frames_per_flip = FLIP_RANGE.clamp(i64::from(frames));
    }

    pub fn beat_sync(&self) -> bool {
        self.beat_sync
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    fn advance(&mut self, audio: &AudioSnapshot) {
        if self.beat_sync {
            // One flip per beat onset, however long the gate stays open.
            if audio.beat && !self.beat_held {
                self.flipped = !self.flipped;
            }
            self.beat_held = audio.beat;
            return;
        }
        self.counter += 1;
        if self.counter >= self.frames_per_flip {
            self.counter = 0;
            self.flipped = !self.flipped;
        }
    }
}

impl Default for Flippy {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Flippy {
    fn name(&self) -> &'static str {
        "Flippy"
    }

    fn description(&self) -> &'static str {
        "Auto mirror - s toggle, up/down flip rate, a beat sync"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn process(&mut self, frame: &mut RgbFrame, audio: &AudioSnapshot) -> Result<(), FrameError> {
        if !self.active {
            return Ok(());
        }
        frame.validate()?;
        self.advance(audio);
        if self.flipped {
            frame.flip_horizontal();
        }
        Ok(())
    }

    fn control(&mut self, op: ControlOp) -> bool {
        match op {
            ControlOp::Toggle => {
                self.active = !self.active;
                if self.active {
                    self.counter = 0;
                }
                tracing::info!(active = self.active, every = self.frames_per_flip, "Flippy toggled");
            }
            ControlOp::ResetClock => {
                self.counter = 0;
                self.flipped = false;
            }
            // Up is faster: fewer frames between flips.
            ControlOp::PitchUp | ControlOp::SpeedUp => {
                self.frames_per_flip = FLIP_RANGE.down(self.frames_per_flip)
            }
            ControlOp::PitchDown | ControlOp::SpeedDown => {
                self.frames_per_flip = FLIP_RANGE.up(self.frames_per_flip)
            }
            ControlOp::ToggleSync => {
                self.beat_sync = !self.beat_sync;
                self.beat_held = false;
                tracing::info!(beat_sync = self.beat_sync, "Flippy sync mode");
            }
            _ => return false,
        }
        true
    }

    fn status(&self) -> String {
        let mode = if self.beat_sync {
            "on beat".to_string()
        } else {
            format!("every {} frames", self.frames_per_flip)
        };
        format!(
            "Flippy {} | {} | {}",
            if self.active { "on" } else { "off" },
            mode,
            if self.flipped { "mirrored" } else { "normal" }
        )
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}
