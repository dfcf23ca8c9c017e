use crate::audio::AudioSnapshot;
use crate::compositor::{blend_gradient, invert_masked};
use crate::effect::{ControlOp, Effect, SeeSawOpacity, StepRange};
use crate::frame::{FrameError, RgbFrame};
use crate::gradient::{GradientLibrary, GradientPreset};
use crate::mask::{AnimatedMasker, AnimatedMasks};

pub const DEFAULT_PITCH: u32 = 19;
pub const PITCH_RANGE: StepRange = StepRange {
    min: 9,
    max: 199,
    step: 10,
};
pub const DEFAULT_OPACITY: i16 = 100;

/// Animated lattice tessellation with see-saw gradient blending.
///
/// Every processed frame advances the clock by the speed multiplier. The
/// threshold grows over `pitch` frames and resets, and the whole pattern
/// flips polarity every `pitch` frames. With a gradient loaded, masked and
/// unmasked pixels are blended toward the gradient at complementary
/// opacities; without one, masked pixels are inverted.
#[derive(Debug)]
pub struct KiAlt {
    active: bool,
    counter: u64,
    pitch: u32,
    speed: u32,
    opacity: SeeSawOpacity,
    gradients: GradientLibrary,
    masker: AnimatedMasker,
    masks: AnimatedMasks,
}

impl KiAlt {
    pub fn new(presets: Vec<GradientPreset>) -> Self {
        Self {
            active: true,
            counter: 0,
            pitch: DEFAULT_PITCH,
            speed: 1,
            opacity: SeeSawOpacity::new(DEFAULT_OPACITY),
            gradients: GradientLibrary::new(presets),
            masker: AnimatedMasker::new(),
            masks: AnimatedMasks::new(0, 0),
        }
    }

    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    pub fn set_pitch(&mut self, pitch: u32) {
        let pitch = PITCH_RANGE.clamp(i64::from(pitch));
        if pitch != self.pitch {
            self.pitch = pitch;
            tracing::info!(pitch, "lattice pitch");
        }
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn frame_counter(&self) -> u64 {
        self.counter
    }

    pub fn opacity(&self) -> SeeSawOpacity {
        self.opacity
    }

    pub fn gradients(&self) -> &GradientLibrary {
        &self.gradients
    }

    /// Scaled clock for the current frame counter.
    pub fn clock(&self) -> u64 {
        self.counter.saturating_mul(u64::from(self.speed))
    }

    /// Masks computed for the most recent frame.
    pub fn last_masks(&self) -> &AnimatedMasks {
        &self.masks
    }
}

impl Effect for KiAlt {
    fn name(&self) -> &'static str {
        "KiAlt"
    }

    fn description(&self) -> &'static str {
        "Animated lattice - s toggle, r reset, up/down pitch, left/right gradient, +/- speed, [/] opacity"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn process(&mut self, frame: &mut RgbFrame, _audio: &AudioSnapshot) -> Result<(), FrameError> {
        if !self.active {
            return Ok(());
        }
        frame.validate()?;

        self.counter += 1;
        let clock = self.clock();
        let t = clock % u64::from(self.pitch);
        self.masker.render_into(
            frame.width,
            frame.height,
            t,
            self.pitch,
            clock,
            &mut self.masks,
        );

        match self.gradients.lut() {
            Some(lut) => blend_gradient(frame, &self.masks.invert, lut, self.opacity.weights()),
            None => invert_masked(frame, &self.masks.invert),
        }
    }

    fn control(&mut self, op: ControlOp) -> bool {
        match op {
            ControlOp::Toggle => {
                self.active = !self.active;
                tracing::info!(active = self.active, "KiAlt toggled");
            }
            ControlOp::ResetClock => {
                self.counter = 0;
                tracing::info!("frame counter reset");
            }
            ControlOp::PitchUp => self.set_pitch(PITCH_RANGE.up(self.pitch)),
            ControlOp::PitchDown => self.set_pitch(PITCH_RANGE.down(self.pitch)),
            ControlOp::SpeedUp => self.speed = self.speed.saturating_add(1),
            ControlOp::SpeedDown => self.speed = self.speed.saturating_sub(1).max(1),
            ControlOp::NextGradient => self.gradients.next(),
            ControlOp::PrevGradient => self.gradients.prev(),
            ControlOp::OpacityUp => self.opacity.increment(),
            ControlOp::OpacityDown => self.opacity.decrement(),
            ControlOp::ToggleSync => return false,
        }
        if matches!(op, ControlOp::OpacityUp | ControlOp::OpacityDown) {
            tracing::debug!(
                opacity = self.opacity.value(),
                masked = self.opacity.masked_percent(),
                unmasked = self.opacity.unmasked_percent(),
                "gradient opacity"
            );
        }
        true
    }

    fn status(&self) -> String {
        format!(
            "KiAlt {} | pitch {} | speed x{} | frame {} | gradient {} | opacity {}% (I={}%, O={}%)",
            if self.active { "on" } else { "off" },
            self.pitch,
            self.speed,
            self.counter,
            self.gradients.current_name(),
            self.opacity.value(),
            self.opacity.masked_percent(),
            self.opacity.unmasked_percent(),
        )
    }

    fn reset(&mut self) {
        self.active = true;
        self.counter = 0;
        self.pitch = DEFAULT_PITCH;
        self.speed = 1;
        self.opacity = SeeSawOpacity::new(DEFAULT_OPACITY);
        self.masker.invalidate();
        self.masks = AnimatedMasks::new(0, 0);
        self.gradients.select(0);
    }
}
