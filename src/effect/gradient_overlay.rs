use crate::audio::AudioSnapshot;
use crate::compositor::apply_lut;
use crate::effect::{ControlOp, Effect, StepRange};
use crate::frame::{FrameError, RgbFrame};
use crate::gradient::{GradientLibrary, GradientPreset};

pub const DEFAULT_OPACITY: u32 = 50;
pub const OPACITY_RANGE: StepRange = StepRange {
    min: 0,
    max: 100,
    step: 5,
};

/// Colour grading by luminance through the selected gradient.
#[derive(Debug)]
pub struct GradientOverlay {
    active: bool,
    opacity: u32,
    gradients: GradientLibrary,
}

impl GradientOverlay {
    pub fn new(presets: Vec<GradientPreset>) -> Self {
        Self {
            active: true,
            opacity: DEFAULT_OPACITY,
            gradients: GradientLibrary::new(presets),
        }
    }

    pub fn opacity(&self) -> u32 {
        self.opacity
    }

    pub fn gradients(&self) -> &GradientLibrary {
        &self.gradients
    }
}

impl Effect for GradientOverlay {
    fn name(&self) -> &'static str {
        "GradientOverlay"
    }

    fn description(&self) -> &'static str {
        "Gradient colour grading - s toggle, left/right gradient, up/down opacity"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn process(&mut self, frame: &mut RgbFrame, _audio: &AudioSnapshot) -> Result<(), FrameError> {
        if !self.active {
            return Ok(());
        }
        match self.gradients.lut() {
            Some(lut) => apply_lut(frame, lut, self.opacity as f32 / 100.0),
            None => Ok(()),
        }
    }

    fn control(&mut self, op: ControlOp) -> bool {
        match op {
            ControlOp::Toggle => self.active = !self.active,
            ControlOp::NextGradient => self.gradients.next(),
            ControlOp::PrevGradient => self.gradients.prev(),
            ControlOp::PitchUp | ControlOp::OpacityUp => {
                self.opacity = OPACITY_RANGE.up(self.opacity)
            }
            ControlOp::PitchDown | ControlOp::OpacityDown => {
                self.opacity = OPACITY_RANGE.down(self.opacity)
            }
            _ => return false,
        }
        true
    }

    fn status(&self) -> String {
        format!(
            "Gradient {} | {} | opacity {}%",
            if self.active { "on" } else { "off" },
            self.gradients.current_name(),
            self.opacity
        )
    }

    fn reset(&mut self) {
        self.active = true;
        self.opacity = DEFAULT_OPACITY;
        self.gradients.select(0);
    }
}
