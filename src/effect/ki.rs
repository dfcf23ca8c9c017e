use crate::audio::AudioSnapshot;
use crate::compositor::invert_masked;
use crate::effect::{ControlOp, Effect, StepRange};
use crate::frame::{FrameError, RgbFrame};
use crate::mask::{InvertMask, diamond_mask};

pub const DEFAULT_WIDTH: u32 = 63;
pub const WIDTH_RANGE: StepRange = StepRange {
    min: 9,
    max: 189,
    step: 9,
};

/// Static diamond grid: inverts the pixels the row formula marks.
///
/// The mask does not change over time, so it is built once per frame size
/// and diamond width.
#[derive(Debug)]
pub struct Ki {
    active: bool,
    width: u32,
    mask: Option<InvertMask>,
}

impl Ki {
    pub fn new() -> Self {
        Self {
            active: true,
            width: DEFAULT_WIDTH,
            mask: None,
        }
    }

    pub fn diamond_width(&self) -> u32 {
        self.width
    }

    pub fn set_diamond_width(&mut self, width: u32) {
        let width = WIDTH_RANGE.clamp(i64::from(width));
        if width != self.width {
            self.width = width;
            self.mask = None;
            tracing::info!(width, "diamond width");
        }
    }

    /// Frame size the cached mask was built for.
    pub fn cached_size(&self) -> Option<(usize, usize)> {
        self.mask.as_ref().map(InvertMask::size)
    }
}

impl Default for Ki {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Ki {
    fn name(&self) -> &'static str {
        "Ki"
    }

    fn description(&self) -> &'static str {
        "Diamond grid inversion - s toggle, up/down size"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn process(&mut self, frame: &mut RgbFrame, _audio: &AudioSnapshot) -> Result<(), FrameError> {
        if !self.active {
            return Ok(());
        }
        frame.validate()?;
        let size = frame.size();
        if self.cached_size() != Some(size) {
            self.mask = Some(diamond_mask(size.0, size.1, self.width));
        }
        match &self.mask {
            Some(mask) => invert_masked(frame, mask),
            None => Ok(()),
        }
    }

    fn control(&mut self, op: ControlOp) -> bool {
        match op {
            ControlOp::Toggle => {
                self.active = !self.active;
                tracing::info!(active = self.active, "Ki toggled");
                true
            }
            ControlOp::PitchUp => {
                self.set_diamond_width(WIDTH_RANGE.up(self.width));
                true
            }
            ControlOp::PitchDown => {
                self.set_diamond_width(WIDTH_RANGE.down(self.width));
                true
            }
            _ => false,
        }
    }

    fn status(&self) -> String {
        format!(
            "Ki {} | width {}px",
            if self.active { "on" } else { "off" },
            self.width
        )
    }

    fn reset(&mut self) {
        self.active = true;
        self.width = DEFAULT_WIDTH;
        self.mask = None;
    }
}
