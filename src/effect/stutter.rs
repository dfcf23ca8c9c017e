use crate::audio::AudioSnapshot;
use crate::effect::{ControlOp, Effect, StepRange};
use crate::frame::{FrameError, RgbFrame};
use std::collections::VecDeque;

pub const DEFAULT_FRAMES: u32 = 3;
pub const FRAMES_RANGE: StepRange = StepRange {
    min: 1,
    max: 9,
    step: 1,
};
/// Frames between two consecutive echoes.
pub const FRAME_GAP: usize = 4;
pub const DEFAULT_DECAY: u32 = 50;
pub const DECAY_RANGE: StepRange = StepRange {
    min: 0,
    max: 90,
    step: 5,
};

/// Motion trail: the current frame blended with `frames - 1` earlier frames,
/// spaced [`FRAME_GAP`] apart. Echo `i` is laid over the running result at
/// opacity `(decay / 100)^i`.
#[derive(Debug)]
pub struct Stutter {
    active: bool,
    frames: u32,
    decay: u32,
    history: VecDeque<RgbFrame>,
    accum: Vec<f32>,
}

impl Stutter {
    pub fn new() -> Self {
        Self {
            active: true,
            frames: DEFAULT_FRAMES,
            decay: DEFAULT_DECAY,
            history: VecDeque::new(),
            accum: Vec::new(),
        }
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn set_frames(&mut self, frames: u32) {
        let frames = FRAMES_RANGE.clamp(i64::from(frames));
        if frames != self.frames {
            self.frames = frames;
            self.trim_history();
            tracing::info!(frames, "stutter frames");
        }
    }

    /// Opacity ratio between successive echoes, in percent.
    pub fn decay(&self) -> u32 {
        self.decay
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn capacity(&self) -> usize {
        (self.frames as usize - 1) * FRAME_GAP + 1
    }

    fn trim_history(&mut self) {
        while self.history.len() > self.capacity() {
            self.history.pop_front();
        }
    }

    fn remember(&mut self, frame: &RgbFrame) {
        if self.history.front().is_some_and(|f| f.size() != frame.size()) {
            self.history.clear();
        }
        let mut slot = if self.history.len() >= self.capacity() {
            self.history.pop_front().unwrap_or_else(|| RgbFrame::new(0, 0))
        } else {
            RgbFrame::new(0, 0)
        };
        slot.copy_from(frame);
        self.history.push_back(slot);
        self.trim_history();
    }
}

impl Default for Stutter {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Stutter {
    fn name(&self) -> &'static str {
        "Stutter"
    }

    fn description(&self) -> &'static str {
        "Motion trail - s toggle, +/- frames, up/down echo opacity, r clear"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn process(&mut self, frame: &mut RgbFrame, _audio: &AudioSnapshot) -> Result<(), FrameError> {
        if !self.active {
            return Ok(());
        }
        frame.validate()?;
        self.remember(frame);

        let len = self.history.len();
        let ratio = self.decay as f32 / 100.0;
        let mut blended = false;
        for i in 1..self.frames as usize {
            let back = i * FRAME_GAP;
            if back >= len {
                break;
            }
            let alpha = ratio.powi(i as i32);
            if alpha <= 0.0 {
                continue;
            }
            if !blended {
                self.accum.clear();
                self.accum.extend(frame.pixels.iter().map(|&c| c as f32));
                blended = true;
            }
            let old = &self.history[len - 1 - back];
            for (acc, &o) in self.accum.iter_mut().zip(&old.pixels) {
                *acc = (1.0 - alpha) * *acc + alpha * o as f32;
            }
        }
        if blended {
            for (dst, &acc) in frame.pixels.iter_mut().zip(&self.accum) {
                *dst = acc.round().clamp(0.0, 255.0) as u8;
            }
        }
        Ok(())
    }

    fn control(&mut self, op: ControlOp) -> bool {
        match op {
            ControlOp::Toggle => {
                self.active = !self.active;
                tracing::info!(active = self.active, "Stutter toggled");
            }
            ControlOp::ResetClock => self.history.clear(),
            ControlOp::SpeedUp => self.set_frames(FRAMES_RANGE.up(self.frames)),
            ControlOp::SpeedDown => self.set_frames(FRAMES_RANGE.down(self.frames)),
            ControlOp::PitchUp | ControlOp::OpacityUp => self.decay = DECAY_RANGE.up(self.decay),
            ControlOp::PitchDown | ControlOp::OpacityDown => {
                self.decay = DECAY_RANGE.down(self.decay)
            }
            _ => return false,
        }
        true
    }

    fn status(&self) -> String {
        format!(
            "Stutter {} | frames {} | gap {} | echo {}%",
            if self.active { "on" } else { "off" },
            self.frames,
            FRAME_GAP,
            self.decay
        )
    }

    fn reset(&mut self) {
        self.active = true;
        self.frames = DEFAULT_FRAMES;
        self.decay = DEFAULT_DECAY;
        self.history.clear();
        self.accum.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_bounded_by_frame_count() {
        let mut fx = Stutter::new();
        let mut frame = RgbFrame::solid(2, 2, [0, 0, 0]);
        for _ in 0..20 {
            fx.process(&mut frame, &AudioSnapshot::default()).expect("process");
        }
        assert_eq!(fx.history_len(), 9);
        fx.set_frames(1);
        assert_eq!(fx.history_len(), 1);
    }

    #[test]
    fn size_change_drops_history() {
        let mut fx = Stutter::new();
        let mut a = RgbFrame::solid(2, 2, [9, 9, 9]);
        for _ in 0..6 {
            fx.process(&mut a, &AudioSnapshot::default()).expect("process");
        }
        let mut b = RgbFrame::solid(3, 2, [1, 1, 1]);
        fx.process(&mut b, &AudioSnapshot::default()).expect("process");
        assert_eq!(fx.history_len(), 1);
        assert_eq!(b.pixel(2, 1), [1, 1, 1]);
    }
}
