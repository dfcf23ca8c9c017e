//! Synthetic frame sources used in place of a camera.

use crate::frame::{CHANNELS, RgbFrame};
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PatternKind {
    /// Scrolling hue bars with a luminance ramp.
    Bars,
    /// Smooth interference field.
    Plasma,
    /// Slow gradient with film grain.
    Grain,
}

pub trait FrameSource {
    fn name(&self) -> &'static str;
    /// Fill `out` (already sized by the caller) with the next frame.
    fn next_frame(&mut self, out: &mut RgbFrame);
}

pub struct TestPattern {
    kind: PatternKind,
    frame_index: u64,
    rng: fastrand::Rng,
}

impl TestPattern {
    pub fn new(kind: PatternKind, seed: u64) -> Self {
        Self {
            kind,
            frame_index: 0,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }
}

impl FrameSource for TestPattern {
    fn name(&self) -> &'static str {
        match self.kind {
            PatternKind::Bars => "bars",
            PatternKind::Plasma => "plasma",
            PatternKind::Grain => "grain",
        }
    }

    fn next_frame(&mut self, out: &mut RgbFrame) {
        let (w, h) = out.size();
        if w == 0 || h == 0 {
            self.frame_index += 1;
            return;
        }
        let phase = self.frame_index as f32 / 60.0;
        let row_len = w * CHANNELS;
        for (y, row) in out.pixels.chunks_exact_mut(row_len).enumerate() {
            let v = y as f32 / h as f32;
            for (x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
                let u = x as f32 / w as f32;
                let rgb = match self.kind {
                    PatternKind::Bars => {
                        let hue = (u + phase * 0.1).fract();
                        let lum = 0.25 + 0.75 * (1.0 - v);
                        scale(hue_rgb(hue), lum)
                    }
                    PatternKind::Plasma => {
                        let a = (u * 6.0 + phase).sin();
                        let b = (v * 5.0 - phase * 0.7).cos();
                        let c = ((u + v) * 4.0 + phase * 1.3).sin();
                        let s = (a + b + c) / 6.0 + 0.5;
                        scale(hue_rgb(s), 0.4 + 0.6 * s)
                    }
                    PatternKind::Grain => {
                        let base = 0.5 + 0.5 * ((u + v) * 0.5 + phase * 0.05).sin();
                        let n = self.rng.f32() * 0.2 - 0.1;
                        let l = (base + n).clamp(0.0, 1.0);
                        [l, l * 0.9, l * 0.8]
                    }
                };
                for (dst, c) in px.iter_mut().zip(rgb) {
                    *dst = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
                }
            }
        }
        self.frame_index += 1;
    }
}

fn scale(rgb: [f32; 3], k: f32) -> [f32; 3] {
    [rgb[0] * k, rgb[1] * k, rgb[2] * k]
}

fn hue_rgb(h: f32) -> [f32; 3] {
    let f = |offset: f32| 0.5 + 0.5 * (TAU * (h + offset)).cos();
    [f(0.0), f(2.0 / 3.0), f(1.0 / 3.0)]
}
