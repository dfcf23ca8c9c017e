//! Combines a frame with a mask and/or gradient LUT.

use crate::frame::{CHANNELS, FrameError, RgbFrame};
use crate::gradient::GradientLut;
use crate::mask::InvertMask;

/// BT.601 luma in 14-bit fixed point, rounded.
#[inline(always)]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = 4899 * r as u32 + 9617 * g as u32 + 1868 * b as u32 + 8192;
    (y >> 14).min(255) as u8
}

#[inline(always)]
fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let v = (1.0 - t) * a as f32 + t * b as f32;
    v.round().clamp(0.0, 255.0) as u8
}

fn check_mask(frame: &RgbFrame, mask: &InvertMask) -> Result<(), FrameError> {
    frame.validate()?;
    if frame.size() != mask.size() {
        return Err(FrameError::SizeMismatch {
            expected: mask.size(),
            actual: frame.size(),
        });
    }
    Ok(())
}

/// Replace every channel `c` of masked pixels with `255 - c`.
pub fn invert_masked(frame: &mut RgbFrame, mask: &InvertMask) -> Result<(), FrameError> {
    check_mask(frame, mask)?;
    for (px, &on) in frame.pixels.chunks_exact_mut(CHANNELS).zip(mask.as_slice()) {
        if on {
            for c in px {
                *c = 255 - *c;
            }
        }
    }
    Ok(())
}

/// Blend weights for the two mask regions, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionOpacity {
    pub masked: f32,
    pub unmasked: f32,
}

/// Blend each pixel toward its gradient colour (keyed by luminance), using
/// the opacity of the region the mask places it in.
pub fn blend_gradient(
    frame: &mut RgbFrame,
    mask: &InvertMask,
    lut: &GradientLut,
    opacity: RegionOpacity,
) -> Result<(), FrameError> {
    check_mask(frame, mask)?;
    let masked = opacity.masked.clamp(0.0, 1.0);
    let unmasked = opacity.unmasked.clamp(0.0, 1.0);
    for (px, &on) in frame.pixels.chunks_exact_mut(CHANNELS).zip(mask.as_slice()) {
        let t = if on { masked } else { unmasked };
        if t <= 0.0 {
            continue;
        }
        let mapped = lut.get(luminance(px[0], px[1], px[2]));
        for (c, m) in px.iter_mut().zip(mapped) {
            *c = lerp_u8(*c, m, t);
        }
    }
    Ok(())
}

/// Recolour the whole frame through `lut` at `opacity` in `[0, 1]`.
pub fn apply_lut(frame: &mut RgbFrame, lut: &GradientLut, opacity: f32) -> Result<(), FrameError> {
    frame.validate()?;
    let t = opacity.clamp(0.0, 1.0);
    if t <= 0.0 {
        return Ok(());
    }
    for px in frame.pixels.chunks_exact_mut(CHANNELS) {
        let mapped = lut.get(luminance(px[0], px[1], px[2]));
        if t >= 1.0 {
            px.copy_from_slice(&mapped);
        } else {
            for (c, m) in px.iter_mut().zip(mapped) {
                *c = lerp_u8(*c, m, t);
            }
        }
    }
    Ok(())
}

/// `base = (1 - amount) * base + amount * processed`.
pub fn mix_into(base: &mut RgbFrame, processed: &RgbFrame, amount: f32) -> Result<(), FrameError> {
    base.validate()?;
    processed.validate()?;
    if base.size() != processed.size() {
        return Err(FrameError::SizeMismatch {
            expected: base.size(),
            actual: processed.size(),
        });
    }
    let t = amount.clamp(0.0, 1.0);
    for (b, p) in base.pixels.iter_mut().zip(&processed.pixels) {
        *b = lerp_u8(*b, *p, t);
    }
    Ok(())
}
