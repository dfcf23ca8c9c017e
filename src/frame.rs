use std::fmt;

pub const CHANNELS: usize = 3;

/// Packed 8-bit RGB frame, row-major, `width * height * 3` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    DimensionsOverflow,
    BufferLengthMismatch { expected: usize, actual: usize },
    SizeMismatch { expected: (usize, usize), actual: (usize, usize) },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionsOverflow => write!(f, "frame dimensions overflowed usize"),
            Self::BufferLengthMismatch { expected, actual } => write!(
                f,
                "RGB buffer length mismatch: expected {expected} bytes, got {actual} bytes"
            ),
            Self::SizeMismatch { expected, actual } => write!(
                f,
                "frame size mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
        }
    }
}

impl std::error::Error for FrameError {}

impl RgbFrame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height * CHANNELS],
        }
    }

    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self, FrameError> {
        let frame = Self {
            width,
            height,
            pixels,
        };
        frame.validate()?;
        Ok(frame)
    }

    pub fn solid(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut frame = Self::new(width, height);
        for px in frame.pixels.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&rgb);
        }
        frame
    }

    pub fn expected_len(width: usize, height: usize) -> Result<usize, FrameError> {
        width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or(FrameError::DimensionsOverflow)
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        let expected = Self::expected_len(self.width, self.height)?;
        if self.pixels.len() != expected {
            return Err(FrameError::BufferLengthMismatch {
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * CHANNELS;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = (y * self.width + x) * CHANNELS;
        self.pixels[i..i + CHANNELS].copy_from_slice(&rgb);
    }

    /// Resize in place, keeping the allocation when possible. Contents are zeroed.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height * CHANNELS, 0);
    }

    /// Overwrite `self` with `other`, reusing the existing buffer.
    pub fn copy_from(&mut self, other: &RgbFrame) {
        self.width = other.width;
        self.height = other.height;
        self.pixels.clear();
        self.pixels.extend_from_slice(&other.pixels);
    }

    pub fn flip_horizontal(&mut self) {
        let row_len = self.width * CHANNELS;
        if row_len == 0 {
            return;
        }
        for row in self.pixels.chunks_exact_mut(row_len) {
            let mut l = 0usize;
            let mut r = self.width.saturating_sub(1);
            while l < r {
                for c in 0..CHANNELS {
                    row.swap(l * CHANNELS + c, r * CHANNELS + c);
                }
                l += 1;
                r -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_short_buffer() {
        let frame = RgbFrame {
            width: 4,
            height: 2,
            pixels: vec![0; 10],
        };
        assert_eq!(
            frame.validate(),
            Err(FrameError::BufferLengthMismatch {
                expected: 24,
                actual: 10
            })
        );
    }

    #[test]
    fn flip_mirrors_each_row() {
        let mut frame = RgbFrame::new(3, 2);
        frame.set_pixel(0, 0, [1, 2, 3]);
        frame.set_pixel(2, 1, [9, 8, 7]);
        frame.flip_horizontal();
        assert_eq!(frame.pixel(2, 0), [1, 2, 3]);
        assert_eq!(frame.pixel(0, 1), [9, 8, 7]);
        assert_eq!(frame.pixel(1, 0), [0, 0, 0]);
    }
}
