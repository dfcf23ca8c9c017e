//! Per-pixel invert masks for the Ki effects.
//!
//! Three generators share [`InvertMask`]:
//! - [`static_mask`]: exhaustive lattice search, one centre per pixel. Slow
//!   (O(centres x pixels)); kept as the reference for small frames.
//! - [`AnimatedMasker`]: closed-form five-candidate search with per-axis
//!   tables, threshold animation and a parity flip every `pitch` frames.
//! - [`diamond_mask`]: row formula of the classic diamond grid.

use crate::lattice::{CenterKind, Lattice, Nearest};

/// Boolean field congruent to a frame; `true` marks an "I" (transformed) pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvertMask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl InvertMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, v: bool) {
        self.bits[y * self.width + x] = v;
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    pub fn count_set(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    pub fn is_all(&self, v: bool) -> bool {
        self.bits.iter().all(|b| *b == v)
    }

    pub fn invert_all(&mut self) {
        for b in &mut self.bits {
            *b = !*b;
        }
    }

    /// Reshape and clear without giving back the allocation.
    pub fn reset(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.bits.clear();
        self.bits.resize(width * height, false);
    }

    /// Rows of `I`/`O` characters, top to bottom.
    pub fn to_rows(&self) -> Vec<String> {
        if self.width == 0 {
            return vec![String::new(); self.height];
        }
        self.bits
            .chunks_exact(self.width)
            .map(|row| row.iter().map(|b| if *b { 'I' } else { 'O' }).collect())
            .collect()
    }

    pub fn to_ascii(&self) -> String {
        self.to_rows().join("\n")
    }
}

/// Single-pixel decision of the static variant.
///
/// Ties between centres keep the pixel original; a pitch without a lattice
/// never inverts.
pub fn evaluate_static(x: i64, y: i64, t: u64, pitch: u32, width: usize, height: usize) -> bool {
    let Some(lattice) = Lattice::new(pitch) else {
        return false;
    };
    let centers = lattice.centers_covering(width, height);
    decide_static(Lattice::nearest_among(&centers, x, y), x, y, t)
}

fn decide_static(nearest: Nearest, x: i64, y: i64, t: u64) -> bool {
    let Nearest::Unique(center) = nearest else {
        return false;
    };
    let threshold = (t / 2) as i64;
    let invert = center.distance_to(x, y) <= threshold;
    match center.kind {
        CenterKind::Corner => invert,
        CenterKind::CellCenter => !invert,
    }
}

/// Full-frame static mask; the candidate set is built once per call.
pub fn static_mask(width: usize, height: usize, t: u64, pitch: u32) -> InvertMask {
    let mut mask = InvertMask::new(width, height);
    let Some(lattice) = Lattice::new(pitch) else {
        return mask;
    };
    let centers = lattice.centers_covering(width, height);
    for y in 0..height {
        for x in 0..width {
            let (xi, yi) = (x as i64, y as i64);
            let v = decide_static(Lattice::nearest_among(&centers, xi, yi), xi, yi, t);
            mask.set(x, y, v);
        }
    }
    mask
}

/// Output of one animated evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimatedMasks {
    pub invert: InvertMask,
    /// Pixels whose nearest centre is the cell centre (Type 2).
    pub cell_center: InvertMask,
}

impl AnimatedMasks {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            invert: InvertMask::new(width, height),
            cell_center: InvertMask::new(width, height),
        }
    }
}

/// Threshold used by the animated variant for clock `t`.
pub fn animated_threshold(t: u64, pitch: u32) -> i64 {
    ((t % u64::from(pitch.max(1))) / 2) as i64
}

/// Whether the global polarity is flipped for this frame counter.
pub fn parity_flipped(frame_counter: u64, pitch: u32) -> bool {
    (frame_counter / u64::from(pitch.max(1))) % 2 == 1
}

/// Closed-form animated mask generator.
///
/// Holds per-column and per-row distance tables keyed by frame size and
/// pitch, so a frame costs two additions, two compares and a select per pixel.
#[derive(Debug, Default)]
pub struct AnimatedMasker {
    key: Option<(usize, usize, u32)>,
    cols: Vec<(i64, i64)>,
    rows: Vec<(i64, i64)>,
}

impl AnimatedMasker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame size and pitch the cached tables were built for.
    pub fn cached_key(&self) -> Option<(usize, usize, u32)> {
        self.key
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }

    fn ensure_tables(&mut self, lattice: &Lattice, width: usize, height: usize) {
        let key = (width, height, lattice.pitch());
        if self.key == Some(key) {
            return;
        }
        self.cols.clear();
        self.cols.extend((0..width).map(|x| lattice.axis_terms(x as i64)));
        self.rows.clear();
        self.rows.extend((0..height).map(|y| lattice.axis_terms(y as i64)));
        self.key = Some(key);
        tracing::debug!(width, height, pitch = lattice.pitch(), "rebuilt lattice tables");
    }

    /// Evaluate a whole frame into `out`, reusing its buffers.
    pub fn render_into(
        &mut self,
        width: usize,
        height: usize,
        t: u64,
        pitch: u32,
        frame_counter: u64,
        out: &mut AnimatedMasks,
    ) {
        out.invert.reset(width, height);
        out.cell_center.reset(width, height);
        let Some(lattice) = Lattice::new(pitch) else {
            self.invalidate();
            return;
        };
        self.ensure_tables(&lattice, width, height);

        let threshold = animated_threshold(t, pitch);
        let flip = parity_flipped(frame_counter, pitch);
        if width == 0 {
            return;
        }

        let rows = self.rows.iter();
        let inv_rows = out.invert.bits.chunks_exact_mut(width);
        let c2_rows = out.cell_center.bits.chunks_exact_mut(width);
        for ((&(edge_y, mid_y), inv_row), c2_row) in rows.zip(inv_rows).zip(c2_rows) {
            for ((&(edge_x, mid_x), inv), c2) in
                self.cols.iter().zip(inv_row.iter_mut()).zip(c2_row.iter_mut())
            {
                let corner = edge_x + edge_y;
                let center = mid_x + mid_y;
                let center_wins = center <= corner;
                let dist = if center_wins { center } else { corner };
                let base = dist <= threshold;
                *inv = (base != center_wins) != flip;
                *c2 = center_wins;
            }
        }
    }

    pub fn render(
        &mut self,
        width: usize,
        height: usize,
        t: u64,
        pitch: u32,
        frame_counter: u64,
    ) -> AnimatedMasks {
        let mut out = AnimatedMasks::new(width, height);
        self.render_into(width, height, t, pitch, frame_counter, &mut out);
        out
    }
}

/// One-shot animated evaluation.
pub fn evaluate_frame(
    width: usize,
    height: usize,
    t: u64,
    pitch: u32,
    frame_counter: u64,
) -> AnimatedMasks {
    AnimatedMasker::new().render(width, height, t, pitch, frame_counter)
}

/// Classic diamond-grid decision for diamond width `n`.
pub fn diamond_invert(x: i64, y: i64, n: u32) -> bool {
    if n == 0 {
        return false;
    }
    let n = i64::from(n);
    let cycle = n + 1;
    let mut row = y.rem_euclid(cycle);
    if row > n / 2 {
        row = n - 1 - row;
    }
    let zeros = n - 2 * row;
    let adjusted = (x - row).rem_euclid(cycle);
    adjusted >= zeros
}

pub fn diamond_mask(width: usize, height: usize, n: u32) -> InvertMask {
    let mut mask = InvertMask::new(width, height);
    if n == 0 {
        return mask;
    }
    for y in 0..height {
        for x in 0..width {
            mask.set(x, y, diamond_invert(x as i64, y as i64, n));
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_rows_match_bits() {
        let mut m = InvertMask::new(3, 2);
        m.set(1, 0, true);
        m.set(2, 1, true);
        assert_eq!(m.to_rows(), vec!["OIO".to_string(), "OOI".to_string()]);
        assert_eq!(m.count_set(), 2);
    }

    #[test]
    fn masker_caches_tables_per_size_and_pitch() {
        let mut masker = AnimatedMasker::new();
        let _ = masker.render(8, 6, 0, 9, 0);
        assert_eq!(masker.cached_key(), Some((8, 6, 9)));
        let _ = masker.render(10, 6, 0, 9, 0);
        assert_eq!(masker.cached_key(), Some((10, 6, 9)));
        let _ = masker.render(10, 6, 0, 1, 0);
        assert_eq!(masker.cached_key(), None);
    }

    #[test]
    fn threshold_and_parity_follow_pitch() {
        assert_eq!(animated_threshold(0, 15), 0);
        assert_eq!(animated_threshold(14, 15), 7);
        assert_eq!(animated_threshold(15, 15), 0);
        assert!(!parity_flipped(14, 15));
        assert!(parity_flipped(15, 15));
        assert!(!parity_flipped(30, 15));
    }

    #[test]
    fn diamond_zero_width_is_empty() {
        assert!(diamond_mask(5, 5, 0).is_all(false));
    }
}
