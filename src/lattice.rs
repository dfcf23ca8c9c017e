//! Tessellation lattice for the Ki mask family.
//!
//! For an odd pitch `p` the half pitch is `q = (p - 1) / 2`. Corner centres
//! sit at `(2iq, 2jq)` and cell centres at `((2i+1)q, (2j+1)q)`. Every pixel
//! belongs to the region of its nearest centre under the L1 metric.

/// Which family a lattice centre belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CenterKind {
    /// Type 1: both coordinates are multiples of `2q`.
    Corner,
    /// Type 2: both coordinates are odd multiples of `q`.
    CellCenter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LatticeCenter {
    pub x: i64,
    pub y: i64,
    pub kind: CenterKind,
}

impl LatticeCenter {
    pub fn distance_to(&self, x: i64, y: i64) -> i64 {
        manhattan(x, y, self.x, self.y)
    }
}

/// Result of the exhaustive nearest-centre search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nearest {
    Unique(LatticeCenter),
    /// Two or more centres tie for the minimum distance.
    Ambiguous,
}

/// Result of the five-candidate search inside one `2q x 2q` cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellNearest {
    pub distance: i64,
    /// The cell centre achieved the minimum (ties with a corner included).
    pub cell_center_wins: bool,
}

#[inline(always)]
pub fn manhattan(ax: i64, ay: i64, bx: i64, by: i64) -> i64 {
    (ax - bx).abs() + (ay - by).abs()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lattice {
    pitch: u32,
    half: i64,
}

impl Lattice {
    /// `None` when the pitch leaves no room for a lattice (`q <= 0`).
    pub fn new(pitch: u32) -> Option<Self> {
        let half = (i64::from(pitch) - 1) / 2;
        (half > 0).then_some(Self { pitch, half })
    }

    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    pub fn half_pitch(&self) -> i64 {
        self.half
    }

    /// Side of one cell, `2q`.
    pub fn span(&self) -> i64 {
        2 * self.half
    }

    pub fn classify(&self, x: i64, y: i64) -> Option<CenterKind> {
        let q = self.half;
        if x.rem_euclid(q) != 0 || y.rem_euclid(q) != 0 {
            return None;
        }
        let odd_x = x.div_euclid(q).rem_euclid(2) == 1;
        let odd_y = y.div_euclid(q).rem_euclid(2) == 1;
        match (odd_x, odd_y) {
            (false, false) => Some(CenterKind::Corner),
            (true, true) => Some(CenterKind::CellCenter),
            _ => None,
        }
    }

    /// Every centre that can be nearest to a pixel of a `width x height`
    /// frame, with one cell of margin on each side.
    pub fn centers_covering(&self, width: usize, height: usize) -> Vec<LatticeCenter> {
        let q = self.half;
        let span = self.span();
        let max_gx = width as i64 / span + 2;
        let max_gy = height as i64 / span + 2;
        let per_kind = ((max_gx + 2) * (max_gy + 2)) as usize;
        let mut out = Vec::with_capacity(per_kind * 2);

        for gy in -1..=max_gy {
            for gx in -1..=max_gx {
                out.push(LatticeCenter {
                    x: gx * span,
                    y: gy * span,
                    kind: CenterKind::Corner,
                });
            }
        }
        for gy in -1..=max_gy {
            for gx in -1..=max_gx {
                out.push(LatticeCenter {
                    x: (2 * gx + 1) * q,
                    y: (2 * gy + 1) * q,
                    kind: CenterKind::CellCenter,
                });
            }
        }
        out
    }

    /// Brute-force nearest centre over a precomputed candidate set.
    pub fn nearest_among(centers: &[LatticeCenter], x: i64, y: i64) -> Nearest {
        let mut best: Option<LatticeCenter> = None;
        let mut best_d = i64::MAX;
        let mut tied = false;
        for c in centers {
            let d = c.distance_to(x, y);
            if d < best_d {
                best_d = d;
                best = Some(*c);
                tied = false;
            } else if d == best_d {
                tied = true;
            }
        }
        match best {
            Some(c) if !tied => Nearest::Unique(c),
            _ => Nearest::Ambiguous,
        }
    }

    /// Exhaustive search; reference form used to cross-check the closed form.
    pub fn nearest_exhaustive(&self, x: i64, y: i64, width: usize, height: usize) -> Nearest {
        Self::nearest_among(&self.centers_covering(width, height), x, y)
    }

    /// Closed form: the nearest centre of any point inside a cell is one of
    /// the cell's four corners or its centre.
    pub fn nearest_in_cell(&self, x: i64, y: i64) -> CellNearest {
        let (corner_x, center_x) = self.axis_terms(x);
        let (corner_y, center_y) = self.axis_terms(y);
        let corner = corner_x + corner_y;
        let center = center_x + center_y;
        CellNearest {
            distance: corner.min(center),
            cell_center_wins: center <= corner,
        }
    }

    /// Per-axis distances for coordinate `v`: to the nearer cell edge and to
    /// the cell middle. L1 separates by axis, so the nearest of the four
    /// corners is the sum of the per-axis edge distances.
    #[inline(always)]
    pub fn axis_terms(&self, v: i64) -> (i64, i64) {
        let span = self.span();
        let cell = v.div_euclid(span);
        let lo = v - cell * span;
        let hi = span - lo;
        let mid = (v - (2 * cell + 1) * self.half).abs();
        (lo.min(hi), mid)
    }
}
