use ki_player::lattice::{CenterKind, Lattice, Nearest};
use proptest::prelude::*;

fn odd_pitch() -> impl Strategy<Value = u32> {
    (1u32..=30).prop_map(|k| 2 * k + 1)
}

#[test]
fn span_is_twice_half_pitch() {
    let l = Lattice::new(15).expect("pitch 15");
    assert_eq!(l.half_pitch(), 7);
    assert_eq!(l.span(), 14);
    assert_eq!(l.pitch(), 15);
}

#[test]
fn covering_centers_reach_past_the_frame() {
    let l = Lattice::new(9).expect("pitch 9");
    let centers = l.centers_covering(10, 10);
    assert!(centers.iter().any(|c| c.x < 0 && c.y < 0));
    assert!(centers.iter().any(|c| c.x >= 10 && c.y >= 10));
    let corners = centers.iter().filter(|c| c.kind == CenterKind::Corner).count();
    assert_eq!(corners * 2, centers.len());
}

#[test]
fn cell_search_agrees_with_exhaustive_on_40x40() {
    let (w, h) = (40usize, 40usize);
    let l = Lattice::new(15).expect("pitch 15");
    let mut unique = 0usize;
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            if let Nearest::Unique(c) = l.nearest_exhaustive(x, y, w, h) {
                unique += 1;
                let cell = l.nearest_in_cell(x, y);
                assert_eq!(cell.distance, c.distance_to(x, y), "distance at ({x},{y})");
                assert_eq!(
                    cell.cell_center_wins,
                    c.kind == CenterKind::CellCenter,
                    "kind at ({x},{y})"
                );
            }
        }
    }
    assert!(unique > w * h / 2);
}

proptest! {
    #[test]
    fn cell_search_matches_exhaustive(pitch in odd_pitch(), x in 0i64..120, y in 0i64..120) {
        let l = Lattice::new(pitch).expect("odd pitch >= 3");
        let cell = l.nearest_in_cell(x, y);
        match l.nearest_exhaustive(x, y, 120, 120) {
            Nearest::Unique(c) => {
                prop_assert_eq!(cell.distance, c.distance_to(x, y));
                prop_assert_eq!(cell.cell_center_wins, c.kind == CenterKind::CellCenter);
            }
            // A tie still shares the minimum distance.
            Nearest::Ambiguous => {
                let best = l
                    .centers_covering(120, 120)
                    .iter()
                    .map(|c| c.distance_to(x, y))
                    .min()
                    .expect("non-empty lattice");
                prop_assert_eq!(cell.distance, best);
            }
        }
    }

    #[test]
    fn axis_terms_stay_within_a_cell(pitch in odd_pitch(), v in -500i64..500) {
        let l = Lattice::new(pitch).expect("odd pitch >= 3");
        let (edge, mid) = l.axis_terms(v);
        prop_assert!(edge >= 0 && edge <= l.half_pitch());
        prop_assert!(mid >= 0 && mid <= l.half_pitch());
        prop_assert_eq!(edge + mid, l.half_pitch());
    }
}
