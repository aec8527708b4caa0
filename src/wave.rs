use rayon::prelude::*;

use crate::config::Params;
use crate::grid::Grid;

/// Fraction of momentum kept at a cell. Close to 1 on open water,
/// smaller towards the shore.
#[inline]
pub fn energy_preserved(height: f32, params: &Params) -> f32 {
    (params.energy_preservation_factor * (params.land_threshold - 0.1 * height)).clamp(0.0, 1.0)
}

/// Advance the wave field by one generation.
///
/// Damped second-order wave equation on the 4-neighbour Laplacian:
/// `out = clamp(last + (velocity + acceleration) * energy_preserved, 0, 1)`
/// where velocity is `last - second_last` and acceleration is the Laplacian
/// of `last` scaled by the attack factor. Land is forced to 0.
///
/// Only interior cells are written; border cells of `out` keep whatever
/// they already hold (0 for every buffer owned by `GridState`).
pub fn advance(
    second_last: &Grid<f32>,
    last: &Grid<f32>,
    terrain: &Grid<f32>,
    out: &mut Grid<f32>,
    params: &Params,
) {
    let w = out.w;
    let h = out.h;
    debug_assert!(last.w == w && last.h == h);
    debug_assert!(second_last.w == w && second_last.h == h);
    debug_assert!(terrain.w == w && terrain.h == h);
    if w < 3 || h < 3 {
        return;
    }

    out.data.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        if y == 0 || y == h - 1 {
            return;
        }
        for x in 1..w - 1 {
            let height = terrain.get(x, y);
            if height >= params.land_threshold {
                row[x] = 0.0;
                continue;
            }

            let here = last.get(x, y);
            let acceleration = (last.get(x, y - 1)
                + last.get(x - 1, y)
                + last.get(x + 1, y)
                + last.get(x, y + 1)
                - 4.0 * here)
                * params.attack_factor;
            let velocity = here - second_last.get(x, y);

            row[x] = (here + (velocity + acceleration) * energy_preserved(height, params))
                .clamp(0.0, 1.0);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params() -> Params {
        Params {
            grid_size: 8,
            ..Params::default()
        }
    }

    #[test]
    fn calm_sea_stays_calm() {
        let p = params();
        let zero = Grid::<f32>::new(8, 8);
        let mut out = Grid::filled(8, 8, 0.0);
        advance(&zero, &zero, &zero, &mut out, &p);
        assert!(out.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn single_cell_matches_formula() {
        let p = params();
        let terrain = Grid::<f32>::filled(8, 8, 0.2);
        let mut last = Grid::<f32>::new(8, 8);
        let mut second_last = Grid::<f32>::new(8, 8);
        last.set(4, 4, 0.5);
        last.set(3, 4, 0.1);
        second_last.set(4, 4, 0.3);

        let mut out = Grid::new(8, 8);
        advance(&second_last, &last, &terrain, &mut out, &p);

        let acceleration = (0.0 + 0.1 + 0.0 + 0.0 - 4.0 * 0.5) * p.attack_factor;
        let velocity = 0.5 - 0.3;
        let e = (p.energy_preservation_factor * (p.land_threshold - 0.1 * 0.2)).clamp(0.0, 1.0);
        let expected = (0.5f32 + (velocity + acceleration) * e).clamp(0.0, 1.0);
        assert!((out.get(4, 4) - expected).abs() < 1e-6);
    }

    #[test]
    fn land_is_zeroed_and_border_untouched() {
        let p = params();
        let mut terrain = Grid::<f32>::new(8, 8);
        terrain.set(2, 2, 0.9);
        let last = Grid::<f32>::filled(8, 8, 0.7);
        let second_last = Grid::<f32>::filled(8, 8, 0.1);
        let mut out = Grid::filled(8, 8, 0.25);

        advance(&second_last, &last, &terrain, &mut out, &p);

        assert_eq!(out.get(2, 2), 0.0);
        for y in 0..8 {
            for x in 0..8 {
                if out.is_border(x, y) {
                    assert_eq!(out.get(x, y), 0.25);
                }
            }
        }
    }

    #[test]
    fn inputs_are_not_mutated() {
        let p = params();
        let terrain = Grid::<f32>::new(8, 8);
        let mut last = Grid::<f32>::new(8, 8);
        last.set(3, 3, 1.0);
        let second_last = last.clone();
        let (l0, s0) = (last.clone(), second_last.clone());
        let mut out = Grid::new(8, 8);
        advance(&second_last, &last, &terrain, &mut out, &p);
        assert_eq!(last, l0);
        assert_eq!(second_last, s0);
    }

    proptest! {
        #[test]
        fn prop_output_is_clamped(
            last in proptest::collection::vec(0.0f32..=1.0, 36),
            second_last in proptest::collection::vec(0.0f32..=1.0, 36),
            terrain in proptest::collection::vec(0.0f32..=1.0, 36),
        ) {
            let p = Params { grid_size: 6, ..Params::default() };
            let last = Grid { data: last, w: 6, h: 6 };
            let second_last = Grid { data: second_last, w: 6, h: 6 };
            let terrain = Grid { data: terrain, w: 6, h: 6 };
            let mut out = Grid::new(6, 6);
            advance(&second_last, &last, &terrain, &mut out, &p);
            for (i, &v) in out.data.iter().enumerate() {
                prop_assert!((0.0..=1.0).contains(&v));
                if terrain.data[i] >= p.land_threshold {
                    prop_assert_eq!(v, 0.0);
                }
            }
        }
    }
}
