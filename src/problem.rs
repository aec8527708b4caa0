use rayon::prelude::*;

use crate::config::Params;
use crate::error::ProblemError;
use crate::grid::{Grid, Pos};
use crate::noise::fractal;
use crate::rng::{Rng, sub_seed};

const SALT_TERRAIN: u64 = 0x57AB_1E00_0000_0001;
const SALT_STORMS: u64 = 0x57AB_1E00_0000_0002;
const SALT_ENDPOINTS: u64 = 0x57AB_1E00_0000_0003;

/// Raising normalised noise to this power keeps most of the map at sea.
const SEA_BIAS: f32 = 1.6;

/// One problem instance. Immutable once built; the solver copies what it
/// needs into its own `GridState`.
#[derive(Clone, Debug)]
pub struct Problem {
    pub terrain: Grid<f32>,
    /// Wave field for generations 0 and 1. Calm sea when `None`.
    pub initial_waves: Option<Grid<f32>>,
    pub origin: Pos,
    pub target: Pos,
    pub seed: u64,
}

impl Problem {
    /// Calm sea, flat terrain. Mostly useful for tests and demos.
    pub fn open_sea(n: usize, origin: Pos, target: Pos) -> Self {
        Self {
            terrain: Grid::new(n, n),
            initial_waves: None,
            origin,
            target,
            seed: 0,
        }
    }

    pub fn validate(&self, params: &Params) -> Result<(), ProblemError> {
        let n = params.grid_size;
        check_dims("terrain", &self.terrain, n)?;
        check_finite("terrain", &self.terrain)?;
        if let Some(waves) = &self.initial_waves {
            check_dims("initial wave field", waves, n)?;
            check_finite("initial wave field", waves)?;
        }
        for (what, pos) in [("origin", self.origin), ("target", self.target)] {
            if !self.terrain.contains(pos) {
                return Err(ProblemError::OutOfBounds { what, pos, n });
            }
        }
        Ok(())
    }
}

fn check_dims(what: &'static str, g: &Grid<f32>, n: usize) -> Result<(), ProblemError> {
    if g.w != n || g.h != n || g.data.len() != n * n {
        return Err(ProblemError::Dimensions { what, w: g.w, h: g.h, n });
    }
    Ok(())
}

fn check_finite(what: &'static str, g: &Grid<f32>) -> Result<(), ProblemError> {
    match g.data.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ProblemError::NonFinite { what, x: i % g.w, y: i / g.w }),
        None => Ok(()),
    }
}

/// Generate a reproducible problem from a seed.
///
/// Terrain is fractal noise normalised to [0,1] and biased towards sea.
/// Storms are radial bumps of wave energy dropped on water. Origin and
/// target are water cells, kept at least a quarter of the map apart when
/// the map allows it.
pub fn generate(seed: u64, params: &Params) -> Problem {
    let n = params.grid_size;
    let terrain = generate_terrain(seed, n, params);
    let initial_waves = generate_storms(seed, &terrain, params);

    let water: Vec<usize> = (0..n * n)
        .filter(|&i| terrain.data[i] < params.land_threshold)
        .collect();

    let mut rng = Rng::new(seed ^ SALT_ENDPOINTS);
    let at = |i: usize| Pos::new((i % n) as i32, (i / n) as i32);
    let (origin, target) = if water.is_empty() {
        (Pos::new(0, 0), Pos::new(n as i32 - 1, n as i32 - 1))
    } else {
        let origin = at(water[rng.below(water.len())]);
        let min_dist = (n / 4) as i32;
        let mut target = at(water[rng.below(water.len())]);
        for _ in 0..256 {
            if target.chebyshev(origin) >= min_dist {
                break;
            }
            target = at(water[rng.below(water.len())]);
        }
        (origin, target)
    };

    Problem {
        terrain,
        initial_waves: Some(initial_waves),
        origin,
        target,
        seed,
    }
}

fn generate_terrain(seed: u64, n: usize, params: &Params) -> Grid<f32> {
    let noise_seed = sub_seed(seed, SALT_TERRAIN);
    let mut terrain = Grid::new(n, n);
    let scale = params.island_scale / n as f32;

    terrain.data.par_chunks_mut(n).enumerate().for_each(|(y, row)| {
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = fractal(x as f32 * scale, y as f32 * scale, noise_seed, 5);
        }
    });

    let (lo, hi) = terrain
        .data
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = (hi - lo).max(1e-6);
    terrain
        .data
        .par_iter_mut()
        .for_each(|v| *v = ((*v - lo) / span).powf(SEA_BIAS));
    terrain
}

fn generate_storms(seed: u64, terrain: &Grid<f32>, params: &Params) -> Grid<f32> {
    let n = terrain.w;
    let mut rng = Rng::new(seed ^ SALT_STORMS);
    let storms: Vec<(f32, f32, f32)> = (0..params.num_storms)
        .map(|_| {
            let cx = rng.next_f32() * n as f32;
            let cy = rng.next_f32() * n as f32;
            let peak = 0.5 + 0.5 * rng.next_f32();
            (cx, cy, peak)
        })
        .collect();
    let r = params.storm_radius.max(1.0);

    let mut waves = Grid::new(n, n);
    waves.data.par_chunks_mut(n).enumerate().for_each(|(y, row)| {
        for (x, cell) in row.iter_mut().enumerate() {
            if terrain.get(x, y) >= params.land_threshold {
                continue;
            }
            let mut v = 0.0f32;
            for &(cx, cy, peak) in &storms {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let d = (dx * dx + dy * dy).sqrt() / r;
                if d < 1.0 {
                    v += peak * (1.0 - d) * (1.0 - d);
                }
            }
            *cell = v.min(1.0);
        }
    });
    waves
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Params {
        Params {
            grid_size: 64,
            num_storms: 4,
            storm_radius: 6.0,
            ..Params::default()
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let p = params();
        let a = generate(11, &p);
        let b = generate(11, &p);
        assert_eq!(a.terrain, b.terrain);
        assert_eq!(a.initial_waves, b.initial_waves);
        assert_eq!((a.origin, a.target), (b.origin, b.target));
        assert_ne!(generate(12, &p).terrain, a.terrain);
    }

    #[test]
    fn generated_problem_is_valid() {
        let p = params();
        for seed in 0..8 {
            let prob = generate(seed, &p);
            prob.validate(&p).unwrap();
            assert!(prob.terrain.data.iter().all(|v| (0.0..=1.0).contains(v)));
            assert!(prob.terrain.at(prob.origin) < p.land_threshold);
            assert!(prob.terrain.at(prob.target) < p.land_threshold);
            let waves = prob.initial_waves.as_ref().unwrap();
            assert!(waves.data.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn rejects_malformed_input() {
        let p = Params { grid_size: 5, ..Params::default() };

        let prob = Problem::open_sea(5, Pos::new(0, 0), Pos::new(5, 2));
        assert!(matches!(
            prob.validate(&p),
            Err(ProblemError::OutOfBounds { what: "target", .. })
        ));

        let prob = Problem::open_sea(4, Pos::new(0, 0), Pos::new(1, 1));
        assert!(matches!(prob.validate(&p), Err(ProblemError::Dimensions { .. })));

        let mut prob = Problem::open_sea(5, Pos::new(-1, 0), Pos::new(1, 1));
        assert!(matches!(
            prob.validate(&p),
            Err(ProblemError::OutOfBounds { what: "origin", .. })
        ));
        prob.origin = Pos::new(0, 0);
        prob.terrain.set(3, 1, f32::NAN);
        assert!(matches!(
            prob.validate(&p),
            Err(ProblemError::NonFinite { x: 3, y: 1, .. })
        ));
    }
}
