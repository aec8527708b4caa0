use crate::config::Params;
use crate::grid::{Grid, Pos};
use crate::problem::Problem;
use crate::reach::{self, Expansion, ReachMap};
use crate::wave;

/// All dense buffers for one problem.
///
/// Wave generations live in three named slots and reachability in two.
/// Rotation swaps the slots (vector headers only), so the oldest buffer
/// becomes the next output without copying or reallocating.
#[derive(Debug)]
pub struct GridState {
    pub terrain: Grid<f32>,
    pub second_last: Grid<f32>,
    pub last: Grid<f32>,
    pub current: Grid<f32>,
    pub previous_reach: ReachMap,
    pub current_reach: ReachMap,
    pub origin: Pos,
    pub target: Pos,
}

impl GridState {
    /// Load a validated problem. Generations 0 and 1 both start from the
    /// problem's initial wave field (calm when absent), clamped to [0,1]
    /// with land and border forced to 0.
    pub fn new(problem: &Problem, params: &Params) -> Self {
        let n = problem.terrain.w;
        let terrain = problem.terrain.clone();

        let mut initial = match &problem.initial_waves {
            Some(waves) => waves.clone(),
            None => Grid::new(n, n),
        };
        for y in 0..n {
            for x in 0..n {
                let v = if initial.is_border(x, y) || terrain.get(x, y) >= params.land_threshold {
                    0.0
                } else {
                    initial.get(x, y).clamp(0.0, 1.0)
                };
                initial.set(x, y, v);
            }
        }

        Self {
            terrain,
            second_last: initial.clone(),
            last: initial,
            current: Grid::new(n, n),
            previous_reach: ReachMap::new(n, n),
            current_reach: ReachMap::new(n, n),
            origin: problem.origin,
            target: problem.target,
        }
    }

    pub fn size(&self) -> usize {
        self.terrain.w
    }

    /// Compute `current` from `last` and `second_last`.
    pub fn advance_waves(&mut self, params: &Params) {
        wave::advance(&self.second_last, &self.last, &self.terrain, &mut self.current, params);
    }

    /// Compute `current_reach` from `previous_reach` and the `current` waves.
    pub fn expand_reach(&mut self, params: &Params) -> Expansion {
        reach::expand(
            &self.previous_reach,
            &self.terrain,
            &self.current,
            self.origin,
            self.target,
            &mut self.current_reach,
            params,
        )
    }

    /// second_last <- last <- current, old second_last becomes the output.
    pub fn rotate_waves(&mut self) {
        std::mem::swap(&mut self.second_last, &mut self.last);
        std::mem::swap(&mut self.last, &mut self.current);
    }

    pub fn rotate_reach(&mut self) {
        std::mem::swap(&mut self.previous_reach, &mut self.current_reach);
    }
}
