use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::Params;
use crate::error::SolveError;
use crate::grid::Pos;
use crate::problem::Problem;
use crate::render::Frame;
use crate::state::GridState;
use crate::trace::PathTracer;

/// First step that is simulated. Generations 0 and 1 are the initial field.
pub const FIRST_STEP: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Advancing,
    Solved,
    Exhausted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Solved | Phase::Exhausted)
    }
}

/// Final answer for one problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Minimum number of steps to the target, `None` if the budget ran out.
    pub path_length: Option<usize>,
    /// Last step that was simulated (1 if none was).
    pub steps: usize,
    pub path: Option<Vec<Pos>>,
}

impl Outcome {
    /// Wire form of the result: the path length, or -1 if unreachable.
    pub fn result_code(&self) -> i64 {
        self.path_length.map_or(-1, |n| n as i64)
    }
}

/// Accumulated wall time per kernel.
#[derive(Clone, Copy, Debug, Default)]
pub struct KernelTimes {
    pub waves: Duration,
    pub search: Duration,
    pub trace: Duration,
}

/// Drives waves, then reachability, then rotation, one step at a time.
#[derive(Debug)]
pub struct Simulation {
    pub state: GridState,
    params: Params,
    phase: Phase,
    step: usize,
    path_length: Option<usize>,
    tracer: Option<PathTracer>,
    times: KernelTimes,
}

impl Simulation {
    /// Validates configuration and problem before allocating any buffer.
    pub fn new(problem: &Problem, params: &Params, trace_path: bool) -> Result<Self, SolveError> {
        params.validate()?;
        if trace_path {
            params.validate_trace()?;
        }
        problem.validate(params)?;

        let state = GridState::new(problem, params);
        let n = state.size();
        Ok(Self {
            state,
            params: params.clone(),
            phase: Phase::Initializing,
            step: FIRST_STEP,
            path_length: None,
            tracer: trace_path.then(|| PathTracer::new(n, n)),
            times: KernelTimes::default(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The step the next call to `step` will simulate.
    pub fn next_step(&self) -> usize {
        self.step
    }

    pub fn times(&self) -> KernelTimes {
        self.times
    }

    /// Simulate one time step. No-op once a terminal phase is reached.
    ///
    /// After a step that does not finish the search, buffers are already
    /// rotated: `state.last` and `state.previous_reach` hold the step just
    /// computed.
    pub fn step(&mut self) -> Phase {
        if self.phase.is_terminal() {
            return self.phase;
        }
        if self.step >= self.params.time_steps {
            warn!(
                budget = self.params.time_steps,
                "step budget exhausted without reaching the target"
            );
            self.phase = Phase::Exhausted;
            return self.phase;
        }
        self.phase = Phase::Advancing;
        let t = self.step;

        let start = Instant::now();
        self.state.advance_waves(&self.params);
        self.times.waves += start.elapsed();

        let start = Instant::now();
        let expansion = self.state.expand_reach(&self.params);
        self.times.search += start.elapsed();
        debug!(step = t, reachable = expansion.marked, "expanded");

        if let Some(tracer) = &mut self.tracer {
            let start = Instant::now();
            tracer.record(&self.state.current_reach);
            self.times.trace += start.elapsed();
        }

        if expansion.target_reached {
            // Frame 0 is never searched and frame 1 is the start position.
            self.path_length = Some(t - 1);
            self.phase = Phase::Solved;
            return self.phase;
        }

        self.state.rotate_reach();
        self.state.rotate_waves();
        self.step += 1;
        self.phase
    }

    /// Step until solved or out of budget.
    pub fn run(&mut self) -> Outcome {
        while !self.step().is_terminal() {}
        self.outcome()
    }

    pub fn outcome(&self) -> Outcome {
        let path = match (&self.tracer, self.phase) {
            (Some(tracer), Phase::Solved) => tracer.backtrack(self.state.origin, self.state.target),
            _ => None,
        };
        // A solved step is not followed by the increment.
        let steps = if self.phase == Phase::Solved {
            self.step
        } else {
            self.step - 1
        };
        Outcome {
            path_length: self.path_length,
            steps,
            path,
        }
    }

    /// Backtracked route so far, if the target is reachable in the latest frame.
    pub fn partial_path(&self) -> Option<Vec<Pos>> {
        self.tracer
            .as_ref()
            .and_then(|t| t.backtrack(self.state.origin, self.state.target))
    }

    /// The most recently computed generation, for drawing.
    pub fn frame<'a>(&'a self, path: Option<&'a [Pos]>) -> Frame<'a> {
        // A solved step is not rotated, so its output is still in the "current" slots.
        let (wave, reach) = if self.phase == Phase::Solved {
            (&self.state.current, &self.state.current_reach)
        } else {
            (&self.state.last, &self.state.previous_reach)
        };
        Frame {
            terrain: &self.state.terrain,
            wave,
            reach,
            origin: self.state.origin,
            target: self.state.target,
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_GRID_SIZE;
    use crate::error::{ConfigError, ProblemError};
    use crate::grid::Grid;

    fn run_problem(problem: &Problem, params: &Params, trace_path: bool) -> (Outcome, KernelTimes) {
        let mut sim = Simulation::new(problem, params, trace_path).unwrap();
        let outcome = sim.run();
        (outcome, sim.times())
    }

    fn calm(n: usize, threshold: f32) -> Params {
        Params {
            grid_size: n,
            time_steps: 64,
            ship_threshold: threshold,
            ..Params::default()
        }
    }

    #[test]
    fn flat_calm_sea_takes_chebyshev_distance() {
        let p = calm(5, 1.0);
        let prob = Problem::open_sea(5, Pos::new(0, 0), Pos::new(2, 2));
        let mut sim = Simulation::new(&prob, &p, false).unwrap();
        assert_eq!(sim.phase(), Phase::Initializing);

        assert_eq!(sim.step(), Phase::Advancing);
        assert_eq!(sim.step(), Phase::Solved);
        let out = sim.outcome();
        assert_eq!(out.path_length, Some(2));
        assert_eq!(out.result_code(), 2);
        assert_eq!(out.steps, 3);

        // Terminal phases are sticky.
        assert_eq!(sim.step(), Phase::Solved);
    }

    #[test]
    fn farther_targets_scale_with_distance() {
        let p = calm(16, 1.0);
        for (target, d) in [(Pos::new(5, 1), 4), (Pos::new(12, 15), 12)] {
            let prob = Problem::open_sea(16, Pos::new(1, 3), target);
            let (out, _) = run_problem(&prob, &p, false);
            assert_eq!(out.path_length, Some(d));
            assert_eq!(d as i32, Pos::new(1, 3).chebyshev(target));
        }
    }

    #[test]
    fn walled_off_target_is_unreachable() {
        let p = calm(9, 1.0);
        let mut prob = Problem::open_sea(9, Pos::new(0, 0), Pos::new(5, 5));
        for y in 4..=6 {
            for x in 4..=6 {
                prob.terrain.set(x, y, p.land_threshold);
            }
        }
        let mut sim = Simulation::new(&prob, &p, true).unwrap();
        let out = sim.run();
        assert_eq!(sim.phase(), Phase::Exhausted);
        assert_eq!(out.result_code(), -1);
        assert_eq!(out.steps, p.time_steps - 1);
        assert!(out.path.is_none());
        assert!(!sim.state.previous_reach.get(5, 5));
    }

    #[test]
    fn budget_too_small_exhausts() {
        let p = Params { time_steps: 4, ..calm(12, 1.0) };
        let prob = Problem::open_sea(12, Pos::new(0, 0), Pos::new(11, 11));
        let (out, _) = run_problem(&prob, &p, false);
        assert_eq!(out.path_length, None);
        assert_eq!(out.steps, 3);
    }

    #[test]
    fn steps_reports_the_last_simulated_step() {
        let p = Params { time_steps: 5, ..calm(12, 1.0) };
        let prob = Problem::open_sea(12, Pos::new(0, 0), Pos::new(11, 11));
        let mut sim = Simulation::new(&prob, &p, false).unwrap();
        assert_eq!(sim.outcome().steps, 1);

        let mut simulated = Vec::new();
        loop {
            let t = sim.next_step();
            if sim.step() == Phase::Exhausted {
                break;
            }
            simulated.push(t);
        }
        assert_eq!(simulated, [2, 3, 4]);
        assert_eq!(sim.outcome().steps, 4);
    }

    #[test]
    fn malformed_input_is_rejected_before_allocating() {
        let p = calm(8, 1.0);
        let prob = Problem::open_sea(6, Pos::new(0, 0), Pos::new(3, 3));
        assert!(matches!(
            Simulation::new(&prob, &p, false),
            Err(SolveError::Problem(ProblemError::Dimensions { .. }))
        ));

        let prob = Problem::open_sea(8, Pos::new(0, 0), Pos::new(3, 3));
        let huge = Params { grid_size: MAX_GRID_SIZE + 1, ..p.clone() };
        assert!(matches!(
            Simulation::new(&prob, &huge, false),
            Err(SolveError::Config(ConfigError::GridTooLarge { .. }))
        ));
        assert!(Simulation::new(&prob, &p, true).is_ok());
    }

    #[test]
    fn traced_path_is_a_valid_route() {
        let p = calm(12, 1.0);
        let mut prob = Problem::open_sea(12, Pos::new(1, 1), Pos::new(10, 1));
        // A wall with a single gap forces a detour.
        for y in 0..11 {
            prob.terrain.set(6, y, 1.0);
        }
        let (out, _) = run_problem(&prob, &p, true);
        let path = out.path.expect("path");
        assert_eq!(path.first(), Some(&prob.origin));
        assert_eq!(path.last(), Some(&prob.target));
        for pair in path.windows(2) {
            assert!(pair[0].chebyshev(pair[1]) <= 1);
        }
        for cell in &path[1..] {
            assert!(prob.terrain.at(*cell) < p.land_threshold);
        }
        assert!(path.contains(&Pos::new(6, 11)));
        assert_eq!(out.path_length, Some(path.len() - 1));
    }

    #[test]
    fn rotation_never_reads_stale_generations() {
        let p = calm(10, 0.2);
        let mut waves = Grid::new(10, 10);
        waves.set(5, 5, 1.0);
        waves.set(4, 5, 0.6);
        let prob = Problem {
            initial_waves: Some(waves),
            ..Problem::open_sea(10, Pos::new(1, 1), Pos::new(8, 8))
        };
        let mut sim = Simulation::new(&prob, &p, false).unwrap();

        // Reference chain kept in freshly allocated buffers.
        let mut older = sim.state.second_last.clone();
        let mut newer = sim.state.last.clone();
        for _ in 0..4 {
            let mut expected = Grid::new(10, 10);
            crate::wave::advance(&older, &newer, &prob.terrain, &mut expected, &p);

            assert_eq!(sim.step(), Phase::Advancing);
            assert_eq!(sim.state.last, expected);
            assert_eq!(sim.state.second_last, newer);

            older = newer;
            newer = expected;
        }
    }

    #[test]
    fn origin_reseeded_when_frontier_is_lost() {
        let p = calm(10, 1.0);
        let prob = Problem::open_sea(10, Pos::new(4, 4), Pos::new(9, 9));
        let mut sim = Simulation::new(&prob, &p, false).unwrap();
        sim.step();
        sim.step();
        assert_eq!(sim.state.previous_reach.count(), 25);

        sim.state.previous_reach.clear();
        assert_eq!(sim.step(), Phase::Advancing);
        assert_eq!(sim.state.previous_reach.count(), 9);
        assert!(sim.state.previous_reach.get(3, 5));
    }
}
