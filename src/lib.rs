pub mod config;
pub mod error;
pub mod grid;
pub mod noise;
pub mod problem;
pub mod reach;
pub mod render;
pub mod rng;
pub mod sim;
pub mod state;
pub mod trace;
pub mod wave;

use std::time::{Duration, Instant};

use tracing::info;

use config::Params;
use error::SolveError;
use problem::Problem;
use sim::{Outcome, Simulation};

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Run `f` on a dedicated pool when `params.threads` is set,
/// otherwise on rayon's global pool.
pub fn with_pool<R, F>(params: &Params, f: F) -> Result<R, SolveError>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    if params.threads == 0 {
        return Ok(f());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(params.threads)
        .build()?;
    Ok(pool.install(f))
}

/// A finished run, with its buffers still around for rendering.
pub struct Solved {
    pub sim: Simulation,
    pub outcome: Outcome,
    pub timings: Vec<Timing>,
}

/// Solve one problem: earliest step at which the target becomes reachable.
///
/// Configuration and problem are validated before any buffer is touched.
pub fn solve(
    problem: &Problem,
    params: &Params,
    trace_path: bool,
) -> Result<(Outcome, Vec<Timing>), SolveError> {
    let solved = solve_full(problem, params, trace_path)?;
    Ok((solved.outcome, solved.timings))
}

pub fn solve_full(problem: &Problem, params: &Params, trace_path: bool) -> Result<Solved, SolveError> {
    let mut timings = Vec::new();
    let total_start = Instant::now();

    info!(
        seed = problem.seed,
        origin = ?problem.origin,
        target = ?problem.target,
        "searching"
    );

    let t = Instant::now();
    let mut sim = Simulation::new(problem, params, trace_path)?;
    timings.push(Timing {
        name: "init",
        ms: ms(t.elapsed()),
    });

    let outcome = with_pool(params, || sim.run())?;
    let kernel = sim.times();
    timings.push(Timing {
        name: "waves",
        ms: ms(kernel.waves),
    });
    timings.push(Timing {
        name: "search",
        ms: ms(kernel.search),
    });
    if trace_path {
        timings.push(Timing {
            name: "trace",
            ms: ms(kernel.trace),
        });
    }
    timings.push(Timing {
        name: "TOTAL",
        ms: ms(total_start.elapsed()),
    });

    info!(
        seed = problem.seed,
        result = outcome.result_code(),
        steps = outcome.steps,
        "finished"
    );
    Ok(Solved {
        sim,
        outcome,
        timings,
    })
}

/// Generate and solve `count` problems, problem k seeded with `seed + k`.
pub fn solve_batch(
    seed: u64,
    count: usize,
    params: &Params,
    trace_path: bool,
) -> Result<Vec<Outcome>, SolveError> {
    params.validate()?;
    (0..count as u64)
        .map(|k| {
            let problem = problem::generate(seed.wrapping_add(k), params);
            solve(&problem, params, trace_path).map(|(outcome, _)| outcome)
        })
        .collect()
}
