use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wavereach::config::Params;
use wavereach::problem;
use wavereach::render;
use wavereach::sim::{Phase, Simulation};

#[derive(Parser, Debug)]
#[command(about = "Find the earliest step a ship can reach port through a storm")]
struct Args {
    /// Seed of the first problem; problem k uses seed + k.
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Number of problems to solve.
    #[arg(short = 'n', long, default_value_t = 1)]
    problems: usize,

    /// Write one PNG per simulated step to the output directory.
    #[arg(short, long)]
    visualize: bool,

    /// Reconstruct and draw one route to the target. Slow and memory hungry.
    #[arg(short, long)]
    path: bool,

    /// JSON file with parameter overrides.
    #[arg(long)]
    params: Option<PathBuf>,

    #[arg(short, long, default_value = "artifacts")]
    out_dir: PathBuf,
}

fn load_params(path: Option<&Path>) -> Result<Params> {
    let Some(path) = path else {
        return Ok(Params::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Params::from_json(&text).with_context(|| format!("invalid parameters in {}", path.display()))
}

fn save_png(path: &Path, rgba: &[u8], n: usize) -> Result<()> {
    image::save_buffer(path, rgba, n as u32, n as u32, image::ColorType::Rgba8)
        .with_context(|| format!("failed to save {}", path.display()))
}

/// Step one problem by hand so every generation can be drawn.
fn solve_visualized(seed: u64, index: usize, params: &Params, trace: bool, out_dir: &Path) -> Result<i64> {
    let prob = problem::generate(seed, params);
    let dir = out_dir.join(format!("problem_{index:03}"));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let mut sim = Simulation::new(&prob, params, trace)?;
    let n = params.grid_size;
    let frames = wavereach::with_pool(params, || -> Result<usize> {
        let mut frames = 0usize;
        loop {
            let step = sim.next_step();
            let phase = sim.step();
            if phase == Phase::Exhausted {
                return Ok(frames);
            }
            let path = if trace { sim.partial_path() } else { None };
            let rgba = render::render_frame(&sim.frame(path.as_deref()), params);
            save_png(&dir.join(format!("step_{step:05}.png")), &rgba, n)?;
            frames += 1;
            if phase.is_terminal() {
                return Ok(frames);
            }
        }
    })??;
    eprintln!("Saved {} frames to {}", frames, dir.display());
    Ok(sim.outcome().result_code())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let params = load_params(args.params.as_deref())?;
    params.validate()?;

    eprintln!(
        "Solving {} problems on a {}x{} grid (visualization: {}, path: {})",
        args.problems, params.grid_size, params.grid_size, args.visualize, args.path
    );

    for k in 0..args.problems {
        let seed = args.seed.wrapping_add(k as u64);
        let result = if args.visualize {
            solve_visualized(seed, k, &params, args.path, &args.out_dir)?
        } else {
            let prob = problem::generate(seed, &params);
            let (outcome, timings) = wavereach::solve(&prob, &params, args.path)?;
            eprintln!("\nTimings (seed {}):", seed);
            for t in &timings {
                eprintln!("  {:20} {:8.1} ms", t.name, t.ms);
            }
            outcome.result_code()
        };
        println!("{}", result);
    }

    Ok(())
}
