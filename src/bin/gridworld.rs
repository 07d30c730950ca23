use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::{Builder, Env};
use log::info;

use gridmdp::mdp::{
    format_report, Config, GridWorld, PolicyGrid, PolicyIteration, Solver, Sweep, UtilityGrid,
    ValueIteration,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Algorithm {
    /// Value iteration
    Value,
    /// Policy iteration
    Policy,
}

#[derive(Parser)]
#[command(author, version, about = "Solve a stochastic grid world MDP", long_about = None)]
struct Cli {
    /// Algorithm to run
    #[arg(value_enum)]
    algorithm: Algorithm,

    /// TOML file describing the grid and solver parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of iterations
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Override the discount factor
    #[arg(short, long)]
    discount: Option<f64>,

    /// Stop value iteration once a sweep changes no utility by this much
    #[arg(short, long)]
    tolerance: Option<f64>,

    /// Stop policy iteration once the policy stops changing
    #[arg(short, long)]
    stop_when_stable: bool,

    /// Print the grids every N iterations (0 prints only the final state)
    #[arg(short, long, default_value_t = 5)]
    report_every: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().filter_or("RUST_LOG", level))
        .format_timestamp(None)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(iterations) = cli.iterations {
        config.solver.iterations = iterations;
    }
    if let Some(discount) = cli.discount {
        config.solver.discount = discount;
    }
    if cli.tolerance.is_some() {
        config.solver.tolerance = cli.tolerance;
    }
    config.solver.stop_when_stable |= cli.stop_when_stable;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let grid = GridWorld::new(&config.grid).context("building grid")?;
    info!(
        "{}x{} grid, {} iterations, discount {}",
        grid.rows(),
        grid.cols(),
        config.solver.iterations,
        config.solver.discount
    );

    let mut solver: Box<dyn Solver + '_> = match cli.algorithm {
        Algorithm::Value => Box::new(ValueIteration::new(&grid, config.solver.clone())?),
        Algorithm::Policy => Box::new(PolicyIteration::new(&grid, config.solver.clone())?),
    };

    let every = cli.report_every;
    let solution = solver.solve_with(&mut |sweep: &Sweep, u: &UtilityGrid, p: &PolicyGrid| {
        if every > 0 && sweep.iteration % every == 0 {
            println!("{}", format_report(sweep.iteration, &grid, u, p));
        }
    })?;

    println!("Final ({} sweeps)", solution.sweeps);
    let last = solution.sweeps.saturating_sub(1);
    println!(
        "{}",
        format_report(last, &grid, &solution.utilities, &solution.policy)
    );
    Ok(())
}
