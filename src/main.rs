//! deepmd-tuner command-line driver
//!
//! Loads one or more YAML configuration files, runs the NSGA-II tuner, and
//! prints the final parent population.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use deepmd_tuner::algorithms::tuner::Nsga2Tuner;
use deepmd_tuner::config::TunerConfig;
use deepmd_tuner::diagnostics::TuningResult;
use deepmd_tuner::execution::ExecutionFacility;
use deepmd_tuner::fitness::evaluator::DryRunEvaluator;
use deepmd_tuner::telemetry::{Probe, TelemetryRecord, TracingTelemetry};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deepmd-tuner")]
#[command(about = "Hyperparameter tuning for deepmd-kit via an evolutionary algorithm", long_about = None)]
struct Cli {
    /// YAML configuration files, later ones overriding earlier ones
    #[arg(required = true)]
    config_files: Vec<PathBuf>,

    /// Random seed (overrides the configuration)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of generations (overrides the configuration)
    #[arg(long)]
    generations: Option<usize>,

    /// Print the final population as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RunSummary {
    job_id: Option<String>,
    seed: u64,
    generations: usize,
    evaluations: usize,
    invalid: usize,
    population: Vec<TelemetryRecord>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_with<X: ExecutionFacility>(
    tuner: &Nsga2Tuner,
    executor: &X,
    seed: u64,
) -> Result<TuningResult> {
    let mut rng = StdRng::seed_from_u64(seed);
    let evaluator = DryRunEvaluator::new(seed);
    let result = tuner.run(&evaluator, executor, &TracingTelemetry, &mut rng)?;
    Ok(result)
}

#[cfg(feature = "parallel")]
fn run(config: &TunerConfig, tuner: &Nsga2Tuner, seed: u64) -> Result<TuningResult> {
    let executor = deepmd_tuner::execution::ParallelExecutor::new(config.distributed.num_workers)?;
    info!(workers = executor.num_workers(), "using parallel executor");
    run_with(tuner, &executor, seed)
}

#[cfg(not(feature = "parallel"))]
fn run(_config: &TunerConfig, tuner: &Nsga2Tuner, seed: u64) -> Result<TuningResult> {
    info!("using sequential executor");
    run_with(tuner, &deepmd_tuner::execution::SequentialExecutor, seed)
}

fn print_table(result: &TuningResult) {
    println!(
        "{:>4} {:>5} {:>12} {:>12} {:>10} {:>10} {:>6} {:>8} {:>8} {:>8}  {}",
        "rank",
        "birth",
        "energy",
        "force",
        "start_lr",
        "stop_lr",
        "smth",
        "rcut",
        "scale",
        "desc",
        "fitting"
    );
    for individual in result.population.iter() {
        let [energy, force] = individual.objectives();
        match individual.configuration() {
            Ok(c) => println!(
                "{:>4} {:>5} {:>12.6e} {:>12.6e} {:>10.3e} {:>10.3e} {:>6.3} {:>8.3} {:>8} {:>8}  {}",
                individual.rank,
                individual.birth_id,
                energy,
                force,
                c.start_lr,
                c.stop_lr,
                c.rcut_smth,
                c.rcut,
                c.scale_by_worker,
                c.desc_activ_func,
                c.fitting_activ_func
            ),
            Err(e) => println!("{:>4} {:>5} undecodable: {e}", individual.rank, individual.birth_id),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TunerConfig::load(cli.config_files.as_slice()).context("loading configuration")?;
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(generations) = cli.generations {
        config.ea.max_generations = generations;
    }

    init_logging(config.verbose);

    if !config.test {
        bail!("only dry runs are supported; set `test: true` in the configuration");
    }

    let seed = config.seed.unwrap_or_else(rand::random);
    info!(job_id = ?config.job_id, seed, "configuration loaded");

    let tuner = config.tuner_builder().build()?;
    let result = run(&config, &tuner, seed)?;

    if cli.json {
        let summary = RunSummary {
            job_id: config.job_id.clone(),
            seed,
            generations: result.generations,
            evaluations: result.evaluations,
            invalid: result.stats.total_invalid(),
            population: result
                .population
                .iter()
                .map(|i| TelemetryRecord::new(Probe::Population, result.generations, i))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_table(&result);
    }

    Ok(())
}
