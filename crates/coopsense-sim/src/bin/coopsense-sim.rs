//! coopsense-sim - run the cooperative sensing engine over traffic
//!
//! Usage:
//!   coopsense-sim                              # synthetic traffic, default config
//!   coopsense-sim --config sim.yaml --steps 5000
//!   coopsense-sim --dataset node1.txt node2.txt ... --profile single
//!   coopsense-sim --print-example-config > coopsense.yaml

use clap::Parser;
use coopsense_core::observe::{init_logging, LogLevel};
use coopsense_sim::config::{DatasetConfig, SimulationConfig};
use coopsense_sim::error::SimResult;
use coopsense_sim::simulator::Simulation;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "coopsense-sim")]
#[command(about = "Cooperative spectrum sensing simulation")]
#[command(version)]
struct Cli {
    /// Config file (default: search COOPSENSE_CONFIG, ./coopsense.yaml, user and system dirs)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Engine profile from the config's `profiles` table
    #[arg(short, long)]
    profile: Option<String>,

    /// Seed for the engine and the traffic generator
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many steps
    #[arg(long)]
    steps: Option<usize>,

    /// RSSI trace files, one per node (replaces synthetic traffic)
    #[arg(long, num_args = 1..)]
    dataset: Vec<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Print statistics as YAML
    #[arg(long)]
    yaml: bool,

    /// Print an example config and exit
    #[arg(long)]
    print_example_config: bool,
}

fn build_config(cli: &Cli) -> SimResult<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load_from(path)?,
        None => SimulationConfig::load()?,
    };
    if let Some(name) = &cli.profile {
        config = config.with_profile(name)?;
    }
    if let Some(seed) = cli.seed {
        config.engine.seed = Some(seed);
        config.traffic.seed = Some(seed);
    }
    if cli.steps.is_some() {
        config.max_steps = cli.steps;
    }
    if !cli.dataset.is_empty() {
        let dataset = config.dataset.get_or_insert_with(DatasetConfig::default);
        dataset.paths = cli.dataset.clone();
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> SimResult<()> {
    let config = build_config(cli)?;
    init_logging(&config.logging);

    let traffic = config.build_traffic()?;
    let mut simulation = Simulation::new(config.engine.clone(), traffic)?.with_max_steps(config.max_steps);
    let stats = simulation.run()?;

    if cli.yaml {
        match serde_yaml::to_string(stats) {
            Ok(yaml) => print!("{}", yaml),
            Err(e) => tracing::warn!(error = %e, "could not serialize statistics"),
        }
    } else {
        print!("{}", stats);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_example_config {
        print!("{}", SimulationConfig::example_yaml());
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("coopsense-sim: {}", e);
            ExitCode::FAILURE
        }
    }
}
