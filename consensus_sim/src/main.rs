//! Consensus Simulator CLI
//!
//! Run a consensus configuration to its step budget, or compare protocols on
//! identical starting conditions.

use clap::Parser;
use consensus_core::ProtocolKind;
use consensus_sim::{ParamOverrides, RunReport, ScenarioRunner};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Consensus simulation CLI
#[derive(Parser, Debug)]
#[command(name = "consensus-sim")]
#[command(about = "Simulate consensus protocols on agent networks", long_about = None)]
struct Args {
    /// JSON configuration file used as the base for all other flags
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preset scenario (baseline, ring_linear, complete_max, ring_max, noisy_linear)
    #[arg(short = 'S', long)]
    scenario: Option<String>,

    /// Number of agents
    #[arg(short, long)]
    agents: Option<usize>,

    /// Topology (random, ring, fully_connected)
    #[arg(short, long)]
    topology: Option<String>,

    /// Edge probability for the random topology
    #[arg(short, long)]
    probability: Option<f64>,

    /// Protocol (linear, max_consensus)
    #[arg(short = 'P', long)]
    protocol: Option<String>,

    /// Noise standard deviation for linear consensus
    #[arg(short, long)]
    noise: Option<f64>,

    /// Step size for linear consensus
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Step budget
    #[arg(long)]
    steps: Option<u64>,

    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Run every protocol on the same graph and initial values
    #[arg(long)]
    compare: bool,

    /// Spread at or below which the agents count as agreed
    #[arg(long, default_value = "0.001")]
    tolerance: f64,

    /// Record agent values every N steps (0 = off)
    #[arg(long, default_value = "0")]
    record_every: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,
}

impl Args {
    /// Base selection and field overrides taken from the flags.
    fn overrides(&self) -> ParamOverrides {
        ParamOverrides {
            config: self.config.clone(),
            scenario: self.scenario.clone(),
            agents: self.agents,
            topology: self.topology.clone(),
            probability: self.probability,
            protocol: self.protocol.clone(),
            noise: self.noise,
            epsilon: self.epsilon,
            steps: self.steps,
        }
    }
}

fn log_report(report: &RunReport) {
    let status = if report.converged() {
        format!("agreed at step {}", report.converged_at.unwrap_or_default())
    } else {
        "no agreement".to_string()
    };

    info!(
        "{} on {} ({} edges{}): {}",
        report.protocol,
        report.topology,
        report.edges,
        if report.connected { "" } else { ", disconnected" },
        status
    );
    info!(
        "  initial  mean={:.4} min={:.4} max={:.4} spread={:.4}",
        report.initial.mean, report.initial.min, report.initial.max, report.initial.spread
    );
    info!(
        "  step {:>4} mean={:.4} min={:.4} max={:.4} spread={:.4}",
        report.steps,
        report.final_metrics.mean,
        report.final_metrics.min,
        report.final_metrics.max,
        report.final_metrics.spread
    );
}

fn main() {
    let args = Args::parse();

    // Initialize logging (stderr, so --json output stays clean)
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let config = match args.overrides().resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Determine seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    } else {
        args.seed
    };

    let runner = ScenarioRunner::new(seed)
        .with_tolerance(args.tolerance)
        .with_record_every(args.record_every);

    let result = if args.compare {
        runner.compare(config.params(), &ProtocolKind::all())
    } else {
        runner.run(config).map(|report| vec![report])
    };

    let reports = match result {
        Ok(reports) => reports,
        Err(e) => {
            error!("Simulation not started: {}", e);
            std::process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to render reports: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        for report in &reports {
            log_report(report);
        }
    }
}
