//! Crowdflow terminal driver
//!
//! Loads a scenario file, advances the chosen movement policy tick by
//! tick and prints the grid after each one. Stops when every pedestrian
//! has been absorbed or the tick budget runs out.

use clap::Parser;
use std::path::PathBuf;

use crowdflow::{Policy, Result, Scenario, TickEvent};

#[derive(Parser)]
#[command(name = "crowdflow", about = "Grid-based pedestrian dynamics simulator")]
struct Args {
    /// Scenario JSON file (rows, cols, pedestrians, obstacles, target)
    scenario: PathBuf,

    /// Movement policy: dijkstra, euclidean or fmm
    #[arg(long, default_value = "dijkstra", value_parser = parse_policy)]
    policy: Policy,

    /// Maximum number of ticks to run
    #[arg(long, default_value_t = 100)]
    ticks: usize,

    /// Print the grid only after the final tick
    #[arg(long)]
    quiet: bool,
}

fn parse_policy(s: &str) -> std::result::Result<Policy, String> {
    match s {
        "dijkstra" => Ok(Policy::Dijkstra),
        "euclidean" => Ok(Policy::Euclidean),
        "fmm" => Ok(Policy::FastMarching),
        other => Err(format!(
            "unknown policy '{other}' (expected dijkstra, euclidean or fmm)"
        )),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crowdflow=info".into()),
        )
        .init();

    let args = Args::parse();
    let scenario = Scenario::load(&args.scenario)?;
    let mut system = scenario.apply()?;
    system.evaluate_utility_field(args.policy)?;

    tracing::info!(
        rows = system.rows(),
        cols = system.cols(),
        pedestrians = system.pedestrians().len(),
        policy = ?args.policy,
        "scenario loaded"
    );

    let mut arrived = 0usize;
    for tick in 1..=args.ticks {
        let events = system.advance_tick(args.policy)?;
        arrived += events
            .iter()
            .filter(|e| matches!(e, TickEvent::Arrived { .. }))
            .count();

        if !args.quiet {
            println!("tick {tick}");
            print!("{}", system.ascii_map());
        }
        if system.pedestrians().is_empty() {
            tracing::info!(tick, arrived, "all pedestrians absorbed");
            break;
        }
    }

    if args.quiet {
        print!("{}", system.ascii_map());
    }
    if !system.pedestrians().is_empty() {
        tracing::info!(
            remaining = system.pedestrians().len(),
            arrived,
            "tick budget exhausted"
        );
    }
    Ok(())
}
