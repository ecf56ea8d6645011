use anyhow::{Context, Result};
use clap::Parser;
use flock_cli::{load_settings, FlockRunner, SettingsOverrides};
use flock_shared::FlockSettings;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless flocking simulation", long_about = None)]
struct Args {
    /// JSON settings file; omitted fields use the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of agents (overrides the settings file)
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 1000)]
    ticks: u64,

    /// Seed for the initial population
    #[arg(short, long)]
    seed: Option<u64>,

    /// Fixed time step per tick, in seconds
    #[arg(long)]
    delta_time: Option<f32>,

    /// Log flock statistics every N ticks (0 disables)
    #[arg(short, long, default_value_t = 100)]
    report_every: u64,

    /// Write the final population snapshot to this JSON file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let mut settings = match &args.config {
        Some(path) => load_settings(path)?,
        None => FlockSettings::default(),
    };
    SettingsOverrides {
        agent_count: args.count,
        seed: args.seed,
        delta_time: args.delta_time,
    }
    .apply(&mut settings);

    if args.ticks == 0 && args.snapshot.is_none() {
        anyhow::bail!("Nothing to do: --ticks is 0 and no --snapshot path was given");
    }

    log::info!("Flock simulation starting...");
    log::debug!("Settings: {:?}", settings);

    let mut runner = FlockRunner::new(&settings).context("Failed to initialize flock")?;
    let summary = runner.run(args.ticks, args.report_every).context("Simulation error")?;

    log::info!(
        "Final state after {} ticks: max distance from center {:.2}, polarization {:.3}",
        summary.ticks,
        summary.max_center_distance,
        summary.polarization
    );

    if let Some(path) = &args.snapshot {
        runner.write_snapshot(path)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
