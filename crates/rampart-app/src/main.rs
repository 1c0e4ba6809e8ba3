//! `rampart`: run a tower-defense match headlessly.
//!
//! Loads a match configuration (or the built-in one), places the requested
//! towers, starts rounds and logs every simulation event until the match ends.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rampart_app::autopilot::{Autopilot, TowerOrder};
use rampart_app::game_loop::spawn_game_loop;
use rampart_app::report;
use rampart_app::state::{LoopExit, LoopSettings};
use rampart_core::commands::PlayerCommand;
use rampart_core::config::MatchConfig;
use rampart_sim::{SimConfig, SimulationEngine};

#[derive(Parser, Debug)]
#[command(name = "rampart")]
#[command(about = "Headless wave-based tower-defense simulation")]
struct Args {
    /// Match configuration JSON. Defaults to the built-in match.
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed for spawn spread
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Stop after this many ticks even if the match is still running
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Pace ticks in wall-clock time instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Real-time pacing multiplier, clamped to [0, 4]
    #[arg(long, default_value = "1.0")]
    time_scale: f64,

    /// Tower to place, as KIND@X,Z (repeatable)
    #[arg(long = "tower", value_name = "KIND@X,Z")]
    towers: Vec<TowerOrder>,

    /// Start each round as soon as it is ready
    #[arg(long)]
    auto_start: bool,

    /// Print the final snapshot as JSON on stdout
    #[arg(long)]
    snapshot_json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading match configuration");
            MatchConfig::from_path(path)?
        }
        None => MatchConfig::default_match(),
    };

    if !args.auto_start && args.max_ticks.is_none() {
        return Err("rounds never start without --auto-start; pass it or --max-ticks".into());
    }

    let mut autopilot = Autopilot::new(&config, args.towers.clone(), args.auto_start);
    let mut engine = SimulationEngine::new(
        SimConfig::default()
            .with_seed(args.seed)
            .with_time_scale(args.time_scale),
        config,
    );
    engine.queue_command(PlayerCommand::StartMatch);

    let settings = LoopSettings {
        realtime: args.realtime,
        max_ticks: args.max_ticks,
        stop_on_game_over: true,
    };

    let handle = spawn_game_loop(engine, settings, move |snapshot| autopilot.react(snapshot))?;

    let mut last = None;
    for snapshot in handle.snapshots.iter() {
        for event in &snapshot.events {
            report::log_event(snapshot.time.tick, event);
        }
        last = Some(snapshot);
    }

    let (_engine, exit) = handle
        .join()
        .map_err(|_| "game loop thread panicked")?;

    match exit {
        LoopExit::GameOver { won } => info!(won, "match finished"),
        LoopExit::MaxTicks => info!("tick limit reached"),
        LoopExit::Shutdown | LoopExit::Disconnected => warn!(?exit, "game loop ended early"),
    }

    if let Some(snapshot) = last {
        report::log_summary(&snapshot);
        if args.snapshot_json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
