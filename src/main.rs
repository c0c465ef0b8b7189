//! # Bramble Main Entry Point
//!
//! Loads the rules, builds a seeded game and runs it headless with scripted
//! or random input, then prints the final frame.

use bramble::{
    parse_script, BrambleError, BrambleResult, Controls, FrameSnapshot, GameHandle, GameRules,
    Session, Simulation, Timings,
};
use clap::Parser;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

/// Command line arguments for the Bramble roguelike.
#[derive(Parser, Debug)]
#[command(name = "bramble")]
#[command(about = "A real-time roguelike simulation with aggression-driven NPCs")]
#[command(version)]
struct Args {
    /// Random seed for grid generation and every roll
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// JSON rules file; built-in defaults when omitted
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Log filter (error, warn, info, debug, trace or env_logger syntax)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Key script to play, e.g. "5d2s D q"; random keys when omitted
    #[arg(long)]
    script: Option<String>,

    /// Key bindings: wasd or vi
    #[arg(long, default_value = "wasd")]
    controls: String,

    /// Delay between key presses
    #[arg(long, default_value_t = 120)]
    key_millis: u64,

    /// Stop the session after this long
    #[arg(long, default_value_t = 10_000)]
    max_millis: u64,

    /// Print every rendered frame, not just the last one
    #[arg(long)]
    render: bool,
}

#[tokio::main]
async fn main() -> BrambleResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level);

    info!("Starting Bramble v{}", bramble::VERSION);

    let frame = run_game(&args).await?;
    println!("{}", frame);
    Ok(())
}

/// Initializes env_logger with the given filter.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::new()
        .parse_filters(log_level)
        .format_target(false)
        .init();
}

fn load_rules(args: &Args) -> BrambleResult<GameRules> {
    match &args.rules {
        Some(path) => {
            info!("Loading rules from {}", path.display());
            GameRules::load(path)
        }
        None => Ok(GameRules::default()),
    }
}

/// Keys the session will press, in order.
fn key_plan(args: &Args, controls: &Controls) -> BrambleResult<Vec<char>> {
    if let Some(script) = &args.script {
        return parse_script(script);
    }

    let presses = (args.max_millis / args.key_millis.max(1)) as usize;
    let playable: Vec<char> = controls
        .keys()
        .into_iter()
        .filter(|&key| key != controls.quit)
        .collect();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let keys = (0..presses)
        .filter_map(|_| playable.choose(&mut rng).copied())
        .collect();
    Ok(keys)
}

/// Runs one session to completion and returns its last frame.
async fn run_game(args: &Args) -> BrambleResult<FrameSnapshot> {
    let rules = load_rules(args)?;
    let controls = Controls::by_name(&args.controls)?;
    let keys = key_plan(args, &controls)?;
    let timings = Timings::from_rules(&rules);

    info!("Generating a {}x{} grid with seed {}", rules.grid_width, rules.grid_height, args.seed);
    let handle = GameHandle::new(Simulation::new(rules, args.seed)?);

    let (key_tx, key_rx) = mpsc::channel(16);
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<FrameSnapshot>();
    let session = Session::start(&handle, controls, key_rx, frame_tx, timings);

    let render = args.render;
    let printer = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            if render {
                println!("{}\n", frame);
            }
        }
    });

    let key_delay = Duration::from_millis(args.key_millis);
    let feeder_handle = handle.clone();
    let feeder = tokio::spawn(async move {
        for key in keys {
            if feeder_handle.should_stop() || key_tx.send(key).await.is_err() {
                break;
            }
            time::sleep(key_delay).await;
        }
    });

    let deadline = time::Instant::now() + Duration::from_millis(args.max_millis);
    if time::timeout_at(deadline, feeder).await.is_err() {
        info!("Time limit reached");
    }
    while !handle.should_stop() && time::Instant::now() < deadline {
        time::sleep(timings.npc_interval).await;
    }
    if !handle.outcome().is_game_over() {
        handle.flags().request_kill();
    }
    session.join().await;
    if let Err(e) = printer.await {
        warn!("Frame printer failed: {}", e);
    }

    let frame = handle.snapshot()?;
    match (&frame.outcome.killed_by, frame.outcome.game_over) {
        (Some(killer), _) => info!("Game over: killed by {}", killer),
        (None, true) => info!("Game over"),
        (None, false) => info!("Session stopped after {} cycles", frame.cycle),
    }
    if frame.player.is_none() {
        return Err(BrambleError::InvalidState("player vanished".to_string()));
    }
    Ok(frame)
}
