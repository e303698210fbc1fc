//! Brix CLI - seeded self-play driver for the merge-puzzle engine.
//!
//! Plays whole games with randomly chosen moves and reports the outcome.
//! Useful for soak-testing the engine and for reproducing games from a
//! seed; it is not an interactive front end.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use brix::{DEFAULT_WIN_THRESHOLD, Direction, GameEngine};
use clap::{Parser, ValueEnum};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::Serialize;

/// Consecutive unchanged moves before the driver assumes the board is
/// stuck. Random direction choice always finds a changing move well
/// before this when one exists.
const STALL_LIMIT: u32 = 64;

/// Brix - a deterministic sliding-tile merge puzzle engine
#[derive(Parser, Debug)]
#[command(name = "brix")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Random seed (default: random)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Board side length
    #[arg(long, default_value = "4")]
    size: u16,

    /// Tile value that wins the game (power of two)
    #[arg(short, long, default_value_t = DEFAULT_WIN_THRESHOLD)]
    threshold: u32,

    /// Maximum number of effective moves before giving up
    #[arg(short, long, default_value = "100000")]
    max_moves: u32,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Suppress the final board
    #[arg(short, long)]
    quiet: bool,
}

/// How to report the finished game.
#[derive(ValueEnum, Debug, Clone, Copy)]
enum OutputFormat {
    /// Human-readable board and summary.
    Text,
    /// Single JSON object.
    Json,
}

/// Summary of one self-played game.
#[derive(Debug, Serialize)]
struct GameReport {
    seed: u64,
    size: u16,
    threshold: u32,
    moves: u32,
    max_tile: u32,
    won: bool,
    game_over: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let mut engine = match GameEngine::with_seed(args.size, args.size, args.threshold, seed) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("brix: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Opening position: two random tiles
    engine.spawn_random_tile();
    engine.spawn_random_tile();

    // Direction choice gets its own stream so spawn placement stays
    // reproducible per effective move
    let mut dir_rng = SmallRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);

    let mut moves = 0u32;
    let mut stalled = 0u32;
    while moves < args.max_moves && !engine.is_game_over() && stalled < STALL_LIMIT {
        let direction = Direction::ALL[dir_rng.gen_range(0..Direction::ALL.len())];
        if engine.apply_move(direction).changed {
            moves += 1;
            stalled = 0;
        } else {
            stalled += 1;
        }
    }

    let report = GameReport {
        seed,
        size: args.size,
        threshold: args.threshold,
        moves,
        max_tile: engine.max_tile(),
        won: engine.is_won(),
        game_over: engine.is_game_over(),
    };

    match args.format {
        OutputFormat::Text => {
            if !args.quiet {
                print!("{}", engine.grid());
            }
            println!(
                "seed {} | {} moves | max tile {} | won: {} | game over: {}",
                report.seed, report.moves, report.max_tile, report.won, report.game_over
            );
        }
        OutputFormat::Json => match serde_json::to_string(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("brix: failed to serialize report: {err}");
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}
