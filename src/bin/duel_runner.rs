//! Headless Duel Runner
//!
//! Runs a single battle, a batch of battles, or a pre-battle prediction
//! between two registry fighters and prints JSON or text.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use duel_sim::batch::{summarize_batch, BatchSummary};
use duel_sim::battle::BattleEventType;
use duel_sim::registry::load_registry;
use duel_sim::{BattleResult, Registry, SimError, SimulationConfig, WinPrediction};
use serde::Serialize;

/// Headless Duel Runner - personality-driven AI vs AI duels
#[derive(Parser, Debug)]
#[command(name = "duel_runner")]
#[command(about = "Run a duel, a batch of duels, or a win prediction")]
struct Args {
    /// Data directory with fighters.toml, locations.toml, ...
    #[arg(long, default_value = "data")]
    data: PathBuf,

    /// First fighter id
    #[arg(long)]
    fighter1: String,

    /// Second fighter id
    #[arg(long)]
    fighter2: String,

    /// Location id
    #[arg(long)]
    location: String,

    /// Optional simulation config TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Turn cap before a stalemate
    #[arg(long)]
    max_turns: Option<u32>,

    /// Run N battles in parallel and print a summary
    #[arg(long)]
    batch: Option<usize>,

    /// Predict the matchup instead of simulating it
    #[arg(long)]
    predict: bool,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Enable verbose battle logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output for a single battle
#[derive(Serialize)]
struct DuelOutput<'a> {
    winner: Option<&'a str>,
    loser: Option<&'a str>,
    is_draw: bool,
    turns: u32,
    seed: u64,
    result: &'a BattleResult,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    let registry = load_registry(&args.data)?;

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => SimulationConfig::default(),
    };
    if let Some(max_turns) = args.max_turns {
        config = config.with_max_turns(max_turns);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    if args.predict {
        let prediction = registry.predict(&args.fighter1, &args.fighter2, &args.location, args.seed)?;
        return print_prediction(args, &prediction);
    }

    if let Some(count) = args.batch {
        let summary = run_batch(&registry, args, &config, count)?;
        return print_summary(args, &summary);
    }

    let result = registry.simulate(&args.fighter1, &args.fighter2, &args.location, &config)?;
    print_battle(args, &result)
}

fn run_batch(
    registry: &Registry,
    args: &Args,
    config: &SimulationConfig,
    count: usize,
) -> Result<BatchSummary, SimError> {
    let f1 = registry.fighter(&args.fighter1)?;
    let f2 = registry.fighter(&args.fighter2)?;
    let location = registry.location(&args.location)?;
    let base_seed = config.seed.unwrap_or_else(rand::random);
    Ok(summarize_batch(
        f1,
        f2,
        location,
        config,
        registry.rules(),
        count,
        base_seed,
    ))
}

fn print_battle(args: &Args, result: &BattleResult) -> Result<(), SimError> {
    if args.format == "text" {
        println!("Duel Result");
        println!("===========");
        println!("{} vs {} at {}", args.fighter1, args.fighter2, result.location_id);
        for event in &result.events {
            if event.event_type.is_input() {
                continue;
            }
            if let BattleEventType::MoveAction {
                actor,
                move_name,
                effectiveness,
                damage,
                target_hp,
                ..
            } = &event.event_type
            {
                println!(
                    "  [{:>2}] {} uses {} ({:?}, {:.1} dmg, target at {:.1} hp)",
                    event.turn, actor, move_name, effectiveness, damage, target_hp
                );
            } else {
                println!("  [{:>2}] {:?}", event.turn, event.event_type);
            }
        }
        println!();
        match &result.winner_id {
            Some(winner) => println!("Winner: {}", winner),
            None if result.is_draw => println!("Draw"),
            None => println!("No result ({:?})", result.termination()),
        }
        println!("Turns: {}", result.turn_count);
        println!("Seed: {}", result.metadata.seed);
        return Ok(());
    }

    if args.format != "json" {
        eprintln!("Unknown format '{}', defaulting to json", args.format);
    }
    let output = DuelOutput {
        winner: result.winner_id.as_deref(),
        loser: result.loser_id.as_deref(),
        is_draw: result.is_draw,
        turns: result.turn_count,
        seed: result.metadata.seed,
        result,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_summary(args: &Args, summary: &BatchSummary) -> Result<(), SimError> {
    if args.format == "text" {
        println!("Batch Summary");
        println!("=============");
        println!("Battles: {}", summary.battles);
        for id in [&args.fighter1, &args.fighter2] {
            println!(
                "{} wins: {} ({:.1}%)",
                id,
                summary.wins.get(id.as_str()).copied().unwrap_or(0),
                summary.win_rate(id) * 100.0
            );
        }
        println!("Draws: {}", summary.draws);
        println!("Terminated: {}", summary.terminated);
        println!("Errors: {}", summary.errors);
        println!(
            "Turns: avg {:.1}, median {:.1}, longest {}",
            summary.average_turns, summary.median_turns, summary.longest_battle
        );
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

fn print_prediction(args: &Args, prediction: &WinPrediction) -> Result<(), SimError> {
    if args.format == "text" {
        println!("Prediction");
        println!("==========");
        println!(
            "{}: {}%  {}: {}%",
            args.fighter1, prediction.f1_prob, args.fighter2, prediction.f2_prob
        );
        println!("Favored: {} ({}%)", prediction.winner_id, prediction.win_prob);
        println!("Victory type: {:?}", prediction.victory_type);
        println!(
            "Tone: {:?} (pool: {})",
            prediction.resolution_tone,
            prediction.resolution_tone.quote_pool()
        );
        for reason in &prediction.outcome_reasons {
            println!("  - {:?}", reason);
        }
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(prediction)?);
    Ok(())
}
