//! Headless Battle Runner
//!
//! Plays a whole battle with an auto-piloted party and prints the result.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use party_battle::battle::{
    load_roster, BattleController, BattleOutcome, BattlePhase, CommandKind, Rewards, Roster,
};
use party_battle::core::config::{load_config, EngineConfig};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Headless Battle Runner - auto-piloted party battles
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run a party battle to completion and report the outcome")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Roster TOML (defaults to the built-in encounter)
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Engine config TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum hero turns before giving up
    #[arg(long, default_value_t = 200)]
    max_turns: u32,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Enable verbose battle logging
    #[arg(long, short = 'v')]
    verbose: bool,

    /// What the party does every turn
    #[arg(long, value_enum, default_value_t = Strategy::Attack)]
    strategy: Strategy,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Attack a random living enemy
    Attack,
    /// Commit every hero to a coordinated escape
    Flee,
}

#[derive(Serialize)]
struct Survivor {
    name: String,
    hp: u32,
    max_hp: u32,
}

/// JSON output structure
#[derive(Serialize)]
struct BattleResult {
    outcome: String,
    rounds: u32,
    hero_turns: u32,
    elapsed_ms: u64,
    rewards: Option<Rewards>,
    survivors: Vec<Survivor>,
    messages: Vec<String>,
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "party_battle=debug"
    } else {
        "party_battle=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let roster = match &args.roster {
        Some(path) => load_roster(path)?,
        None => Roster::builtin(),
    };

    // Determine seed
    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);
    config.seed = Some(seed);
    let mut pilot_rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(2));

    let mut battle = BattleController::new(roster, config);
    battle.start_or_restart_battle()?;

    let mut hero_turns = 0;
    while battle.run_until_idle() == BattlePhase::PlayerCommand {
        if hero_turns >= args.max_turns {
            tracing::warn!(hero_turns, "turn limit reached");
            break;
        }
        hero_turns += 1;

        let hero = battle
            .current_actor()
            .map(|h| h.id.clone())
            .ok_or("no acting hero at the command menu")?;
        match args.strategy {
            Strategy::Attack => {
                battle.select_command(CommandKind::Attack)?;
                let targets = battle.legal_targets();
                let target = targets
                    .choose(&mut pilot_rng)
                    .cloned()
                    .ok_or("no enemy to attack")?;
                battle.select_target(target)?;
            }
            Strategy::Flee => battle.commit_flee(&hero)?,
        }
    }

    let state = battle.state();
    let outcome = match battle.outcome() {
        Some(BattleOutcome::Victory) => "victory",
        Some(BattleOutcome::Defeat) => "defeat",
        Some(BattleOutcome::Escaped) => "escaped",
        None => "timeout",
    };
    let result = BattleResult {
        outcome: outcome.to_string(),
        rounds: state.round,
        hero_turns,
        elapsed_ms: battle.now(),
        rewards: battle.rewards(),
        survivors: battle
            .alive_heroes()
            .map(|h| Survivor {
                name: h.name.clone(),
                hp: h.hp(),
                max_hp: h.stats().max_hp,
            })
            .collect(),
        messages: state.messages.texts().map(str::to_string).collect(),
        seed,
    };

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => {
            println!("Battle Result");
            println!("=============");
            println!("Outcome: {}", result.outcome);
            println!("Rounds: {}", result.rounds);
            println!("Hero turns: {}", result.hero_turns);
            if let Some(rewards) = result.rewards {
                println!("Rewards: {} EXP, {} gold", rewards.exp, rewards.gold);
            }
            for survivor in &result.survivors {
                println!("  {} {}/{}", survivor.name, survivor.hp, survivor.max_hp);
            }
            if args.verbose {
                println!();
                for message in &result.messages {
                    println!("{}", message);
                }
            }
            println!();
            println!("Seed: {}", result.seed);
        }
    }
    Ok(())
}
