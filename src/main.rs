//! dot-combat - run a combat encounter from the command line

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dot_combat::combat::{DiceSource, RngDice};
use dot_combat::{run_encounter, Combat, SimConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Turn-based tabletop combat simulator
#[derive(Parser, Debug)]
#[command(name = "dot-combat", version, about = "Simulate a tabletop combat encounter")]
struct Args {
    /// TOML file describing the encounter (default: built-in demo)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed the dice for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Also print the technical log
    #[arg(long)]
    technical: bool,

    /// Emit diagnostics on stderr as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dot_combat=warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let config = SimConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    let roster = config.roster()?;

    let dice: Box<dyn DiceSource> = match args.seed.or(config.seed) {
        Some(seed) => Box::new(RngDice::seeded(seed)),
        None => Box::new(RngDice::from_entropy()),
    };
    let mut combat = Combat::with_dice(roster, dice);
    let report = run_encounter(&mut combat, config.max_rounds)?;

    println!("{}", combat.narrative_log());
    if args.technical {
        println!("{}", combat.technical_log());
    }
    match report.winner {
        Some(winner) => println!(
            "The {} win after {} rounds. Standing: {}",
            winner,
            report.rounds,
            report.survivors.join(", ")
        ),
        None => println!("No winner after {} rounds.", report.rounds),
    }

    Ok(())
}
