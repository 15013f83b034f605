//! rf-rtp-sim: batch RTP simulation from the command line
//!
//! Usage:
//!   rf-rtp-sim --preset demo --rounds 1000000 --seed 7
//!   rf-rtp-sim --config game.yaml --threads 8 --json
//!   rf-rtp-sim --preset toy --base-only --exact

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;

use rf_cascade::{CascadeEngine, GameConfig, presets};
use rf_rtp_sim::{DEFAULT_COMBINATION_LIMIT, SimConfig, Simulator, enumerate_base_rtp};

#[derive(Parser)]
#[command(name = "rf-rtp-sim", about = "Batch RTP simulator for cascading ways engines")]
struct Cli {
    /// Built-in preset (demo, classic, toy)
    #[arg(long, conflicts_with = "config")]
    preset: Option<String>,

    /// Game config file (.json, .yaml, .yml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Paid base rounds to simulate
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    rounds: u64,

    /// RNG seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Worker threads (0 = one per CPU)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Skip awarded free rounds
    #[arg(long)]
    base_only: bool,

    /// Base stake per round
    #[arg(long, default_value_t = 1)]
    stake: u64,

    /// Free-round weight table tier
    #[arg(long, default_value_t = 0)]
    tier: usize,

    /// Also compute the exact base-game RTP by enumeration
    #[arg(long)]
    exact: bool,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let engine = Arc::new(CascadeEngine::new(Arc::new(config)).context("Invalid game config")?);

    let sim_config = SimConfig {
        rounds: cli.rounds,
        seed: cli.seed,
        threads: cli.threads,
        base_only: cli.base_only,
        stake: cli.stake,
        feature_tier: cli.tier,
        ..SimConfig::default()
    };
    let report = Simulator::new(engine.clone(), sim_config)
        .run()
        .context("Simulation failed")?;

    let exact = if cli.exact {
        Some(
            enumerate_base_rtp(&engine, DEFAULT_COMBINATION_LIMIT)
                .context("Enumeration failed")?,
        )
    } else {
        None
    };

    if cli.json {
        let output = serde_json::json!({ "report": report, "exact": exact });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{report}");
        if let Some(exact) = exact {
            println!(
                "Exact base RTP:    {:.4}% over {} combinations (simulated base {:.4}%)",
                exact.rtp * 100.0,
                exact.combinations,
                report.base_rtp * 100.0
            );
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<GameConfig> {
    if let Some(path) = &cli.config {
        return GameConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    let name = cli.preset.as_deref().unwrap_or("demo");
    match presets::by_name(name) {
        Some(config) => Ok(config),
        None => bail!("Unknown preset '{name}' (expected demo, classic or toy)"),
    }
}
