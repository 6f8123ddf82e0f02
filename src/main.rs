//! fairroll CLI
//!
//! Offline operator and player tool: commit to a server seed, derive rounds,
//! verify claimed outcomes and estimate return-to-player.

use clap::{Args, Parser, Subcommand};
use fairroll::{
    config::ConfigLoader,
    extractor::sha256_hex,
    games::{CoinSide, GameParams, GameType, OutcomeEngine},
    seeds::ServerSeed,
    verifier::{FairnessVerifier, VerifyRequest},
    FairnessError,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Provably fair outcome engine
#[derive(Parser)]
#[command(name = "fairroll")]
#[command(about = "Commit-reveal fairness engine for dice, coin flip, crash and keno")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a server seed and print its commitment
    Commit {
        /// Client seed to pair with the new server seed
        #[arg(long)]
        client_seed: Option<String>,
    },

    /// Derive one round from explicit seeds
    Derive {
        #[arg(long)]
        server_seed: String,

        #[arg(long)]
        client_seed: String,

        #[arg(long, default_value = "0")]
        nonce: u64,

        #[command(flatten)]
        game: GameArgs,
    },

    /// Verify a claimed outcome read from a JSON request file
    Verify {
        #[arg(long)]
        request: PathBuf,
    },

    /// Estimate return-to-player over fresh seeds
    Simulate {
        #[command(flatten)]
        game: GameArgs,

        #[arg(short, long, default_value = "100000")]
        rounds: u64,
    },
}

#[derive(Args)]
struct GameArgs {
    /// dice | coinflip | crash | keno
    #[arg(short, long)]
    game: GameType,

    /// Dice: win when the roll is above this
    #[arg(long, default_value = "50")]
    target: u8,

    /// Coin flip call
    #[arg(long, default_value = "heads")]
    choice: CoinSide,

    /// Crash: cash-out multiplier
    #[arg(long, default_value = "2.0")]
    cashout: f64,

    /// Keno: comma separated picks
    #[arg(long, value_delimiter = ',', default_value = "7")]
    picks: Vec<u8>,
}

impl GameArgs {
    fn params(&self) -> GameParams {
        match self.game {
            GameType::Dice => GameParams::Dice { target: self.target },
            GameType::CoinFlip => GameParams::CoinFlip { choice: self.choice },
            GameType::Crash => GameParams::Crash { cashout: self.cashout },
            GameType::Keno => GameParams::Keno { picks: self.picks.clone() },
        }
    }
}

/// Operator-side output of `commit`; the server seed stays with the operator
#[derive(Serialize)]
struct CommitOutput {
    server_seed: String,
    server_seed_hash: String,
    client_seed: Option<String>,
}

#[derive(Serialize)]
struct SimulationReport {
    game: GameType,
    params: GameParams,
    rounds: u64,
    wins: u64,
    /// Mean multiplier returned per unit staked
    estimated_rtp: f64,
    house_edge: f64,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let config = loader.load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.monitoring.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let engine = OutcomeEngine::new(config.games.clone());

    match cli.command {
        Commands::Commit { client_seed } => {
            if let Some(seed) = &client_seed {
                fairroll::seeds::types::validate_client_seed(seed)?;
            }
            let server_seed = ServerSeed::generate(config.seeds.server_seed_bytes)?;
            print_json(&CommitOutput {
                server_seed_hash: server_seed.commitment(),
                server_seed: server_seed.as_str().to_string(),
                client_seed,
            })
        }
        Commands::Derive {
            server_seed,
            client_seed,
            nonce,
            game,
        } => {
            let outcome = engine.derive(&server_seed, &client_seed, nonce, &game.params())?;
            print_json(&outcome)
        }
        Commands::Verify { request } => {
            let raw = std::fs::read_to_string(&request)?;
            let request: VerifyRequest = serde_json::from_str(&raw)?;
            let response = FairnessVerifier::new(engine).verify_request(&request)?;
            print_json(&response)
        }
        Commands::Simulate { game, rounds } => {
            let report = simulate(&engine, &game, rounds, config.seeds.server_seed_bytes)?;
            print_json(&report)
        }
    }
}

fn simulate(
    engine: &OutcomeEngine,
    game: &GameArgs,
    rounds: u64,
    seed_bytes: usize,
) -> Result<SimulationReport, FairnessError> {
    if rounds == 0 {
        return Err(FairnessError::InvalidParameters("rounds must be positive".to_string()));
    }
    let params = game.params();
    engine.validate(&params)?;

    let server_seed = ServerSeed::generate(seed_bytes)?;
    let client_seed = "simulation";
    info!(
        game = %game.game,
        rounds,
        server_seed_hash = %sha256_hex(server_seed.as_str().as_bytes()),
        "Starting simulation"
    );

    let mut wins = 0u64;
    let mut returned = 0.0f64;
    for nonce in 0..rounds {
        let outcome = engine.derive(server_seed.as_str(), client_seed, nonce, &params)?;
        if outcome.is_win {
            wins += 1;
            returned += outcome.multiplier;
        }
    }

    Ok(SimulationReport {
        game: game.game,
        params,
        rounds,
        wins,
        estimated_rtp: returned / rounds as f64,
        house_edge: engine.house_edge(game.game),
    })
}
