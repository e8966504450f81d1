//! Beacon CLI - Main entry point
//!
//! Runs result-signing simulations against an in-memory chain and manages
//! the relay configuration they use.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beacon_chain::{LocalChain, RelayConfig};
use beacon_cli::{load_or_default, resolve_config_path, SimulationConfig};
use beacon_core::{DkgResult, MemberKeyPair, ParticipantIndex};

#[derive(Parser)]
#[command(name = "beacon")]
#[command(about = "Threshold relay DKG result-signing simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Relay configuration file (defaults to $BEACON_CONFIG, then ./beacon.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one result-signing phase and submit the result
    Simulate {
        /// Override the configured group size
        #[arg(long)]
        group_size: Option<u16>,

        /// Override the configured honest threshold
        #[arg(long)]
        threshold: Option<u16>,

        /// Member that signs two results (repeatable)
        #[arg(short, long = "equivocator")]
        equivocators: Vec<u16>,

        /// Member that signs a competing result (repeatable)
        #[arg(short, long = "dissenter")]
        dissenters: Vec<u16>,

        /// Group public key of the agreed result (hex, random if omitted)
        #[arg(long)]
        group_public_key: Option<String>,

        /// Milliseconds each member waits for its peers
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Print the hash members sign for a result
    Hash {
        /// Group public key (hex)
        #[arg(long)]
        group_public_key: String,

        /// Misbehaved member index (repeatable)
        #[arg(short, long)]
        misbehaved: Vec<u16>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);

    match cli.command {
        Commands::Simulate {
            group_size,
            threshold,
            equivocators,
            dissenters,
            group_public_key,
            timeout_ms,
        } => {
            let mut relay = load_or_default(&config_path)?;
            if let Some(group_size) = group_size {
                relay.group_size = group_size;
            }
            if let Some(threshold) = threshold {
                relay.honest_threshold = threshold;
            }

            let group_public_key = match group_public_key {
                Some(hex_key) => hex::decode(hex_key.trim_start_matches("0x"))?,
                None => MemberKeyPair::generate(&mut OsRng)
                    .public_key()
                    .as_bytes()
                    .to_vec(),
            };

            let mut simulation = SimulationConfig::new(group_public_key);
            simulation.equivocators = indices(&equivocators)?.into_iter().collect();
            simulation.dissenters = indices(&dissenters)?.into_iter().collect();
            simulation.phase_timeout = Duration::from_millis(timeout_ms);

            simulate(relay, simulation).await
        }

        Commands::Config(ConfigCommands::Init { force }) => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "Config already exists at {:?}, pass --force to overwrite",
                    config_path
                );
            }
            RelayConfig::default().save(&config_path)?;
            println!("Wrote default config to {}", config_path.display());
            Ok(())
        }

        Commands::Config(ConfigCommands::Show) => {
            let relay = load_or_default(&config_path)?;
            println!("{}", serde_json::to_string_pretty(&relay)?);
            println!("Relay entry timeout: {} blocks", relay.relay_entry_timeout());
            Ok(())
        }

        Commands::Hash {
            group_public_key,
            misbehaved,
        } => {
            let relay = load_or_default(&config_path)?;
            let chain = LocalChain::connect(relay)?;
            let result = DkgResult::new(
                hex::decode(group_public_key.trim_start_matches("0x"))?,
                indices(&misbehaved)?,
            );
            println!("{}", chain.calculate_result_hash(&result)?);
            Ok(())
        }
    }
}

async fn simulate(relay: RelayConfig, simulation: SimulationConfig) -> Result<()> {
    let chain = Arc::new(LocalChain::connect(relay).context("Invalid relay configuration")?);
    let mut submissions = chain.on_dkg_result_submitted();

    let report = beacon_cli::run(Arc::clone(&chain), simulation).await?;

    println!("Result hash: {}", report.result_hash);
    println!("\nMembers:");
    for outcome in &report.outcomes {
        let accused: Vec<String> = outcome
            .accusations
            .keys()
            .map(ToString::to_string)
            .collect();
        println!(
            "  {:>3}: prefers {}, {} signatures, accuses [{}]",
            outcome.index,
            outcome.preferred_result_hash.short(),
            outcome.signatures.len(),
            accused.join(", ")
        );
    }

    if let Some(event) = submissions.try_recv() {
        info!("Observed submission event at block {}", event.block_number);
    }
    println!(
        "\nSubmitted by member {} at block {} ({} groups registered)",
        report.submission.member_index,
        report.submission.block_number,
        chain.number_of_groups().await
    );

    Ok(())
}

fn indices(values: &[u16]) -> Result<Vec<ParticipantIndex>> {
    values
        .iter()
        .map(|v| ParticipantIndex::new(*v).map_err(Into::into))
        .collect()
}
