//! Aegis hedge agent
//!
//! Polls the oracle, decides whether to hedge, and proves the decision
//! on-chain through `trigger_hedge`.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aegis_agent::model::load_model;
use aegis_agent::oracle::HermesOracle;
use aegis_agent::submit::{
    initialize_config, parse_address, to_pubkey, ConfigInit, HedgeSubmitter, SolanaSubmitter,
};
use aegis_agent::vault::InputVault;
use aegis_agent::{Config, CycleOutcome, HedgePipeline, PipelineSettings};
use aegis_circuit::instruction::{initialize_config_call, GLOBAL_NAMESPACE};
use aegis_circuit::{
    discriminator, scale_price, FieldElement, HedgeProver, PrivateWitness, PublicInputs,
};

const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

#[derive(Parser)]
#[command(name = "aegis-agent")]
#[command(about = "Autonomous hedge agent with commitment proofs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the oracle and hedge until interrupted
    Run {
        /// Override POLL_INTERVAL_SECONDS
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval: Option<u64>,

        /// Build transactions without sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a single hedge cycle
    Once {
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate a proof from explicit inputs
    Prove {
        #[arg(long)]
        volatility: f64,

        /// Yield threshold scaled by 1e10
        #[arg(long, default_value_t = 500_000_000)]
        threshold: i128,

        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        decision: bool,

        /// Oracle price as a decimal (scaled by 1e8)
        #[arg(long)]
        price: f64,
    },

    /// Verify a hex-encoded proof against public inputs
    Verify {
        #[arg(long)]
        proof_hex: String,

        /// Commitment, decimal or 0x-prefixed hex
        #[arg(long)]
        commitment: String,

        #[arg(long)]
        price: f64,
    },

    /// Print an instruction discriminator
    Discriminator {
        name: String,

        #[arg(long, default_value = GLOBAL_NAMESPACE)]
        namespace: String,
    },

    /// Create the program's global config account
    InitConfig {
        /// Minimum collateral ratio (8 decimals, 150% = 150000000)
        #[arg(long, default_value_t = 150_000_000)]
        min_ratio: u64,

        #[arg(long = "collateral")]
        collaterals: Vec<String>,

        #[arg(long = "oracle")]
        oracles: Vec<String>,

        #[arg(long, default_value = WRAPPED_SOL_MINT)]
        mint: String,

        #[arg(long)]
        dry_run: bool,
    },

    /// Print a fresh vault key
    Keygen,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aegis_agent=info,aegis_circuit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { poll_interval, dry_run } => {
            let mut config = Config::from_env()?;
            config.dry_run |= dry_run;
            let interval =
                Duration::from_secs(poll_interval.unwrap_or(config.poll_interval_seconds));

            let mut pipeline = build_pipeline(&config)?;
            tracing::info!(
                interval_secs = interval.as_secs(),
                cooldown_secs = config.hedge_cooldown_seconds,
                dry_run = config.dry_run,
                "Starting hedge loop"
            );

            tokio::select! {
                _ = pipeline.run(interval) => {}
                _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
            }
        }

        Commands::Once { dry_run } => {
            let mut config = Config::from_env()?;
            config.dry_run |= dry_run;

            let mut pipeline = build_pipeline(&config)?;
            match pipeline.cycle().await? {
                CycleOutcome::NoHedge => println!("No hedge"),
                CycleOutcome::RateLimited { remaining } => {
                    println!("Rate limited, {}s remaining", remaining.as_secs())
                }
                CycleOutcome::ProofRejected(report) => println!("Proof rejected: {}", report),
                CycleOutcome::DryRun(call) => {
                    println!("Dry run: {} accounts", call.accounts.len());
                    println!("Data: {}", hex::encode(&call.data));
                }
                CycleOutcome::Submitted { signature } => {
                    println!("Submitted: {}", signature);
                    println!(
                        "Explorer: https://explorer.solana.com/tx/{}?cluster=devnet",
                        signature
                    );
                }
            }
        }

        Commands::Prove { volatility, threshold, decision, price } => {
            let prover = HedgeProver::default();
            let witness = PrivateWitness::from_raw(volatility, threshold, decision)?;
            let public = PublicInputs {
                commitment: prover.commit_witness(&witness),
                oracle_price: scale_price(price)?,
            };

            let proof = prover.generate(&witness, &public);
            let bytes = aegis_circuit::serialize(&proof)?;

            println!("{}", serde_json::to_string_pretty(&proof)?);
            println!("Commitment: {}", public.commitment.to_hex());
            println!("Proof: {}", hex::encode(bytes));
        }

        Commands::Verify { proof_hex, commitment, price } => {
            let bytes =
                hex::decode(proof_hex.trim_start_matches("0x")).context("Invalid proof hex")?;
            let public = PublicInputs {
                commitment: FieldElement::parse(&commitment).context("Invalid commitment")?,
                oracle_price: scale_price(price)?,
            };

            let report = HedgeProver::default().verify_bytes(&bytes, &public)?;
            println!("{}", report);
            if !report.is_valid() {
                anyhow::bail!("Proof verification failed");
            }
        }

        Commands::Discriminator { name, namespace } => {
            println!("{}", hex::encode(discriminator(&namespace, &name)));
        }

        Commands::InitConfig { min_ratio, collaterals, oracles, mint, dry_run } => {
            let config = Config::from_env()?;
            let program_id = parse_address(&config.program_id)?;
            let submitter =
                SolanaSubmitter::from_keypair_file(&config.rpc_url, &config.wallet_keypair_path)?;

            let collaterals = collaterals
                .iter()
                .map(|s| parse_address(s))
                .collect::<Result<Vec<_>, _>>()?;
            let oracles = oracles
                .iter()
                .map(|s| parse_address(s))
                .collect::<Result<Vec<_>, _>>()?;

            let call = initialize_config_call(
                submitter.deriver(),
                &program_id,
                &submitter.caller(),
                &parse_address(&mint)?,
                &config.pda_seeds(),
                min_ratio,
                &collaterals,
                &oracles,
            )?;

            let config_pda = call.accounts[0].address;
            println!("Config PDA: {}", to_pubkey(&config_pda));

            match initialize_config(&submitter, &call, dry_run || config.dry_run).await? {
                ConfigInit::DryRun => println!("Data: {}", hex::encode(&call.data)),
                ConfigInit::AlreadyInitialized => println!("Config account already initialized"),
                ConfigInit::Initialized { signature } => {
                    println!("Config initialized: {}", signature)
                }
            }
        }

        Commands::Keygen => {
            println!("{}", hex::encode(InputVault::generate_key()));
        }
    }

    Ok(())
}

fn build_pipeline(config: &Config) -> Result<HedgePipeline> {
    let program_id = parse_address(&config.program_id)?;

    let oracle = Arc::new(HermesOracle::new(&config.hermes_url, &config.asset_id)?);
    let model = load_model(config.model_path.as_deref())?;
    let vault = match &config.vault_key {
        Some(key) => InputVault::from_hex(key)?,
        None => InputVault::ephemeral(),
    };
    let submitter = Arc::new(
        SolanaSubmitter::from_keypair_file(&config.rpc_url, &config.wallet_keypair_path)
            .context("Failed to load wallet")?,
    );

    tracing::info!(
        wallet = %to_pubkey(&submitter.caller()),
        program = %config.program_id,
        asset = %config.asset_id,
        "Agent initialized"
    );

    Ok(HedgePipeline::new(
        oracle,
        model,
        vault,
        submitter,
        PipelineSettings::from_config(config, program_id),
    ))
}
