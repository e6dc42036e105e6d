//! Configuration management

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use aegis_circuit::PdaSeeds;

/// 0.05 scaled by 1e10
pub const DEFAULT_YIELD_THRESHOLD: i128 = 500_000_000;

#[derive(Clone, Debug)]
pub struct Config {
    pub rpc_url: String,
    pub program_id: String,
    pub wallet_keypair_path: PathBuf,
    /// Pyth price feed id
    pub asset_id: String,
    pub hermes_url: String,
    pub poll_interval_seconds: u64,
    pub hedge_cooldown_seconds: u64,
    pub max_staleness_seconds: u64,
    pub price_history_len: usize,
    pub yield_threshold: i128,
    pub model_path: Option<PathBuf>,
    /// Hex vault key; a fresh key is generated per process when unset
    pub vault_key: Option<String>,
    pub dry_run: bool,
    pub position_seed: String,
    pub config_seed: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let home = lookup("HOME");

        let poll_interval_seconds: u64 = var("POLL_INTERVAL_SECONDS", "60")
            .parse()
            .context("Invalid POLL_INTERVAL_SECONDS")?;
        anyhow::ensure!(
            poll_interval_seconds > 0,
            "Invalid POLL_INTERVAL_SECONDS: must be at least 1"
        );

        Ok(Self {
            rpc_url: var("RPC_URL", "https://api.devnet.solana.com"),

            program_id: var("PROGRAM_ID", "55XeLRYQTn24sEDvTxM2UfDQp8z8oZ7mA8DSkFmD2kzN"),

            wallet_keypair_path: expand_home(
                &var("WALLET_KEYPAIR_PATH", "~/.config/solana/id.json"),
                home.as_deref(),
            ),

            // SOL/USD
            asset_id: var(
                "ASSET_ID",
                "0xef0d8b6fda2ceba41da15d4095d1da392a0d2f8ed0c6c7bc0f4cfac8c280b56d",
            ),

            hermes_url: var("HERMES_URL", "https://hermes.pyth.network"),

            poll_interval_seconds,

            hedge_cooldown_seconds: var("HEDGE_COOLDOWN_SECONDS", "3600")
                .parse()
                .context("Invalid HEDGE_COOLDOWN_SECONDS")?,

            max_staleness_seconds: var("MAX_STALENESS_SECONDS", "60")
                .parse()
                .context("Invalid MAX_STALENESS_SECONDS")?,

            price_history_len: var("PRICE_HISTORY_LEN", "5")
                .parse()
                .context("Invalid PRICE_HISTORY_LEN")?,

            yield_threshold: var("YIELD_THRESHOLD", &DEFAULT_YIELD_THRESHOLD.to_string())
                .parse()
                .context("Invalid YIELD_THRESHOLD")?,

            model_path: lookup("MODEL_PATH").map(|p| expand_home(&p, home.as_deref())),

            vault_key: lookup("VAULT_KEY"),

            dry_run: var("DRY_RUN", "false")
                .parse()
                .context("Invalid DRY_RUN")?,

            position_seed: var("POSITION_SEED", "position"),

            config_seed: var("CONFIG_SEED", "config"),
        })
    }

    pub fn pda_seeds(&self) -> PdaSeeds {
        PdaSeeds {
            position: self.position_seed.as_bytes().to_vec(),
            config: self.config_seed.as_bytes().to_vec(),
        }
    }
}

fn expand_home(path: &str, home: Option<&str>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
