//! Hedge cycle orchestration
//!
//! One cycle: sample oracle → seal/open inputs → decide → cooldown gate →
//! prove → verify locally → encode `trigger_hedge` → submit.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use aegis_circuit::instruction::trigger_hedge_call;
use aegis_circuit::shares::DEFAULT_SECRET;
use aegis_circuit::{
    scale_price, split_shares, Address, HedgeProver, PdaSeeds, PrivateWitness, ProgramCall,
    PublicInputs, VerificationReport,
};

use crate::config::Config;
use crate::error::Result;
use crate::model::DecisionModel;
use crate::oracle::{PriceOracle, PriceWindow};
use crate::submit::HedgeSubmitter;
use crate::vault::InputVault;

/// Shortest period `run` will poll at
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What a cycle ended with
#[derive(Debug)]
pub enum CycleOutcome {
    NoHedge,
    RateLimited { remaining: Duration },
    ProofRejected(VerificationReport),
    DryRun(ProgramCall),
    Submitted { signature: String },
}

/// One hedge per `period`
#[derive(Debug, Clone)]
pub struct HedgeCooldown {
    period: Duration,
    last_hedge: Option<DateTime<Utc>>,
}

impl HedgeCooldown {
    pub fn new(period: Duration) -> Self {
        Self { period, last_hedge: None }
    }

    /// Time left before the next hedge is allowed, if any
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.last_hedge?;
        let elapsed = (now - last).to_std().unwrap_or_default();
        self.period.checked_sub(elapsed).filter(|left| !left.is_zero())
    }

    pub fn record(&mut self, at: DateTime<Utc>) {
        self.last_hedge = Some(at);
    }

    pub fn next_available(&self) -> Option<DateTime<Utc>> {
        let period = chrono::Duration::from_std(self.period).ok()?;
        self.last_hedge.map(|last| last + period)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub program_id: Address,
    pub seeds: PdaSeeds,
    pub yield_threshold: i128,
    pub max_staleness_seconds: u64,
    pub price_history_len: usize,
    pub hedge_cooldown: Duration,
    pub dry_run: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &Config, program_id: Address) -> Self {
        Self {
            program_id,
            seeds: config.pda_seeds(),
            yield_threshold: config.yield_threshold,
            max_staleness_seconds: config.max_staleness_seconds,
            price_history_len: config.price_history_len,
            hedge_cooldown: Duration::from_secs(config.hedge_cooldown_seconds),
            dry_run: config.dry_run,
        }
    }
}

pub struct HedgePipeline {
    oracle: Arc<dyn PriceOracle>,
    model: Box<dyn DecisionModel>,
    vault: InputVault,
    submitter: Arc<dyn HedgeSubmitter>,
    prover: HedgeProver,
    window: PriceWindow,
    cooldown: HedgeCooldown,
    settings: PipelineSettings,
}

impl HedgePipeline {
    pub fn new(
        oracle: Arc<dyn PriceOracle>,
        model: Box<dyn DecisionModel>,
        vault: InputVault,
        submitter: Arc<dyn HedgeSubmitter>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            oracle,
            model,
            vault,
            submitter,
            prover: HedgeProver::default(),
            window: PriceWindow::new(settings.price_history_len),
            cooldown: HedgeCooldown::new(settings.hedge_cooldown),
            settings,
        }
    }

    pub fn cooldown(&self) -> &HedgeCooldown {
        &self.cooldown
    }

    pub async fn cycle(&mut self) -> Result<CycleOutcome> {
        self.cycle_at(Utc::now()).await
    }

    pub async fn cycle_at(&mut self, now: DateTime<Utc>) -> Result<CycleOutcome> {
        let quote = self.oracle.latest_price().await?;
        quote.validate(now.timestamp(), self.settings.max_staleness_seconds)?;
        let sample = self.window.push(quote.price);

        let sealed_yield = self.vault.seal(sample.yield_rate)?;
        let sealed_volatility = self.vault.seal(sample.volatility)?;
        let yield_rate = self.vault.open(&sealed_yield)?;
        let volatility = self.vault.open(&sealed_volatility)?;

        let decision = self.model.decide(yield_rate, volatility)?;
        tracing::info!(
            price = sample.price,
            yield_rate,
            volatility,
            decision,
            model = self.model.name(),
            "Market sampled"
        );

        if !decision {
            return Ok(CycleOutcome::NoHedge);
        }

        if let Some(remaining) = self.cooldown.remaining(now) {
            tracing::info!(
                remaining_secs = remaining.as_secs(),
                next = ?self.cooldown.next_available(),
                "Hedge rate limited"
            );
            return Ok(CycleOutcome::RateLimited { remaining });
        }

        let witness = PrivateWitness::from_raw(volatility, self.settings.yield_threshold, true)?;
        let public = PublicInputs {
            commitment: self.prover.commit_witness(&witness),
            oracle_price: scale_price(sample.price)?,
        };

        let proof = self.prover.generate_bytes(&witness, &public)?;
        let report = self.prover.verify_bytes(&proof, &public)?;
        if !report.is_valid() {
            tracing::warn!(%report, "Local verification failed, skipping submission");
            return Ok(CycleOutcome::ProofRejected(report));
        }
        tracing::debug!(commitment = %public.commitment.to_hex(), "Proof generated and verified");

        let shares = split_shares(DEFAULT_SECRET);
        let call = trigger_hedge_call(
            self.submitter.deriver(),
            &self.settings.program_id,
            &self.submitter.caller(),
            &self.settings.seeds,
            decision,
            &proof,
            &shares,
        )?;

        if self.settings.dry_run {
            tracing::info!(bytes = call.data.len(), "Dry run, transaction not sent");
            return Ok(CycleOutcome::DryRun(call));
        }

        let signature = self.submitter.submit(&call).await?;
        self.cooldown.record(now);
        tracing::info!(%signature, next = ?self.cooldown.next_available(), "Hedge executed");

        Ok(CycleOutcome::Submitted { signature })
    }

    /// Poll forever; failed cycles are logged and the loop continues.
    /// Periods below `MIN_POLL_INTERVAL` are raised to it.
    pub async fn run(&mut self, poll_interval: Duration) {
        let mut ticker = tokio::time::interval(poll_interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.cycle().await {
                Ok(outcome) => tracing::debug!(?outcome, "Cycle complete"),
                Err(e) => tracing::error!(error = %e, "Hedge cycle failed"),
            }
        }
    }
}
