use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aegis_agent::error::{AgentError, Result};
use aegis_agent::model::{DecisionModel, RiskRuleModel};
use aegis_agent::oracle::{PriceOracle, PriceQuote};
use aegis_agent::submit::HedgeSubmitter;
use aegis_agent::vault::InputVault;
use aegis_agent::{CycleOutcome, HedgePipeline, PipelineSettings};
use aegis_circuit::{
    deserialize, discriminator, Address, AddressDeriver, HedgeProver, PdaSeeds, ProgramCall,
    PROOF_LEN,
};

const NOW: i64 = 1_700_000_000;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

struct ScriptedOracle {
    quotes: Mutex<VecDeque<PriceQuote>>,
}

impl ScriptedOracle {
    fn new(quotes: impl IntoIterator<Item = PriceQuote>) -> Arc<Self> {
        Arc::new(Self {
            quotes: Mutex::new(quotes.into_iter().collect()),
        })
    }
}

#[async_trait]
impl PriceOracle for ScriptedOracle {
    async fn latest_price(&self) -> Result<PriceQuote> {
        self.quotes
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::Oracle("no more quotes".to_string()))
    }
}

struct FixedDecision(bool);

impl DecisionModel for FixedDecision {
    fn decide(&self, _yield_rate: f64, _volatility: f64) -> Result<bool> {
        Ok(self.0)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

struct FirstSeedDeriver;

impl AddressDeriver for FirstSeedDeriver {
    fn derive(&self, seeds: &[&[u8]], _program_id: &Address) -> Address {
        let mut out = [0u8; 32];
        for (o, b) in out.iter_mut().zip(seeds[0]) {
            *o = *b;
        }
        Address::new(out)
    }
}

#[derive(Default)]
struct RecordingSubmitter {
    calls: Mutex<Vec<ProgramCall>>,
    fail: bool,
}

#[async_trait]
impl HedgeSubmitter for RecordingSubmitter {
    fn caller(&self) -> Address {
        Address::new([0xaa; 32])
    }

    fn deriver(&self) -> &dyn AddressDeriver {
        &FirstSeedDeriver
    }

    async fn submit(&self, call: &ProgramCall) -> Result<String> {
        if self.fail {
            return Err(AgentError::Submission("node unavailable".to_string()));
        }
        let mut calls = self.calls.lock().unwrap();
        calls.push(call.clone());
        Ok(format!("sig{}", calls.len()))
    }

    async fn account_exists(&self, _address: &Address) -> Result<bool> {
        Ok(false)
    }
}

fn settings(dry_run: bool) -> PipelineSettings {
    PipelineSettings {
        program_id: Address::new([0x11; 32]),
        seeds: PdaSeeds::default(),
        yield_threshold: 500_000_000,
        max_staleness_seconds: 60,
        price_history_len: 5,
        hedge_cooldown: Duration::from_secs(3600),
        dry_run,
    }
}

fn quote(price: f64) -> PriceQuote {
    PriceQuote { price, publish_time: NOW }
}

fn pipeline(
    quotes: Vec<PriceQuote>,
    model: Box<dyn DecisionModel>,
    submitter: Arc<RecordingSubmitter>,
    dry_run: bool,
) -> HedgePipeline {
    HedgePipeline::new(
        ScriptedOracle::new(quotes),
        model,
        InputVault::ephemeral(),
        submitter,
        settings(dry_run),
    )
}

#[tokio::test]
async fn test_no_hedge_skips_submission() {
    let submitter = Arc::new(RecordingSubmitter::default());
    let mut pipeline = pipeline(
        vec![quote(150.0)],
        Box::new(FixedDecision(false)),
        submitter.clone(),
        false,
    );

    let outcome = pipeline.cycle_at(at(NOW)).await.unwrap();
    assert!(matches!(outcome, CycleOutcome::NoHedge));
    assert!(submitter.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_hedge_submits_verifiable_proof() {
    let submitter = Arc::new(RecordingSubmitter::default());
    let mut pipeline = pipeline(
        vec![quote(150.25)],
        Box::new(FixedDecision(true)),
        submitter.clone(),
        false,
    );

    let outcome = pipeline.cycle_at(at(NOW)).await.unwrap();
    assert!(matches!(outcome, CycleOutcome::Submitted { ref signature } if signature == "sig1"));

    let calls = submitter.calls.lock().unwrap();
    let call = &calls[0];
    assert_eq!(call.program_id, Address::new([0x11; 32]));
    assert_eq!(call.accounts.len(), 4);
    assert_eq!(call.accounts[2].address, Address::new([0xaa; 32]));
    assert!(call.accounts[2].is_signer);

    let data = &call.data;
    assert_eq!(&data[..8], &discriminator("global", "trigger_hedge"));
    assert_eq!(data[8], 1);
    assert_eq!(&data[9..13], &(PROOF_LEN as u32).to_le_bytes());

    let proof = deserialize(&data[13..13 + PROOF_LEN]).unwrap();
    assert_eq!(proof.public_oracle_price, 15_025_000_000);

    // first sample has zero volatility
    let prover = HedgeProver::default();
    let commitment = prover.commit(0.0, 500_000_000, true).unwrap();
    assert_eq!(proof.commitment, commitment);
}

#[tokio::test]
async fn test_second_hedge_within_cooldown_is_rate_limited() {
    let submitter = Arc::new(RecordingSubmitter::default());
    let mut pipeline = pipeline(
        vec![quote(150.0), quote(151.0), PriceQuote { price: 152.0, publish_time: NOW + 3600 }],
        Box::new(FixedDecision(true)),
        submitter.clone(),
        false,
    );

    assert!(matches!(
        pipeline.cycle_at(at(NOW)).await.unwrap(),
        CycleOutcome::Submitted { .. }
    ));

    match pipeline.cycle_at(at(NOW + 60)).await.unwrap() {
        CycleOutcome::RateLimited { remaining } => assert_eq!(remaining, Duration::from_secs(3540)),
        other => panic!("expected rate limit, got {:?}", other),
    }

    assert!(matches!(
        pipeline.cycle_at(at(NOW + 3600)).await.unwrap(),
        CycleOutcome::Submitted { .. }
    ));
    assert_eq!(submitter.calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_dry_run_builds_call_without_sending() {
    let submitter = Arc::new(RecordingSubmitter::default());
    let mut pipeline = pipeline(
        vec![quote(150.0), quote(150.0)],
        Box::new(FixedDecision(true)),
        submitter.clone(),
        true,
    );

    for offset in [0, 60] {
        match pipeline.cycle_at(at(NOW + offset)).await.unwrap() {
            CycleOutcome::DryRun(call) => assert_eq!(call.data.len(), 327),
            other => panic!("expected dry run, got {:?}", other),
        }
    }
    assert!(submitter.calls.lock().unwrap().is_empty());
    assert!(pipeline.cooldown().next_available().is_none());
}

#[tokio::test]
async fn test_stale_quote_aborts_cycle() {
    let submitter = Arc::new(RecordingSubmitter::default());
    let stale = PriceQuote { price: 150.0, publish_time: NOW - 61 };
    let mut pipeline =
        pipeline(vec![stale], Box::new(FixedDecision(true)), submitter.clone(), false);

    let err = pipeline.cycle_at(at(NOW)).await.unwrap_err();
    assert!(matches!(err, AgentError::StaleData { age: 61, max: 60 }));
    assert!(submitter.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_submission_does_not_start_cooldown() {
    let submitter = Arc::new(RecordingSubmitter { fail: true, ..Default::default() });
    let mut pipeline =
        pipeline(vec![quote(150.0)], Box::new(FixedDecision(true)), submitter, false);

    assert!(matches!(
        pipeline.cycle_at(at(NOW)).await,
        Err(AgentError::Submission(_))
    ));
    assert!(pipeline.cooldown().next_available().is_none());
}

#[tokio::test]
async fn test_risk_rule_hedges_on_low_yield() {
    // price 20 → yield 0.02, below the 0.05 floor
    let submitter = Arc::new(RecordingSubmitter::default());
    let mut pipeline = pipeline(
        vec![quote(20.0)],
        Box::new(RiskRuleModel::default()),
        submitter.clone(),
        false,
    );

    assert!(matches!(
        pipeline.cycle_at(at(NOW)).await.unwrap(),
        CycleOutcome::Submitted { .. }
    ));
}

#[tokio::test]
async fn test_run_with_zero_interval_keeps_polling() {
    let submitter = Arc::new(RecordingSubmitter::default());
    let mut pipeline = pipeline(vec![], Box::new(FixedDecision(false)), submitter.clone(), false);

    // empty oracle: every cycle fails and the loop carries on until the timeout
    let result =
        tokio::time::timeout(Duration::from_millis(50), pipeline.run(Duration::ZERO)).await;
    assert!(result.is_err());
    assert!(submitter.calls.lock().unwrap().is_empty());
}
