//! Autonomous hedge agent
//!
//! Samples a Pyth price feed, runs a decision model over derived yield and
//! volatility, and when a hedge is warranted proves the decision with the
//! `aegis-circuit` commitment proof and submits `trigger_hedge` to Solana.

pub mod config;
pub mod error;
pub mod model;
pub mod oracle;
pub mod pipeline;
pub mod submit;
pub mod vault;

pub use config::Config;
pub use error::{AgentError, Result};
pub use pipeline::{CycleOutcome, HedgeCooldown, HedgePipeline, PipelineSettings};
