//! Error types for the hedge agent

use aegis_circuit::{CodecError, InstructionError, ProofError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Stale oracle data: published {age}s ago (max {max}s)")]
    StaleData { age: i64, max: u64 },

    #[error("Invalid oracle price: {0}")]
    InvalidPrice(f64),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Invalid vault key: expected 32 bytes, got {0}")]
    InvalidKey(usize),

    #[error("Vault token could not be opened")]
    InvalidToken,

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Proof generation failed: {0}")]
    Proof(#[from] ProofError),

    #[error("Proof encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("Instruction encoding failed: {0}")]
    Instruction(#[from] InstructionError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::Oracle(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
