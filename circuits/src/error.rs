//! Error types for the hedge circuit

use thiserror::Error;

/// Failure to lift a raw value into the field
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("Cannot scale non-finite value {0} into the field")]
    NonFinite(f64),
}

/// Proof buffer encode/decode failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Field element `{field}` does not fit in 32 bytes")]
    FieldOverflow { field: &'static str },

    #[error("Oracle price {0} does not fit in 8 bytes")]
    PriceOverflow(u128),

    #[error("Proof buffer too short: {len} bytes (expected at least 200)")]
    BufferTooShort { len: usize },
}

/// Proof generation failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProofError {
    #[error("Invalid private input: {0}")]
    Field(#[from] FieldError),

    #[error("Oracle price {0} cannot be scaled to an integer")]
    InvalidPrice(f64),

    #[error("Proof encoding failed: {0}")]
    Codec(#[from] CodecError),
}

/// Instruction payload assembly failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstructionError {
    #[error("{what} length {len} exceeds u32 length prefix")]
    LengthOverflow { what: &'static str, len: usize },

    #[error("Too few shares: got {got}, need {threshold}")]
    TooFewShares { got: usize, threshold: usize },
}
