//! Fixed 256-byte proof layout
//!
//! ```text
//! [  0.. 32) commitment          (big-endian)
//! [ 32.. 64) challenge
//! [ 64.. 96) response_volatility
//! [ 96..128) response_threshold
//! [128..160) response_decision
//! [160..192) verification_hash
//! [192..200) oracle price        (u64 big-endian)
//! [200..256) zero padding        (ignored on decode)
//! ```
//!
//! The layout is shared with the on-chain verifier.

use crate::error::CodecError;
use crate::field::{FieldElement, FIELD_BYTES};
use crate::proof::Proof;

/// Encoded proof size (fits a single Solana transaction)
pub const PROOF_LEN: usize = 256;

/// Bytes carrying data; the remainder is reserved padding
pub const MEANINGFUL_LEN: usize = 200;

const PRICE_OFFSET: usize = 6 * FIELD_BYTES;

pub type ProofBuffer = [u8; PROOF_LEN];

/// Encode a proof into its 256-byte wire form
pub fn serialize(proof: &Proof) -> Result<ProofBuffer, CodecError> {
    let mut buffer = [0u8; PROOF_LEN];

    let fields: [(&'static str, &FieldElement); 6] = [
        ("commitment", &proof.commitment),
        ("challenge", &proof.challenge),
        ("response_volatility", &proof.response_volatility),
        ("response_threshold", &proof.response_threshold),
        ("response_decision", &proof.response_decision),
        ("verification_hash", &proof.verification_hash),
    ];

    for (i, (field, element)) in fields.into_iter().enumerate() {
        let bytes = element
            .to_be_bytes()
            .ok_or(CodecError::FieldOverflow { field })?;
        buffer[i * FIELD_BYTES..(i + 1) * FIELD_BYTES].copy_from_slice(&bytes);
    }

    let price = u64::try_from(proof.public_oracle_price)
        .map_err(|_| CodecError::PriceOverflow(proof.public_oracle_price))?;
    buffer[PRICE_OFFSET..MEANINGFUL_LEN].copy_from_slice(&price.to_be_bytes());

    Ok(buffer)
}

/// Decode a proof from at least 200 bytes; trailing bytes are not inspected
pub fn deserialize(buffer: &[u8]) -> Result<Proof, CodecError> {
    if buffer.len() < MEANINGFUL_LEN {
        return Err(CodecError::BufferTooShort { len: buffer.len() });
    }

    let word = |i: usize| {
        FieldElement::from_be_bytes_unreduced(&buffer[i * FIELD_BYTES..(i + 1) * FIELD_BYTES])
    };

    let mut price = [0u8; 8];
    price.copy_from_slice(&buffer[PRICE_OFFSET..MEANINGFUL_LEN]);

    Ok(Proof {
        commitment: word(0),
        challenge: word(1),
        response_volatility: word(2),
        response_threshold: word(3),
        response_decision: word(4),
        verification_hash: word(5),
        public_oracle_price: u128::from(u64::from_be_bytes(price)),
    })
}
