//! Commit / challenge / response proof for hedge validity
//!
//! Statement: the prover knows (volatility, threshold, decision) hashing to
//! the public commitment, bound to the public oracle price.
//!
//! 1. commitment   = H(vol, thresh, dec)
//! 2. challenge    = H(commitment, price, vol)          (Fiat-Shamir)
//! 3. response_x   = x + challenge                       (no blinding)
//! 4. verification = H(r_vol, r_thresh, r_dec)
//!
//! Responses carry no randomness, so identical inputs always yield identical
//! proofs and anyone holding the public inputs can recompute the challenge.
//! The on-chain verifier runs exactly this check; it must not be altered
//! independently.

use serde::Serialize;
use thiserror::Error;

use crate::codec;
use crate::error::{CodecError, ProofError};
use crate::field::FieldElement;
use crate::poseidon::PoseidonHasher;

/// Oracle prices are carried with 8 decimal places
pub const PRICE_SCALE: f64 = 1e8;

/// Private inputs, never transmitted
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateWitness {
    pub volatility: FieldElement,
    pub threshold: FieldElement,
    pub decision: FieldElement,
}

impl PrivateWitness {
    /// Lift raw agent values into the field (volatility scaled by 1e10)
    pub fn from_raw(volatility: f64, threshold: i128, decision: bool) -> Result<Self, ProofError> {
        Ok(Self {
            volatility: FieldElement::from_scaled_f64(volatility)?,
            threshold: FieldElement::from_i128(threshold),
            decision: FieldElement::from(decision),
        })
    }
}

impl std::fmt::Debug for PrivateWitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateWitness { .. }")
    }
}

/// Public inputs shared with the verifier
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublicInputs {
    pub commitment: FieldElement,
    /// price · 1e8, must fit in 8 bytes to be encoded
    pub oracle_price: u128,
}

/// Convert a float price to its 8-decimal integer form (truncating)
pub fn scale_price(price: f64) -> Result<u128, ProofError> {
    let scaled = (price * PRICE_SCALE).trunc();
    if !scaled.is_finite() || scaled < 0.0 || scaled > u128::MAX as f64 {
        return Err(ProofError::InvalidPrice(price));
    }
    Ok(scaled as u128)
}

/// Hedge validity proof
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Proof {
    pub commitment: FieldElement,
    pub challenge: FieldElement,
    pub response_volatility: FieldElement,
    pub response_threshold: FieldElement,
    pub response_decision: FieldElement,
    pub verification_hash: FieldElement,
    pub public_oracle_price: u128,
}

impl Proof {
    pub fn responses(&self) -> [&FieldElement; 3] {
        [
            &self.response_volatility,
            &self.response_threshold,
            &self.response_decision,
        ]
    }
}

/// A single reason a proof was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyFailure {
    #[error("Commitment mismatch: {actual} != {expected}")]
    CommitmentMismatch { expected: FieldElement, actual: FieldElement },

    #[error("Oracle price mismatch: {actual} != {expected}")]
    PublicInputMismatch { expected: u128, actual: u128 },

    #[error("Verification hash mismatch: {actual} != {expected}")]
    VerificationHashMismatch { expected: FieldElement, actual: FieldElement },

    #[error("Response `{field}` out of field range")]
    FieldElementOutOfRange { field: &'static str },
}

/// Outcome of verification; every check is always evaluated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub failures: Vec<VerifyFailure>,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn has(&self, predicate: impl Fn(&VerifyFailure) -> bool) -> bool {
        self.failures.iter().any(predicate)
    }
}

impl std::fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            return f.write_str("valid");
        }
        let reasons: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
        write!(f, "invalid: {}", reasons.join("; "))
    }
}

/// Prover and verifier for the hedge statement
#[derive(Debug, Clone, Default)]
pub struct HedgeProver {
    hasher: PoseidonHasher,
}

impl HedgeProver {
    pub fn new(hasher: PoseidonHasher) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &PoseidonHasher {
        &self.hasher
    }

    /// Commitment from raw values
    pub fn commit(
        &self,
        volatility: f64,
        threshold: i128,
        decision: bool,
    ) -> Result<FieldElement, ProofError> {
        let witness = PrivateWitness::from_raw(volatility, threshold, decision)?;
        Ok(self.commit_witness(&witness))
    }

    pub fn commit_witness(&self, witness: &PrivateWitness) -> FieldElement {
        self.hasher.hash(&[
            witness.volatility.clone(),
            witness.threshold.clone(),
            witness.decision.clone(),
        ])
    }

    /// Build the proof. A commitment that disagrees with `public` is logged
    /// and the proof is still produced from the recomputed commitment.
    pub fn generate(&self, witness: &PrivateWitness, public: &PublicInputs) -> Proof {
        let commitment = self.commit_witness(witness);
        if commitment != public.commitment {
            tracing::warn!(
                computed = %commitment.to_hex(),
                expected = %public.commitment.to_hex(),
                "Computed commitment differs from public commitment"
            );
        }

        let challenge = self.hasher.hash(&[
            commitment.clone(),
            FieldElement::from(public.oracle_price),
            witness.volatility.clone(),
        ]);

        let response_volatility = &witness.volatility + &challenge;
        let response_threshold = &witness.threshold + &challenge;
        let response_decision = &witness.decision + &challenge;

        let verification_hash = self.hasher.hash(&[
            response_volatility.clone(),
            response_threshold.clone(),
            response_decision.clone(),
        ]);

        Proof {
            commitment,
            challenge,
            response_volatility,
            response_threshold,
            response_decision,
            verification_hash,
            public_oracle_price: public.oracle_price,
        }
    }

    /// Check a proof against public inputs, collecting every failure
    pub fn verify(&self, proof: &Proof, public: &PublicInputs) -> VerificationReport {
        let mut failures = Vec::new();

        if proof.commitment != public.commitment {
            failures.push(VerifyFailure::CommitmentMismatch {
                expected: public.commitment.clone(),
                actual: proof.commitment.clone(),
            });
        }

        if proof.public_oracle_price != public.oracle_price {
            failures.push(VerifyFailure::PublicInputMismatch {
                expected: public.oracle_price,
                actual: proof.public_oracle_price,
            });
        }

        let computed = self.hasher.hash(&proof.responses().map(FieldElement::clone));
        if computed != proof.verification_hash {
            failures.push(VerifyFailure::VerificationHashMismatch {
                expected: computed,
                actual: proof.verification_hash.clone(),
            });
        }

        let names = ["response_volatility", "response_threshold", "response_decision"];
        for (field, response) in names.into_iter().zip(proof.responses()) {
            if !response.is_canonical() {
                failures.push(VerifyFailure::FieldElementOutOfRange { field });
            }
        }

        let report = VerificationReport { failures };
        if !report.is_valid() {
            tracing::debug!(%report, "Proof rejected");
        }
        report
    }

    /// Generate and encode in one step
    pub fn generate_bytes(
        &self,
        witness: &PrivateWitness,
        public: &PublicInputs,
    ) -> Result<codec::ProofBuffer, ProofError> {
        let proof = self.generate(witness, public);
        Ok(codec::serialize(&proof)?)
    }

    /// Decode and verify; a short buffer is an error rather than a report
    pub fn verify_bytes(
        &self,
        buffer: &[u8],
        public: &PublicInputs,
    ) -> Result<VerificationReport, CodecError> {
        let proof = codec::deserialize(buffer)?;
        Ok(self.verify(&proof, public))
    }
}
