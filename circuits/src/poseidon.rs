//! Poseidon-style permutation hash over the StarkNet field
//!
//! ## parameters
//!
//! - state width: 3 (one capacity slot, two rate slots)
//! - rounds: 4 full + 83 partial + 4 full
//! - s-box: x^5
//! - mds: [[3,1,1],[1,3,1],[1,1,3]]
//!
//! Round constants come from a fixed linear-congruential expansion, so any
//! two `PoseidonParams::new()` produce identical digests. The on-chain
//! verifier evaluates the same parameters; changing any of them breaks
//! proof acceptance.

use std::sync::Arc;

use crate::field::FieldElement;

pub const STATE_WIDTH: usize = 3;
pub const RATE: usize = STATE_WIDTH - 1;
pub const FULL_ROUNDS: usize = 8;
pub const PARTIAL_ROUNDS: usize = 83;

/// "Poseidon" in ASCII
const CONSTANT_SEED: u64 = 0x506f736569646f6e;
const LCG_MULTIPLIER: u64 = 0x1234567890abcdef;
const LCG_INCREMENT: u64 = 0xfedcba0987654321;

const MDS: [[u64; STATE_WIDTH]; STATE_WIDTH] = [[3, 1, 1], [1, 3, 1], [1, 1, 3]];

/// Sponge state: slot 0 is capacity, slots 1..3 absorb input
pub type HashState = [FieldElement; STATE_WIDTH];

/// Immutable permutation constants
#[derive(Debug, Clone)]
pub struct PoseidonParams {
    /// number of full rounds, split evenly around the partial block
    pub rounds_f: usize,
    /// number of partial rounds
    pub rounds_p: usize,
    round_constants: Vec<FieldElement>,
    mds: [[FieldElement; STATE_WIDTH]; STATE_WIDTH],
}

impl Default for PoseidonParams {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseidonParams {
    pub fn new() -> Self {
        let total_rounds = FULL_ROUNDS + PARTIAL_ROUNDS;
        let round_constants = Self::generate_round_constants(total_rounds * STATE_WIDTH);
        let mds = MDS.map(|row| row.map(FieldElement::from));

        Self {
            rounds_f: FULL_ROUNDS,
            rounds_p: PARTIAL_ROUNDS,
            round_constants,
            mds,
        }
    }

    /// seed_{i+1} = seed_i · M + I (mod p), emitting every step
    fn generate_round_constants(count: usize) -> Vec<FieldElement> {
        let multiplier = FieldElement::from(LCG_MULTIPLIER);
        let increment = FieldElement::from(LCG_INCREMENT);
        let mut seed = FieldElement::from(CONSTANT_SEED);

        (0..count)
            .map(|_| {
                seed = &(&seed * &multiplier) + &increment;
                seed.clone()
            })
            .collect()
    }

    pub fn total_rounds(&self) -> usize {
        self.rounds_f + self.rounds_p
    }

    pub fn round_constants(&self) -> &[FieldElement] {
        &self.round_constants
    }
}

/// Hash front-end sharing one set of parameters
#[derive(Debug, Clone)]
pub struct PoseidonHasher {
    params: Arc<PoseidonParams>,
}

impl Default for PoseidonHasher {
    fn default() -> Self {
        Self::new(Arc::new(PoseidonParams::new()))
    }
}

impl PoseidonHasher {
    pub fn new(params: Arc<PoseidonParams>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PoseidonParams {
        &self.params
    }

    /// Absorb `inputs` two at a time and squeeze slot 0.
    ///
    /// Inputs are added into the rate slots on top of the previous
    /// permutation output. An empty input permutes the zero state once.
    pub fn hash(&self, inputs: &[FieldElement]) -> FieldElement {
        let mut state = HashState::default();

        if inputs.is_empty() {
            self.permute(&mut state);
        }

        for chunk in inputs.chunks(RATE) {
            for (slot, input) in state[1..].iter_mut().zip(chunk) {
                *slot = &*slot + input;
            }
            self.permute(&mut state);
        }

        let [digest, _, _] = state;
        digest
    }

    /// Full permutation: add constants → s-box → mix, per round
    pub fn permute(&self, state: &mut HashState) {
        let half_full = self.params.rounds_f / 2;
        let mut round = 0;

        for _ in 0..half_full {
            self.round(state, round, true);
            round += 1;
        }
        for _ in 0..self.params.rounds_p {
            self.round(state, round, false);
            round += 1;
        }
        for _ in 0..half_full {
            self.round(state, round, true);
            round += 1;
        }
    }

    fn round(&self, state: &mut HashState, round: usize, full: bool) {
        let constants =
            &self.params.round_constants[round * STATE_WIDTH..(round + 1) * STATE_WIDTH];
        for (slot, constant) in state.iter_mut().zip(constants) {
            *slot = &*slot + constant;
        }

        if full {
            for slot in state.iter_mut() {
                *slot = slot.pow5();
            }
        } else {
            state[0] = state[0].pow5();
        }

        self.mix(state);
    }

    fn mix(&self, state: &mut HashState) {
        let mixed = self.params.mds.each_ref().map(|row| {
            row.iter()
                .zip(state.iter())
                .fold(FieldElement::zero(), |acc, (m, s)| &acc + &(m * s))
        });
        *state = mixed;
    }
}
