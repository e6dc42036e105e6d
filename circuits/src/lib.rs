//! Aegis hedge circuit
//!
//! Proves that an agent's hedge decision was derived from committed private
//! inputs and a public oracle price, then packs the proof into the
//! `trigger_hedge` instruction understood by the on-chain program.
//!
//! ## pipeline
//!
//! ```text
//! witness ──commit──► commitment ─┐
//!                                 ├─► generate ─► Proof ─► serialize ─► [u8; 256]
//! oracle price ───────────────────┘                                        │
//!                                                  build_call_payload ◄─────┘
//! ```
//!
//! Everything here is synchronous and free of I/O.

pub mod codec;
pub mod error;
pub mod field;
pub mod instruction;
pub mod poseidon;
pub mod proof;
pub mod shares;

pub use codec::{deserialize, serialize, ProofBuffer, MEANINGFUL_LEN, PROOF_LEN};
pub use error::{CodecError, FieldError, InstructionError, ProofError};
pub use field::{modulus, FieldElement};
pub use instruction::{
    build_call_payload, build_initialize_config, discriminator, trigger_hedge_accounts, AccountSpec,
    Address, AddressDeriver, PdaSeeds, ProgramCall, SYSTEM_PROGRAM_ADDRESS,
};
pub use poseidon::{PoseidonHasher, PoseidonParams};
pub use proof::{
    scale_price, HedgeProver, PrivateWitness, Proof, PublicInputs, VerificationReport,
    VerifyFailure,
};
pub use shares::{reconstruct_shares, split_shares};
