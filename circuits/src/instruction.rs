//! Instruction encoding for the on-chain hedge program
//!
//! Payloads follow the Anchor/Borsh convention the program deserializes:
//! an 8-byte discriminator, then each argument in declaration order, with
//! `Vec<T>` as a u32 little-endian length followed by its items.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::InstructionError;

pub const GLOBAL_NAMESPACE: &str = "global";
pub const TRIGGER_HEDGE: &str = "trigger_hedge";
pub const INITIALIZE_CONFIG: &str = "initialize_config";

/// 32-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// System program (all-zero address)
pub const SYSTEM_PROGRAM_ADDRESS: Address = Address([0u8; 32]);

/// Account reference passed alongside the payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountSpec {
    pub address: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountSpec {
    pub fn writable(address: Address, is_signer: bool) -> Self {
        Self { address, is_signer, is_writable: true }
    }

    pub fn readonly(address: Address, is_signer: bool) -> Self {
        Self { address, is_signer, is_writable: false }
    }
}

/// Program-derived address scheme supplied by the network layer
pub trait AddressDeriver {
    fn derive(&self, seeds: &[&[u8]], program_id: &Address) -> Address;
}

/// Seeds for the position and config accounts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdaSeeds {
    pub position: Vec<u8>,
    pub config: Vec<u8>,
}

impl Default for PdaSeeds {
    fn default() -> Self {
        Self {
            position: b"position".to_vec(),
            config: b"config".to_vec(),
        }
    }
}

/// Fully assembled call handed to the submitter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramCall {
    pub program_id: Address,
    pub accounts: Vec<AccountSpec>,
    pub data: Vec<u8>,
}

/// First 8 bytes of SHA-256("<namespace>:<name>")
pub fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut tag = [0u8; 8];
    tag.copy_from_slice(&digest[..8]);
    tag
}

fn put_len(data: &mut Vec<u8>, what: &'static str, len: usize) -> Result<(), InstructionError> {
    let len = u32::try_from(len).map_err(|_| InstructionError::LengthOverflow { what, len })?;
    data.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

/// `trigger_hedge(hedge_decision: bool, agent_proof: Vec<u8>, mpc_shares: Vec<Vec<u8>>)`
pub fn build_call_payload(
    decision: bool,
    proof: &[u8],
    shares: &[Vec<u8>],
) -> Result<Vec<u8>, InstructionError> {
    let shares_len: usize = shares.iter().map(|s| 4 + s.len()).sum();
    let mut data = Vec::with_capacity(8 + 1 + 4 + proof.len() + 4 + shares_len);

    data.extend_from_slice(&discriminator(GLOBAL_NAMESPACE, TRIGGER_HEDGE));
    data.push(u8::from(decision));

    put_len(&mut data, "proof", proof.len())?;
    data.extend_from_slice(proof);

    put_len(&mut data, "shares", shares.len())?;
    for share in shares {
        put_len(&mut data, "share", share.len())?;
        data.extend_from_slice(share);
    }

    Ok(data)
}

/// [position (mut), config, caller (mut, signer), system]
pub fn trigger_hedge_accounts(
    deriver: &dyn AddressDeriver,
    program_id: &Address,
    caller: &Address,
    seeds: &PdaSeeds,
) -> Vec<AccountSpec> {
    let position = deriver.derive(&[&seeds.position, caller.as_ref()], program_id);
    let config = deriver.derive(&[&seeds.config], program_id);

    vec![
        AccountSpec::writable(position, false),
        AccountSpec::readonly(config, false),
        AccountSpec::writable(*caller, true),
        AccountSpec::readonly(SYSTEM_PROGRAM_ADDRESS, false),
    ]
}

pub fn trigger_hedge_call(
    deriver: &dyn AddressDeriver,
    program_id: &Address,
    caller: &Address,
    seeds: &PdaSeeds,
    decision: bool,
    proof: &[u8],
    shares: &[Vec<u8>],
) -> Result<ProgramCall, InstructionError> {
    Ok(ProgramCall {
        program_id: *program_id,
        accounts: trigger_hedge_accounts(deriver, program_id, caller, seeds),
        data: build_call_payload(decision, proof, shares)?,
    })
}

/// `initialize_config(min_ratio: u64, approved_collaterals: Vec<Pubkey>, oracle_accounts: Vec<Pubkey>)`
pub fn build_initialize_config(
    min_ratio: u64,
    collaterals: &[Address],
    oracles: &[Address],
) -> Result<Vec<u8>, InstructionError> {
    let mut data = Vec::with_capacity(8 + 8 + 8 + 32 * (collaterals.len() + oracles.len()));
    data.extend_from_slice(&discriminator(GLOBAL_NAMESPACE, INITIALIZE_CONFIG));
    data.extend_from_slice(&min_ratio.to_le_bytes());

    for (what, list) in [("collaterals", collaterals), ("oracles", oracles)] {
        put_len(&mut data, what, list.len())?;
        for address in list {
            data.extend_from_slice(address.as_ref());
        }
    }

    Ok(data)
}

/// [config (mut), admin (mut, signer), mint, system]
pub fn initialize_config_call(
    deriver: &dyn AddressDeriver,
    program_id: &Address,
    admin: &Address,
    mint: &Address,
    seeds: &PdaSeeds,
    min_ratio: u64,
    collaterals: &[Address],
    oracles: &[Address],
) -> Result<ProgramCall, InstructionError> {
    let config = deriver.derive(&[&seeds.config], program_id);

    Ok(ProgramCall {
        program_id: *program_id,
        accounts: vec![
            AccountSpec::writable(config, false),
            AccountSpec::writable(*admin, true),
            AccountSpec::readonly(*mint, false),
            AccountSpec::readonly(SYSTEM_PROGRAM_ADDRESS, false),
        ],
        data: build_initialize_config(min_ratio, collaterals, oracles)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shares::{split_shares, DEFAULT_SECRET};

    /// Deterministic stand-in for the chain's PDA derivation
    struct HashDeriver;

    impl AddressDeriver for HashDeriver {
        fn derive(&self, seeds: &[&[u8]], program_id: &Address) -> Address {
            let mut hasher = Sha256::new();
            for seed in seeds {
                hasher.update(seed);
            }
            hasher.update(program_id.as_ref());
            Address(hasher.finalize().into())
        }
    }

    #[test]
    fn test_known_discriminators() {
        assert_eq!(
            hex::encode(discriminator("global", "trigger_hedge")),
            "1de7f968bf2d33c6"
        );
        assert_eq!(
            hex::encode(discriminator("global", "initialize_config")),
            "d07f1501c2bec446"
        );
        assert_eq!(
            discriminator("global", "trigger_hedge"),
            discriminator("global", "trigger_hedge")
        );
    }

    #[test]
    fn test_payload_layout() {
        let proof = [0x11u8; 256];
        let shares = split_shares(DEFAULT_SECRET).to_vec();
        let data = build_call_payload(true, &proof, &shares).unwrap();

        assert_eq!(data.len(), 8 + 1 + 4 + 256 + 4 + 3 * (4 + 14));
        assert_eq!(&data[..8], &discriminator("global", "trigger_hedge"));
        assert_eq!(data[8], 1);
        assert_eq!(&data[9..13], &256u32.to_le_bytes());
        assert_eq!(&data[13..269], &proof[..]);
        assert_eq!(
            hex::encode(&data[269..]),
            "03000000\
             0e0000006866666a69646a6c6b727d747b7b\
             0e0000006967676b6a656b6d6c737e757c7c\
             0e00000069646566665e6564646870686869"
        );
    }

    #[test]
    fn test_no_hedge_flag_and_empty_shares() {
        let data = build_call_payload(false, &[], &[]).unwrap();
        assert_eq!(data.len(), 8 + 1 + 4 + 4);
        assert_eq!(data[8], 0);
        assert_eq!(&data[9..], &[0u8; 8]);
    }

    #[test]
    fn test_trigger_hedge_account_order() {
        let program = Address([7u8; 32]);
        let caller = Address([9u8; 32]);
        let seeds = PdaSeeds::default();
        let accounts = trigger_hedge_accounts(&HashDeriver, &program, &caller, &seeds);

        let position = HashDeriver.derive(&[b"position", caller.as_ref()], &program);
        let config = HashDeriver.derive(&[b"config"], &program);

        assert_eq!(
            accounts,
            vec![
                AccountSpec { address: position, is_signer: false, is_writable: true },
                AccountSpec { address: config, is_signer: false, is_writable: false },
                AccountSpec { address: caller, is_signer: true, is_writable: true },
                AccountSpec {
                    address: SYSTEM_PROGRAM_ADDRESS,
                    is_signer: false,
                    is_writable: false,
                },
            ]
        );
    }

    #[test]
    fn test_initialize_config_payload() {
        let collateral = Address([1u8; 32]);
        let oracle = Address([2u8; 32]);
        let data = build_initialize_config(150_000_000, &[collateral], &[oracle]).unwrap();

        assert_eq!(data.len(), 8 + 8 + 4 + 32 + 4 + 32);
        assert_eq!(&data[..8], &discriminator("global", "initialize_config"));
        assert_eq!(&data[8..16], &150_000_000u64.to_le_bytes());
        assert_eq!(&data[16..20], &1u32.to_le_bytes());
        assert_eq!(&data[20..52], &[1u8; 32]);
        assert_eq!(&data[52..56], &1u32.to_le_bytes());
        assert_eq!(&data[56..88], &[2u8; 32]);
    }

    #[test]
    fn test_initialize_config_accounts() {
        let program = Address([3u8; 32]);
        let admin = Address([4u8; 32]);
        let mint = Address([5u8; 32]);
        let call = initialize_config_call(
            &HashDeriver,
            &program,
            &admin,
            &mint,
            &PdaSeeds::default(),
            150_000_000,
            &[],
            &[],
        )
        .unwrap();

        assert_eq!(call.program_id, program);
        assert!(call.accounts[0].is_writable && !call.accounts[0].is_signer);
        assert_eq!(call.accounts[1], AccountSpec::writable(admin, true));
        assert_eq!(call.accounts[2], AccountSpec::readonly(mint, false));
        assert_eq!(call.accounts[3].address, SYSTEM_PROGRAM_ADDRESS);
    }
}
