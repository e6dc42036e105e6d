//! Transaction submission

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
    transaction::Transaction,
};
use std::path::Path;
use std::str::FromStr;

use aegis_circuit::{Address, AddressDeriver, ProgramCall};

use crate::error::{AgentError, Result};

/// Network side of the pipeline: who signs, how PDAs are derived, where calls go
#[async_trait]
pub trait HedgeSubmitter: Send + Sync {
    /// Signing wallet, also the fee payer
    fn caller(&self) -> Address;

    fn deriver(&self) -> &dyn AddressDeriver;

    /// Send a call and wait for confirmation, returning its signature
    async fn submit(&self, call: &ProgramCall) -> Result<String>;

    async fn account_exists(&self, address: &Address) -> Result<bool>;
}

/// How an `initialize_config` request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigInit {
    DryRun,
    AlreadyInitialized,
    Initialized { signature: String },
}

/// Send `initialize_config` unless the config account already exists.
/// A dry run returns before touching the network.
pub async fn initialize_config(
    submitter: &dyn HedgeSubmitter,
    call: &ProgramCall,
    dry_run: bool,
) -> Result<ConfigInit> {
    if dry_run {
        return Ok(ConfigInit::DryRun);
    }

    let config_pda = call
        .accounts
        .first()
        .ok_or_else(|| AgentError::Submission("Call carries no accounts".to_string()))?;
    if submitter.account_exists(&config_pda.address).await? {
        return Ok(ConfigInit::AlreadyInitialized);
    }

    let signature = submitter.submit(call).await?;
    Ok(ConfigInit::Initialized { signature })
}

pub fn to_pubkey(address: &Address) -> Pubkey {
    Pubkey::new_from_array(address.to_bytes())
}

pub fn to_address(pubkey: &Pubkey) -> Address {
    Address::new(pubkey.to_bytes())
}

pub fn parse_address(s: &str) -> Result<Address> {
    Pubkey::from_str(s)
        .map(|pk| to_address(&pk))
        .map_err(|e| AgentError::Config(format!("Invalid address `{}`: {}", s, e)))
}

/// `Pubkey::find_program_address`, bump discarded
#[derive(Debug, Clone, Copy, Default)]
pub struct SolanaPdaDeriver;

impl AddressDeriver for SolanaPdaDeriver {
    fn derive(&self, seeds: &[&[u8]], program_id: &Address) -> Address {
        let (address, _bump) = Pubkey::find_program_address(seeds, &to_pubkey(program_id));
        to_address(&address)
    }
}

pub struct SolanaSubmitter {
    client: RpcClient,
    payer: Keypair,
    deriver: SolanaPdaDeriver,
}

impl SolanaSubmitter {
    pub fn new(rpc_url: &str, payer: Keypair) -> Self {
        Self {
            client: RpcClient::new_with_commitment(
                rpc_url.to_string(),
                CommitmentConfig::confirmed(),
            ),
            payer,
            deriver: SolanaPdaDeriver,
        }
    }

    /// Load the payer from a JSON byte-array keypair file
    pub fn from_keypair_file(rpc_url: &str, path: &Path) -> Result<Self> {
        let payer = read_keypair_file(path).map_err(|e| {
            AgentError::Config(format!("Cannot read keypair {}: {}", path.display(), e))
        })?;
        Ok(Self::new(rpc_url, payer))
    }
}

fn to_instruction(call: &ProgramCall) -> Instruction {
    let accounts = call
        .accounts
        .iter()
        .map(|spec| AccountMeta {
            pubkey: to_pubkey(&spec.address),
            is_signer: spec.is_signer,
            is_writable: spec.is_writable,
        })
        .collect();

    Instruction {
        program_id: to_pubkey(&call.program_id),
        accounts,
        data: call.data.clone(),
    }
}

#[async_trait]
impl HedgeSubmitter for SolanaSubmitter {
    fn caller(&self) -> Address {
        to_address(&self.payer.pubkey())
    }

    fn deriver(&self) -> &dyn AddressDeriver {
        &self.deriver
    }

    async fn submit(&self, call: &ProgramCall) -> Result<String> {
        let instruction = to_instruction(call);

        let recent_blockhash = self
            .client
            .get_latest_blockhash()
            .await
            .map_err(|e| AgentError::Submission(format!("Blockhash unavailable: {}", e)))?;

        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.payer.pubkey()),
            &[&self.payer],
            recent_blockhash,
        );

        let signature = self
            .client
            .send_and_confirm_transaction(&transaction)
            .await
            .map_err(|e| AgentError::Submission(e.to_string()))?;

        tracing::info!(%signature, program = %to_pubkey(&call.program_id), "Transaction confirmed");
        Ok(signature.to_string())
    }

    async fn account_exists(&self, address: &Address) -> Result<bool> {
        let response = self
            .client
            .get_account_with_commitment(&to_pubkey(address), CommitmentConfig::confirmed())
            .await
            .map_err(|e| AgentError::Submission(e.to_string()))?;
        Ok(response.value.is_some())
    }
}
