use serde_json::Value;
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};

/// Hard protocol ceiling on a serialized transaction. Anything larger is
/// rejected by the network before it reaches a leader.
pub const MAX_TRANSACTION_SIZE: usize = 1232;

/// Maximum number of address lookup tables carried per transaction.
pub const MAX_LOOKUP_TABLES: usize = 2;

/// Lookup tables whose raw account data exceeds this are discarded; their
/// byte cost outweighs the addresses they compress.
pub const LOOKUP_TABLE_DISCARD_BYTES: usize = 1000;

#[derive(Debug, Clone)]
pub struct Quote {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub in_amount: u64,
    pub out_amount: u64,
    /// Verbatim pricing-service response; re-posted to the instruction
    /// service when building the leg.
    pub route: Value,
}

/// One half of the round trip: the executable swap instruction plus any
/// lookup tables the instruction service returned for it.
#[derive(Debug, Clone)]
pub struct SwapLeg {
    pub instruction: Instruction,
    pub lookup_tables: Vec<LookupTableRef>,
}

#[derive(Debug, Clone)]
pub struct LookupTableRef {
    pub key: Pubkey,
    pub account: AddressLookupTableAccount,
    pub serialized_len: usize,
}

/// A signed, size-validated transaction bound to a specific blockhash and
/// its validity window.
#[derive(Debug, Clone)]
pub struct TransactionCandidate {
    pub transaction: VersionedTransaction,
    pub serialized_size: usize,
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
    pub with_lookup_tables: bool,
}

impl TransactionCandidate {
    pub fn signature(&self) -> Signature {
        self.transaction.signatures[0]
    }
}

#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub succeeded: bool,
    pub reason: String,
}

impl CycleOutcome {
    pub fn confirmed(signature: &Signature) -> Self {
        Self {
            succeeded: true,
            reason: format!("confirmed {}", signature),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            reason: reason.into(),
        }
    }
}

// Error types for the round-trip bot
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("Instruction build failed: {0}")]
    InstructionBuild(String),

    #[error("No viable transaction: {0}")]
    NoViableTransaction(String),

    #[error("Simulation failed: {0}")]
    SimulationFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Confirmation failed: {0}")]
    ConfirmationFailed(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

// Result type alias for bot operations
pub type BotResult<T> = Result<T, BotError>;
