mod arbitrage_engine;
mod lookup_tables;
mod profit_calculator;
mod retry;
mod rpc;
mod submission;
mod transaction_builder;

pub use arbitrage_engine::*;
pub use lookup_tables::*;
pub use profit_calculator::*;
pub use retry::*;
pub use rpc::*;
pub use submission::*;
pub use transaction_builder::*;

use async_trait::async_trait;
use solana_sdk::{hash::Hash, signature::Signature, transaction::VersionedTransaction};

use crate::types::common::BotResult;

/// Seam over the blockchain RPC endpoint: exactly the operations the
/// pipeline consumes, so the loop and submission stages can be exercised
/// against fakes.
#[async_trait]
pub trait RpcGateway: Send + Sync {
    /// Latest blockhash plus the last block height at which it is valid.
    async fn latest_blockhash(&self) -> BotResult<(Hash, u64)>;

    /// Dry-run the signed transaction against current network state.
    async fn simulate(&self, transaction: &VersionedTransaction) -> BotResult<()>;

    /// Broadcast the signed transaction. Irreversible once accepted.
    async fn send(&self, transaction: &VersionedTransaction) -> BotResult<Signature>;

    async fn block_height(&self) -> BotResult<u64>;

    /// `None` while the signature is unseen/unconfirmed; `Some(Ok)` once
    /// confirmed; `Some(Err)` if the transaction executed and failed.
    async fn signature_status(&self, signature: &Signature)
        -> BotResult<Option<Result<(), String>>>;
}
