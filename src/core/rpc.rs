use async_trait::async_trait;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig},
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, signature::Signature,
    transaction::VersionedTransaction,
};

use super::RpcGateway;
use crate::types::common::{BotError, BotResult};

/// Live gateway over a Solana RPC node.
pub struct SolanaRpcGateway {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl SolanaRpcGateway {
    pub fn new(rpc_url: String) -> Self {
        let commitment = CommitmentConfig::confirmed();
        Self {
            client: RpcClient::new_with_commitment(rpc_url, commitment),
            commitment,
        }
    }
}

#[async_trait]
impl RpcGateway for SolanaRpcGateway {
    async fn latest_blockhash(&self) -> BotResult<(Hash, u64)> {
        self.client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(|e| BotError::Rpc(format!("Blockhash fetch failed: {}", e)))
    }

    async fn simulate(&self, transaction: &VersionedTransaction) -> BotResult<()> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: false,
            commitment: Some(self.commitment),
            ..Default::default()
        };

        let response = self
            .client
            .simulate_transaction_with_config(transaction, config)
            .await
            .map_err(|e| BotError::SimulationFailed(format!("RPC error: {}", e)))?;

        if let Some(err) = response.value.err {
            if let Some(logs) = response.value.logs {
                for line in logs {
                    log::debug!("sim log: {}", line);
                }
            }
            return Err(BotError::SimulationFailed(format!("{:?}", err)));
        }

        Ok(())
    }

    async fn send(&self, transaction: &VersionedTransaction) -> BotResult<Signature> {
        // Preflight is skipped: the candidate was simulated immediately
        // before this call.
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            ..Default::default()
        };

        self.client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(|e| BotError::SendFailed(e.to_string()))
    }

    async fn block_height(&self) -> BotResult<u64> {
        self.client
            .get_block_height()
            .await
            .map_err(|e| BotError::Rpc(format!("Block height fetch failed: {}", e)))
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> BotResult<Option<Result<(), String>>> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| BotError::Rpc(format!("Status fetch failed: {}", e)))?;

        let status = match response.value.into_iter().next().flatten() {
            Some(status) => status,
            None => return Ok(None),
        };

        if let Some(err) = &status.err {
            return Ok(Some(Err(format!("{:?}", err))));
        }

        if status.satisfies_commitment(self.commitment) {
            Ok(Some(Ok(())))
        } else {
            Ok(None)
        }
    }
}
