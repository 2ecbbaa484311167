use std::sync::Arc;
use std::time::Duration;

use solana_sdk::signature::Signature;

use super::RpcGateway;
use crate::types::common::{BotError, BotResult, TransactionCandidate};

const CONFIRM_POLL_INTERVAL_MS: u64 = 200;

/// Simulate, broadcast, confirm. Simulation and broadcast failures retry
/// the whole sequence with linear backoff; once a transaction is on the
/// wire, a confirmation failure is final; resubmitting a possibly-landed
/// transaction is unsafe.
pub struct SubmissionPipeline {
    rpc: Arc<dyn RpcGateway>,
    max_retries: u32,
    backoff_ms: u64,
}

impl SubmissionPipeline {
    pub fn new(rpc: Arc<dyn RpcGateway>, max_retries: u32, backoff_ms: u64) -> Self {
        Self {
            rpc,
            max_retries,
            backoff_ms,
        }
    }

    pub async fn submit(&self, candidate: &TransactionCandidate) -> BotResult<Signature> {
        let mut last_err = None;

        for attempt in 1..=self.max_retries {
            if let Err(e) = self.rpc.simulate(&candidate.transaction).await {
                log::warn!("submit: simulation attempt {}/{} failed: {}", attempt, self.max_retries, e);
                last_err = Some(e);
                self.backoff(attempt).await;
                continue;
            }

            let signature = match self.rpc.send(&candidate.transaction).await {
                Ok(signature) => signature,
                Err(e) => {
                    log::warn!("submit: broadcast attempt {}/{} failed: {}", attempt, self.max_retries, e);
                    last_err = Some(e);
                    self.backoff(attempt).await;
                    continue;
                }
            };

            log::info!(
                "Broadcast {} ({} bytes, lookup tables: {})",
                signature,
                candidate.serialized_size,
                candidate.with_lookup_tables
            );

            self.confirm(&signature, candidate).await?;
            return Ok(signature);
        }

        Err(last_err
            .unwrap_or_else(|| BotError::SendFailed("no submission attempts made".to_string())))
    }

    /// Poll the signature against the candidate's blockhash validity
    /// window. Past `last_valid_block_height` the transaction can no
    /// longer land and the wait is over.
    async fn confirm(&self, signature: &Signature, candidate: &TransactionCandidate) -> BotResult<()> {
        loop {
            let status = self
                .rpc
                .signature_status(signature)
                .await
                .map_err(|e| BotError::ConfirmationFailed(e.to_string()))?;

            match status {
                Some(Ok(())) => {
                    log::info!("Confirmed {}", signature);
                    return Ok(());
                }
                Some(Err(err)) => {
                    return Err(BotError::ConfirmationFailed(format!(
                        "{} executed with error: {}",
                        signature, err
                    )));
                }
                None => {}
            }

            let height = self
                .rpc
                .block_height()
                .await
                .map_err(|e| BotError::ConfirmationFailed(e.to_string()))?;
            if height > candidate.last_valid_block_height {
                return Err(BotError::ConfirmationFailed(format!(
                    "blockhash expired at height {} (valid through {})",
                    height, candidate.last_valid_block_height
                )));
            }

            tokio::time::sleep(Duration::from_millis(CONFIRM_POLL_INTERVAL_MS)).await;
        }
    }

    async fn backoff(&self, attempt: u32) {
        if attempt < self.max_retries {
            tokio::time::sleep(Duration::from_millis(self.backoff_ms * attempt as u64)).await;
        }
    }
}
