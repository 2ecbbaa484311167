use std::sync::Arc;
use std::time::Duration;

use solana_sdk::{pubkey::Pubkey, signature::Signature};

use super::{lookup_tables, ProfitCalculator, RpcGateway, SubmissionPipeline, TransactionBuilder};
use crate::{
    alerts::{Notifier, OpportunityAlert},
    api::{QuoteService, SwapInstructionService},
    config::{Settings, SignerHandle},
    types::common::{BotResult, CycleOutcome},
};

/// Consecutive-failure circuit breaker. Any success resets the run; a run
/// reaching the threshold asks for one cooldown pause and starts over.
pub struct LoopState {
    consecutive_failures: u32,
    threshold: u32,
    cooldown: Duration,
}

impl LoopState {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            consecutive_failures: 0,
            threshold,
            cooldown,
        }
    }

    pub fn record(&mut self, outcome: &CycleOutcome) -> Option<Duration> {
        if outcome.succeeded {
            self.consecutive_failures = 0;
            return None;
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.threshold {
            self.consecutive_failures = 0;
            Some(self.cooldown)
        } else {
            None
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

/// The opportunity loop: one strictly sequential cycle per cadence tick,
/// quote → profit gate → build → assemble → submit. A cycle owns no state
/// beyond its own data; only the failure counter outlives it.
pub struct ArbitrageEngine {
    settings: Arc<Settings>,
    quotes: Arc<dyn QuoteService>,
    instructions: Arc<dyn SwapInstructionService>,
    rpc: Arc<dyn RpcGateway>,
    builder: TransactionBuilder,
    submission: SubmissionPipeline,
    profit: ProfitCalculator,
    notifier: Notifier,
    input_mint: Pubkey,
    output_mint: Pubkey,
}

impl ArbitrageEngine {
    pub fn new(
        settings: Settings,
        signer: SignerHandle,
        quotes: Arc<dyn QuoteService>,
        instructions: Arc<dyn SwapInstructionService>,
        rpc: Arc<dyn RpcGateway>,
    ) -> BotResult<Self> {
        let input_mint = settings.input_mint()?;
        let output_mint = settings.output_mint()?;

        let builder = TransactionBuilder::new(signer);
        let submission = SubmissionPipeline::new(
            rpc.clone(),
            settings.network.max_retries,
            settings.network.retry_backoff_ms,
        );
        let profit = ProfitCalculator::new(
            settings.trading.min_profit_lamports,
            settings.trading.fee_estimate_lamports,
        );
        let notifier = Notifier::new(settings.monitoring.webhook_url.clone());

        Ok(Self {
            settings: Arc::new(settings),
            quotes,
            instructions,
            rpc,
            builder,
            submission,
            profit,
            notifier,
            input_mint,
            output_mint,
        })
    }

    pub async fn run(&self) -> BotResult<()> {
        log::info!(
            "Scanning {} -> {} round trips, input {} units, min profit {}",
            self.input_mint,
            self.output_mint,
            self.settings.trading.trade_amount,
            self.settings.trading.min_profit_lamports
        );

        let mut state = LoopState::new(
            self.settings.runtime.failure_threshold,
            Duration::from_millis(self.settings.runtime.cooldown_ms),
        );
        let cycle_delay = Duration::from_millis(self.settings.runtime.cycle_delay_ms);

        loop {
            let outcome = self.run_cycle().await;
            if outcome.succeeded {
                log::info!("Cycle succeeded: {}", outcome.reason);
            } else {
                log::warn!("Cycle failed: {}", outcome.reason);
            }

            if let Some(cooldown) = state.record(&outcome) {
                log::warn!(
                    "{} consecutive failures, cooling down for {}s",
                    self.settings.runtime.failure_threshold,
                    cooldown.as_secs()
                );
                tokio::time::sleep(cooldown).await;
            }

            tokio::time::sleep(cycle_delay).await;
        }
    }

    /// One full cycle. Every stage error is absorbed into the outcome;
    /// nothing thrown here can take the loop down.
    pub async fn run_cycle(&self) -> CycleOutcome {
        match self.try_cycle().await {
            Ok(Some(signature)) => CycleOutcome::confirmed(&signature),
            Ok(None) => CycleOutcome::failed("insufficient profit"),
            Err(e) => CycleOutcome::failed(e.to_string()),
        }
    }

    async fn try_cycle(&self) -> BotResult<Option<Signature>> {
        let amount = self.settings.trading.trade_amount;

        log::debug!("Quoting buy leg ({} units)", amount);
        let buy = self
            .quotes
            .get_quote(self.input_mint, self.output_mint, amount)
            .await?;

        log::debug!("Quoting sell leg ({} units)", buy.out_amount);
        let sell = self
            .quotes
            .get_quote(self.output_mint, self.input_mint, buy.out_amount)
            .await?;

        let net = match self.profit.evaluate(amount, sell.out_amount) {
            Some(net) => net,
            None => {
                log::debug!(
                    "No opportunity: {} in, {} back",
                    amount,
                    sell.out_amount
                );
                return Ok(None);
            }
        };

        log::info!(
            "Opportunity: {} in, {} back, net {} lamports",
            amount,
            sell.out_amount,
            net
        );
        self.notifier.notify(OpportunityAlert {
            profit_lamports: net,
            input_amount: amount,
            fee_estimate_lamports: self.profit.fee_estimate(),
        });

        let buy_leg = self.instructions.get_swap_leg(&buy).await?;
        let sell_leg = self.instructions.get_swap_leg(&sell).await?;

        let mut tables = buy_leg.lookup_tables;
        tables.extend(sell_leg.lookup_tables);
        let tables = lookup_tables::optimize(tables);

        // Atomicity hinges on order: the buy must execute before the sell.
        let instructions = [buy_leg.instruction, sell_leg.instruction];

        let (blockhash, last_valid_block_height) = self.rpc.latest_blockhash().await?;
        let candidate =
            self.builder
                .assemble(&instructions, &tables, blockhash, last_valid_block_height)?;

        let signature = self.submission.submit(&candidate).await?;
        Ok(Some(signature))
    }
}
