mod aggregator;

pub use aggregator::*;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

use crate::types::common::{BotResult, Quote, SwapLeg};

/// Pricing service: one priced route for a token swap.
#[async_trait]
pub trait QuoteService: Send + Sync {
    async fn get_quote(
        &self,
        input_mint: Pubkey,
        output_mint: Pubkey,
        amount: u64,
    ) -> BotResult<Quote>;
}

/// Instruction service: executable instructions (plus lookup-table data)
/// for a previously fetched quote.
#[async_trait]
pub trait SwapInstructionService: Send + Sync {
    async fn get_swap_leg(&self, quote: &Quote) -> BotResult<SwapLeg>;
}
