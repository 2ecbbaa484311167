use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::types::common::{BotError, BotResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub network: NetworkSettings,
    pub trading: TradingSettings,
    pub runtime: RuntimeSettings,
    pub monitoring: MonitoringSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub rpc_url: String,
    pub quote_api_url: String,
    pub swap_api_url: String,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSettings {
    pub input_mint: String,
    pub output_mint: String,
    /// Fixed per-cycle input, in the input mint's smallest unit.
    pub trade_amount: u64,
    pub slippage_bps: u16,
    pub min_profit_lamports: u64,
    /// Configured estimate reported in alerts; not derived from live
    /// compute-unit pricing.
    pub fee_estimate_lamports: u64,
    pub compute_unit_price_micro_lamports: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSettings {
    pub cycle_delay_ms: u64,
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSettings {
    pub log_level: String,
    pub webhook_url: Option<String>,
}

impl Settings {
    pub fn load() -> BotResult<Self> {
        dotenv::dotenv().ok();

        let mut settings = Self::default();

        if let Ok(url) = std::env::var("SOLANA_RPC_URL") {
            settings.network.rpc_url = url;
        }
        if let Ok(url) = std::env::var("QUOTE_API_URL") {
            settings.network.quote_api_url = url;
        }
        if let Ok(url) = std::env::var("SWAP_API_URL") {
            settings.network.swap_api_url = url;
        }
        if let Ok(v) = std::env::var("MAX_RETRIES") {
            settings.network.max_retries = parse_env("MAX_RETRIES", &v)?;
        }
        if let Ok(mint) = std::env::var("INPUT_MINT") {
            settings.trading.input_mint = mint;
        }
        if let Ok(mint) = std::env::var("OUTPUT_MINT") {
            settings.trading.output_mint = mint;
        }
        if let Ok(v) = std::env::var("TRADE_AMOUNT") {
            settings.trading.trade_amount = parse_env("TRADE_AMOUNT", &v)?;
        }
        if let Ok(v) = std::env::var("SLIPPAGE_BPS") {
            settings.trading.slippage_bps = parse_env("SLIPPAGE_BPS", &v)?;
        }
        if let Ok(v) = std::env::var("MIN_PROFIT_LAMPORTS") {
            settings.trading.min_profit_lamports = parse_env("MIN_PROFIT_LAMPORTS", &v)?;
        }
        if let Ok(v) = std::env::var("FEE_ESTIMATE_LAMPORTS") {
            settings.trading.fee_estimate_lamports = parse_env("FEE_ESTIMATE_LAMPORTS", &v)?;
        }
        if let Ok(v) = std::env::var("COMPUTE_UNIT_PRICE") {
            settings.trading.compute_unit_price_micro_lamports =
                parse_env("COMPUTE_UNIT_PRICE", &v)?;
        }
        if let Ok(url) = std::env::var("WEBHOOK_URL") {
            settings.monitoring.webhook_url = Some(url);
        }

        settings.validate()?;

        Ok(settings)
    }

    pub fn input_mint(&self) -> BotResult<Pubkey> {
        Pubkey::from_str(&self.trading.input_mint)
            .map_err(|e| BotError::ConfigError(format!("Invalid input mint: {}", e)))
    }

    pub fn output_mint(&self) -> BotResult<Pubkey> {
        Pubkey::from_str(&self.trading.output_mint)
            .map_err(|e| BotError::ConfigError(format!("Invalid output mint: {}", e)))
    }

    pub fn validate(&self) -> BotResult<()> {
        if self.network.rpc_url.is_empty() {
            return Err(BotError::ConfigError("No RPC endpoint configured".to_string()));
        }
        if self.network.quote_api_url.is_empty() || self.network.swap_api_url.is_empty() {
            return Err(BotError::ConfigError(
                "Pricing and instruction service endpoints are required".to_string(),
            ));
        }
        if self.network.max_retries == 0 {
            return Err(BotError::ConfigError("MAX_RETRIES must be at least 1".to_string()));
        }
        if self.trading.trade_amount == 0 {
            return Err(BotError::ConfigError("TRADE_AMOUNT must be positive".to_string()));
        }
        let input = self.input_mint()?;
        let output = self.output_mint()?;
        if input == output {
            return Err(BotError::ConfigError(
                "Input and output mints must differ".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            network: NetworkSettings {
                rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
                quote_api_url: "https://quote-api.jup.ag/v6/quote".to_string(),
                swap_api_url: "https://quote-api.jup.ag/v6/swap-instructions".to_string(),
                max_retries: 3,
                retry_backoff_ms: 1000,
            },
            trading: TradingSettings {
                // wSOL -> USDC
                input_mint: "So11111111111111111111111111111111111111112".to_string(),
                output_mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
                trade_amount: 10_000_000,
                slippage_bps: 50,
                min_profit_lamports: 10_000,
                fee_estimate_lamports: 5_000,
                compute_unit_price_micro_lamports: 100_000,
            },
            runtime: RuntimeSettings {
                cycle_delay_ms: 5000,
                failure_threshold: 5,
                cooldown_ms: 30_000,
            },
            monitoring: MonitoringSettings {
                log_level: "info".to_string(),
                webhook_url: None,
            },
        }
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> BotResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| BotError::ConfigError(format!("Invalid {}: {}", name, value)))
}
