mod alerts;
mod api;
mod config;
mod core;
mod types;

use {
    crate::{
        api::AggregatorClient,
        config::{load_signer, Settings},
        core::{ArbitrageEngine, SolanaRpcGateway},
        types::common::BotError,
    },
    clap::Parser,
    std::sync::Arc,
};

#[derive(Debug, Parser)]
#[command(
    name = "solana-roundtrip-bot",
    about = "Two-token round-trip arbitrage in one atomic transaction"
)]
struct Args {
    /// Path to the signing keypair file (falls back to KEYPAIR_PATH)
    #[arg(long)]
    keypair: Option<String>,

    /// RPC endpoint override (falls back to SOLANA_RPC_URL)
    #[arg(long)]
    rpc_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), BotError> {
    // Initialize logging
    env_logger::init();
    log::info!("Starting Solana round-trip bot...");

    let args = Args::parse();

    // Load configuration
    let mut settings = Settings::load()?;
    if let Some(rpc_url) = args.rpc_url {
        settings.network.rpc_url = rpc_url;
    }
    log::info!("Configuration loaded successfully");

    // Load the signing credential
    let signer = load_signer(args.keypair.as_deref())?;
    log::info!("Loaded signer: {}", signer.pubkey());

    // Wire up the external services and the engine
    let aggregator = Arc::new(AggregatorClient::new(&settings, signer.pubkey())?);
    let rpc = Arc::new(SolanaRpcGateway::new(settings.network.rpc_url.clone()));

    let engine = ArbitrageEngine::new(settings, signer, aggregator.clone(), aggregator, rpc)?;
    log::info!("Engine initialized");

    engine.run().await
}
