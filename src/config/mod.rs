mod settings;

pub use settings::*;

use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};
use std::{fmt, str::FromStr, sync::Arc};

use crate::types::common::{BotError, BotResult};

/// Scoped handle around the signing keypair. The raw key never appears in
/// logs or outbound payloads; callers get the public identity and a signer
/// reference, nothing else.
#[derive(Clone)]
pub struct SignerHandle {
    keypair: Arc<Keypair>,
}

impl SignerHandle {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl fmt::Debug for SignerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerHandle")
            .field("pubkey", &self.keypair.pubkey())
            .finish()
    }
}

/// Load the signing credential: `WALLET_PRIVATE_KEY` (base58) takes
/// precedence, otherwise the file at `KEYPAIR_PATH`.
pub fn load_signer(keypair_path: Option<&str>) -> BotResult<SignerHandle> {
    if let Ok(encoded) = std::env::var("WALLET_PRIVATE_KEY") {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|e| BotError::ConfigError(format!("Invalid WALLET_PRIVATE_KEY: {}", e)))?;
        let keypair = Keypair::from_bytes(&bytes)
            .map_err(|e| BotError::ConfigError(format!("Invalid private key: {}", e)))?;
        return Ok(SignerHandle::new(keypair));
    }

    let path = match keypair_path {
        Some(path) => path.to_string(),
        None => std::env::var("KEYPAIR_PATH")
            .map_err(|_| BotError::ConfigError("KEYPAIR_PATH not set".to_string()))?,
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| BotError::ConfigError(format!("Failed to read keypair file: {}", e)))?;

    let keypair = parse_keypair_bytes(&contents)?;
    Ok(SignerHandle::new(keypair))
}

// Accepts both a bare comma-separated byte list and a JSON-style array.
fn parse_keypair_bytes(contents: &str) -> BotResult<Keypair> {
    let bytes = contents
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|s| u8::from_str(s.trim()))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| BotError::ConfigError(format!("Invalid keypair format: {}", e)))?;

    Keypair::from_bytes(&bytes)
        .map_err(|e| BotError::ConfigError(format!("Invalid keypair: {}", e)))
}
