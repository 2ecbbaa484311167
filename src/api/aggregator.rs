use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use std::str::FromStr;
use std::time::Duration;

use super::{QuoteService, SwapInstructionService};
use crate::{
    config::Settings,
    core::{decode_lookup_table, with_retry},
    types::common::{
        BotError, BotResult, LookupTableRef, Quote, SwapLeg, LOOKUP_TABLE_DISCARD_BYTES,
        MAX_LOOKUP_TABLES,
    },
};

/// HTTP client for the pricing and instruction services. Both calls share
/// the retry policy from config; route selection is pinned to direct
/// routes to keep account counts (and lookup-table bytes) down.
pub struct AggregatorClient {
    http: reqwest::Client,
    quote_url: String,
    swap_url: String,
    signer_pubkey: Pubkey,
    slippage_bps: u16,
    compute_unit_price: u64,
    max_retries: u32,
    backoff_ms: u64,
}

impl AggregatorClient {
    pub fn new(settings: &Settings, signer_pubkey: Pubkey) -> BotResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BotError::ConfigError(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http,
            quote_url: settings.network.quote_api_url.clone(),
            swap_url: settings.network.swap_api_url.clone(),
            signer_pubkey,
            slippage_bps: settings.trading.slippage_bps,
            compute_unit_price: settings.trading.compute_unit_price_micro_lamports,
            max_retries: settings.network.max_retries,
            backoff_ms: settings.network.retry_backoff_ms,
        })
    }

    async fn fetch_quote_once(
        &self,
        input_mint: Pubkey,
        output_mint: Pubkey,
        amount: u64,
    ) -> BotResult<Quote> {
        let response = self
            .http
            .get(&self.quote_url)
            .query(&[
                ("inputMint", input_mint.to_string()),
                ("outputMint", output_mint.to_string()),
                ("amount", amount.to_string()),
                ("slippageBps", self.slippage_bps.to_string()),
                ("onlyDirectRoutes", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| BotError::QuoteUnavailable(format!("transport: {}", e)))?;

        if !response.status().is_success() {
            return Err(BotError::QuoteUnavailable(format!(
                "service returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BotError::QuoteUnavailable(format!("invalid body: {}", e)))?;

        parse_quote_response(input_mint, output_mint, amount, body)
    }

    async fn fetch_leg_once(&self, quote: &Quote) -> BotResult<SwapLeg> {
        let body = json!({
            "quoteResponse": quote.route,
            "userPublicKey": self.signer_pubkey.to_string(),
            "wrapAndUnwrapSol": true,
            "computeUnitPriceMicroLamports": self.compute_unit_price,
        });

        let response = self
            .http
            .post(&self.swap_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::InstructionBuild(format!("transport: {}", e)))?;

        if !response.status().is_success() {
            return Err(BotError::InstructionBuild(format!(
                "service returned {}",
                response.status()
            )));
        }

        let parsed: SwapInstructionsResponse = response
            .json()
            .await
            .map_err(|e| BotError::InstructionBuild(format!("invalid body: {}", e)))?;

        build_leg(parsed)
    }
}

#[async_trait]
impl QuoteService for AggregatorClient {
    async fn get_quote(
        &self,
        input_mint: Pubkey,
        output_mint: Pubkey,
        amount: u64,
    ) -> BotResult<Quote> {
        with_retry("quote fetch", self.max_retries, self.backoff_ms, |_| {
            self.fetch_quote_once(input_mint, output_mint, amount)
        })
        .await
    }
}

#[async_trait]
impl SwapInstructionService for AggregatorClient {
    async fn get_swap_leg(&self, quote: &Quote) -> BotResult<SwapLeg> {
        with_retry("instruction fetch", self.max_retries, self.backoff_ms, |_| {
            self.fetch_leg_once(quote)
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapInstructionsResponse {
    swap_instruction: Option<UiInstruction>,
    #[serde(default)]
    address_lookup_tables: Vec<UiLookupTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiInstruction {
    program_id: String,
    accounts: Vec<UiAccountMeta>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiAccountMeta {
    pubkey: String,
    is_signer: bool,
    is_writable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiLookupTable {
    account_key: String,
    data: String,
}

fn parse_quote_response(
    input_mint: Pubkey,
    output_mint: Pubkey,
    in_amount: u64,
    body: Value,
) -> BotResult<Quote> {
    let out_amount = match &body["outAmount"] {
        Value::String(s) => s
            .parse::<u64>()
            .map_err(|e| BotError::QuoteUnavailable(format!("bad outAmount: {}", e)))?,
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| BotError::QuoteUnavailable("bad outAmount".to_string()))?,
        _ => {
            return Err(BotError::QuoteUnavailable(
                "response carries no outAmount".to_string(),
            ))
        }
    };

    Ok(Quote {
        input_mint,
        output_mint,
        in_amount,
        out_amount,
        route: body,
    })
}

fn build_leg(response: SwapInstructionsResponse) -> BotResult<SwapLeg> {
    let ui_instruction = response.swap_instruction.ok_or_else(|| {
        BotError::InstructionBuild("response carries no swap instruction".to_string())
    })?;

    let instruction = decode_instruction(&ui_instruction)?;
    let lookup_tables = collect_lookup_tables(&response.address_lookup_tables);

    Ok(SwapLeg {
        instruction,
        lookup_tables,
    })
}

fn decode_instruction(ui: &UiInstruction) -> BotResult<Instruction> {
    let program_id = Pubkey::from_str(&ui.program_id)
        .map_err(|e| BotError::InstructionBuild(format!("bad program id: {}", e)))?;

    let accounts = ui
        .accounts
        .iter()
        .map(|meta| {
            let pubkey = Pubkey::from_str(&meta.pubkey)
                .map_err(|e| BotError::InstructionBuild(format!("bad account key: {}", e)))?;
            Ok(AccountMeta {
                pubkey,
                is_signer: meta.is_signer,
                is_writable: meta.is_writable,
            })
        })
        .collect::<BotResult<Vec<_>>>()?;

    let data = BASE64
        .decode(&ui.data)
        .map_err(|e| BotError::InstructionBuild(format!("bad instruction payload: {}", e)))?;

    Ok(Instruction {
        program_id,
        accounts,
        data,
    })
}

/// Keep at most `MAX_LOOKUP_TABLES` tables, in the order received,
/// skipping any whose raw form is oversized or undecodable.
fn collect_lookup_tables(tables: &[UiLookupTable]) -> Vec<LookupTableRef> {
    let mut kept = Vec::new();

    for table in tables {
        if kept.len() == MAX_LOOKUP_TABLES {
            break;
        }

        let key = match Pubkey::from_str(&table.account_key) {
            Ok(key) => key,
            Err(e) => {
                log::warn!("Skipping lookup table with bad key {}: {}", table.account_key, e);
                continue;
            }
        };

        let raw = match BASE64.decode(&table.data) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Skipping lookup table {}: bad encoding: {}", key, e);
                continue;
            }
        };

        if raw.len() > LOOKUP_TABLE_DISCARD_BYTES {
            log::debug!(
                "Discarding lookup table {} ({} bytes, limit {})",
                key,
                raw.len(),
                LOOKUP_TABLE_DISCARD_BYTES
            );
            continue;
        }

        match decode_lookup_table(key, &raw) {
            Ok(table_ref) => kept.push(table_ref),
            Err(e) => log::warn!("Skipping lookup table {}: {}", key, e),
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Raw account bytes for an active lookup table with no authority:
    // 56-byte meta header followed by 32-byte addresses.
    fn fake_table_bytes(n_addresses: usize) -> Vec<u8> {
        let mut data = vec![0u8; 56];
        data[0] = 1; // ProgramState::LookupTable discriminant
        data[4..12].copy_from_slice(&u64::MAX.to_le_bytes()); // never deactivated
        for _ in 0..n_addresses {
            data.extend_from_slice(Pubkey::new_unique().as_ref());
        }
        data
    }

    fn ui_table(n_addresses: usize) -> UiLookupTable {
        UiLookupTable {
            account_key: Pubkey::new_unique().to_string(),
            data: BASE64.encode(fake_table_bytes(n_addresses)),
        }
    }

    fn ui_instruction() -> UiInstruction {
        UiInstruction {
            program_id: Pubkey::new_unique().to_string(),
            accounts: vec![UiAccountMeta {
                pubkey: Pubkey::new_unique().to_string(),
                is_signer: false,
                is_writable: true,
            }],
            data: BASE64.encode([9u8, 8, 7]),
        }
    }

    #[test]
    fn test_parse_quote_with_string_out_amount() {
        let body = json!({"outAmount": "60000", "routePlan": []});
        let quote =
            parse_quote_response(Pubkey::new_unique(), Pubkey::new_unique(), 10_000_000, body)
                .unwrap();
        assert_eq!(quote.out_amount, 60_000);
        assert_eq!(quote.in_amount, 10_000_000);
    }

    #[test]
    fn test_parse_quote_with_numeric_out_amount() {
        let body = json!({"outAmount": 60000});
        let quote =
            parse_quote_response(Pubkey::new_unique(), Pubkey::new_unique(), 1_000, body).unwrap();
        assert_eq!(quote.out_amount, 60_000);
    }

    #[test]
    fn test_parse_quote_without_out_amount_is_invalid() {
        let body = json!({"inAmount": "1000"});
        let result = parse_quote_response(Pubkey::new_unique(), Pubkey::new_unique(), 1_000, body);
        assert!(matches!(result, Err(BotError::QuoteUnavailable(_))));
    }

    #[test]
    fn test_build_leg_decodes_instruction() {
        let response = SwapInstructionsResponse {
            swap_instruction: Some(ui_instruction()),
            address_lookup_tables: vec![ui_table(2)],
        };

        let leg = build_leg(response).unwrap();
        assert_eq!(leg.instruction.data, vec![9, 8, 7]);
        assert_eq!(leg.instruction.accounts.len(), 1);
        assert_eq!(leg.lookup_tables.len(), 1);
        assert_eq!(leg.lookup_tables[0].account.addresses.len(), 2);
        assert_eq!(leg.lookup_tables[0].serialized_len, 56 + 2 * 32);
    }

    #[test]
    fn test_build_leg_without_swap_instruction_is_rejected() {
        let response = SwapInstructionsResponse {
            swap_instruction: None,
            address_lookup_tables: vec![],
        };
        assert!(matches!(
            build_leg(response),
            Err(BotError::InstructionBuild(_))
        ));
    }

    #[test]
    fn test_lookup_tables_capped_at_two_in_received_order() {
        let tables = vec![ui_table(1), ui_table(2), ui_table(3)];
        let first = tables[0].account_key.clone();
        let second = tables[1].account_key.clone();

        let kept = collect_lookup_tables(&tables);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].key.to_string(), first);
        assert_eq!(kept[1].key.to_string(), second);
    }

    #[test]
    fn test_oversized_lookup_table_discarded() {
        // 31 addresses puts the raw account at 56 + 992 = 1048 bytes.
        let tables = vec![ui_table(31), ui_table(1), ui_table(1)];
        let kept = collect_lookup_tables(&tables);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|t| t.serialized_len <= 1000));
    }

    #[test]
    fn test_undecodable_lookup_table_skipped() {
        let tables = vec![UiLookupTable {
            account_key: Pubkey::new_unique().to_string(),
            data: BASE64.encode([0u8; 8]),
        }];
        assert!(collect_lookup_tables(&tables).is_empty());
    }

    #[test]
    fn test_instruction_with_bad_payload_rejected() {
        let mut ui = ui_instruction();
        ui.data = "not base64!!!".to_string();
        assert!(decode_instruction(&ui).is_err());
    }
}
