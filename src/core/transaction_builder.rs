use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    transaction::VersionedTransaction,
};

use crate::{
    config::SignerHandle,
    types::common::{
        BotError, BotResult, LookupTableRef, TransactionCandidate, MAX_TRANSACTION_SIZE,
    },
};

pub struct TransactionBuilder {
    signer: SignerHandle,
}

impl TransactionBuilder {
    pub fn new(signer: SignerHandle) -> Self {
        Self { signer }
    }

    /// Compile the combined instruction sequence into a signed, size-valid
    /// versioned transaction. Two tiers: with the optimized lookup tables
    /// first (if any), then without. A sequence that fits neither way is a
    /// structural failure; retrying cannot shrink it.
    pub fn assemble(
        &self,
        instructions: &[Instruction],
        tables: &[LookupTableRef],
        blockhash: Hash,
        last_valid_block_height: u64,
    ) -> BotResult<TransactionCandidate> {
        if !tables.is_empty() {
            let accounts: Vec<AddressLookupTableAccount> =
                tables.iter().map(|t| t.account.clone()).collect();

            match self.compile_and_sign(instructions, &accounts, blockhash) {
                Ok((transaction, size)) if size <= MAX_TRANSACTION_SIZE => {
                    log::debug!("Assembled with {} lookup tables ({} bytes)", tables.len(), size);
                    return Ok(TransactionCandidate {
                        transaction,
                        serialized_size: size,
                        blockhash,
                        last_valid_block_height,
                        with_lookup_tables: true,
                    });
                }
                Ok((_, size)) => {
                    log::debug!(
                        "With lookup tables the transaction is {} bytes, over the {}-byte ceiling",
                        size,
                        MAX_TRANSACTION_SIZE
                    );
                }
                Err(e) => {
                    log::debug!("Compile with lookup tables failed: {}", e);
                }
            }
        }

        match self.compile_and_sign(instructions, &[], blockhash) {
            Ok((transaction, size)) if size <= MAX_TRANSACTION_SIZE => {
                log::debug!("Assembled without lookup tables ({} bytes)", size);
                Ok(TransactionCandidate {
                    transaction,
                    serialized_size: size,
                    blockhash,
                    last_valid_block_height,
                    with_lookup_tables: false,
                })
            }
            Ok((_, size)) => Err(BotError::NoViableTransaction(format!(
                "{} bytes even without lookup tables (max {})",
                size, MAX_TRANSACTION_SIZE
            ))),
            Err(e) => Err(e),
        }
    }

    fn compile_and_sign(
        &self,
        instructions: &[Instruction],
        tables: &[AddressLookupTableAccount],
        blockhash: Hash,
    ) -> BotResult<(VersionedTransaction, usize)> {
        let message = v0::Message::try_compile(&self.signer.pubkey(), instructions, tables, blockhash)
            .map_err(|e| BotError::NoViableTransaction(format!("Message compile failed: {}", e)))?;

        let transaction =
            VersionedTransaction::try_new(VersionedMessage::V0(message), &[self.signer.keypair()])
                .map_err(|e| BotError::NoViableTransaction(format!("Signing failed: {}", e)))?;

        let size = bincode::serialize(&transaction)
            .map_err(|e| BotError::NoViableTransaction(format!("Serialization failed: {}", e)))?
            .len();

        Ok((transaction, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey, signature::Keypair};

    fn builder() -> TransactionBuilder {
        TransactionBuilder::new(SignerHandle::new(Keypair::new()))
    }

    fn table_for(addresses: Vec<Pubkey>) -> LookupTableRef {
        let key = Pubkey::new_unique();
        LookupTableRef {
            key,
            account: AddressLookupTableAccount { key, addresses },
            serialized_len: 56 + 32,
        }
    }

    #[test]
    fn test_small_instruction_fits_without_tables() {
        let ix = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![],
            data: vec![1, 2, 3],
        };

        let candidate = builder()
            .assemble(&[ix], &[], Hash::default(), 100)
            .unwrap();

        assert!(!candidate.with_lookup_tables);
        assert!(candidate.serialized_size <= MAX_TRANSACTION_SIZE);
        assert_eq!(candidate.last_valid_block_height, 100);
    }

    #[test]
    fn test_lookup_tables_used_when_they_fit() {
        let referenced = Pubkey::new_unique();
        let ix = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new_readonly(referenced, false)],
            data: vec![0; 64],
        };
        let table = table_for(vec![referenced]);

        let candidate = builder()
            .assemble(&[ix], &[table], Hash::default(), 100)
            .unwrap();

        assert!(candidate.with_lookup_tables);
        assert!(candidate.serialized_size <= MAX_TRANSACTION_SIZE);
    }

    #[test]
    fn test_falls_back_to_no_table_variant_at_the_boundary() {
        // With one table-resolved account the lookup block costs 3 bytes
        // more than carrying the key statically. 1026 bytes of data puts
        // the no-table form at the ceiling and the table form just over.
        let referenced = Pubkey::new_unique();
        let ix = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new_readonly(referenced, false)],
            data: vec![0; 1026],
        };
        let table = table_for(vec![referenced]);

        let candidate = builder()
            .assemble(&[ix], &[table], Hash::default(), 100)
            .unwrap();

        assert!(!candidate.with_lookup_tables);
        assert!(candidate.serialized_size <= MAX_TRANSACTION_SIZE);
    }

    #[test]
    fn test_structurally_oversized_is_rejected() {
        let ix = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![],
            data: vec![0; 2000],
        };

        let result = builder().assemble(&[ix], &[], Hash::default(), 100);
        assert!(matches!(result, Err(BotError::NoViableTransaction(_))));
    }
}
