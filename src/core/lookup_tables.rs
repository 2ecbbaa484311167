use solana_sdk::{
    address_lookup_table::{state::AddressLookupTable, AddressLookupTableAccount},
    pubkey::Pubkey,
};
use std::collections::HashSet;

use crate::types::common::{BotError, BotResult, LookupTableRef, MAX_LOOKUP_TABLES};

/// Decode a raw lookup-table account blob into an addressable table.
pub fn decode_lookup_table(key: Pubkey, raw: &[u8]) -> BotResult<LookupTableRef> {
    let table = AddressLookupTable::deserialize(raw)
        .map_err(|e| BotError::InstructionBuild(format!("Undecodable lookup table {}: {}", key, e)))?;

    let account = AddressLookupTableAccount {
        key,
        addresses: table.addresses.to_vec(),
    };

    Ok(LookupTableRef {
        key,
        account,
        serialized_len: raw.len(),
    })
}

/// Rank-select the lookup tables for one transaction: dedupe by key (first
/// occurrence wins), order ascending by serialized size, keep the smallest
/// two. Transaction size is dominated by table bytes, so the smallest
/// survivors give the best chance of fitting the wire ceiling.
///
/// Pure: no I/O, never fails. Tables with no measurable serialization are
/// dropped with a log line.
pub fn optimize(tables: Vec<LookupTableRef>) -> Vec<LookupTableRef> {
    let mut seen: HashSet<Pubkey> = HashSet::new();
    let mut survivors: Vec<LookupTableRef> = Vec::with_capacity(tables.len());

    for table in tables {
        if !seen.insert(table.key) {
            log::debug!("Dropping duplicate lookup table {}", table.key);
            continue;
        }
        if table.serialized_len == 0 {
            log::warn!("Dropping lookup table {} with no serialized form", table.key);
            continue;
        }
        survivors.push(table);
    }

    survivors.sort_by_key(|t| t.serialized_len);
    survivors.truncate(MAX_LOOKUP_TABLES);
    survivors
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table_ref(key: Pubkey, serialized_len: usize) -> LookupTableRef {
        LookupTableRef {
            key,
            account: AddressLookupTableAccount {
                key,
                addresses: vec![Pubkey::new_unique()],
            },
            serialized_len,
        }
    }

    #[test]
    fn test_keeps_two_smallest_ascending() {
        let tables = vec![
            table_ref(Pubkey::new_unique(), 500),
            table_ref(Pubkey::new_unique(), 50),
            table_ref(Pubkey::new_unique(), 10),
        ];

        let kept = optimize(tables);
        let sizes: Vec<usize> = kept.iter().map(|t| t.serialized_len).collect();
        assert_eq!(sizes, vec![10, 50]);
    }

    #[test]
    fn test_dedupes_by_key_first_wins() {
        let shared = Pubkey::new_unique();
        let tables = vec![
            table_ref(shared, 400),
            table_ref(shared, 5),
            table_ref(Pubkey::new_unique(), 100),
        ];

        let kept = optimize(tables);
        assert_eq!(kept.len(), 2);
        // The duplicate's first occurrence (400 bytes) survives, not the 5-byte copy.
        assert_eq!(kept[0].serialized_len, 100);
        assert_eq!(kept[1].serialized_len, 400);
        assert_eq!(kept[1].key, shared);
    }

    #[test]
    fn test_drops_unserializable_tables() {
        let tables = vec![
            table_ref(Pubkey::new_unique(), 0),
            table_ref(Pubkey::new_unique(), 80),
        ];

        let kept = optimize(tables);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].serialized_len, 80);
    }

    #[test]
    fn test_empty_input() {
        assert!(optimize(Vec::new()).is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_lookup_table(Pubkey::new_unique(), &[0xff; 16]);
        assert!(result.is_err());
    }
}
