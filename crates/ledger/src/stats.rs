//! Dashboard aggregates over the catalog and ledger.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entry::{LedgerEntry, TransactionType};
use crate::match_key::MatchKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_unique_items: u64,
    pub total_received: Decimal,
    pub total_issued: Decimal,
    pub low_stock_count: u64,
}

/// Folds per-item snapshots into [`Stats`].
///
/// Totals count quantities that actually moved and stayed moved: an entry
/// that was later reversed contributes nothing, and REVERSAL entries
/// themselves contribute nothing. `total_unique_items` counts distinct
/// match keys, so duplicate catalog records of one physical part count
/// once.
#[derive(Debug, Default)]
pub struct StatsBuilder {
    keys: HashSet<MatchKey>,
    received: Decimal,
    issued: Decimal,
    low_stock: u64,
}

impl StatsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(
        &mut self,
        key: MatchKey,
        available_quantity: Decimal,
        min_quantity: Decimal,
        entries: &[LedgerEntry],
    ) {
        self.keys.insert(key);
        if available_quantity < min_quantity {
            self.low_stock += 1;
        }
        for entry in entries {
            if entry.reversed_by.is_some() {
                continue;
            }
            match entry.transaction_type {
                TransactionType::In => self.received += entry.quantity_change,
                TransactionType::Out => self.issued += entry.quantity_change.abs(),
                TransactionType::Reversal => {}
            }
        }
    }

    pub fn finish(self) -> Stats {
        Stats {
            total_unique_items: self.keys.len() as u64,
            total_received: self.received,
            total_issued: self.issued,
            low_stock_count: self.low_stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryDraft;
    use crate::match_key::MatchPolicy;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use stockroom_core::{LedgerId, StockId};

    fn entry(
        id: u64,
        transaction_type: TransactionType,
        quantity_change: Decimal,
        reversed_by: Option<u64>,
    ) -> LedgerEntry {
        let mut entry = EntryDraft {
            transaction_type,
            quantity_change,
            reference: "test".to_string(),
            optional_reason: None,
            created_by: "test".to_string(),
        }
        .stamp(LedgerId::from_u64(id), StockId::new(), Utc::now());
        entry.reversed_by = reversed_by.map(LedgerId::from_u64);
        entry
    }

    fn key(part_name: &str) -> MatchKey {
        MatchPolicy::default().key("P1", part_name, "pcs", "A1", "")
    }

    #[test]
    fn test_totals_exclude_reversed_entries() {
        let mut builder = StatsBuilder::new();
        builder.add_item(
            key("Bolt"),
            dec!(100),
            dec!(0),
            &[
                entry(1, TransactionType::In, dec!(100), None),
                entry(2, TransactionType::Out, dec!(-30), Some(3)),
                entry(3, TransactionType::Reversal, dec!(30), None),
            ],
        );

        let stats = builder.finish();
        assert_eq!(stats.total_received, dec!(100));
        assert_eq!(stats.total_issued, dec!(0));
    }

    #[test]
    fn test_issued_total_is_reported_positive() {
        let mut builder = StatsBuilder::new();
        builder.add_item(
            key("Bolt"),
            dec!(60),
            dec!(0),
            &[
                entry(1, TransactionType::In, dec!(100), None),
                entry(2, TransactionType::Out, dec!(-40), None),
            ],
        );

        let stats = builder.finish();
        assert_eq!(stats.total_issued, dec!(40));
    }

    #[test]
    fn test_unique_items_counts_match_keys_not_records() {
        let mut builder = StatsBuilder::new();
        builder.add_item(key("Bolt"), dec!(10), dec!(0), &[]);
        builder.add_item(key("Bolt"), dec!(5), dec!(0), &[]);
        builder.add_item(key("Nut"), dec!(3), dec!(0), &[]);

        assert_eq!(builder.finish().total_unique_items, 2);
    }

    #[test]
    fn test_low_stock_is_strictly_below_threshold() {
        let mut builder = StatsBuilder::new();
        builder.add_item(key("Bolt"), dec!(10), dec!(10), &[]);
        builder.add_item(key("Nut"), dec!(9), dec!(10), &[]);
        builder.add_item(key("Washer"), dec!(0), dec!(0), &[]);

        assert_eq!(builder.finish().low_stock_count, 1);
    }
}
