//! Ledger entries: the append-only movement records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{LedgerError, LedgerId, StockId};

/// Reference recorded on manual single-item receipts.
pub const MANUAL_ADDITION_REFERENCE: &str = "Manual Stock Addition";

/// Reference recorded on import-sourced receipts.
pub fn import_reference(invoice: &str, supplier_name: &str) -> String {
    format!("Excel Import: {invoice} | Supplier: {supplier_name}")
}

/// Reference recorded on a reversal entry, naming the entry it undoes.
pub fn reversal_reference(original: LedgerId) -> String {
    format!("Reversal of Ledger ID: {original}")
}

/// Reason recorded on a reversal entry, carrying the original reference
/// forward so the audit trail reads without a join.
pub fn reversal_reason(original_reference: &str) -> String {
    format!("Original Ref: {original_reference}")
}

/// Direction of a ledger entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    In,
    Out,
    Reversal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
            TransactionType::Reversal => "REVERSAL",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(TransactionType::In),
            "OUT" => Ok(TransactionType::Out),
            "REVERSAL" => Ok(TransactionType::Reversal),
            other => Err(LedgerError::validation(format!(
                "unknown transaction type: {other}"
            ))),
        }
    }
}

/// One immutable movement record.
///
/// Entries are never updated or deleted once committed, with a single
/// exception: `reversed_by` is written exactly once, at the moment a
/// reversal of this entry commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub ledger_id: LedgerId,
    pub stock_id: StockId,
    pub transaction_type: TransactionType,
    /// Signed: positive for IN, negative for OUT, either sign for REVERSAL.
    pub quantity_change: Decimal,
    pub transaction_date: DateTime<Utc>,
    pub reference: String,
    #[serde(default)]
    pub optional_reason: Option<String>,
    pub created_by: String,
    #[serde(default)]
    pub reversed_by: Option<LedgerId>,
}

/// A ledger entry before the store assigns its identity and commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub transaction_type: TransactionType,
    pub quantity_change: Decimal,
    pub reference: String,
    pub optional_reason: Option<String>,
    pub created_by: String,
}

impl EntryDraft {
    /// Finalize the draft into a committed entry.
    pub fn stamp(
        self,
        ledger_id: LedgerId,
        stock_id: StockId,
        transaction_date: DateTime<Utc>,
    ) -> LedgerEntry {
        LedgerEntry {
            ledger_id,
            stock_id,
            transaction_type: self.transaction_type,
            quantity_change: self.quantity_change,
            transaction_date,
            reference: self.reference,
            optional_reason: self.optional_reason,
            created_by: self.created_by,
            reversed_by: None,
        }
    }
}

/// Ledger entry joined with the owning item's naming fields, as shown in
/// the audit and export views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    pub part_name: String,
    pub description: String,
}

impl HistoryEntry {
    /// Case-insensitive substring match on the audit-view search fields:
    /// reference, reason, acting user, entry type, part name, description.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        let hit = |s: &str| s.to_lowercase().contains(needle.as_str());
        hit(&self.entry.reference)
            || self.entry.optional_reason.as_deref().is_some_and(hit)
            || hit(&self.entry.created_by)
            || hit(self.entry.transaction_type.as_str())
            || hit(&self.part_name)
            || hit(&self.description)
    }
}
