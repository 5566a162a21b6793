//! Bulk import rows and their classification against the catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{LedgerId, StockId};

use crate::item::{StockFields, StockItem};
use crate::match_key::normalize;

/// One parsed spreadsheet row. Nothing is persisted until the batch is
/// confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub project: String,
    pub supplier_name: String,
    pub invoice: String,
    pub po_no: String,
    pub part_name: String,
    pub description: String,
    pub quantity: Decimal,
    pub uom: String,
    pub location: String,
    #[serde(default)]
    pub remarks: Option<String>,
    /// Receipt date as written on the sheet. Informational only; the ledger
    /// stamps its own transaction date at commit.
    #[serde(default)]
    pub rec_date: Option<String>,
}

impl ImportRow {
    pub fn stock_fields(&self) -> StockFields {
        StockFields {
            project: self.project.clone(),
            supplier_name: self.supplier_name.clone(),
            invoice: self.invoice.clone(),
            po_no: self.po_no.clone(),
            part_name: self.part_name.clone(),
            description: self.description.clone(),
            uom: self.uom.clone(),
            location: self.location.clone(),
            remarks: self.remarks.clone(),
        }
    }
}

/// How one import row relates to the current catalog.
///
/// Tagged by `status` on the wire; the preview a client confirms is the
/// same shape it got back from classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ImportClassification {
    /// The row matched existing stock and will merge into it.
    #[serde(rename = "MERGED")]
    Merged {
        row: ImportRow,
        matched_stock_id: StockId,
        /// Secondary-field mismatches worth a human glance. Never blocks
        /// the merge.
        #[serde(default)]
        diff_reason: Option<String>,
    },
    /// No match; confirming will create a new stock item.
    #[serde(rename = "NEW")]
    New { row: ImportRow },
}

impl ImportClassification {
    pub fn row(&self) -> &ImportRow {
        match self {
            ImportClassification::Merged { row, .. } | ImportClassification::New { row } => row,
        }
    }
}

/// Compare the secondary fields of a row against the item it merges into.
/// Differences are reported, not enforced; matching is decided by the
/// identity tuple alone.
pub fn diff_reason(row: &ImportRow, existing: &StockItem) -> Option<String> {
    let mut diffs = Vec::new();
    let mut check = |field: &str, incoming: &str, current: &str| {
        if normalize(incoming) != normalize(current) {
            diffs.push(format!("{field}: {incoming:?} != {current:?}"));
        }
    };

    check(
        "supplier_name",
        &row.supplier_name,
        &existing.fields.supplier_name,
    );
    check("invoice", &row.invoice, &existing.fields.invoice);
    check("po_no", &row.po_no, &existing.fields.po_no);

    if diffs.is_empty() {
        None
    } else {
        Some(diffs.join("; "))
    }
}

/// Per-row result of a confirmed batch commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum RowOutcome {
    /// The row committed: its quantity landed on `stock_id` as `ledger_id`.
    #[serde(rename = "COMMITTED")]
    Committed {
        stock_id: StockId,
        ledger_id: LedgerId,
    },
    /// The row failed; the rest of the batch continued without it.
    #[serde(rename = "FAILED")]
    Failed { reason: String },
}

/// Batch commit report: one outcome per input row, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    pub outcomes: Vec<RowOutcome>,
    pub committed: usize,
    pub failed: usize,
}

impl CommitReport {
    pub fn from_outcomes(outcomes: Vec<RowOutcome>) -> Self {
        let committed = outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Committed { .. }))
            .count();
        let failed = outcomes.len() - committed;
        Self {
            outcomes,
            committed,
            failed,
        }
    }
}
