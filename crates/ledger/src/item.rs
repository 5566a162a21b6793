//! Stock items: the descriptive master record plus its live quantities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{LedgerError, LedgerResult, StockId};

/// Descriptive fields of a stock item. Fixed at creation; corrections go
/// through reversal and re-entry, not in-place edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockFields {
    pub project: String,
    pub supplier_name: String,
    pub invoice: String,
    pub po_no: String,
    pub part_name: String,
    pub description: String,
    pub uom: String,
    pub location: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl StockFields {
    /// Required-field check for new stock. `uom` and `location` may be
    /// blank; `part_name` and `project` may not.
    pub fn validate_required(&self) -> LedgerResult<()> {
        if self.part_name.trim().is_empty() {
            return Err(LedgerError::required("part_name"));
        }
        if self.project.trim().is_empty() {
            return Err(LedgerError::required("project"));
        }
        Ok(())
    }

    /// Case-insensitive substring match on the catalog search fields:
    /// part name, project, description.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.part_name.to_lowercase().contains(&needle)
            || self.project.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// Snapshot of one stock item: the master fields together with the
/// quantities as of the moment the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub stock_id: StockId,
    #[serde(flatten)]
    pub fields: StockFields,
    pub available_quantity: Decimal,
    pub min_quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub last_movement: Option<DateTime<Utc>>,
}

impl StockItem {
    /// Below-threshold check used by the dashboard. An item sitting exactly
    /// at its threshold is not low.
    pub fn is_low_stock(&self) -> bool {
        self.available_quantity < self.min_quantity
    }
}
