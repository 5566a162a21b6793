//! `stockroom-ledger` — the domain model of the inventory ledger.
//!
//! Pure data and rules: stock items, ledger entries, import rows, the
//! matching key used to decide merge-vs-new, and dashboard aggregates.
//! Nothing here locks or performs IO; the engine crate owns storage and
//! concurrency.

pub mod entry;
pub mod import;
pub mod item;
pub mod match_key;
pub mod stats;

pub use entry::{EntryDraft, HistoryEntry, LedgerEntry, TransactionType};
pub use import::{CommitReport, ImportClassification, ImportRow, RowOutcome};
pub use item::{StockFields, StockItem};
pub use match_key::{MatchKey, MatchPolicy};
pub use stats::{Stats, StatsBuilder};
