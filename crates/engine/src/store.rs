//! In-memory catalog and ledger with per-item critical sections.
//!
//! Layout:
//!
//! ```text
//! LedgerStore
//!   items:        RwLock<HashMap<StockId, Arc<StockRecord>>>    catalog
//!   match_index:  RwLock<HashMap<MatchKey, StockId>>            merge lookup
//!   entry_index:  RwLock<HashMap<LedgerId, StockId>>            entry -> owner
//!   sequence:     AtomicU64                                     ledger ids
//!
//! StockRecord
//!   id, fields, created_at     immutable after creation
//!   cell: Mutex<ItemCell>      available_quantity + min_quantity + entries
//! ```
//!
//! A stock item's quantity and its ledger entries live behind one mutex, so
//! every check-then-mutate-then-append sequence is a single critical
//! section, and any reader of the cell sees quantity and ledger tail in
//! agreement. Operations on different items take different cells and never
//! block each other.
//!
//! Lock order is acyclic: catalog or index read, release, then cell; cell,
//! then `entry_index` write. No path holds two cells at once, and no path
//! takes the catalog write lock while holding a cell.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use stockroom_core::{LedgerError, LedgerId, StockId};
use stockroom_ledger::{
    EntryDraft, HistoryEntry, LedgerEntry, MatchKey, MatchPolicy, Stats, StatsBuilder,
    StockFields, StockItem, TransactionType,
};

use crate::error::{EngineError, StoreError};

/// The mutable half of a stock item. Everything that changes after creation
/// lives here, under one lock.
#[derive(Debug)]
struct ItemCell {
    available_quantity: Decimal,
    min_quantity: Decimal,
    entries: Vec<LedgerEntry>,
}

#[derive(Debug)]
struct StockRecord {
    id: StockId,
    fields: StockFields,
    created_at: DateTime<Utc>,
    cell: Mutex<ItemCell>,
}

impl StockRecord {
    fn snapshot(&self, cell: &ItemCell) -> StockItem {
        StockItem {
            stock_id: self.id,
            fields: self.fields.clone(),
            available_quantity: cell.available_quantity,
            min_quantity: cell.min_quantity,
            created_at: self.created_at,
            last_movement: cell.entries.last().map(|e| e.transaction_date),
        }
    }

    fn lock_cell(&self) -> Result<MutexGuard<'_, ItemCell>, StoreError> {
        self.cell
            .lock()
            .map_err(|_| StoreError::LockPoisoned("item cell"))
    }
}

/// The catalog, the ledger, and the indexes over both.
#[derive(Debug)]
pub struct LedgerStore {
    policy: MatchPolicy,
    items: RwLock<HashMap<StockId, Arc<StockRecord>>>,
    match_index: RwLock<HashMap<MatchKey, StockId>>,
    entry_index: RwLock<HashMap<LedgerId, StockId>>,
    sequence: AtomicU64,
}

impl LedgerStore {
    /// The matching policy is fixed for the store's lifetime, so a match
    /// key computed at any point stays comparable with every other.
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            policy,
            items: RwLock::new(HashMap::new()),
            match_index: RwLock::new(HashMap::new()),
            entry_index: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    fn next_ledger_id(&self) -> LedgerId {
        LedgerId::from_u64(self.sequence.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Create a stock item with zero quantity and register it in the match
    /// index. The first item per key wins the index slot; later duplicates
    /// stay reachable by id.
    pub(crate) fn create(&self, fields: StockFields) -> Result<StockItem, EngineError> {
        let record = Arc::new(StockRecord {
            id: StockId::new(),
            fields,
            created_at: Utc::now(),
            cell: Mutex::new(ItemCell {
                available_quantity: Decimal::ZERO,
                min_quantity: Decimal::ZERO,
                entries: Vec::new(),
            }),
        });
        let key = self.policy.key_for_item(&record.fields);
        let snapshot = StockItem {
            stock_id: record.id,
            fields: record.fields.clone(),
            available_quantity: Decimal::ZERO,
            min_quantity: Decimal::ZERO,
            created_at: record.created_at,
            last_movement: None,
        };

        {
            let mut items = self
                .items
                .write()
                .map_err(|_| StoreError::LockPoisoned("catalog"))?;
            items.insert(record.id, record.clone());
        }
        {
            let mut index = self
                .match_index
                .write()
                .map_err(|_| StoreError::LockPoisoned("match index"))?;
            index.entry(key).or_insert(record.id);
        }

        Ok(snapshot)
    }

    /// Point lookup.
    pub fn find(&self, stock_id: StockId) -> Result<StockItem, EngineError> {
        let record = self.record(stock_id)?;
        let cell = record.lock_cell()?;
        Ok(record.snapshot(&cell))
    }

    /// Exact lookup on the identity tuple, `None` when nothing matches.
    pub fn find_match(&self, key: &MatchKey) -> Result<Option<StockItem>, EngineError> {
        let id = {
            let index = self
                .match_index
                .read()
                .map_err(|_| StoreError::LockPoisoned("match index"))?;
            index.get(key).copied()
        };
        match id {
            Some(id) => self.find(id).map(Some),
            None => Ok(None),
        }
    }

    /// Page through the catalog, ascending by stock id (UUIDv7, so creation
    /// order). A stable sort key keeps concurrent creates from reshuffling
    /// already-served pages. Returns the page plus the total match count.
    pub fn list_items(
        &self,
        page: usize,
        page_size: usize,
        search: Option<&str>,
    ) -> Result<(Vec<StockItem>, usize), EngineError> {
        let mut records = self.all_records()?;
        records.sort_by_key(|r| r.id);
        if let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) {
            records.retain(|r| r.fields.matches_search(needle));
        }

        let total = records.len();
        let start = page.saturating_sub(1).saturating_mul(page_size);
        let mut items = Vec::new();
        for record in records.into_iter().skip(start).take(page_size) {
            let cell = record.lock_cell()?;
            items.push(record.snapshot(&cell));
        }
        Ok((items, total))
    }

    /// Page through the joined audit view, newest first.
    pub fn list_history(
        &self,
        page: usize,
        page_size: usize,
        search: Option<&str>,
    ) -> Result<(Vec<HistoryEntry>, usize), EngineError> {
        let mut rows = self.collect_history(None, None, None)?;
        if let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) {
            rows.retain(|r| r.matches_search(needle));
        }
        let total = rows.len();
        let start = page.saturating_sub(1).saturating_mul(page_size);
        let rows = rows.into_iter().skip(start).take(page_size).collect();
        Ok((rows, total))
    }

    /// Unpaged audit view for export, filtered by calendar-date range
    /// (inclusive on both ends) and entry type, newest first.
    pub fn export_history(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        type_filter: Option<TransactionType>,
    ) -> Result<Vec<HistoryEntry>, EngineError> {
        self.collect_history(date_from, date_to, type_filter)
    }

    /// Look up one ledger entry.
    pub fn entry(&self, ledger_id: LedgerId) -> Result<LedgerEntry, EngineError> {
        let owner = self.entry_owner(ledger_id)?;
        let record = self.record(owner)?;
        let cell = record.lock_cell()?;
        cell.entries
            .iter()
            .find(|e| e.ledger_id == ledger_id)
            .cloned()
            .ok_or_else(|| LedgerError::entry_not_found(ledger_id).into())
    }

    /// Dashboard aggregates. Each item is folded under its own cell lock;
    /// the result is per-item consistent, not a global snapshot.
    pub fn stats(&self) -> Result<Stats, EngineError> {
        let mut builder = StatsBuilder::new();
        for record in self.all_records()? {
            let key = self.policy.key_for_item(&record.fields);
            let cell = record.lock_cell()?;
            builder.add_item(key, cell.available_quantity, cell.min_quantity, &cell.entries);
        }
        Ok(builder.finish())
    }

    /// Resolve which stock item owns a ledger entry.
    pub(crate) fn entry_owner(&self, ledger_id: LedgerId) -> Result<StockId, EngineError> {
        let index = self
            .entry_index
            .read()
            .map_err(|_| StoreError::LockPoisoned("entry index"))?;
        index
            .get(&ledger_id)
            .copied()
            .ok_or_else(|| LedgerError::entry_not_found(ledger_id).into())
    }

    /// Update an item's reorder threshold. Not a movement; no ledger entry
    /// is written.
    pub(crate) fn set_min_quantity(
        &self,
        stock_id: StockId,
        min_quantity: Decimal,
    ) -> Result<StockItem, EngineError> {
        let record = self.record(stock_id)?;
        let mut cell = record.lock_cell()?;
        cell.min_quantity = min_quantity;
        Ok(record.snapshot(&cell))
    }

    /// Run `f` inside the item's critical section.
    ///
    /// The transaction value is consumed by its commit methods, so one
    /// critical section appends at most one entry, and the lock is released
    /// on every exit path.
    pub(crate) fn with_item<T, F>(&self, stock_id: StockId, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(ItemTxn<'_>) -> Result<T, EngineError>,
    {
        let record = self.record(stock_id)?;
        let cell = record.lock_cell()?;
        f(ItemTxn {
            store: self,
            record: record.as_ref(),
            cell,
        })
    }

    fn record(&self, stock_id: StockId) -> Result<Arc<StockRecord>, EngineError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::LockPoisoned("catalog"))?;
        items
            .get(&stock_id)
            .cloned()
            .ok_or_else(|| LedgerError::stock_not_found(stock_id).into())
    }

    fn all_records(&self) -> Result<Vec<Arc<StockRecord>>, EngineError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::LockPoisoned("catalog"))?;
        Ok(items.values().cloned().collect())
    }

    fn collect_history(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        type_filter: Option<TransactionType>,
    ) -> Result<Vec<HistoryEntry>, EngineError> {
        let mut rows = Vec::new();
        for record in self.all_records()? {
            let cell = record.lock_cell()?;
            for entry in &cell.entries {
                let day = entry.transaction_date.date_naive();
                if date_from.is_some_and(|from| day < from) {
                    continue;
                }
                if date_to.is_some_and(|to| day > to) {
                    continue;
                }
                if type_filter.is_some_and(|t| entry.transaction_type != t) {
                    continue;
                }
                rows.push(HistoryEntry {
                    entry: entry.clone(),
                    part_name: record.fields.part_name.clone(),
                    description: record.fields.description.clone(),
                });
            }
        }

        // Ledger ids are allocation-ordered, so this is newest first.
        rows.sort_by(|a, b| b.entry.ledger_id.cmp(&a.entry.ledger_id));
        Ok(rows)
    }
}

/// Exclusive transaction over one stock item's quantity and ledger tail.
pub(crate) struct ItemTxn<'a> {
    store: &'a LedgerStore,
    record: &'a StockRecord,
    cell: MutexGuard<'a, ItemCell>,
}

impl ItemTxn<'_> {
    pub fn entry(&self, ledger_id: LedgerId) -> Option<&LedgerEntry> {
        self.cell.entries.iter().find(|e| e.ledger_id == ledger_id)
    }

    /// Apply the draft's quantity change and append the entry, refusing any
    /// change that would drive the quantity negative. On failure nothing is
    /// written and no ledger id is spent.
    pub fn commit(self, draft: EntryDraft) -> Result<LedgerEntry, EngineError> {
        self.commit_inner(draft, None)
    }

    /// Commit a reversal entry and stamp `reversed_by` on the entry it
    /// undoes, in the same critical section. The stamp is write-once: a
    /// target already carrying one fails `AlreadyReversed` before anything
    /// is written.
    pub fn commit_reversal(
        self,
        reverses: LedgerId,
        draft: EntryDraft,
    ) -> Result<LedgerEntry, EngineError> {
        self.commit_inner(draft, Some(reverses))
    }

    fn commit_inner(
        mut self,
        draft: EntryDraft,
        reverses: Option<LedgerId>,
    ) -> Result<LedgerEntry, EngineError> {
        let new_quantity = self.cell.available_quantity + draft.quantity_change;
        if new_quantity < Decimal::ZERO {
            return Err(LedgerError::insufficient_stock(
                draft.quantity_change.abs(),
                self.cell.available_quantity,
            )
            .into());
        }

        let reversed_at = match reverses {
            Some(target) => {
                let pos = self
                    .cell
                    .entries
                    .iter()
                    .position(|e| e.ledger_id == target)
                    .ok_or_else(|| LedgerError::entry_not_found(target))?;
                if self.cell.entries[pos].reversed_by.is_some() {
                    return Err(LedgerError::AlreadyReversed(target).into());
                }
                Some(pos)
            }
            None => None,
        };

        let ledger_id = self.store.next_ledger_id();
        let entry = draft.stamp(ledger_id, self.record.id, Utc::now());

        // Registered while the cell is still held: anyone resolving this id
        // through the index must wait for the cell, and will then see the
        // appended entry.
        {
            let mut index = self
                .store
                .entry_index
                .write()
                .map_err(|_| StoreError::LockPoisoned("entry index"))?;
            index.insert(ledger_id, self.record.id);
        }

        if let Some(pos) = reversed_at {
            self.cell.entries[pos].reversed_by = Some(ledger_id);
        }
        self.cell.available_quantity = new_quantity;
        self.cell.entries.push(entry.clone());

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fields(part_name: &str, location: &str) -> StockFields {
        StockFields {
            project: "Line 3".to_string(),
            supplier_name: "Acme Corp".to_string(),
            invoice: "INV-001".to_string(),
            po_no: "PO-42".to_string(),
            part_name: part_name.to_string(),
            description: "Hex bolt".to_string(),
            uom: "pcs".to_string(),
            location: location.to_string(),
            remarks: None,
        }
    }

    fn draft(transaction_type: TransactionType, quantity_change: Decimal) -> EntryDraft {
        EntryDraft {
            transaction_type,
            quantity_change,
            reference: "test".to_string(),
            optional_reason: None,
            created_by: "test".to_string(),
        }
    }

    fn store() -> LedgerStore {
        LedgerStore::new(MatchPolicy::default())
    }

    #[test]
    fn test_create_then_find_round_trips() {
        let store = store();
        let created = store.create(fields("Bolt M8", "A1")).unwrap();
        let found = store.find(created.stock_id).unwrap();

        assert_eq!(found.fields.part_name, "Bolt M8");
        assert_eq!(found.available_quantity, dec!(0));
        assert_eq!(found.min_quantity, dec!(0));
        assert_eq!(found.last_movement, None);
    }

    #[test]
    fn test_find_unknown_id_is_not_found() {
        let err = store().find(StockId::new()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_find_match_is_case_and_whitespace_insensitive() {
        let store = store();
        let created = store.create(fields("Bolt M8", "A1")).unwrap();

        let key = store.policy().key("  LINE  3 ", "bolt m8", "PCS", "a1", "anything");
        let hit = store.find_match(&key).unwrap().unwrap();
        assert_eq!(hit.stock_id, created.stock_id);

        let miss = store.policy().key("Line 3", "Bolt M8", "pcs", "B2", "");
        assert_eq!(store.find_match(&miss).unwrap(), None);
    }

    #[test]
    fn test_duplicate_key_keeps_first_item_in_index() {
        let store = store();
        let first = store.create(fields("Bolt M8", "A1")).unwrap();
        let second = store.create(fields("Bolt M8", "A1")).unwrap();
        assert_ne!(first.stock_id, second.stock_id);

        let key = store.policy().key_for_item(&first.fields);
        let hit = store.find_match(&key).unwrap().unwrap();
        assert_eq!(hit.stock_id, first.stock_id);

        // Both remain independently addressable.
        assert!(store.find(second.stock_id).is_ok());
    }

    #[test]
    fn test_commit_updates_quantity_ledger_and_index() {
        let store = store();
        let item = store.create(fields("Bolt M8", "A1")).unwrap();

        let entry = store
            .with_item(item.stock_id, |txn| {
                txn.commit(draft(TransactionType::In, dec!(100)))
            })
            .unwrap();

        assert_eq!(entry.ledger_id, LedgerId::from_u64(1));
        assert_eq!(entry.stock_id, item.stock_id);

        let after = store.find(item.stock_id).unwrap();
        assert_eq!(after.available_quantity, dec!(100));
        assert_eq!(after.last_movement, Some(entry.transaction_date));
        assert_eq!(store.entry(entry.ledger_id).unwrap(), entry);
    }

    #[test]
    fn test_commit_refuses_underflow_and_leaves_no_trace() {
        let store = store();
        let item = store.create(fields("Bolt M8", "A1")).unwrap();
        store
            .with_item(item.stock_id, |txn| {
                txn.commit(draft(TransactionType::In, dec!(10)))
            })
            .unwrap();

        let err = store
            .with_item(item.stock_id, |txn| {
                txn.commit(draft(TransactionType::Out, dec!(-11)))
            })
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Domain(LedgerError::insufficient_stock(dec!(11), dec!(10)))
        );

        // Quantity unchanged and the rejected commit spent no ledger id.
        assert_eq!(store.find(item.stock_id).unwrap().available_quantity, dec!(10));
        let next = store
            .with_item(item.stock_id, |txn| {
                txn.commit(draft(TransactionType::Out, dec!(-10)))
            })
            .unwrap();
        assert_eq!(next.ledger_id, LedgerId::from_u64(2));
    }

    #[test]
    fn test_ledger_ids_are_monotonic_across_items() {
        let store = store();
        let a = store.create(fields("Bolt M8", "A1")).unwrap();
        let b = store.create(fields("Nut M8", "A2")).unwrap();

        let first = store
            .with_item(a.stock_id, |txn| txn.commit(draft(TransactionType::In, dec!(1))))
            .unwrap();
        let second = store
            .with_item(b.stock_id, |txn| txn.commit(draft(TransactionType::In, dec!(1))))
            .unwrap();
        let third = store
            .with_item(a.stock_id, |txn| txn.commit(draft(TransactionType::In, dec!(1))))
            .unwrap();

        assert!(first.ledger_id < second.ledger_id);
        assert!(second.ledger_id < third.ledger_id);
    }

    #[test]
    fn test_list_items_pages_in_creation_order() {
        let store = store();
        let mut created = Vec::new();
        for i in 0..5 {
            created.push(store.create(fields(&format!("Part {i}"), "A1")).unwrap());
        }

        let (page1, total) = store.list_items(1, 2, None).unwrap();
        let (page3, _) = store.list_items(3, 2, None).unwrap();
        assert_eq!(total, 5);
        assert_eq!(page1.len(), 2);
        assert_eq!(page3.len(), 1);
        assert_eq!(page1[0].stock_id, created[0].stock_id);
        assert_eq!(page3[0].stock_id, created[4].stock_id);

        let (beyond, total) = store.list_items(4, 2, None).unwrap();
        assert_eq!(beyond.len(), 0);
        assert_eq!(total, 5);
    }

    #[test]
    fn test_list_items_search_narrows_but_counts_all_matches() {
        let store = store();
        store.create(fields("Bolt M8", "A1")).unwrap();
        store.create(fields("Bolt M10", "A1")).unwrap();
        store.create(fields("Washer", "A2")).unwrap();

        let (items, total) = store.list_items(1, 10, Some("bolt")).unwrap();
        assert_eq!(total, 2);
        assert!(items.iter().all(|i| i.fields.part_name.starts_with("Bolt")));

        let (items, total) = store.list_items(1, 1, Some("bolt")).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(total, 2);
    }

    #[test]
    fn test_history_is_newest_first_and_joined() {
        let store = store();
        let item = store.create(fields("Bolt M8", "A1")).unwrap();
        for qty in [dec!(5), dec!(7)] {
            store
                .with_item(item.stock_id, |txn| {
                    txn.commit(draft(TransactionType::In, qty))
                })
                .unwrap();
        }

        let (rows, total) = store.list_history(1, 10, None).unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows[0].entry.quantity_change, dec!(7));
        assert_eq!(rows[1].entry.quantity_change, dec!(5));
        assert_eq!(rows[0].part_name, "Bolt M8");
        assert_eq!(rows[0].description, "Hex bolt");
    }

    #[test]
    fn test_list_history_search_narrows_but_counts_all_matches() {
        let store = store();
        let bolt = store.create(fields("Bolt M8", "A1")).unwrap();
        let washer = store.create(fields("Washer", "A2")).unwrap();
        for (id, qty) in [(bolt.stock_id, dec!(10)), (washer.stock_id, dec!(5))] {
            store
                .with_item(id, |txn| txn.commit(draft(TransactionType::In, qty)))
                .unwrap();
        }
        for qty in [dec!(-2), dec!(-3)] {
            store
                .with_item(bolt.stock_id, |txn| {
                    txn.commit(EntryDraft {
                        optional_reason: Some("Damaged in transit".to_string()),
                        ..draft(TransactionType::Out, qty)
                    })
                })
                .unwrap();
        }

        // "damaged" appears only in the reason of the two OUT entries.
        let (rows, total) = store.list_history(1, 10, Some("damaged")).unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows[0].entry.quantity_change, dec!(-3));
        assert_eq!(rows[1].entry.quantity_change, dec!(-2));

        let (rows, total) = store.list_history(1, 1, Some("damaged")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(total, 2);
    }

    #[test]
    fn test_export_filters_by_type_and_date() {
        let store = store();
        let item = store.create(fields("Bolt M8", "A1")).unwrap();
        store
            .with_item(item.stock_id, |txn| {
                txn.commit(draft(TransactionType::In, dec!(10)))
            })
            .unwrap();
        store
            .with_item(item.stock_id, |txn| {
                txn.commit(draft(TransactionType::Out, dec!(-4)))
            })
            .unwrap();

        let only_out = store
            .export_history(None, None, Some(TransactionType::Out))
            .unwrap();
        assert_eq!(only_out.len(), 1);
        assert_eq!(only_out[0].entry.quantity_change, dec!(-4));

        let today = Utc::now().date_naive();
        let all_today = store.export_history(Some(today), Some(today), None).unwrap();
        assert_eq!(all_today.len(), 2);

        let tomorrow = today.succ_opt().unwrap();
        let none = store.export_history(Some(tomorrow), None, None).unwrap();
        assert!(none.is_empty());

        let none = store.export_history(None, Some(today.pred_opt().unwrap()), None).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_set_min_quantity_writes_no_ledger_entry() {
        let store = store();
        let item = store.create(fields("Bolt M8", "A1")).unwrap();
        let updated = store.set_min_quantity(item.stock_id, dec!(25)).unwrap();

        assert_eq!(updated.min_quantity, dec!(25));
        let (rows, total) = store.list_history(1, 10, None).unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }
}
