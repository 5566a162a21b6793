//! Bulk reconciliation: classify spreadsheet rows, commit confirmed batches.

use std::collections::HashMap;
use std::sync::Arc;

use stockroom_core::{LedgerId, StockId};
use stockroom_ledger::{
    entry, import, CommitReport, ImportClassification, ImportRow, MatchKey, RowOutcome,
};

use crate::error::EngineError;
use crate::quantity::QuantityEngine;
use crate::store::LedgerStore;

/// Matches import rows against the catalog and commits confirmed batches
/// through the quantity engine.
#[derive(Debug, Clone)]
pub struct BulkMatcher {
    store: Arc<LedgerStore>,
    engine: QuantityEngine,
}

impl BulkMatcher {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        let engine = QuantityEngine::new(store.clone());
        Self { store, engine }
    }

    /// Classify each row as merging into existing stock or creating new
    /// stock. Pure read: classifying writes nothing, so running it twice
    /// against an unchanged catalog gives identical output.
    pub fn classify(
        &self,
        rows: Vec<ImportRow>,
    ) -> Result<Vec<ImportClassification>, EngineError> {
        let policy = self.store.policy();
        let mut previews = Vec::with_capacity(rows.len());
        for row in rows {
            let key = policy.key_for_row(&row);
            match self.store.find_match(&key)? {
                Some(existing) => {
                    previews.push(ImportClassification::Merged {
                        matched_stock_id: existing.stock_id,
                        diff_reason: import::diff_reason(&row, &existing),
                        row,
                    });
                }
                None => previews.push(ImportClassification::New { row }),
            }
        }
        Ok(previews)
    }

    /// Commit a confirmed batch row by row, in input order. A row's domain
    /// failure becomes its outcome and the batch continues; only store
    /// faults abort the whole call.
    ///
    /// NEW rows that share an identity key within one batch collapse onto
    /// the item the first of them creates.
    pub fn commit(
        &self,
        previews: Vec<ImportClassification>,
        user: &str,
    ) -> Result<CommitReport, EngineError> {
        let mut created_in_batch: HashMap<MatchKey, StockId> = HashMap::new();
        let mut outcomes = Vec::with_capacity(previews.len());
        for preview in previews {
            outcomes.push(self.commit_row(preview, user, &mut created_in_batch)?);
        }

        let report = CommitReport::from_outcomes(outcomes);
        tracing::info!(
            committed = report.committed,
            failed = report.failed,
            "bulk upload committed"
        );
        Ok(report)
    }

    /// Receive one already-parsed row, merging or creating by the same rule
    /// as a bulk batch. Unlike a batch, a failure here surfaces as the
    /// operation's error.
    pub fn receive_row(
        &self,
        row: ImportRow,
        user: &str,
    ) -> Result<(StockId, LedgerId), EngineError> {
        let key = self.store.policy().key_for_row(&row);
        let reference = entry::import_reference(&row.invoice, &row.supplier_name);
        match self.store.find_match(&key)? {
            Some(existing) => {
                let entry = self
                    .engine
                    .receive(existing.stock_id, row.quantity, reference, user)?;
                Ok((entry.stock_id, entry.ledger_id))
            }
            None => {
                let (item, entry) =
                    self.engine
                        .create_and_receive(row.stock_fields(), row.quantity, reference, user)?;
                Ok((item.stock_id, entry.ledger_id))
            }
        }
    }

    fn commit_row(
        &self,
        preview: ImportClassification,
        user: &str,
        created_in_batch: &mut HashMap<MatchKey, StockId>,
    ) -> Result<RowOutcome, EngineError> {
        let policy = self.store.policy();
        let committed = match preview {
            ImportClassification::Merged { row, matched_stock_id, .. } => self
                .engine
                .receive(
                    matched_stock_id,
                    row.quantity,
                    entry::import_reference(&row.invoice, &row.supplier_name),
                    user,
                )
                .map(|entry| (entry.stock_id, entry.ledger_id)),
            ImportClassification::New { row } => {
                let key = policy.key_for_row(&row);
                let reference = entry::import_reference(&row.invoice, &row.supplier_name);
                match created_in_batch.get(&key).copied() {
                    Some(stock_id) => self
                        .engine
                        .receive(stock_id, row.quantity, reference, user)
                        .map(|entry| (entry.stock_id, entry.ledger_id)),
                    None => self
                        .engine
                        .create_and_receive(row.stock_fields(), row.quantity, reference, user)
                        .map(|(item, entry)| {
                            created_in_batch.insert(key, item.stock_id);
                            (item.stock_id, entry.ledger_id)
                        }),
                }
            }
        };

        match committed {
            Ok((stock_id, ledger_id)) => Ok(RowOutcome::Committed { stock_id, ledger_id }),
            Err(EngineError::Domain(err)) => {
                tracing::warn!(error = %err, "bulk upload row failed");
                Ok(RowOutcome::Failed {
                    reason: err.to_string(),
                })
            }
            Err(fault) => Err(fault),
        }
    }
}
