//! Undoing committed ledger entries with compensating counter-entries.

use std::sync::Arc;

use stockroom_core::{LedgerError, LedgerId};
use stockroom_ledger::{entry, EntryDraft, LedgerEntry, TransactionType};

use crate::error::EngineError;
use crate::store::LedgerStore;

/// Appends the REVERSAL counter-entry that undoes a past entry, at most
/// once per entry.
#[derive(Debug, Clone)]
pub struct ReversalCoordinator {
    store: Arc<LedgerStore>,
}

impl ReversalCoordinator {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Reverse a ledger entry: append a REVERSAL carrying the negated
    /// quantity change and stamp the original with the reversal's id.
    ///
    /// Eligibility is checked inside the owning item's critical section, so
    /// two racing reversals of one entry resolve to exactly one winner.
    /// Undoing a receipt whose stock has since been issued away fails
    /// `InsufficientStock` and changes nothing.
    pub fn reverse(
        &self,
        ledger_id: LedgerId,
        user: impl Into<String>,
    ) -> Result<LedgerEntry, EngineError> {
        let owner = self.store.entry_owner(ledger_id)?;
        let user = user.into();

        let reversal = self.store.with_item(owner, |txn| {
            let original = txn
                .entry(ledger_id)
                .cloned()
                .ok_or_else(|| LedgerError::entry_not_found(ledger_id))?;

            if original.reversed_by.is_some() {
                return Err(LedgerError::AlreadyReversed(ledger_id).into());
            }
            if original.transaction_type == TransactionType::Reversal {
                return Err(LedgerError::NotReversible(ledger_id).into());
            }

            let draft = EntryDraft {
                transaction_type: TransactionType::Reversal,
                quantity_change: -original.quantity_change,
                reference: entry::reversal_reference(ledger_id),
                optional_reason: Some(entry::reversal_reason(&original.reference)),
                created_by: user,
            };
            txn.commit_reversal(ledger_id, draft)
        })?;

        tracing::info!(
            ledger_id = %ledger_id,
            reversal_id = %reversal.ledger_id,
            stock_id = %reversal.stock_id,
            "ledger entry reversed"
        );
        Ok(reversal)
    }
}
