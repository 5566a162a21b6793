//! Receiving and issuing stock.

use std::sync::Arc;

use rust_decimal::Decimal;

use stockroom_core::{LedgerError, StockId};
use stockroom_ledger::{EntryDraft, LedgerEntry, StockFields, StockItem, TransactionType};

use crate::error::EngineError;
use crate::store::LedgerStore;

/// The sole writer of stock quantities. Every mutation it performs pairs a
/// quantity change with exactly one ledger entry, inside the item's
/// critical section.
#[derive(Debug, Clone)]
pub struct QuantityEngine {
    store: Arc<LedgerStore>,
}

impl QuantityEngine {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Receive `quantity` into an existing item as an IN entry.
    ///
    /// The business reference is supplied by the caller: manual additions
    /// and import commits record different provenance through the same
    /// operation.
    pub fn receive(
        &self,
        stock_id: StockId,
        quantity: Decimal,
        reference: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<LedgerEntry, EngineError> {
        require_positive(quantity)?;
        let draft = EntryDraft {
            transaction_type: TransactionType::In,
            quantity_change: quantity,
            reference: reference.into(),
            optional_reason: None,
            created_by: user.into(),
        };
        let entry = self.store.with_item(stock_id, |txn| txn.commit(draft))?;
        tracing::info!(
            stock_id = %entry.stock_id,
            ledger_id = %entry.ledger_id,
            quantity = %quantity,
            "stock received"
        );
        Ok(entry)
    }

    /// Issue `quantity` out of an item as an OUT entry with a negative
    /// quantity change. The availability check and the decrement share one
    /// critical section, so two racing issues can never both spend the same
    /// stock.
    pub fn issue(
        &self,
        stock_id: StockId,
        quantity: Decimal,
        reference: impl Into<String>,
        reason: Option<String>,
        user: impl Into<String>,
    ) -> Result<LedgerEntry, EngineError> {
        require_positive(quantity)?;
        let draft = EntryDraft {
            transaction_type: TransactionType::Out,
            quantity_change: -quantity,
            reference: reference.into(),
            optional_reason: reason,
            created_by: user.into(),
        };
        let entry = self.store.with_item(stock_id, |txn| txn.commit(draft))?;
        tracing::info!(
            stock_id = %entry.stock_id,
            ledger_id = %entry.ledger_id,
            quantity = %quantity,
            "stock issued"
        );
        Ok(entry)
    }

    /// Create a stock item and receive its opening quantity in one call.
    /// All validation runs before the item is created, so a rejected call
    /// leaves no empty item behind.
    pub fn create_and_receive(
        &self,
        fields: StockFields,
        quantity: Decimal,
        reference: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<(StockItem, LedgerEntry), EngineError> {
        fields.validate_required()?;
        require_positive(quantity)?;

        let created = self.store.create(fields)?;
        let entry = self.receive(created.stock_id, quantity, reference, user)?;
        let item = self.store.find(created.stock_id)?;
        Ok((item, entry))
    }

    /// Set an item's reorder threshold.
    pub fn set_threshold(
        &self,
        stock_id: StockId,
        min_quantity: Decimal,
        user: impl Into<String>,
    ) -> Result<StockItem, EngineError> {
        if min_quantity < Decimal::ZERO {
            return Err(LedgerError::validation("min_quantity must not be negative").into());
        }
        let user = user.into();
        let item = self.store.set_min_quantity(stock_id, min_quantity)?;
        tracing::info!(
            stock_id = %stock_id,
            min_quantity = %min_quantity,
            user = %user,
            "reorder threshold updated"
        );
        Ok(item)
    }
}

fn require_positive(quantity: Decimal) -> Result<(), LedgerError> {
    if quantity <= Decimal::ZERO {
        return Err(LedgerError::invalid_quantity(quantity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stockroom_ledger::entry::MANUAL_ADDITION_REFERENCE;

    fn fields(part_name: &str) -> StockFields {
        StockFields {
            project: "Line 3".to_string(),
            supplier_name: "Acme Corp".to_string(),
            invoice: "INV-001".to_string(),
            po_no: "PO-42".to_string(),
            part_name: part_name.to_string(),
            description: "Hex bolt".to_string(),
            uom: "pcs".to_string(),
            location: "A1".to_string(),
            remarks: None,
        }
    }

    fn engine() -> (Arc<LedgerStore>, QuantityEngine) {
        let store = Arc::new(LedgerStore::new(Default::default()));
        let engine = QuantityEngine::new(store.clone());
        (store, engine)
    }

    #[test]
    fn test_create_and_receive_opens_with_the_received_quantity() {
        let (_, engine) = engine();
        let (item, entry) = engine
            .create_and_receive(fields("Bolt M8"), dec!(100), MANUAL_ADDITION_REFERENCE, "khalid")
            .unwrap();

        assert_eq!(item.available_quantity, dec!(100));
        assert_eq!(item.last_movement, Some(entry.transaction_date));
        assert_eq!(entry.transaction_type, TransactionType::In);
        assert_eq!(entry.quantity_change, dec!(100));
        assert_eq!(entry.reference, MANUAL_ADDITION_REFERENCE);
        assert_eq!(entry.created_by, "khalid");
    }

    #[test]
    fn test_create_and_receive_validates_before_creating() {
        let (store, engine) = engine();

        let mut blank = fields("Bolt M8");
        blank.part_name = "  ".to_string();
        let err = engine
            .create_and_receive(blank, dec!(5), "ref", "khalid")
            .unwrap_err();
        assert_eq!(err, LedgerError::required("part_name").into());

        let err = engine
            .create_and_receive(fields("Bolt M8"), dec!(0), "ref", "khalid")
            .unwrap_err();
        assert_eq!(err, LedgerError::invalid_quantity(dec!(0)).into());

        // Neither rejected call left an item behind.
        let (_, total) = store.list_items(1, 10, None).unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn test_receive_rejects_non_positive_quantities() {
        let (_, engine) = engine();
        let (item, _) = engine
            .create_and_receive(fields("Bolt M8"), dec!(10), "ref", "khalid")
            .unwrap();

        for bad in [dec!(0), dec!(-5)] {
            let err = engine.receive(item.stock_id, bad, "ref", "khalid").unwrap_err();
            assert_eq!(err, LedgerError::invalid_quantity(bad).into());
        }
    }

    #[test]
    fn test_receive_into_unknown_item_is_not_found() {
        let (_, engine) = engine();
        let err = engine
            .receive(StockId::new(), dec!(5), "ref", "khalid")
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_issue_decrements_and_records_negative_change() {
        let (store, engine) = engine();
        let (item, _) = engine
            .create_and_receive(fields("Bolt M8"), dec!(100), "ref", "khalid")
            .unwrap();

        let entry = engine
            .issue(item.stock_id, dec!(30), "Work order 7", Some("line rework".to_string()), "aisha")
            .unwrap();

        assert_eq!(entry.transaction_type, TransactionType::Out);
        assert_eq!(entry.quantity_change, dec!(-30));
        assert_eq!(entry.optional_reason.as_deref(), Some("line rework"));
        assert_eq!(
            store.find(item.stock_id).unwrap().available_quantity,
            dec!(70)
        );
    }

    #[test]
    fn test_issue_beyond_available_fails_and_changes_nothing() {
        let (store, engine) = engine();
        let (item, _) = engine
            .create_and_receive(fields("Bolt M8"), dec!(100), "ref", "khalid")
            .unwrap();

        let err = engine
            .issue(item.stock_id, dec!(200), "Work order 7", None, "aisha")
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::insufficient_stock(dec!(200), dec!(100)).into()
        );

        let after = store.find(item.stock_id).unwrap();
        assert_eq!(after.available_quantity, dec!(100));
        let (_, entries) = store.list_history(1, 10, None).unwrap();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_issue_down_to_exactly_zero_is_allowed() {
        let (store, engine) = engine();
        let (item, _) = engine
            .create_and_receive(fields("Bolt M8"), dec!(10), "ref", "khalid")
            .unwrap();

        engine
            .issue(item.stock_id, dec!(10), "Work order 7", None, "aisha")
            .unwrap();
        assert_eq!(store.find(item.stock_id).unwrap().available_quantity, dec!(0));
    }

    #[test]
    fn test_set_threshold_rejects_negative_values() {
        let (_, engine) = engine();
        let (item, _) = engine
            .create_and_receive(fields("Bolt M8"), dec!(10), "ref", "khalid")
            .unwrap();

        let updated = engine.set_threshold(item.stock_id, dec!(25), "khalid").unwrap();
        assert_eq!(updated.min_quantity, dec!(25));

        let err = engine
            .set_threshold(item.stock_id, dec!(-1), "khalid")
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(LedgerError::Validation(_))
        ));
    }
}
