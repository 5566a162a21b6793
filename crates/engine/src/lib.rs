//! `stockroom-engine` — storage and the operations that mutate it.
//!
//! The [`store::LedgerStore`] holds the catalog and ledger; the components
//! around it ([`quantity::QuantityEngine`], [`reversal::ReversalCoordinator`],
//! [`reconcile::BulkMatcher`]) are the only writers.

pub mod error;
pub mod quantity;
pub mod reconcile;
pub mod reversal;
pub mod store;


pub use error::{EngineError, StoreError};
pub use quantity::QuantityEngine;
pub use reconcile::BulkMatcher;
pub use reversal::ReversalCoordinator;
pub use store::LedgerStore;
