use std::sync::Arc;

use stockroom_engine::{BulkMatcher, LedgerStore, QuantityEngine, ReversalCoordinator};
use stockroom_ledger::MatchPolicy;

/// Shared engine wiring handed to every handler via `Extension`.
///
/// All four components borrow the same [`LedgerStore`], so a quantity
/// written through one is immediately visible through the others.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<LedgerStore>,
    pub quantity: QuantityEngine,
    pub reversal: ReversalCoordinator,
    pub matcher: BulkMatcher,
}

pub fn build_services(policy: MatchPolicy) -> AppServices {
    let store = Arc::new(LedgerStore::new(policy));

    AppServices {
        quantity: QuantityEngine::new(store.clone()),
        reversal: ReversalCoordinator::new(store.clone()),
        matcher: BulkMatcher::new(store.clone()),
        store,
    }
}
