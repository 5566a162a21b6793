use axum::Router;

pub mod history;
pub mod inventory;
pub mod reconcile;
pub mod system;

/// Router for the RPC surface. One POST route per operation, named after
/// the operation it performs.
pub fn router() -> Router {
    Router::new()
        .merge(inventory::router())
        .merge(history::router())
        .merge(reconcile::router())
}
