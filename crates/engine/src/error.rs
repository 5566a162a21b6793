//! Engine failures: domain rejections plus infrastructure faults.

use thiserror::Error;

use stockroom_core::LedgerError;

/// Infrastructure failure inside the store. Not caller-correctable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A lock was poisoned by a panic in another thread.
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
}

/// What an engine operation can fail with: a deterministic domain
/// rejection, or a store fault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] LedgerError),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}
