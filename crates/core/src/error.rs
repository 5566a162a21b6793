//! Engine error model.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::LedgerId;

/// Result type used across the engine.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Deterministic failure of a catalog, ledger, or engine operation.
///
/// Every variant maps to a caller-correctable condition; a mutating operation
/// that fails with any of these leaves state exactly as it was before the
/// call. Infrastructure concerns (lock poisoning, storage faults) belong
/// elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A stock item or ledger entry id did not resolve.
    #[error("{0} not found")]
    NotFound(String),

    /// A quantity argument was zero or negative.
    #[error("invalid quantity {quantity}: must be greater than zero")]
    InvalidQuantity { quantity: Decimal },

    /// The mutation would drive a stock item's quantity below zero.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        requested: Decimal,
        available: Decimal,
    },

    /// The target ledger entry already carries a `reversed_by` id.
    #[error("ledger entry {0} has already been reversed")]
    AlreadyReversed(LedgerId),

    /// The target ledger entry is itself a reversal.
    #[error("ledger entry {0} is a reversal and cannot be reversed")]
    NotReversible(LedgerId),

    /// A field failed validation (e.g. required field missing or blank).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl LedgerError {
    pub fn stock_not_found(id: impl core::fmt::Display) -> Self {
        Self::NotFound(format!("stock item {id}"))
    }

    pub fn entry_not_found(id: LedgerId) -> Self {
        Self::NotFound(format!("ledger entry {id}"))
    }

    pub fn invalid_quantity(quantity: Decimal) -> Self {
        Self::InvalidQuantity { quantity }
    }

    pub fn insufficient_stock(requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Validation failure for a required field, named so the caller can fix it.
    pub fn required(field: &str) -> Self {
        Self::Validation(format!("{field} is required"))
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
