//! `stockroom-core` — foundation building blocks for the inventory ledger.
//!
//! This crate contains **pure** primitives (identifiers and the error
//! taxonomy); domain types and storage live in the crates above it.

pub mod error;
pub mod id;

pub use error::{LedgerError, LedgerResult};
pub use id::{LedgerId, StockId};
