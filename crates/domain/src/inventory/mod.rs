//! Inventory ledger: per-product stock levels with atomic reserve/release.

mod ledger;

pub use ledger::{InventoryLedger, ReserveOutcome, StockRecord};
