//! Finance module - transactions, security ledgers, portfolio

pub mod ledger;
pub mod portfolio;
pub mod transaction;

pub use ledger::{fold_outcomes, SecurityLedger};
pub use portfolio::{HoldingSummary, Portfolio};
pub use transaction::{AcbOutcome, RunningBalance, TransactionRecord, TransactionSide};
