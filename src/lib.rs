//! # Rusty-CapTrack
//!
//! Adjusted cost base (ACB) and capital gains tracking for stock portfolios.
//!
//! A [`finance::Portfolio`] holds one [`finance::SecurityLedger`] per ticker.
//! Each ledger keeps its transactions in date order and, after every change,
//! recomputes the running share count, cost base and realized gain of every
//! transaction affected by it.
//!
//! ## Example
//!
//! ```rust
//! use rusty_captrack::prelude::*;
//! use chrono::NaiveDate;
//!
//! # fn main() -> rusty_captrack::Result<()> {
//! let mut portfolio = Portfolio::new("Simon");
//! portfolio.add_security("BNS");
//!
//! let bought = NaiveDate::from_ymd_opt(2019, 11, 20).unwrap();
//! let sold = NaiveDate::from_ymd_opt(2020, 6, 5).unwrap();
//! portfolio.add_transaction(TransactionRecord::buy("BNS", bought, 1089.18, 10, 4.99)?)?;
//! portfolio.add_transaction(TransactionRecord::sell("BNS", sold, 420.20, 5, 4.99)?)?;
//!
//! let ledger = portfolio.ledger("BNS").unwrap();
//! assert_eq!(ledger.current_shares(), 5);
//! assert!((ledger.current_cost_base() - 547.085).abs() < 1e-6);
//! # Ok(())
//! # }
//! ```

pub mod currency;
pub mod error;
pub mod finance;
pub mod persistence;
pub mod types;

pub use error::{CapTrackError, Result};

pub mod prelude {
    //! Commonly used types
    pub use crate::currency::TradeCurrency;
    pub use crate::error::{CapTrackError, Result};
    pub use crate::finance::{
        HoldingSummary, Portfolio, RunningBalance, SecurityLedger, TransactionRecord,
        TransactionSide,
    };
    pub use crate::persistence::{CsvImporter, ImportBatch, ImportSummary};
    pub use crate::types::*;
}
