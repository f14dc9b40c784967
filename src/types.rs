//! Core types and constants

use chrono::NaiveDate;

/// Calendar date of a trade (no time component)
pub type TradeDate = NaiveDate;

/// Ticker symbol identifying a security
pub type Ticker = String;

/// Money amount (using f64 for precision)
pub type Cash = f64;

/// Whole number of shares
pub type Shares = u64;

/// Exchange rate from a foreign currency into the reporting currency
pub type FxRate = f64;
