//! JSON persistence of portfolios
//!
//! File layout:
//!
//! ```json
//! {
//!   "name": "Simon",
//!   "holdings": [ { "ticker": "BNS" } ],
//!   "transactions": [
//!     { "ticker": "BNS", "year": 2018, "month": 10, "day": 20, "isSell": false,
//!       "value": 1089.18, "isUSD": false, "fxRate": 0.0, "shares": 10, "commission": 4.99 }
//!   ]
//! }
//! ```
//!
//! Months are zero-based. Only trade inputs are stored; gains and balances are
//! recomputed when the portfolio is rebuilt.

use crate::currency::TradeCurrency;
use crate::error::{CapTrackError, Result};
use crate::finance::{Portfolio, TransactionRecord, TransactionSide};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of saved portfolios
pub const PORTFOLIO_EXTENSION: &str = "json";

/// Serialized form of a portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioFile {
    pub name: String,
    #[serde(default)]
    pub holdings: Vec<HoldingEntry>,
    #[serde(default)]
    pub transactions: Vec<TransactionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingEntry {
    pub ticker: String,
}

/// Serialized form of one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    pub ticker: String,
    pub year: i32,
    /// Zero-based month
    pub month: u32,
    pub day: u32,
    pub is_sell: bool,
    pub value: f64,
    #[serde(rename = "isUSD")]
    pub is_usd: bool,
    pub fx_rate: f64,
    pub shares: u64,
    pub commission: f64,
}

impl From<&TransactionRecord> for TransactionEntry {
    fn from(record: &TransactionRecord) -> Self {
        let date = record.date();
        Self {
            ticker: record.ticker().to_string(),
            year: date.year(),
            month: date.month0(),
            day: date.day(),
            is_sell: record.is_sell(),
            value: record.gross_value(),
            is_usd: record.currency().is_foreign(),
            fx_rate: record.fx_rate(),
            shares: record.shares(),
            commission: record.commission(),
        }
    }
}

impl TryFrom<&TransactionEntry> for TransactionRecord {
    type Error = CapTrackError;

    fn try_from(entry: &TransactionEntry) -> Result<Self> {
        let date = entry
            .month
            .checked_add(1)
            .and_then(|month| NaiveDate::from_ymd_opt(entry.year, month, entry.day))
            .ok_or_else(|| {
                CapTrackError::CorruptFile(format!(
                    "invalid date {}-{}-{} for {}",
                    entry.year, entry.month, entry.day, entry.ticker
                ))
            })?;

        TransactionRecord::new(
            entry.ticker.clone(),
            date,
            TransactionSide::from_sell_flag(entry.is_sell),
            entry.value,
            entry.shares,
            entry.commission,
        )
        .and_then(|record| {
            record.with_currency(TradeCurrency::from_foreign_flag(entry.is_usd), entry.fx_rate)
        })
        .map_err(|e| CapTrackError::CorruptFile(format!("{} on {}: {}", entry.ticker, date, e)))
    }
}

impl PortfolioFile {
    /// Capture a portfolio: holdings in ticker order, transactions ledger by
    /// ledger in chronological order.
    pub fn from_portfolio(portfolio: &Portfolio) -> Self {
        Self {
            name: portfolio.name().to_string(),
            holdings: portfolio
                .tickers()
                .into_iter()
                .map(|ticker| HoldingEntry {
                    ticker: ticker.to_string(),
                })
                .collect(),
            transactions: portfolio
                .ledgers()
                .iter()
                .flat_map(|ledger| ledger.history())
                .map(TransactionEntry::from)
                .collect(),
        }
    }

    /// Rebuild the portfolio: holdings first, then all transactions together
    pub fn into_portfolio(self) -> Result<Portfolio> {
        let mut portfolio = Portfolio::new(self.name);
        for holding in &self.holdings {
            portfolio.add_security(&holding.ticker);
        }

        let records = self
            .transactions
            .iter()
            .map(TransactionRecord::try_from)
            .collect::<Result<Vec<_>>>()?;
        portfolio.add_transactions(records)?;
        Ok(portfolio)
    }
}

/// List of saved portfolio names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedNames {
    pub names: Vec<String>,
}

/// Path of the saved file for portfolio `name` inside `dir`
pub fn portfolio_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    dir.as_ref().join(format!("{}.{}", name, PORTFOLIO_EXTENSION))
}

/// Read a portfolio from a JSON file
pub fn read_portfolio(path: impl AsRef<Path>) -> Result<Portfolio> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let file: PortfolioFile = serde_json::from_str(&contents)?;
    log::debug!(
        "Read portfolio {} with {} holdings from {}",
        file.name,
        file.holdings.len(),
        path.display()
    );
    file.into_portfolio()
}

/// Write a portfolio to a JSON file, replacing any existing content
pub fn write_portfolio(path: impl AsRef<Path>, portfolio: &Portfolio) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(&PortfolioFile::from_portfolio(portfolio))?;
    fs::write(path, json)?;
    log::debug!("Wrote portfolio {} to {}", portfolio.name(), path.display());
    Ok(())
}

/// Read a saved-names list
pub fn read_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    let saved: SavedNames = serde_json::from_str(&contents)?;
    Ok(saved.names)
}

/// Write a saved-names list
pub fn write_names(path: impl AsRef<Path>, names: &[String]) -> Result<()> {
    let saved = SavedNames {
        names: names.to_vec(),
    };
    fs::write(path, serde_json::to_string_pretty(&saved)?)?;
    Ok(())
}
