//! Portfolio - the set of security ledgers an investor tracks
//!
//! Ledgers are kept sorted by ticker, compared case-insensitively, with at
//! most one ledger per exact ticker string. Transactions are routed to the
//! ledger whose ticker matches exactly.

use crate::error::{CapTrackError, Result};
use crate::finance::ledger::SecurityLedger;
use crate::finance::transaction::TransactionRecord;
use crate::types::{Cash, Shares};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One summary row per holding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingSummary {
    pub ticker: String,
    pub shares: Shares,
    pub cost_base: Cash,
    pub transaction_count: usize,
}

impl fmt::Display for HoldingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>5} || {:>5}   || {:>10}  ||{:>2}",
            self.ticker,
            self.shares,
            format!("${:.2}", self.cost_base),
            self.transaction_count
        )
    }
}

/// Stock portfolio holding a ledger per security
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    name: String,
    ledgers: Vec<SecurityLedger>,
}

impl Portfolio {
    /// Create an empty portfolio
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ledgers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Add an empty ledger for `ticker`.
    ///
    /// Returns `false` if a ledger with exactly this ticker already exists.
    pub fn add_security(&mut self, ticker: &str) -> bool {
        if self.has_ticker(ticker) {
            return false;
        }
        let key = ticker.to_lowercase();
        let index = self
            .ledgers
            .partition_point(|ledger| ledger.ticker().to_lowercase() <= key);
        self.ledgers.insert(index, SecurityLedger::new(ticker));
        true
    }

    /// Remove the ledger for `ticker` along with its transactions.
    ///
    /// Returns `false` if no ledger has exactly this ticker.
    pub fn remove_security(&mut self, ticker: &str) -> bool {
        match self.position(ticker) {
            Some(index) => {
                self.ledgers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Add a transaction to the ledger of its ticker.
    ///
    /// Returns the index of the record in that ledger's history.
    pub fn add_transaction(&mut self, record: TransactionRecord) -> Result<usize> {
        self.ledger_mut(record.ticker())?.insert(record)
    }

    /// Add a batch of transactions in one step.
    ///
    /// Every ticker must already be held. Records are grouped per ledger,
    /// keeping their relative order, and each ledger recomputes once. Either
    /// every record is added or the portfolio is left unchanged.
    pub fn add_transactions<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = TransactionRecord>,
    {
        let mut groups: Vec<(usize, Vec<TransactionRecord>)> = Vec::new();
        for record in records {
            let index = self
                .position(record.ticker())
                .ok_or_else(|| CapTrackError::NoSuchTicker(record.ticker().to_string()))?;
            match groups.iter_mut().find(|(i, _)| *i == index) {
                Some((_, group)) => group.push(record),
                None => groups.push((index, vec![record])),
            }
        }

        let snapshot = self.ledgers.clone();
        for (index, group) in groups {
            if let Err(e) = self.ledgers[index].insert_all(group) {
                self.ledgers = snapshot;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Remove the transaction at `index` of the ledger for `ticker`
    pub fn remove_transaction(&mut self, ticker: &str, index: usize) -> Result<TransactionRecord> {
        self.ledger_mut(ticker)?.remove(index)
    }

    /// Full chronological history of `ticker`
    pub fn search_transactions(&self, ticker: &str) -> Result<&[TransactionRecord]> {
        self.ledger(ticker)
            .map(SecurityLedger::history)
            .ok_or_else(|| CapTrackError::NoSuchTicker(ticker.to_string()))
    }

    /// Current position of every holding, in ticker order
    pub fn summary(&self) -> Vec<HoldingSummary> {
        self.ledgers
            .iter()
            .map(|ledger| HoldingSummary {
                ticker: ledger.ticker().to_string(),
                shares: ledger.current_shares(),
                cost_base: ledger.current_cost_base(),
                transaction_count: ledger.len(),
            })
            .collect()
    }

    /// Every sell dated in `year`, ledger by ledger in ticker order
    pub fn tax_year_transactions(&self, year: i32) -> Vec<&TransactionRecord> {
        self.ledgers
            .iter()
            .flat_map(|ledger| ledger.history())
            .filter(|record| record.is_sell() && record.year() == year)
            .collect()
    }

    pub fn has_ticker(&self, ticker: &str) -> bool {
        self.position(ticker).is_some()
    }

    /// Number of securities held
    pub fn ticker_count(&self) -> usize {
        self.ledgers.len()
    }

    /// Tickers in sorted order
    pub fn tickers(&self) -> Vec<&str> {
        self.ledgers.iter().map(SecurityLedger::ticker).collect()
    }

    pub fn ledger(&self, ticker: &str) -> Option<&SecurityLedger> {
        self.ledgers.iter().find(|ledger| ledger.ticker() == ticker)
    }

    pub fn ledgers(&self) -> &[SecurityLedger] {
        &self.ledgers
    }

    fn ledger_mut(&mut self, ticker: &str) -> Result<&mut SecurityLedger> {
        self.ledgers
            .iter_mut()
            .find(|ledger| ledger.ticker() == ticker)
            .ok_or_else(|| CapTrackError::NoSuchTicker(ticker.to_string()))
    }

    fn position(&self, ticker: &str) -> Option<usize> {
        self.ledgers.iter().position(|ledger| ledger.ticker() == ticker)
    }
}
