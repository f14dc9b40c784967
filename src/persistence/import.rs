//! Import batches - securities and transactions read from an external source
//!
//! A batch may reference tickers that its own security list does not name.
//! Those are discovered before anything is added to the portfolio.

use crate::error::Result;
use crate::finance::{Portfolio, TransactionRecord};
use serde::Serialize;

/// Securities and transactions to merge into a portfolio
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBatch {
    security_names: Vec<String>,
    transactions: Vec<TransactionRecord>,
}

/// Counts reported after a batch has been merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportSummary {
    /// Securities newly added to the portfolio
    pub securities_added: usize,
    /// Securities the portfolio already held
    pub securities_existing: usize,
    /// Transactions added
    pub transactions_imported: usize,
}

impl ImportBatch {
    pub fn new(security_names: Vec<String>, transactions: Vec<TransactionRecord>) -> Self {
        Self {
            security_names,
            transactions,
        }
    }

    pub fn security_names(&self) -> &[String] {
        &self.security_names
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    /// Add every transaction ticker missing from the security list.
    ///
    /// Returns the number of tickers discovered.
    pub fn normalize(&mut self) -> usize {
        let mut discovered = 0;
        for record in &self.transactions {
            if !self.security_names.iter().any(|name| name == record.ticker()) {
                log::debug!("Discovered untracked ticker {} in import", record.ticker());
                self.security_names.push(record.ticker().to_string());
                discovered += 1;
            }
        }
        discovered
    }

    /// Merge this batch into `portfolio`.
    ///
    /// Securities are added first (already held ones are left alone), then
    /// every transaction is replayed in batch order. The ledgers restore date
    /// order themselves. If any transaction is rejected the portfolio is left
    /// as it was before the call.
    pub fn add_to_portfolio(mut self, portfolio: &mut Portfolio) -> Result<ImportSummary> {
        self.normalize();
        let snapshot = portfolio.clone();
        let mut summary = ImportSummary::default();

        for name in &self.security_names {
            if portfolio.add_security(name) {
                summary.securities_added += 1;
            } else {
                summary.securities_existing += 1;
            }
        }

        summary.transactions_imported = self.transactions.len();
        if let Err(e) = portfolio.add_transactions(self.transactions) {
            log::warn!("Import into {} rejected: {}", portfolio.name(), e);
            *portfolio = snapshot;
            return Err(e);
        }

        log::info!(
            "Imported {} transactions into {} ({} new securities)",
            summary.transactions_imported,
            portfolio.name(),
            summary.securities_added
        );
        Ok(summary)
    }
}
