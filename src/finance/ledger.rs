//! Security ledger - ordered trade history and running ACB for one ticker
//!
//! The ledger keeps its history sorted by trade date. Inserting or removing a
//! record invalidates the computed figures of every record from that position
//! onward, so the suffix is recomputed as a left fold seeded with the balance
//! of the record just before it. Records before the change point are never
//! touched.
//!
//! Same-date records keep the order in which they were inserted: a new record
//! lands after every record dated on or before its own date.

use crate::error::{CapTrackError, Result};
use crate::finance::transaction::{AcbOutcome, RunningBalance, TransactionRecord};
use crate::types::{Cash, Shares, TradeDate};
use serde::Serialize;

/// Ledger for one security
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityLedger {
    /// Ticker identifying the security
    ticker: String,
    /// Transactions, non-decreasing by date
    history: Vec<TransactionRecord>,
    /// Balance after the last transaction
    current: RunningBalance,
}

impl SecurityLedger {
    /// Create an empty ledger for `ticker`
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            history: Vec::new(),
            current: RunningBalance::ZERO,
        }
    }

    /// Insert a transaction at its chronological position.
    ///
    /// Returns the index the record landed at. Fails without modifying the
    /// ledger if the ticker does not match or if the history would contain a
    /// sell of more shares than are held at that point.
    pub fn insert(&mut self, record: TransactionRecord) -> Result<usize> {
        self.check_ticker(&record)?;

        let index = self.insertion_point(record.date());
        self.history.insert(index, record);

        if let Err(e) = self.recompute_from(index) {
            self.history.remove(index);
            return Err(e);
        }
        Ok(index)
    }

    /// Insert a batch of transactions and recompute once.
    ///
    /// Records are placed one after another with the same policy as
    /// [`insert`](Self::insert), so the resulting order does not depend on
    /// whether they arrive one by one or together. Only the final history has
    /// to be valid; on failure the ledger is restored to its previous state.
    pub fn insert_all<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = TransactionRecord>,
    {
        let records: Vec<TransactionRecord> = records.into_iter().collect();
        if records.is_empty() {
            return Ok(());
        }
        for record in &records {
            self.check_ticker(record)?;
        }

        let previous = self.history.clone();
        let mut first_changed = self.history.len();
        for record in records {
            let index = self.insertion_point(record.date());
            self.history.insert(index, record);
            first_changed = first_changed.min(index);
        }

        if let Err(e) = self.recompute_from(first_changed) {
            self.history = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Remove the transaction at `index` and return it.
    ///
    /// Fails without modifying the ledger if the index is out of range or if
    /// a later sell would no longer be covered by the remaining buys.
    pub fn remove(&mut self, index: usize) -> Result<TransactionRecord> {
        if index >= self.history.len() {
            return Err(CapTrackError::IndexOutOfRange {
                index,
                len: self.history.len(),
            });
        }

        let removed = self.history.remove(index);
        if let Err(e) = self.recompute_from(index) {
            self.history.insert(index, removed);
            return Err(e);
        }
        Ok(removed)
    }

    /// Index at which a record dated `date` is inserted: after every record
    /// dated on or before it.
    fn insertion_point(&self, date: TradeDate) -> usize {
        self.history.partition_point(|existing| existing.date() <= date)
    }

    fn check_ticker(&self, record: &TransactionRecord) -> Result<()> {
        if record.ticker() != self.ticker {
            return Err(CapTrackError::TickerMismatch {
                expected: self.ticker.clone(),
                found: record.ticker().to_string(),
            });
        }
        Ok(())
    }

    /// Recompute every record from `index` to the end.
    ///
    /// New outcomes are computed for the whole suffix before any is written,
    /// so an error leaves every record as it was.
    fn recompute_from(&mut self, index: usize) -> Result<()> {
        let seed = match index.checked_sub(1) {
            Some(prev) if prev < self.history.len() => self.history[prev].outcome().balance,
            _ => RunningBalance::ZERO,
        };

        let outcomes = fold_outcomes(seed, self.history.get(index..).unwrap_or(&[]))?;
        for (record, outcome) in self.history[index..].iter_mut().zip(outcomes) {
            record.set_outcome(outcome);
        }

        self.current = self
            .history
            .last()
            .map(|last| last.outcome().balance)
            .unwrap_or(RunningBalance::ZERO);
        Ok(())
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Full history in chronological order
    pub fn history(&self) -> &[TransactionRecord] {
        &self.history
    }

    pub fn get(&self, index: usize) -> Option<&TransactionRecord> {
        self.history.get(index)
    }

    /// Number of transactions
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Shares held after the last transaction
    pub fn current_shares(&self) -> Shares {
        self.current.shares
    }

    /// Adjusted cost base after the last transaction
    pub fn current_cost_base(&self) -> Cash {
        self.current.cost_base
    }

    pub fn current_balance(&self) -> RunningBalance {
        self.current
    }
}

/// Run the ACB recurrence over `records` starting from `seed`.
///
/// Returns one outcome per record, in order. Stops at the first record that
/// cannot be applied.
pub fn fold_outcomes(
    seed: RunningBalance,
    records: &[TransactionRecord],
) -> Result<Vec<AcbOutcome>> {
    let mut outcomes = Vec::with_capacity(records.len());
    records.iter().try_fold(seed, |prev, record| {
        let outcome = record.apply(prev)?;
        outcomes.push(outcome);
        Ok::<_, CapTrackError>(outcome.balance)
    })?;
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn buy_bns_1() -> TransactionRecord {
        TransactionRecord::buy("BNS", date(2019, 11, 20), 1089.18, 10, 4.99).unwrap()
    }

    fn sell_bns() -> TransactionRecord {
        TransactionRecord::sell("BNS", date(2020, 6, 5), 420.20, 5, 4.99).unwrap()
    }

    fn buy_bns_2() -> TransactionRecord {
        TransactionRecord::buy("BNS", date(2021, 3, 20), 1850.10, 20, 4.99).unwrap()
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = SecurityLedger::new("BNS");
        assert_eq!(ledger.ticker(), "BNS");
        assert!(ledger.is_empty());
        assert_eq!(ledger.current_shares(), 0);
        assert_eq!(ledger.current_cost_base(), 0.0);
    }

    #[test]
    fn test_insert_into_empty_ledger() {
        let mut ledger = SecurityLedger::new("BNS");
        assert_eq!(ledger.insert(buy_bns_1()).unwrap(), 0);

        let first = &ledger.history()[0];
        assert_eq!(first.realized_gain(), 0.0);
        assert_eq!(first.resulting_shares(), 10);
        assert_relative_eq!(first.resulting_cost_base(), 1094.17, epsilon = 0.005);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.current_shares(), 10);
        assert_relative_eq!(ledger.current_cost_base(), 1094.17, epsilon = 0.005);
    }

    #[test]
    fn test_insert_in_order() {
        let mut ledger = SecurityLedger::new("BNS");
        ledger.insert(buy_bns_1()).unwrap();
        ledger.insert(buy_bns_2()).unwrap();

        assert_eq!(ledger.current_shares(), 30);
        assert_relative_eq!(ledger.current_cost_base(), 2949.26, epsilon = 0.005);
        assert_relative_eq!(ledger.history()[0].resulting_cost_base(), 1094.17, epsilon = 0.005);
    }

    #[test]
    fn test_insert_out_of_order() {
        let mut ledger = SecurityLedger::new("BNS");
        ledger.insert(buy_bns_2()).unwrap();
        assert_eq!(ledger.insert(buy_bns_1()).unwrap(), 0);

        assert_eq!(ledger.history()[0].date(), date(2019, 11, 20));
        assert_eq!(ledger.history()[1].resulting_shares(), 30);
        assert_relative_eq!(ledger.history()[1].resulting_cost_base(), 2949.26, epsilon = 0.005);
        assert_relative_eq!(ledger.history()[0].resulting_cost_base(), 1094.17, epsilon = 0.005);
    }

    #[test]
    fn test_insert_in_middle() {
        let mut ledger = SecurityLedger::new("BNS");
        ledger.insert(buy_bns_1()).unwrap();
        ledger.insert(buy_bns_2()).unwrap();
        assert_eq!(ledger.insert(sell_bns()).unwrap(), 1);

        let history = ledger.history();
        assert_relative_eq!(history[0].resulting_cost_base(), 1094.17, epsilon = 0.005);

        assert_relative_eq!(history[1].realized_gain(), -131.875, epsilon = 1e-6);
        assert_eq!(history[1].resulting_shares(), 5);
        assert_relative_eq!(history[1].resulting_cost_base(), 547.085, epsilon = 1e-6);

        assert_eq!(history[2].resulting_shares(), 25);
        assert_relative_eq!(history[2].resulting_cost_base(), 2402.175, epsilon = 1e-6);

        assert_eq!(ledger.current_shares(), 25);
        assert_relative_eq!(ledger.current_cost_base(), 2402.175, epsilon = 1e-6);
    }

    #[test]
    fn test_insert_wrong_ticker() {
        let mut ledger = SecurityLedger::new("TD");
        let err = ledger.insert(buy_bns_1()).unwrap_err();
        assert!(matches!(err, CapTrackError::TickerMismatch { .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_sell_from_empty_ledger_fails() {
        let mut ledger = SecurityLedger::new("BNS");
        let err = ledger.insert(sell_bns()).unwrap_err();

        assert!(matches!(err, CapTrackError::InsufficientShares { available: 0, .. }));
        assert!(ledger.is_empty());
        assert_eq!(ledger.current_shares(), 0);
    }

    #[test]
    fn test_failed_insert_leaves_ledger_untouched() {
        let mut ledger = SecurityLedger::new("BNS");
        ledger.insert(buy_bns_1()).unwrap();
        ledger.insert(sell_bns()).unwrap();
        let before = ledger.clone();

        // Selling 6 before the first buy's sale leaves the existing sell short
        let early_sell =
            TransactionRecord::sell("BNS", date(2020, 1, 10), 500.0, 6, 0.0).unwrap();
        assert!(ledger.insert(early_sell).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_same_date_keeps_insertion_order() {
        let mut ledger = SecurityLedger::new("BNS");
        let day = date(2020, 6, 5);
        let first = TransactionRecord::buy("BNS", day, 100.0, 10, 0.0).unwrap();
        let second = TransactionRecord::sell("BNS", day, 60.0, 5, 0.0).unwrap();

        assert_eq!(ledger.insert(first).unwrap(), 0);
        assert_eq!(ledger.insert(second).unwrap(), 1);

        let history = ledger.history();
        assert!(history[0].is_buy());
        assert!(history[1].is_sell());
        assert_relative_eq!(history[1].realized_gain(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_same_date_sell_first_is_rejected() {
        // The sell lands after the buy only if it is inserted after it
        let mut ledger = SecurityLedger::new("BNS");
        let day = date(2020, 6, 5);
        let sell = TransactionRecord::sell("BNS", day, 60.0, 5, 0.0).unwrap();
        assert!(ledger.insert(sell).is_err());
    }

    #[test]
    fn test_insert_all_accepts_any_order() {
        let mut ledger = SecurityLedger::new("BNS");
        ledger
            .insert_all(vec![buy_bns_2(), sell_bns(), buy_bns_1()])
            .unwrap();

        let dates: Vec<_> = ledger.history().iter().map(|t| t.date()).collect();
        assert_eq!(dates, vec![date(2019, 11, 20), date(2020, 6, 5), date(2021, 3, 20)]);
        assert_eq!(ledger.current_shares(), 25);
        assert_relative_eq!(ledger.current_cost_base(), 2402.175, epsilon = 1e-6);
    }

    #[test]
    fn test_insert_all_restores_on_failure() {
        let mut ledger = SecurityLedger::new("BNS");
        ledger.insert(buy_bns_1()).unwrap();
        let before = ledger.clone();

        let oversell = TransactionRecord::sell("BNS", date(2022, 1, 1), 10.0, 50, 0.0).unwrap();
        assert!(ledger.insert_all(vec![buy_bns_2(), oversell]).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_remove_recomputes_suffix() {
        let mut ledger = SecurityLedger::new("BNS");
        ledger.insert_all(vec![buy_bns_1(), sell_bns(), buy_bns_2()]).unwrap();

        let removed = ledger.remove(1).unwrap();
        assert!(removed.is_sell());
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.current_shares(), 30);
        assert_relative_eq!(ledger.current_cost_base(), 2949.26, epsilon = 0.005);
    }

    #[test]
    fn test_remove_last_record_empties_ledger() {
        let mut ledger = SecurityLedger::new("BNS");
        ledger.insert(buy_bns_1()).unwrap();
        ledger.remove(0).unwrap();

        assert!(ledger.is_empty());
        assert_eq!(ledger.current_shares(), 0);
        assert_eq!(ledger.current_cost_base(), 0.0);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut ledger = SecurityLedger::new("BNS");
        ledger.insert(buy_bns_1()).unwrap();
        assert!(matches!(
            ledger.remove(1),
            Err(CapTrackError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_remove_funding_buy_is_rejected() {
        let mut ledger = SecurityLedger::new("BNS");
        ledger.insert_all(vec![buy_bns_1(), sell_bns()]).unwrap();
        let before = ledger.clone();

        assert!(matches!(
            ledger.remove(0),
            Err(CapTrackError::InsufficientShares { .. })
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_fold_outcomes() {
        let records = vec![buy_bns_1(), sell_bns()];
        let outcomes = fold_outcomes(RunningBalance::ZERO, &records).unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].balance.shares, 10);
        assert_eq!(outcomes[1].balance.shares, 5);
        assert!(fold_outcomes(RunningBalance::ZERO, &records[1..]).is_err());
    }
}
