//! Transaction - a single buy or sell of a security
//!
//! A `TransactionRecord` holds the trade as entered by the caller plus the
//! running figures (gain, share balance, cost base) that the owning ledger
//! computes for it. The computed figures are only meaningful relative to the
//! record's current position in that ledger.

use crate::currency::{self, ReportingAmounts, TradeCurrency};
use crate::error::{CapTrackError, Result};
use crate::types::{Cash, FxRate, Shares, Ticker, TradeDate};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transaction side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionSide {
    Buy,
    Sell,
}

impl TransactionSide {
    /// Build from the persisted `isSell` flag
    pub fn from_sell_flag(is_sell: bool) -> Self {
        if is_sell {
            TransactionSide::Sell
        } else {
            TransactionSide::Buy
        }
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, TransactionSide::Sell)
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, TransactionSide::Buy)
    }
}

impl FromStr for TransactionSide {
    type Err = CapTrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Buy" | "buy" | "BUY" | "b" => Ok(TransactionSide::Buy),
            "Sell" | "sell" | "SELL" | "s" => Ok(TransactionSide::Sell),
            other => Err(CapTrackError::InvalidTransaction(format!(
                "'{}' is not a valid transaction side",
                other
            ))),
        }
    }
}

impl fmt::Display for TransactionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionSide::Buy => write!(f, "Buy"),
            TransactionSide::Sell => write!(f, "Sell"),
        }
    }
}

/// Share balance and pooled cost base of a security at a point in its history
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Shares held
    pub shares: Shares,
    /// Adjusted cost base of all held shares, reporting currency
    pub cost_base: Cash,
}

impl RunningBalance {
    /// Balance of a security with no history
    pub const ZERO: RunningBalance = RunningBalance {
        shares: 0,
        cost_base: 0.0,
    };

    pub fn new(shares: Shares, cost_base: Cash) -> Self {
        Self { shares, cost_base }
    }

    /// Cost base per share, `None` when nothing is held
    pub fn average_cost(&self) -> Option<Cash> {
        if self.shares == 0 {
            None
        } else {
            Some(self.cost_base / self.shares as f64)
        }
    }
}

/// Figures computed for a record from the balance that precedes it
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AcbOutcome {
    /// Realized capital gain (negative for a loss), zero for buys
    pub realized_gain: Cash,
    /// Balance after this transaction
    pub balance: RunningBalance,
}

/// A recorded trade of one security
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    ticker: Ticker,
    date: TradeDate,
    side: TransactionSide,
    gross_value: Cash,
    currency: TradeCurrency,
    fx_rate: FxRate,
    shares: Shares,
    commission: Cash,
    outcome: AcbOutcome,
}

impl TransactionRecord {
    /// Create a new transaction settled in the reporting currency
    pub fn new(
        ticker: impl Into<Ticker>,
        date: TradeDate,
        side: TransactionSide,
        gross_value: Cash,
        shares: Shares,
        commission: Cash,
    ) -> Result<Self> {
        let record = Self {
            ticker: ticker.into(),
            date,
            side,
            gross_value,
            currency: TradeCurrency::Reporting,
            fx_rate: 0.0,
            shares,
            commission,
            outcome: AcbOutcome::default(),
        };
        record.validate()?;
        Ok(record)
    }

    /// Create a buy in the reporting currency
    pub fn buy(
        ticker: impl Into<Ticker>,
        date: TradeDate,
        gross_value: Cash,
        shares: Shares,
        commission: Cash,
    ) -> Result<Self> {
        Self::new(ticker, date, TransactionSide::Buy, gross_value, shares, commission)
    }

    /// Create a sell in the reporting currency
    pub fn sell(
        ticker: impl Into<Ticker>,
        date: TradeDate,
        gross_value: Cash,
        shares: Shares,
        commission: Cash,
    ) -> Result<Self> {
        Self::new(ticker, date, TransactionSide::Sell, gross_value, shares, commission)
    }

    /// Set the trade currency and its rate into the reporting currency.
    ///
    /// The rate is kept as given for reporting currency trades but only
    /// validated (finite, positive) for foreign ones.
    pub fn with_currency(mut self, currency: TradeCurrency, fx_rate: FxRate) -> Result<Self> {
        self.currency = currency;
        self.fx_rate = fx_rate;
        self.validate()?;
        Ok(self)
    }

    /// Shorthand for a foreign currency trade at `fx_rate`
    pub fn in_foreign_currency(self, fx_rate: FxRate) -> Result<Self> {
        self.with_currency(TradeCurrency::Foreign, fx_rate)
    }

    fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(CapTrackError::InvalidTransaction(
                "ticker must not be empty".to_string(),
            ));
        }
        if !self.gross_value.is_finite() || self.gross_value < 0.0 {
            return Err(CapTrackError::InvalidTransaction(format!(
                "value must be a non-negative amount, got {}",
                self.gross_value
            )));
        }
        if self.shares == 0 {
            return Err(CapTrackError::InvalidTransaction(
                "share count must be greater than zero".to_string(),
            ));
        }
        if !self.commission.is_finite() || self.commission < 0.0 {
            return Err(CapTrackError::InvalidTransaction(format!(
                "commission must be a non-negative amount, got {}",
                self.commission
            )));
        }
        if self.currency.is_foreign() && !(self.fx_rate.is_finite() && self.fx_rate > 0.0) {
            return Err(CapTrackError::InvalidTransaction(format!(
                "exchange rate must be positive for a foreign trade, got {}",
                self.fx_rate
            )));
        }
        Ok(())
    }

    /// Compute this transaction's outcome from the balance immediately before it.
    ///
    /// Buys add value and commission to the cost base. Sells remove the
    /// proportional share of the cost base and realize the difference between
    /// net proceeds and that share. Selling more than `prev` holds fails.
    pub fn apply(&self, prev: RunningBalance) -> Result<AcbOutcome> {
        let ReportingAmounts { value, commission } = self.reporting_amounts();

        match self.side {
            TransactionSide::Buy => {
                let shares = prev.shares.checked_add(self.shares).ok_or_else(|| {
                    CapTrackError::InvalidTransaction(format!(
                        "share balance of {} overflows",
                        self.ticker
                    ))
                })?;
                Ok(AcbOutcome {
                    realized_gain: 0.0,
                    balance: RunningBalance::new(shares, prev.cost_base + value + commission),
                })
            }
            TransactionSide::Sell => {
                if prev.shares == 0 || self.shares > prev.shares {
                    return Err(CapTrackError::InsufficientShares {
                        ticker: self.ticker.clone(),
                        date: self.date,
                        requested: self.shares,
                        available: prev.shares,
                    });
                }
                let held = prev.shares as f64;
                let remaining = prev.shares - self.shares;
                let realized_gain =
                    value - commission - (prev.cost_base / held) * self.shares as f64;
                let cost_base = prev.cost_base * remaining as f64 / held;
                Ok(AcbOutcome {
                    realized_gain,
                    balance: RunningBalance::new(remaining, cost_base),
                })
            }
        }
    }

    pub(crate) fn set_outcome(&mut self, outcome: AcbOutcome) {
        self.outcome = outcome;
    }

    /// Value and commission in the reporting currency
    pub fn reporting_amounts(&self) -> ReportingAmounts {
        currency::to_reporting(self.gross_value, self.commission, self.currency, self.fx_rate)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn date(&self) -> TradeDate {
        self.date
    }

    /// Calendar year of the trade
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn side(&self) -> TransactionSide {
        self.side
    }

    pub fn is_sell(&self) -> bool {
        self.side.is_sell()
    }

    pub fn is_buy(&self) -> bool {
        self.side.is_buy()
    }

    /// Trade value in the trade currency
    pub fn gross_value(&self) -> Cash {
        self.gross_value
    }

    pub fn currency(&self) -> TradeCurrency {
        self.currency
    }

    pub fn fx_rate(&self) -> FxRate {
        self.fx_rate
    }

    pub fn shares(&self) -> Shares {
        self.shares
    }

    /// Commission in the trade currency
    pub fn commission(&self) -> Cash {
        self.commission
    }

    pub fn outcome(&self) -> AcbOutcome {
        self.outcome
    }

    pub fn realized_gain(&self) -> Cash {
        self.outcome.realized_gain
    }

    pub fn resulting_shares(&self) -> Shares {
        self.outcome.balance.shares
    }

    pub fn resulting_cost_base(&self) -> Cash {
        self.outcome.balance.cost_base
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Date: {}", self.date.format("%Y-%B-%d"))?;
        writeln!(f, "{} {} shares of {}", self.side, self.shares, self.ticker)?;
        writeln!(f, "Value: ${:.2} {}", self.gross_value, self.currency)?;
        writeln!(f, "Commission: ${:.2} {}", self.commission, self.currency)?;
        writeln!(f, "Gains: ${:.2}", self.realized_gain())?;
        writeln!(f, "TotalShares: {}", self.resulting_shares())?;
        write!(f, "ACB: ${:.2}", self.resulting_cost_base())
    }
}
