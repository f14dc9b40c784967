//! Trade currency and conversion into the reporting currency

use crate::types::{Cash, FxRate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency a trade was settled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TradeCurrency {
    /// The reporting currency itself (e.g. CAD), no conversion needed
    #[default]
    Reporting,
    /// A foreign currency (e.g. USD), converted with the per-trade rate
    Foreign,
}

impl TradeCurrency {
    /// Build from the persisted `isUSD`-style flag
    pub fn from_foreign_flag(is_foreign: bool) -> Self {
        if is_foreign {
            TradeCurrency::Foreign
        } else {
            TradeCurrency::Reporting
        }
    }

    /// Check if this is a foreign currency trade
    pub fn is_foreign(&self) -> bool {
        matches!(self, TradeCurrency::Foreign)
    }

    /// Convert an amount in this currency into the reporting currency.
    ///
    /// `fx_rate` is ignored for reporting currency amounts.
    pub fn to_reporting(&self, amount: Cash, fx_rate: FxRate) -> Cash {
        match self {
            TradeCurrency::Reporting => amount,
            TradeCurrency::Foreign => amount * fx_rate,
        }
    }
}

impl fmt::Display for TradeCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeCurrency::Reporting => write!(f, "Reporting"),
            TradeCurrency::Foreign => write!(f, "Foreign"),
        }
    }
}

/// Trade value and commission expressed in the reporting currency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportingAmounts {
    pub value: Cash,
    pub commission: Cash,
}

/// Convert a trade value and its commission into the reporting currency
pub fn to_reporting(
    value: Cash,
    commission: Cash,
    currency: TradeCurrency,
    fx_rate: FxRate,
) -> ReportingAmounts {
    ReportingAmounts {
        value: currency.to_reporting(value, fx_rate),
        commission: currency.to_reporting(commission, fx_rate),
    }
}
