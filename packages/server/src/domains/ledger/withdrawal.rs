use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::{round_money, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    Bdt,
    Usd,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Bdt => f.write_str("BDT"),
            Currency::Usd => f.write_str("USD"),
        }
    }
}

/// Payout channel a holder can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalMethod {
    Recharge,
    Rocket,
    Binance,
}

impl WithdrawalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalMethod::Recharge => "recharge",
            WithdrawalMethod::Rocket => "rocket",
            WithdrawalMethod::Binance => "binance",
        }
    }

    /// Currency the holder states the amount in.
    pub fn currency(&self) -> Currency {
        match self {
            WithdrawalMethod::Binance => Currency::Usd,
            WithdrawalMethod::Recharge | WithdrawalMethod::Rocket => Currency::Bdt,
        }
    }
}

impl fmt::Display for WithdrawalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recharge" => Ok(WithdrawalMethod::Recharge),
            "rocket" => Ok(WithdrawalMethod::Rocket),
            "binance" => Ok(WithdrawalMethod::Binance),
            other => Err(format!("unknown withdrawal method: {}", other)),
        }
    }
}

/// A priced withdrawal request: what the holder asked for and what it costs
/// their balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WithdrawalQuote {
    pub method: WithdrawalMethod,
    /// Amount in the method's currency.
    pub amount: Money,
    /// Amount debited from the balance (base currency).
    pub amount_base: Money,
}

/// Minimums per method and the USD exchange rate. Balances are kept in BDT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalPolicy {
    pub usd_rate: Decimal,
    pub min_recharge: Money,
    pub min_rocket: Money,
    pub min_binance_usd: Money,
}

impl Default for WithdrawalPolicy {
    fn default() -> Self {
        Self {
            usd_rate: Decimal::new(110, 0),
            min_recharge: Decimal::new(20, 0),
            min_rocket: Decimal::new(30, 0),
            min_binance_usd: Decimal::new(25, 2),
        }
    }
}

impl WithdrawalPolicy {
    /// Minimum in the method's own currency.
    pub fn minimum(&self, method: WithdrawalMethod) -> Money {
        match method {
            WithdrawalMethod::Recharge => self.min_recharge,
            WithdrawalMethod::Rocket => self.min_rocket,
            WithdrawalMethod::Binance => self.min_binance_usd,
        }
    }

    /// Amount in the base currency, or None when the conversion overflows.
    pub fn to_base(&self, method: WithdrawalMethod, amount: Money) -> Option<Money> {
        match method.currency() {
            Currency::Usd => amount.checked_mul(self.usd_rate).map(round_money),
            Currency::Bdt => Some(round_money(amount)),
        }
    }

    /// Price a request.
    pub fn quote(
        &self,
        method: WithdrawalMethod,
        amount: Money,
    ) -> Result<WithdrawalQuote, QuoteRefusal> {
        let minimum = self.minimum(method);
        if amount < minimum {
            return Err(QuoteRefusal::BelowMinimum { minimum });
        }
        let amount_base = self
            .to_base(method, amount)
            .ok_or(QuoteRefusal::OutOfRange)?;
        Ok(WithdrawalQuote {
            method,
            amount,
            amount_base,
        })
    }
}

/// Why a withdrawal could not be priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteRefusal {
    /// Under the method minimum (in the method's currency).
    BelowMinimum { minimum: Money },
    /// Too large to convert to the base currency.
    OutOfRange,
}
