//! Profit/loss summary over a deposit and a withdrawal aggregate.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{Aggregate, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Status {
    Profit,
    Loss,
}

impl Status {
    /// Break-even counts as profit.
    fn of(profit_or_loss: Money) -> Self {
        if profit_or_loss.is_negative() {
            Status::Loss
        } else {
            Status::Profit
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Profit => "Profit",
            Status::Loss => "Loss",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_deposited: Money,
    pub total_withdrawn: Money,
    /// `total_withdrawn - total_deposited`.
    pub profit_or_loss: Money,
    pub status: Status,
}

/// Totals both aggregates and compares them.
#[must_use]
pub fn summarize(deposits: &Aggregate, withdrawals: &Aggregate) -> Summary {
    let total_deposited = deposits.total();
    let total_withdrawn = withdrawals.total();
    let profit_or_loss = total_withdrawn.saturating_sub(total_deposited);
    Summary {
        total_deposited,
        total_withdrawn,
        profit_or_loss,
        status: Status::of(profit_or_loss),
    }
}

/// One currency of the detailed breakdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CurrencyLine {
    pub currency: String,
    pub deposited: Money,
    pub withdrawn: Money,
    pub profit_or_loss: Money,
}

/// Per-currency comparison, ordered by currency.
pub type Breakdown = Vec<CurrencyLine>;

/// Pairs every currency present on either side; a missing side counts as
/// zero.
#[must_use]
pub fn breakdown(deposits: &Aggregate, withdrawals: &Aggregate) -> Breakdown {
    let currencies: BTreeSet<&str> = deposits.currencies().chain(withdrawals.currencies()).collect();
    currencies
        .into_iter()
        .map(|currency| {
            let deposited = deposits.get(currency).unwrap_or(Money::ZERO);
            let withdrawn = withdrawals.get(currency).unwrap_or(Money::ZERO);
            CurrencyLine {
                currency: currency.to_string(),
                deposited,
                withdrawn,
                profit_or_loss: withdrawn.saturating_sub(deposited),
            }
        })
        .collect()
}
