//! Currency aggregation.
//!
//! Amounts are summed per currency as absolute values (a record set only
//! says how much moved, not in which direction), then valued in the
//! reference currency with one batched rate lookup.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{Money, RateProvider, RateTable, Transaction};

/// Sum of `|amount|` per lowercase currency over one record set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CurrencyTotals(BTreeMap<String, Decimal>);

impl CurrencyTotals {
    /// Adds `|tx.amount|` to its currency. A sum past the decimal range is
    /// clamped to [`Decimal::MAX`].
    pub fn add(&mut self, tx: &Transaction) {
        let total = self.0.entry(tx.currency.to_lowercase()).or_default();
        let amount = tx.amount.abs();
        *total = total.checked_add(amount).unwrap_or_else(|| {
            tracing::warn!("{} total overflowed, saturating", tx.currency);
            Decimal::MAX
        });
    }

    #[must_use]
    pub fn get(&self, currency: &str) -> Option<Decimal> {
        self.0.get(currency).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Distinct currencies seen.
    pub fn symbols(&self) -> BTreeSet<String> {
        self.0.keys().cloned().collect()
    }

    /// Values every total with `rates`. A currency without a rate is worth
    /// zero; it is still listed.
    #[must_use]
    pub fn apply_rates(&self, rates: &RateTable) -> Aggregate {
        Aggregate(
            self.0
                .iter()
                .map(|(currency, total)| {
                    let rate = rates.get(currency).unwrap_or(Decimal::ZERO);
                    let value = total.checked_mul(rate).unwrap_or_else(|| {
                        tracing::warn!("{currency} value overflowed, saturating");
                        Decimal::MAX
                    });
                    let value = Money::round(value);
                    (currency.clone(), CurrencyValue { value })
                })
                .collect(),
        )
    }
}

impl FromIterator<Transaction> for CurrencyTotals {
    fn from_iter<T: IntoIterator<Item = Transaction>>(iter: T) -> Self {
        let mut totals = Self::default();
        for tx in iter {
            totals.add(&tx);
        }
        totals
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CurrencyValue {
    /// Value in the reference currency.
    pub value: Money,
}

/// Per-currency valuation of one record set, ordered by currency.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Aggregate(BTreeMap<String, CurrencyValue>);

impl Aggregate {
    #[must_use]
    pub fn get(&self, currency: &str) -> Option<Money> {
        self.0.get(currency).map(|v| v.value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Money)> {
        self.0.iter().map(|(currency, v)| (currency.as_str(), v.value))
    }

    /// Sum of all per-currency values.
    #[must_use]
    pub fn total(&self) -> Money {
        self.0
            .values()
            .fold(Money::ZERO, |total, v| total.saturating_add(v.value))
    }
}

impl<S: Into<String>> FromIterator<(S, Money)> for Aggregate {
    fn from_iter<T: IntoIterator<Item = (S, Money)>>(iter: T) -> Self {
        Aggregate(
            iter.into_iter()
                .map(|(currency, value)| (currency.into(), CurrencyValue { value }))
                .collect(),
        )
    }
}

/// Values already summed totals. No rate lookup happens when `totals` is
/// empty.
pub async fn aggregate_totals(totals: &CurrencyTotals, rates: &dyn RateProvider) -> Aggregate {
    if totals.is_empty() {
        return Aggregate::default();
    }
    let table = rates.fetch_rates(&totals.symbols()).await;
    totals.apply_rates(&table)
}

/// Sums and values a sequence of transactions.
pub async fn aggregate<I>(transactions: I, rates: &dyn RateProvider) -> Aggregate
where
    I: IntoIterator<Item = Transaction>,
{
    let totals: CurrencyTotals = transactions.into_iter().collect();
    aggregate_totals(&totals, rates).await
}
