//! Exchange rates into the reference currency.
//!
//! The price service is a third party and is assumed to be unreliable, so
//! [`RateProvider::fetch_rates`] cannot fail: a symbol the provider cannot
//! value is simply absent from the returned [`RateTable`], and a failed
//! lookup returns an empty table.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::ReferenceCurrency;

mod cache;
mod coingecko;

pub use cache::CachedRates;
pub use coingecko::{CoinGeckoRates, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Rates keyed by lowercase ticker. Only strictly positive rates are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RateTable(HashMap<String, Decimal>);

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rate. Zero and negative rates are dropped, so the ticker stays
    /// unresolved.
    pub fn insert(&mut self, symbol: impl Into<String>, rate: Decimal) {
        if rate > Decimal::ZERO {
            self.0.insert(symbol.into().to_lowercase(), rate);
        }
    }

    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<Decimal> {
        self.0.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(symbol, rate)| (symbol.as_str(), *rate))
    }
}

impl<S: Into<String>> FromIterator<(S, Decimal)> for RateTable {
    fn from_iter<T: IntoIterator<Item = (S, Decimal)>>(iter: T) -> Self {
        let mut table = RateTable::new();
        for (symbol, rate) in iter {
            table.insert(symbol, rate);
        }
        table
    }
}

/// Source of exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Currency the returned rates are expressed in.
    fn currency(&self) -> ReferenceCurrency;

    /// Looks up the rate of every symbol in `symbols` (lowercase tickers).
    ///
    /// Implementations must issue at most one outbound request per call and
    /// must never fail; unresolvable symbols are left out of the result.
    async fn fetch_rates(&self, symbols: &BTreeSet<String>) -> RateTable;
}

/// Provider backed by a fixed table. Useful offline and in tests.
#[derive(Clone, Debug, Default)]
pub struct StaticRates {
    currency: ReferenceCurrency,
    rates: RateTable,
}

impl StaticRates {
    pub fn new(currency: ReferenceCurrency, rates: RateTable) -> Self {
        Self { currency, rates }
    }
}

#[async_trait]
impl RateProvider for StaticRates {
    fn currency(&self) -> ReferenceCurrency {
        self.currency
    }

    async fn fetch_rates(&self, symbols: &BTreeSet<String>) -> RateTable {
        symbols
            .iter()
            .filter_map(|symbol| Some((symbol.clone(), self.rates.get(symbol)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn table_drops_non_positive_rates() {
        let table: RateTable = [("BTC", dec!(50000)), ("eth", dec!(0)), ("xrp", dec!(-1))]
            .into_iter()
            .collect();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("btc"), Some(dec!(50000)));
        assert_eq!(table.get("eth"), None);
    }

    #[tokio::test]
    async fn static_rates_only_answers_requested_symbols() {
        let provider = StaticRates::new(
            ReferenceCurrency::Eur,
            [("btc", dec!(50000)), ("eth", dec!(2000))].into_iter().collect(),
        );
        let symbols: BTreeSet<String> = ["btc".to_string(), "xyz".to_string()].into();
        let rates = provider.fetch_rates(&symbols).await;
        assert_eq!(rates.len(), 1);
        assert_eq!(rates.get("btc"), Some(dec!(50000)));
    }
}
