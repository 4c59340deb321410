use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{RateProvider, RateTable};
use crate::ReferenceCurrency;

#[derive(Clone, Copy, Debug)]
struct CachedRate {
    rate: Decimal,
    fetched_at: Instant,
}

/// Short-lived, process-wide cache in front of another provider.
///
/// Entries expire `ttl` after they were fetched and are evicted when a read
/// finds them expired. Symbols that are missing or expired are forwarded to
/// the inner provider in one call. Unresolved symbols are never cached, so a
/// failed lookup is retried on the next request.
pub struct CachedRates {
    inner: Arc<dyn RateProvider>,
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedRate>>,
}

impl CachedRates {
    pub fn new(inner: Arc<dyn RateProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateProvider for CachedRates {
    fn currency(&self) -> ReferenceCurrency {
        self.inner.currency()
    }

    async fn fetch_rates(&self, symbols: &BTreeSet<String>) -> RateTable {
        if self.ttl.is_zero() {
            return self.inner.fetch_rates(symbols).await;
        }

        let now = Instant::now();
        let mut rates = RateTable::new();
        let mut missing = BTreeSet::new();
        {
            let mut entries = self.entries.lock().await;
            for symbol in symbols {
                match entries.get(symbol) {
                    Some(cached) if now.duration_since(cached.fetched_at) < self.ttl => {
                        rates.insert(symbol.clone(), cached.rate);
                    }
                    Some(_) => {
                        entries.remove(symbol);
                        missing.insert(symbol.clone());
                    }
                    None => {
                        missing.insert(symbol.clone());
                    }
                }
            }
        }

        if missing.is_empty() {
            tracing::trace!("all {} rates served from cache", rates.len());
            return rates;
        }

        let fetched = self.inner.fetch_rates(&missing).await;
        let fetched_at = Instant::now();
        let mut entries = self.entries.lock().await;
        for (symbol, rate) in fetched.iter() {
            entries.insert(symbol.to_string(), CachedRate { rate, fetched_at });
            rates.insert(symbol, rate);
        }
        rates
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::StaticRates;
    use rust_decimal_macros::dec;

    struct Counting {
        inner: StaticRates,
        calls: AtomicUsize,
        requested: std::sync::Mutex<Vec<BTreeSet<String>>>,
    }

    #[async_trait]
    impl RateProvider for Counting {
        fn currency(&self) -> ReferenceCurrency {
            self.inner.currency()
        }

        async fn fetch_rates(&self, symbols: &BTreeSet<String>) -> RateTable {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push(symbols.clone());
            self.inner.fetch_rates(symbols).await
        }
    }

    fn counting() -> Arc<Counting> {
        Arc::new(Counting {
            inner: StaticRates::new(
                ReferenceCurrency::Eur,
                [("btc", dec!(50000)), ("eth", dec!(2000))].into_iter().collect(),
            ),
            calls: AtomicUsize::new(0),
            requested: std::sync::Mutex::new(Vec::new()),
        })
    }

    fn set(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn repeated_lookups_within_ttl_hit_the_cache() {
        let provider = counting();
        let cache = CachedRates::new(provider.clone(), Duration::from_secs(60));

        let first = cache.fetch_rates(&set(&["btc", "eth"])).await;
        let second = cache.fetch_rates(&set(&["btc", "eth"])).await;

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn only_missing_symbols_are_forwarded() {
        let provider = counting();
        let cache = CachedRates::new(provider.clone(), Duration::from_secs(60));

        cache.fetch_rates(&set(&["btc"])).await;
        let rates = cache.fetch_rates(&set(&["btc", "eth", "xyz"])).await;

        assert_eq!(rates.get("btc"), Some(dec!(50000)));
        assert_eq!(rates.get("eth"), Some(dec!(2000)));
        assert_eq!(rates.get("xyz"), None);
        let requested = provider.requested.lock().unwrap().clone();
        assert_eq!(requested, vec![set(&["btc"]), set(&["eth", "xyz"])]);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let provider = counting();
        let cache = CachedRates::new(provider.clone(), Duration::from_millis(20));

        cache.fetch_rates(&set(&["btc"])).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.fetch_rates(&set(&["btc"])).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let provider = counting();
        let cache = CachedRates::new(provider.clone(), Duration::ZERO);

        cache.fetch_rates(&set(&["btc"])).await;
        cache.fetch_rates(&set(&["btc"])).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
