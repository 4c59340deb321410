//! CoinGecko `simple/price` client.

use std::{
    collections::{BTreeSet, HashMap},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;

use super::{RateProvider, RateTable};
use crate::{ReferenceCurrency, currency::coin_id, money::parse_amount};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `{"bitcoin": {"eur": 50000.0}, ...}`. Entries are kept as raw JSON so
/// that one malformed price only loses that coin.
type PriceResponse = HashMap<String, serde_json::Value>;

#[derive(Debug, thiserror::Error)]
enum RateError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Rate provider backed by the CoinGecko public API.
///
/// Tickers are translated through the static ticker table first; anything
/// not in the table is never requested. All remaining tickers are valued in
/// a single batched request bounded by `timeout`.
#[derive(Clone, Debug)]
pub struct CoinGeckoRates {
    client: Client,
    base_url: String,
    currency: ReferenceCurrency,
    timeout: Duration,
}

impl CoinGeckoRates {
    pub fn new(base_url: &str, currency: ReferenceCurrency, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!("failed to build http client ({err}), using defaults");
                Client::new()
            });
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            currency,
            timeout,
        }
    }

    async fn request(&self, ids: &str) -> Result<PriceResponse, RateError> {
        let resp = self
            .client
            .get(format!("{}/simple/price", self.base_url))
            .query(&[("ids", ids), ("vs_currencies", self.currency.vs_currency())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RateError::Status(status));
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl Default for CoinGeckoRates {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, ReferenceCurrency::default(), DEFAULT_TIMEOUT)
    }
}

/// Pairs every resolvable symbol with its price service identifier.
fn resolve(symbols: &BTreeSet<String>) -> Vec<(&str, &'static str)> {
    symbols
        .iter()
        .filter_map(|symbol| Some((symbol.as_str(), coin_id(symbol)?)))
        .collect()
}

/// Maps a price response back to tickers. Identifiers the service returned
/// no value for are left out.
fn rates_from_response(
    resolved: &[(&str, &'static str)],
    response: &PriceResponse,
    vs_currency: &str,
) -> RateTable {
    resolved
        .iter()
        .filter_map(|(symbol, id)| {
            let rate = price(response.get(*id)?.get(vs_currency)?)?;
            Some((*symbol, rate))
        })
        .collect()
}

fn price(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(number) => parse_amount(&number.to_string()),
        serde_json::Value::String(text) => parse_amount(text),
        _ => None,
    }
}

#[async_trait]
impl RateProvider for CoinGeckoRates {
    fn currency(&self) -> ReferenceCurrency {
        self.currency
    }

    async fn fetch_rates(&self, symbols: &BTreeSet<String>) -> RateTable {
        let resolved = resolve(symbols);
        if resolved.is_empty() {
            return RateTable::new();
        }

        let mut ids: Vec<&str> = resolved.iter().map(|(_, id)| *id).collect();
        ids.dedup();
        let ids = ids.join(",");

        let result = match tokio::time::timeout(self.timeout, self.request(&ids)).await {
            Ok(result) => result,
            Err(_) => Err(RateError::Timeout(self.timeout)),
        };

        match result {
            Ok(response) => {
                let rates = rates_from_response(&resolved, &response, self.currency.vs_currency());
                tracing::debug!("fetched {} of {} rates", rates.len(), resolved.len());
                rates
            }
            Err(err) => {
                tracing::warn!("Error fetching crypto rates: {err}");
                RateTable::new()
            }
        }
    }
}
