use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Currency every total is converted into before being compared.
///
/// Deposits and withdrawals are recorded in many crypto tickers; they only
/// become comparable once valued in a single fiat currency. `EUR` is the
/// default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReferenceCurrency {
    #[default]
    Eur,
    Usd,
    Gbp,
}

impl ReferenceCurrency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            ReferenceCurrency::Eur => "EUR",
            ReferenceCurrency::Usd => "USD",
            ReferenceCurrency::Gbp => "GBP",
        }
    }

    /// Identifier the price service expects in `vs_currencies`.
    #[must_use]
    pub const fn vs_currency(self) -> &'static str {
        match self {
            ReferenceCurrency::Eur => "eur",
            ReferenceCurrency::Usd => "usd",
            ReferenceCurrency::Gbp => "gbp",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            ReferenceCurrency::Eur => "€",
            ReferenceCurrency::Usd => "$",
            ReferenceCurrency::Gbp => "£",
        }
    }
}

impl core::fmt::Display for ReferenceCurrency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for ReferenceCurrency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(ReferenceCurrency::Eur),
            "USD" => Ok(ReferenceCurrency::Usd),
            "GBP" => Ok(ReferenceCurrency::Gbp),
            other => Err(EngineError::UnsupportedCurrency(other.to_string())),
        }
    }
}

/// Tickers the price service can value, with the identifier it knows them by.
///
/// Supporting a new ticker means adding a row here. Tickers missing from this
/// table are never sent to the price service and are valued at zero.
pub const KNOWN_TICKERS: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("ltc", "litecoin"),
    ("usdt", "tether"),
    ("sol", "solana"),
    ("doge", "dogecoin"),
    ("bch", "bitcoin-cash"),
    ("xrp", "ripple"),
    ("trx", "tron"),
    ("eos", "eos"),
    ("bnb", "binancecoin"),
    ("usdc", "usd-coin"),
    ("ape", "apecoin"),
    ("busd", "binance-usd"),
    ("dai", "dai"),
    ("cro", "crypto-com-chain"),
    ("sand", "the-sandbox"),
    ("link", "chainlink"),
    ("shib", "shiba-inu"),
    ("uni", "uniswap"),
    ("pol", "polkadot"),
    ("trump", "official-trump"),
];

/// Looks up the price service identifier of a ticker (case-insensitive).
#[must_use]
pub fn coin_id(ticker: &str) -> Option<&'static str> {
    let ticker = ticker.trim();
    KNOWN_TICKERS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ticker))
        .map(|(_, id)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_id_ignores_case() {
        assert_eq!(coin_id("btc"), Some("bitcoin"));
        assert_eq!(coin_id("BTC"), Some("bitcoin"));
        assert_eq!(coin_id(" Usdc "), Some("usd-coin"));
        assert_eq!(coin_id("xyz"), None);
        assert_eq!(coin_id(""), None);
    }

    #[test]
    fn reference_currency_parses_codes() {
        assert_eq!(
            ReferenceCurrency::try_from("eur").unwrap(),
            ReferenceCurrency::Eur
        );
        assert_eq!(
            ReferenceCurrency::try_from(" USD ").unwrap(),
            ReferenceCurrency::Usd
        );
        assert!(ReferenceCurrency::try_from("jpy").is_err());
    }

    #[test]
    fn ticker_table_has_unique_lowercase_tickers() {
        for (i, (ticker, _)) in KNOWN_TICKERS.iter().enumerate() {
            assert_eq!(*ticker, ticker.to_ascii_lowercase());
            assert!(KNOWN_TICKERS[i + 1..].iter().all(|(t, _)| t != ticker));
        }
    }
}
