//! Record parser.
//!
//! Turns the rows of an uploaded CSV into [`Transaction`]s. Only the
//! `currency` and `amount` columns are read; every other column is ignored.
//!
//! A row without a currency, or whose amount is not a number, is skipped.
//! Failing to read the source itself is an error.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{EngineError, ResultEngine, money::parse_amount};

/// One deposit or withdrawal, as found in a record set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Lowercase ticker.
    pub currency: String,
    pub amount: Decimal,
}

impl Transaction {
    /// Validates raw column values. The currency is trimmed and lowercased.
    pub fn new(currency: &str, amount: &str) -> Option<Self> {
        let currency = currency.trim().to_lowercase();
        if currency.is_empty() {
            return None;
        }
        let amount = parse_amount(amount)?;
        Some(Self { currency, amount })
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    amount: Option<String>,
}

impl RawRow {
    fn into_transaction(self) -> Option<Transaction> {
        Transaction::new(self.currency.as_deref()?, self.amount.as_deref()?)
    }
}

/// Lazy sequence of the valid transactions of one record set.
///
/// Yields `Err` at most once, when the underlying source fails mid-read, and
/// ends right after.
pub struct Transactions<R> {
    rows: csv::DeserializeRecordsIntoIter<R, RawRow>,
    origin: PathBuf,
    skipped: usize,
    done: bool,
}

impl<R> Transactions<R> {
    /// Rows dropped so far because they were malformed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: Read> Iterator for Transactions<R> {
    type Item = ResultEngine<Transaction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(row) = self.rows.next() else {
                self.done = true;
                if self.skipped > 0 {
                    tracing::debug!(
                        "skipped {} malformed rows in {}",
                        self.skipped,
                        self.origin.display()
                    );
                }
                return None;
            };
            match row {
                Ok(raw) => match raw.into_transaction() {
                    Some(tx) => return Some(Ok(tx)),
                    None => self.skipped += 1,
                },
                Err(err) if err.is_io_error() => {
                    self.done = true;
                    tracing::error!("error reading {}: {err}", self.origin.display());
                    return Some(Err(EngineError::source_unavailable(&self.origin, err)));
                }
                Err(err) => {
                    tracing::trace!("skipping row of {}: {err}", self.origin.display());
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Opens the record set at `location`.
pub fn parse(location: &Path) -> ResultEngine<Transactions<File>> {
    let file = File::open(location).map_err(|err| {
        tracing::error!("error opening {}: {err}", location.display());
        EngineError::source_unavailable(location, err)
    })?;
    from_reader(file, location)
}

/// Same as [`parse`], over any byte source. `origin` is only used in logs and
/// errors.
pub fn from_reader<R: Read>(reader: R, origin: impl Into<PathBuf>) -> ResultEngine<Transactions<R>> {
    let origin = origin.into();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // An undecodable header row means no column can be matched: the record
    // set is read as having no valid rows.
    let readable = match reader.headers() {
        Ok(headers) => {
            for column in ["currency", "amount"] {
                if !headers.iter().any(|h| h == column) {
                    tracing::warn!("{} has no \"{column}\" column", origin.display());
                }
            }
            true
        }
        Err(err) if err.is_io_error() => {
            return Err(EngineError::source_unavailable(&origin, err));
        }
        Err(err) => {
            tracing::warn!("unreadable header row in {}: {err}", origin.display());
            false
        }
    };

    Ok(Transactions {
        rows: reader.into_deserialize(),
        origin,
        skipped: 0,
        done: !readable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn collect(input: &str) -> Vec<Transaction> {
        from_reader(input.as_bytes(), "test.csv")
            .unwrap()
            .map(|tx| tx.unwrap())
            .collect()
    }

    #[test]
    fn reads_currency_and_amount_only() {
        let txs = collect(
            "id,currency,amount,date\n\
             1,BTC,1.5,2024-01-01\n\
             2,eth, 0.25 ,2024-01-02\n",
        );
        assert_eq!(
            txs,
            vec![
                Transaction {
                    currency: "btc".to_string(),
                    amount: dec!(1.5)
                },
                Transaction {
                    currency: "eth".to_string(),
                    amount: dec!(0.25)
                },
            ]
        );
    }

    #[test]
    fn skips_malformed_rows() {
        let mut txs = from_reader(
            "currency,amount\n\
             btc,abc\n\
             ,10\n\
             ltc,\n\
             doge\n\
             sol,-2\n"
                .as_bytes(),
            "test.csv",
        )
        .unwrap();

        let first = txs.next().unwrap().unwrap();
        assert_eq!(first.currency, "sol");
        assert_eq!(first.amount, dec!(-2));
        assert!(txs.next().is_none());
        assert_eq!(txs.skipped(), 4);
    }

    #[test]
    fn missing_columns_yield_nothing() {
        assert!(collect("ticker,value\nbtc,1\n").is_empty());
        assert!(collect("").is_empty());
    }

    #[test]
    fn undecodable_header_is_no_rows() {
        let input: &[u8] = b"curr\xffency,amount\nbtc,1\n";
        let mut txs = from_reader(input, "test.csv").unwrap();
        assert!(txs.next().is_none());
        assert_eq!(txs.skipped(), 0);
    }

    #[test]
    fn transaction_new_normalizes_currency() {
        let tx = Transaction::new("  USDT ", "3").unwrap();
        assert_eq!(tx.currency, "usdt");
        assert!(Transaction::new("   ", "3").is_none());
        assert!(Transaction::new("btc", "three").is_none());
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let path = Path::new("definitely/not/here.csv");
        assert_eq!(
            parse(path).err(),
            Some(EngineError::SourceUnavailable {
                path: path.to_path_buf(),
                reason: String::new(),
            })
        );
    }
}
