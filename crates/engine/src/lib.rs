//! Deposit/withdrawal ledger engine.
//!
//! Users upload one CSV of deposits and one of withdrawals. On request the
//! engine re-reads them, sums amounts per currency, values each currency in
//! the reference currency at the current spot rate and compares the two
//! sides. Nothing computed is persisted.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

pub use aggregate::{Aggregate, CurrencyTotals, CurrencyValue, aggregate, aggregate_totals};
pub use currency::{KNOWN_TICKERS, ReferenceCurrency, coin_id};
pub use error::EngineError;
pub use money::Money;
pub use parser::Transaction;
pub use rates::{CachedRates, CoinGeckoRates, RateProvider, RateTable, StaticRates};
pub use records::{RecordKind, RecordStore, UserId};
pub use summary::{Breakdown, CurrencyLine, Status, Summary, breakdown, summarize};

mod aggregate;
mod currency;
mod error;
mod money;
pub mod parser;
pub mod rates;
mod records;
mod summary;

type ResultEngine<T> = Result<T, EngineError>;

pub const DEFAULT_DIRECTORY: &str = "user_files";

/// Entry point for every request.
///
/// Cloning is cheap: clones share the record index and the rate provider, so
/// one engine built at startup can be handed to every request handler.
#[derive(Clone)]
pub struct Engine {
    records: RecordStore,
    rates: Arc<dyn RateProvider>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("records", &self.records)
            .field("currency", &self.rates.currency())
            .finish()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Currency all values are expressed in.
    pub fn currency(&self) -> ReferenceCurrency {
        self.rates.currency()
    }

    /// Stores an uploaded record set and makes it the current one for
    /// `(user_id, kind)`.
    pub async fn upload(
        &self,
        user_id: UserId,
        kind: RecordKind,
        contents: &[u8],
    ) -> ResultEngine<PathBuf> {
        self.records.store(user_id, kind, contents).await
    }

    /// Registers a record set that is already on disk.
    pub async fn register(&self, user_id: UserId, kind: RecordKind, location: impl Into<PathBuf>) {
        self.records.register(user_id, kind, location).await;
    }

    /// Values the record set of `(user_id, kind)` per currency.
    pub async fn compute_aggregate(
        &self,
        user_id: UserId,
        kind: RecordKind,
    ) -> ResultEngine<Aggregate> {
        let location = self.records.locate(user_id, kind).await?;
        self.aggregate_at(location).await
    }

    /// Compares everything deposited with everything withdrawn.
    pub async fn compute_summary(&self, user_id: UserId) -> ResultEngine<Summary> {
        let (deposits, withdrawals) = self.both_sides(user_id).await?;
        Ok(summarize(&deposits, &withdrawals))
    }

    /// Same comparison as [`Engine::compute_summary`], currency by currency.
    pub async fn compute_breakdown(&self, user_id: UserId) -> ResultEngine<Breakdown> {
        let (deposits, withdrawals) = self.both_sides(user_id).await?;
        Ok(breakdown(&deposits, &withdrawals))
    }

    /// Forgets and deletes both record sets of `user_id`. Returns how many
    /// were removed.
    pub async fn clear(&self, user_id: UserId) -> usize {
        self.records.clear(user_id).await
    }

    async fn both_sides(&self, user_id: UserId) -> ResultEngine<(Aggregate, Aggregate)> {
        // Locate both first so a missing upload is reported before any work.
        let deposits = self.records.locate(user_id, RecordKind::Deposit).await?;
        let withdrawals = self.records.locate(user_id, RecordKind::Withdrawal).await?;
        tokio::try_join!(self.aggregate_at(deposits), self.aggregate_at(withdrawals))
    }

    async fn aggregate_at(&self, location: PathBuf) -> ResultEngine<Aggregate> {
        let origin = location.clone();
        let totals = tokio::task::spawn_blocking(move || load_totals(&location))
            .await
            .map_err(|err| EngineError::source_unavailable(origin, err))??;
        Ok(aggregate_totals(&totals, self.rates.as_ref()).await)
    }
}

fn load_totals(location: &Path) -> ResultEngine<CurrencyTotals> {
    let mut totals = CurrencyTotals::default();
    for tx in parser::parse(location)? {
        totals.add(&tx?);
    }
    Ok(totals)
}

#[derive(Default)]
pub struct EngineBuilder {
    directory: Option<PathBuf>,
    records: Option<RecordStore>,
    rates: Option<Arc<dyn RateProvider>>,
}

impl EngineBuilder {
    /// Directory holding the record sets. Scanned when the engine is built.
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> EngineBuilder {
        self.directory = Some(directory.into());
        self
    }

    /// Use an already populated store instead of scanning a directory.
    pub fn records(mut self, records: RecordStore) -> EngineBuilder {
        self.records = Some(records);
        self
    }

    pub fn rates(mut self, rates: Arc<dyn RateProvider>) -> EngineBuilder {
        self.rates = Some(rates);
        self
    }

    /// Construct `Engine`.
    pub async fn build(self) -> ResultEngine<Engine> {
        let records = match self.records {
            Some(records) => records,
            None => {
                let directory = self
                    .directory
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DIRECTORY));
                RecordStore::open(directory).await?
            }
        };
        let rates = self
            .rates
            .unwrap_or_else(|| Arc::new(CoinGeckoRates::default()));

        Ok(Engine { records, rates })
    }
}
