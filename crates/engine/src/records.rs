//! Record store.
//!
//! Every user owns at most one record set per [`RecordKind`]. Record sets
//! live as CSV files in a single directory, named `<kind>_<user id>.csv`.
//! The store keeps an index `(user, kind) -> path` that is filled by scanning
//! the directory at startup and updated on every upload or clear.

use std::{
    collections::HashMap,
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{EngineError, ResultEngine};

/// Identifier of the user owning a record set (platform user id).
pub type UserId = u64;

const EXTENSION: &str = "csv";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Deposit,
    Withdrawal,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Deposit, RecordKind::Withdrawal];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RecordKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            other => Err(EngineError::InvalidKind(other.to_string())),
        }
    }
}

impl FromStr for RecordKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

/// File name a record set is stored under.
#[must_use]
pub fn file_name(user_id: UserId, kind: RecordKind) -> String {
    format!("{kind}_{user_id}.{EXTENSION}")
}

/// Inverse of [`file_name`]. Returns `None` for anything that does not match
/// `<deposit|withdrawal>_<digits>.csv` exactly.
fn parse_file_name(name: &str) -> Option<(UserId, RecordKind)> {
    let stem = name.strip_suffix(".csv")?;
    let (kind, user) = stem.split_once('_')?;
    let kind = match kind {
        "deposit" => RecordKind::Deposit,
        "withdrawal" => RecordKind::Withdrawal,
        _ => return None,
    };
    if user.is_empty() || !user.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let user_id = user.parse().ok()?;
    Some((user_id, kind))
}

type Index = HashMap<(UserId, RecordKind), PathBuf>;

/// Index of uploaded record sets.
///
/// Cloning is cheap and every clone shares the same index. The lock is held
/// only while reading or writing an entry, never while a record set is
/// parsed.
#[derive(Clone, Debug)]
pub struct RecordStore {
    directory: PathBuf,
    index: Arc<RwLock<Index>>,
}

impl RecordStore {
    /// Creates a store over `directory` with an empty index. Nothing is read
    /// from disk; see [`RecordStore::open`].
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            index: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates the directory if needed and indexes the record sets found in
    /// it.
    pub async fn open(directory: impl Into<PathBuf>) -> ResultEngine<Self> {
        let store = Self::new(directory);
        if !tokio::fs::try_exists(&store.directory).await? {
            tracing::info!(
                "No record directory at {}, creating it...",
                store.directory.display()
            );
            tokio::fs::create_dir_all(&store.directory).await?;
            return Ok(store);
        }
        store.scan().await?;
        Ok(store)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Walks the directory and registers every correctly named file.
    ///
    /// Files that do not follow the naming pattern are skipped with a
    /// warning. Returns how many record sets were registered.
    pub async fn scan(&self) -> ResultEngine<usize> {
        tracing::info!("Loading record sets from {}...", self.directory.display());
        let mut entries = tokio::fs::read_dir(&self.directory).await?;
        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some((user_id, kind)) = name.to_str().and_then(parse_file_name) else {
                tracing::warn!("Ignoring invalid file format: {}", name.to_string_lossy());
                continue;
            };
            found.push((user_id, kind, entry.path()));
        }

        let loaded = found.len();
        let mut index = self.index.write().await;
        for (user_id, kind, path) in found {
            tracing::debug!("Loaded {kind} file for user ID {user_id}");
            index.insert((user_id, kind), path);
        }
        drop(index);

        tracing::info!("{loaded} record sets loaded");
        Ok(loaded)
    }

    /// Points `(user_id, kind)` at `location`, replacing any previous entry.
    pub async fn register(&self, user_id: UserId, kind: RecordKind, location: impl Into<PathBuf>) {
        let location = location.into();
        tracing::info!(
            "Registered {kind} record set for user ID {user_id} at {}",
            location.display()
        );
        self.index.write().await.insert((user_id, kind), location);
    }

    /// Returns where the record set of `(user_id, kind)` lives.
    pub async fn locate(&self, user_id: UserId, kind: RecordKind) -> ResultEngine<PathBuf> {
        self.index
            .read()
            .await
            .get(&(user_id, kind))
            .cloned()
            .ok_or(EngineError::NoRecords { user_id, kind })
    }

    /// Writes an uploaded record set into the directory and registers it.
    ///
    /// A previous upload of the same kind is overwritten.
    pub async fn store(
        &self,
        user_id: UserId,
        kind: RecordKind,
        contents: &[u8],
    ) -> ResultEngine<PathBuf> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let path = self.directory.join(file_name(user_id, kind));
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, contents).await?;
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            tracing::debug!("rename of {} failed ({err}), copying", tmp.display());
            tokio::fs::copy(&tmp, &path).await?;
            let _ = tokio::fs::remove_file(&tmp).await;
        }

        self.register(user_id, kind, path.clone()).await;
        Ok(path)
    }

    /// Drops both record sets of `user_id` from the index and deletes their
    /// files. Returns how many record sets were removed.
    pub async fn clear(&self, user_id: UserId) -> usize {
        let removed: Vec<PathBuf> = {
            let mut index = self.index.write().await;
            RecordKind::ALL
                .iter()
                .filter_map(|kind| index.remove(&(user_id, *kind)))
                .collect()
        };

        for path in &removed {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!("failed to delete {}: {err}", path.display());
                }
            }
        }

        tracing::info!("Cleared {} record sets for user ID {user_id}", removed.len());
        removed.len()
    }

    /// Snapshot of the index, ordered by user then kind.
    pub async fn registered(&self) -> Vec<(UserId, RecordKind, PathBuf)> {
        let mut entries: Vec<_> = self
            .index
            .read()
            .await
            .iter()
            .map(|((user_id, kind), path)| (*user_id, *kind, path.clone()))
            .collect();
        entries.sort_by_key(|(user_id, kind, _)| (*user_id, *kind));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_round_trip() {
        assert_eq!(file_name(42, RecordKind::Deposit), "deposit_42.csv");
        assert_eq!(
            parse_file_name("withdrawal_123456789012345678.csv"),
            Some((123_456_789_012_345_678, RecordKind::Withdrawal))
        );
    }

    #[test]
    fn parse_file_name_rejects_other_files() {
        assert_eq!(parse_file_name("deposit_42.txt"), None);
        assert_eq!(parse_file_name("deposit_.csv"), None);
        assert_eq!(parse_file_name("deposit_4a2.csv"), None);
        assert_eq!(parse_file_name("refund_42.csv"), None);
        assert_eq!(parse_file_name("Deposit_42.csv"), None);
        assert_eq!(parse_file_name("deposit_42.csv.bak"), None);
        assert_eq!(parse_file_name("notes.csv"), None);
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(RecordKind::try_from("Deposit").unwrap(), RecordKind::Deposit);
        assert_eq!("withdrawal".parse::<RecordKind>().unwrap(), RecordKind::Withdrawal);
        assert_eq!(
            RecordKind::try_from("refund"),
            Err(EngineError::InvalidKind("refund".to_string()))
        );
    }

    #[tokio::test]
    async fn locate_unregistered_is_no_records() {
        let store = RecordStore::new("unused");
        assert_eq!(
            store.locate(7, RecordKind::Deposit).await,
            Err(EngineError::NoRecords {
                user_id: 7,
                kind: RecordKind::Deposit
            })
        );
    }

    #[tokio::test]
    async fn register_is_last_write_wins() {
        let store = RecordStore::new("unused");
        store.register(7, RecordKind::Deposit, "a.csv").await;
        store.register(7, RecordKind::Deposit, "b.csv").await;
        assert_eq!(
            store.locate(7, RecordKind::Deposit).await.unwrap(),
            PathBuf::from("b.csv")
        );
        assert!(store.locate(7, RecordKind::Withdrawal).await.is_err());
    }

    #[tokio::test]
    async fn clear_only_touches_one_user() {
        let store = RecordStore::new("unused");
        store.register(1, RecordKind::Deposit, "missing_1.csv").await;
        store.register(1, RecordKind::Withdrawal, "missing_2.csv").await;
        store.register(2, RecordKind::Deposit, "missing_3.csv").await;

        assert_eq!(store.clear(1).await, 2);
        assert_eq!(store.clear(1).await, 0);
        assert!(store.locate(1, RecordKind::Deposit).await.is_err());
        assert!(store.locate(2, RecordKind::Deposit).await.is_ok());
    }
}
