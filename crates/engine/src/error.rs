//! The module contains the errors the engine can return.
//!
//! The errors a caller is expected to handle are:
//!
//! - [`NoRecords`] returned when a user never uploaded a record set of the
//!   requested kind, or cleared it. This is a normal, recoverable state.
//! - [`SourceUnavailable`] returned when a record set is registered but its
//!   source cannot be read.
//!
//! Unknown currencies, price service failures and malformed rows are never
//! errors: they degrade to zero values or skipped rows.
//!
//!  [`NoRecords`]: EngineError::NoRecords
//!  [`SourceUnavailable`]: EngineError::SourceUnavailable
use std::path::PathBuf;

use thiserror::Error;

use crate::{RecordKind, UserId};

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No {kind} file found for this user.")]
    NoRecords { user_id: UserId, kind: RecordKind },
    #[error("Source \"{}\" unavailable: {reason}", .path.display())]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("Invalid record kind: {0}")]
    InvalidKind(String),
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// Returns `true` when the error means "nothing uploaded yet".
    #[must_use]
    pub fn is_no_records(&self) -> bool {
        matches!(self, Self::NoRecords { .. })
    }

    pub(crate) fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::NoRecords {
                    user_id: a,
                    kind: ka,
                },
                Self::NoRecords {
                    user_id: b,
                    kind: kb,
                },
            ) => a == b && ka == kb,
            // The reason comes from the OS or the csv reader; compare the
            // location only.
            (Self::SourceUnavailable { path: a, .. }, Self::SourceUnavailable { path: b, .. }) => {
                a == b
            }
            (Self::InvalidKind(a), Self::InvalidKind(b)) => a == b,
            (Self::UnsupportedCurrency(a), Self::UnsupportedCurrency(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a == b,
            _ => false,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
