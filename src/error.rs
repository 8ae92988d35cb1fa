//! Error and result types used throughout the ledger.
//!
//! Internally everything is an `anyhow::Error`. At the command boundary, errors are classified
//! with an `ErrorType` so that the user can tell which part of the system failed.

use serde::{Deserialize, Serialize};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure as reported to the user.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The ledger home directory or its configuration is missing or invalid.
    Config,
    /// A read or write against the document store failed.
    Store,
    /// There is no signed-in identity, or signing in or out failed.
    Auth,
    /// The user supplied data that cannot be saved.
    Validation,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// Adds an `ErrorType` to the front of an error chain.
pub(crate) trait IntoResult<T> {
    /// Wraps the error, if any, with the name of `error_type`.
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| e.into().context(format!("{error_type} error")))
    }
}
