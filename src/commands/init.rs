use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its `.secrets` subdirectory, an initial `config.json` with default
/// settings and an empty SQLite store.
///
/// # Arguments
/// - `ledger_home` - The directory that will be the root of data directory, e.g. `$HOME/ledger`
///
/// # Errors
/// - Returns an error if the directory already holds a ledger or if any file operation fails.
pub async fn init(ledger_home: &Path) -> Result<Out<()>> {
    let config = Config::create(ledger_home)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Created the ledger at '{}'. Sign in with 'ledger login --email <EMAIL>'",
        config.root().display()
    )
    .into())
}
