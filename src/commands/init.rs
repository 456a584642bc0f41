use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the expense home directory with a default `config.json` and, if they do not exist
/// yet, the transactions and budget CSV files.
///
/// # Arguments
/// - `expense_home` - The directory that will be the root of data directory, e.g. `$HOME/expense`
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(expense_home: &Path) -> Result<Out<()>> {
    let config = Config::create(expense_home)
        .await
        .context("Unable to create the expense home directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the expense directory at {}",
        config.root().display()
    )
    .into())
}

/// Loads the configuration from `expense_home`, tagging any failure as a config error.
pub async fn load_config(expense_home: &Path) -> Result<Config> {
    Config::load(expense_home)
        .await
        .pub_result(ErrorType::Config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("expense");
        let out = init(&home).await.unwrap();
        assert!(out.message().contains("expense"));
        let config = load_config(&home).await.unwrap();
        assert!(config.transactions_path().is_file());
        assert!(config.budget_path().is_file());
    }

    #[tokio::test]
    async fn test_load_config_without_init() {
        let dir = TempDir::new().unwrap();
        let err = load_config(&dir.path().join("missing")).await.unwrap_err();
        assert!(err.to_string().starts_with("config: Expense home is missing"));
    }
}
