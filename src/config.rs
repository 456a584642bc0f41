//! Configuration file handling for the expense tracker.
//!
//! The configuration file is stored at `$EXPENSE_HOME/config.json` and holds the currency label,
//! the budget warning threshold, cache sizing, validation limits, and the locations of the two
//! CSV data files.

use crate::store::Store;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "expense";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const TRANSACTIONS_CSV: &str = "transactions.csv";
const BUDGET_CSV: &str = "budget.csv";
const EXPORTS: &str = "exports";
const CURRENCY: &str = "VNĐ";
const MAX_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const MAX_DATE_RANGE_YEARS: u32 = 200;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EXPENSE_HOME` and from there it loads `$EXPENSE_HOME/config.json`. It provides
/// paths to the data files, which are either configured or expected in a default location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory and:
    /// - Writes an initial `config.json` with default settings
    /// - Creates the transactions and budget CSV files with their header rows
    ///
    /// Existing data files are left untouched, so running this over an existing home only resets
    /// `config.json`.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the expense home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let config = Self {
            root,
            config_path,
            config_file,
        };
        config
            .store()
            .init()
            .await
            .context("Unable to create the data files")?;
        Ok(config)
    }

    /// This will
    /// - validate that `expense_home` exists and that the config file exists
    /// - load and validate the config file
    /// - recreate either data file if it has gone missing
    /// - return the loaded configuration object
    pub async fn load(expense_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = expense_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Expense home is missing, run 'expense init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            root,
            config_path,
            config_file,
        };
        config.store().init().await?;
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn currency(&self) -> &str {
        &self.config_file.currency
    }

    pub fn budget_warning_threshold(&self) -> Decimal {
        self.config_file.budget_warning_threshold
    }

    pub fn cache(&self) -> &CacheSettings {
        &self.config_file.cache
    }

    pub fn validation(&self) -> &ValidationSettings {
        &self.config_file.validation
    }

    /// Returns the stored `transactions_path` if it is absolute, otherwise resolves it against
    /// the home directory.
    pub fn transactions_path(&self) -> PathBuf {
        self.resolve(self.config_file.transactions_path())
    }

    /// Returns the stored `budget_path` if it is absolute, otherwise resolves it against the home
    /// directory.
    pub fn budget_path(&self) -> PathBuf {
        self.resolve(self.config_file.budget_path())
    }

    /// The default directory for `expense export`.
    pub fn exports(&self) -> PathBuf {
        self.root.join(EXPORTS)
    }

    /// Creates a new `Store` over the configured data files.
    pub fn store(&self) -> Store {
        Store::new(self)
    }

    fn resolve(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file. Every
/// setting other than `app_name` and `config_version` may be omitted and takes its default.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "expense",
///   "config_version": 1,
///   "currency": "VNĐ",
///   "budget_warning_threshold": "0.8",
///   "cache": {
///     "monthly_summary_capacity": 12,
///     "monthly_summary_ttl_secs": 1800,
///     "category_analysis_capacity": 10,
///     "category_analysis_ttl_secs": 900,
///     "query_ttl_secs": 300
///   },
///   "validation": {
///     "min_amount": "0.01",
///     "max_amount": "1000000000",
///     "max_description_length": 200,
///     "date_range_years": 10
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "expense"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Label printed after money amounts
    #[serde(default = "default_currency")]
    currency: String,

    /// Fraction of a budget after which spending is flagged as a warning
    #[serde(default = "default_warning_threshold")]
    budget_warning_threshold: Decimal,

    #[serde(default)]
    cache: CacheSettings,

    #[serde(default)]
    validation: ValidationSettings,

    /// Path to the transactions CSV (optional, relative to the home directory or absolute)
    #[serde(skip_serializing_if = "Option::is_none")]
    transactions_path: Option<PathBuf>,

    /// Path to the budget CSV (optional, relative to the home directory or absolute)
    #[serde(skip_serializing_if = "Option::is_none")]
    budget_path: Option<PathBuf>,
}

fn default_currency() -> String {
    CURRENCY.to_string()
}

/// Upper bound for `max_amount`. Sums of amounts below it cannot overflow a `Decimal`.
fn max_amount_limit() -> Decimal {
    Decimal::new(1_000_000_000_000_000, 0)
}

fn default_warning_threshold() -> Decimal {
    Decimal::new(8, 1)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            currency: default_currency(),
            budget_warning_threshold: default_warning_threshold(),
            cache: CacheSettings::default(),
            validation: ValidationSettings::default(),
            transactions_path: None,
            budget_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads and validates a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if a setting is out of range
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.budget_warning_threshold > Decimal::ZERO
                && config.budget_warning_threshold <= Decimal::ONE,
            "budget_warning_threshold must be greater than 0 and at most 1, got {}",
            config.budget_warning_threshold
        );
        ensure!(
            config.validation.min_amount > Decimal::ZERO
                && config.validation.min_amount <= config.validation.max_amount,
            "min_amount must be positive and no greater than max_amount"
        );
        ensure!(
            config.validation.max_amount <= max_amount_limit(),
            "max_amount must not exceed {}",
            max_amount_limit()
        );
        ensure!(
            config.validation.date_range_years <= MAX_DATE_RANGE_YEARS,
            "date_range_years must be at most {MAX_DATE_RANGE_YEARS}"
        );
        let cache = &config.cache;
        for (name, secs) in [
            ("monthly_summary_ttl_secs", cache.monthly_summary_ttl_secs),
            ("category_analysis_ttl_secs", cache.category_analysis_ttl_secs),
            ("query_ttl_secs", cache.query_ttl_secs),
        ] {
            ensure!(
                secs <= MAX_TTL_SECS,
                "{name} must be at most {MAX_TTL_SECS}, got {secs}"
            );
        }

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.transactions_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(TRANSACTIONS_CSV))
    }

    pub fn budget_path(&self) -> PathBuf {
        self.budget_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(BUDGET_CSV))
    }
}

/// Sizing and lifetimes of the tracker's caches.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    monthly_summary_capacity: usize,
    monthly_summary_ttl_secs: u64,
    category_analysis_capacity: usize,
    category_analysis_ttl_secs: u64,
    query_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            monthly_summary_capacity: 12,
            monthly_summary_ttl_secs: 30 * 60,
            category_analysis_capacity: 10,
            category_analysis_ttl_secs: 15 * 60,
            query_ttl_secs: 5 * 60,
        }
    }
}

impl CacheSettings {
    pub fn monthly_summary_capacity(&self) -> usize {
        self.monthly_summary_capacity
    }

    pub fn monthly_summary_ttl(&self) -> Duration {
        Duration::from_secs(self.monthly_summary_ttl_secs)
    }

    pub fn category_analysis_capacity(&self) -> usize {
        self.category_analysis_capacity
    }

    pub fn category_analysis_ttl(&self) -> Duration {
        Duration::from_secs(self.category_analysis_ttl_secs)
    }

    pub fn query_ttl(&self) -> Duration {
        Duration::from_secs(self.query_ttl_secs)
    }
}

/// Limits enforced on user input.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ValidationSettings {
    min_amount: Decimal,
    max_amount: Decimal,
    max_description_length: usize,
    date_range_years: u32,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            min_amount: Decimal::new(1, 2),
            max_amount: Decimal::new(1_000_000_000, 0),
            max_description_length: 200,
            date_range_years: 10,
        }
    }
}

impl ValidationSettings {
    pub fn min_amount(&self) -> Decimal {
        self.min_amount
    }

    pub fn max_amount(&self) -> Decimal {
        self.max_amount
    }

    pub fn max_description_length(&self) -> usize {
        self.max_description_length
    }

    /// How many years before today a transaction date may be.
    pub fn date_range_years(&self) -> u32 {
        self.date_range_years
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("expense_home");

        let config = Config::create(&home_dir).await.unwrap();

        assert!(config.config_path().is_file());
        assert_eq!(config.currency(), "VNĐ");
        assert_eq!(config.budget_warning_threshold(), Decimal::new(8, 1));
        assert_eq!(
            utils::read(&config.transactions_path()).await.unwrap(),
            "timestamp,date,type,category,amount,description\n"
        );
        assert_eq!(
            utils::read(&config.budget_path()).await.unwrap(),
            "category,amount,month_year\n"
        );
    }

    #[tokio::test]
    async fn test_config_load_after_create() {
        let dir = TempDir::new().unwrap();
        let created = Config::create(dir.path()).await.unwrap();
        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.root(), loaded.root());
        assert_eq!(created.config_file, loaded.config_file);
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_load_recreates_missing_data_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path()).await.unwrap();
        tokio::fs::remove_file(config.budget_path()).await.unwrap();
        let config = Config::load(dir.path()).await.unwrap();
        assert!(config.budget_path().is_file());
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        utils::write(&config_path, r#"{ "app_name": "expense", "config_version": 1 }"#)
            .await
            .unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();

        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.transactions_path(), PathBuf::from(TRANSACTIONS_CSV));
        assert_eq!(config.budget_path(), PathBuf::from(BUDGET_CSV));
    }

    #[tokio::test]
    async fn test_config_file_load_partial_sections() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "expense",
            "config_version": 1,
            "currency": "USD",
            "cache": { "query_ttl_secs": 5 },
            "validation": { "max_amount": 5000 }
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();

        assert_eq!(config.currency, "USD");
        assert_eq!(config.cache.query_ttl(), Duration::from_secs(5));
        assert_eq!(config.cache.monthly_summary_capacity(), 12);
        assert_eq!(config.validation.max_amount(), Decimal::new(5000, 0));
        assert_eq!(config.validation.max_description_length(), 200);
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        utils::write(&config_path, r#"{ "app_name": "ledger", "config_version": 1 }"#)
            .await
            .unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_rejects_bad_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "expense",
            "config_version": 1,
            "budget_warning_threshold": "1.5"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        assert!(ConfigFile::load(&config_path).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_load_rejects_out_of_range_limits() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        for (json, expected) in [
            (
                r#"{ "app_name": "expense", "config_version": 1,
                     "cache": { "query_ttl_secs": 18446744073709551615 } }"#,
                "query_ttl_secs",
            ),
            (
                r#"{ "app_name": "expense", "config_version": 1,
                     "validation": { "date_range_years": 4294967295 } }"#,
                "date_range_years",
            ),
            (
                r#"{ "app_name": "expense", "config_version": 1,
                     "validation": { "max_amount": "50000000000000000000000000000" } }"#,
                "max_amount",
            ),
        ] {
            utils::write(&config_path, json).await.unwrap();
            let err = ConfigFile::load(&config_path).await.unwrap_err();
            assert!(err.to_string().contains(expected), "{err}");
        }
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let original = ConfigFile {
            transactions_path: Some(PathBuf::from("/var/data/tx.csv")),
            ..ConfigFile::default()
        };
        original.save(&path).await.unwrap();
        let read = ConfigFile::load(&path).await.unwrap();
        assert_eq!(original, read);
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("transactions_path"));
        assert!(!json.contains("budget_path"));
    }
}
