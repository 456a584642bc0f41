//! CSV persistence for transactions and budgets.
//!
//! Each file starts with a fixed header row. Rows are read by header name, so column order in
//! hand-edited files does not matter. Writes go through [`csv::Writer`] into memory and then to
//! disk in one call.

use crate::model::{
    Amount, Budget, Transaction, TransactionType, BUDGET_HEADERS, TRANSACTION_HEADERS,
};
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Reads and writes the two CSV data files.
#[derive(Debug, Clone)]
pub struct Store {
    transactions_path: PathBuf,
    budget_path: PathBuf,
    /// Stored amounts above this are read as zero.
    max_amount: Decimal,
}

/// A transaction row before its fields are interpreted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TransactionRow {
    timestamp: String,
    date: String,
    #[serde(rename = "type")]
    transaction_type: String,
    category: String,
    amount: String,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BudgetRow {
    category: String,
    amount: String,
    month_year: String,
}

/// Where `Store::export` wrote its copies.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedFiles {
    pub transactions: PathBuf,
    pub budget: PathBuf,
}

/// Facts about one data file.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub exists: bool,
    pub size: u64,
    /// Last modification time as `DD/MM/YYYY HH:MM:SS`, when known.
    pub modified: Option<String>,
}

impl Store {
    pub fn new(config: &Config) -> Self {
        Self {
            transactions_path: config.transactions_path(),
            budget_path: config.budget_path(),
            max_amount: config.validation().max_amount(),
        }
    }

    pub fn transactions_path(&self) -> &Path {
        &self.transactions_path
    }

    pub fn budget_path(&self) -> &Path {
        &self.budget_path
    }

    /// Creates either data file, holding only its header row, if it does not exist.
    pub async fn init(&self) -> Result<()> {
        if !self.transactions_path.is_file() {
            info!(
                "Creating transactions file at {}",
                self.transactions_path.display()
            );
            utils::write(
                &self.transactions_path,
                encode_transactions::<Transaction>(&[])?,
            )
            .await?;
        }
        if !self.budget_path.is_file() {
            info!("Creating budget file at {}", self.budget_path.display());
            utils::write(&self.budget_path, encode_budgets(&[])?).await?;
        }
        Ok(())
    }

    /// Loads every transaction in file order.
    ///
    /// A row with an unreadable or out of range amount is kept with an amount of zero. Missing
    /// trailing fields are read as empty. A row that cannot be read at all, or whose type is
    /// neither income nor expense, is skipped. All of these cases are logged.
    pub async fn load_transactions(&self) -> Result<Vec<Transaction>> {
        let content = utils::read(&self.transactions_path).await?;
        let mut transactions = Vec::new();
        for (line, row) in read_rows::<TransactionRow>(&content, "transaction")? {
            let transaction_type = match TransactionType::from_str(row.transaction_type.trim()) {
                Ok(t) => t,
                Err(_) => {
                    warn!(
                        "Skipping transaction on line {line} with unknown type '{}'",
                        row.transaction_type
                    );
                    continue;
                }
            };
            let amount = self.parse_amount(&row.amount, line);
            transactions.push(Transaction::new(
                row.date,
                transaction_type,
                row.category,
                amount,
                row.description,
                row.timestamp,
            ));
        }
        debug!(
            "Loaded {} transactions from {}",
            transactions.len(),
            self.transactions_path.display()
        );
        Ok(transactions)
    }

    /// Appends one row to the transactions file.
    pub async fn append_transaction(&self, transaction: &Transaction) -> Result<()> {
        let mut writer = writer();
        writer
            .serialize(transaction)
            .context("Unable to encode transaction")?;
        utils::append(&self.transactions_path, into_bytes(writer)?).await
    }

    /// Replaces the whole transactions file with `transactions`.
    pub async fn rewrite_transactions<T>(&self, transactions: &[T]) -> Result<()>
    where
        T: AsRef<Transaction>,
    {
        utils::write(&self.transactions_path, encode_transactions(transactions)?).await
    }

    /// Loads every budget in file order. A row with an unreadable or out of range amount is kept
    /// with an amount of zero.
    pub async fn load_budgets(&self) -> Result<Vec<Budget>> {
        let content = utils::read(&self.budget_path).await?;
        let budgets = read_rows::<BudgetRow>(&content, "budget")?
            .into_iter()
            .map(|(line, row)| {
                Budget::new(
                    row.category,
                    self.parse_amount(&row.amount, line),
                    row.month_year,
                )
            })
            .collect();
        Ok(budgets)
    }

    /// Inserts `budget`, or overwrites the amount of the budget with the same category and month.
    pub async fn save_budget(&self, budget: &Budget) -> Result<()> {
        let mut budgets = self.load_budgets().await?;
        match budgets
            .iter_mut()
            .find(|b| b.is_for(budget.category(), budget.month_year()))
        {
            Some(existing) => existing.set_amount(budget.amount()),
            None => budgets.push(budget.clone()),
        }
        self.save_all_budgets(&budgets).await
    }

    /// Removes the budget for `category` in `month_year`. Returns false when there was none.
    pub async fn delete_budget(&self, category: &str, month_year: &str) -> Result<bool> {
        let mut budgets = self.load_budgets().await?;
        let before = budgets.len();
        budgets.retain(|b| !b.is_for(category, month_year));
        if budgets.len() == before {
            return Ok(false);
        }
        self.save_all_budgets(&budgets).await?;
        Ok(true)
    }

    /// Replaces the whole budget file with `budgets`.
    pub async fn save_all_budgets(&self, budgets: &[Budget]) -> Result<()> {
        utils::write(&self.budget_path, encode_budgets(budgets)?).await
    }

    /// Copies both data files into `dir`, naming them `exported_transactions_YYYYMMDD.csv` and
    /// `exported_budget_YYYYMMDD.csv` for the given day.
    pub async fn export(&self, dir: &Path, today: NaiveDate) -> Result<ExportedFiles> {
        utils::make_dir(dir).await?;
        let stamp = today.format("%Y%m%d");
        let exported = ExportedFiles {
            transactions: dir.join(format!("exported_transactions_{stamp}.csv")),
            budget: dir.join(format!("exported_budget_{stamp}.csv")),
        };
        utils::copy(&self.transactions_path, &exported.transactions).await?;
        utils::copy(&self.budget_path, &exported.budget).await?;
        Ok(exported)
    }

    /// Describes the transactions file and then the budget file.
    pub async fn file_info(&self) -> Result<Vec<FileInfo>> {
        let mut info = Vec::with_capacity(2);
        for path in [&self.transactions_path, &self.budget_path] {
            info.push(file_info(path).await?);
        }
        Ok(info)
    }

    fn parse_amount(&self, s: &str, line: usize) -> Amount {
        match Amount::from_str(s) {
            Ok(amount) if amount.value().abs() <= self.max_amount => amount,
            Ok(amount) => {
                warn!(
                    "Amount {amount} on line {line} exceeds the limit of {}, using 0",
                    self.max_amount
                );
                Amount::default()
            }
            Err(e) => {
                warn!("Unreadable amount '{s}' on line {line}, using 0: {e}");
                Amount::default()
            }
        }
    }
}

async fn file_info(path: &Path) -> Result<FileInfo> {
    if !path.exists() {
        return Ok(FileInfo {
            path: path.to_path_buf(),
            exists: false,
            size: 0,
            modified: None,
        });
    }
    let metadata = utils::metadata(path).await?;
    let modified = metadata
        .modified()
        .ok()
        .map(|t| DateTime::<Local>::from(t).format("%d/%m/%Y %H:%M:%S").to_string());
    Ok(FileInfo {
        path: path.to_path_buf(),
        exists: true,
        size: metadata.len(),
        modified,
    })
}

/// Reads every data row of `content` by header name, paired with its line number. Short rows are
/// padded with empty fields. Rows that still cannot be read are logged and skipped.
fn read_rows<T>(content: &str, kind: &str) -> Result<Vec<(usize, T)>>
where
    T: DeserializeOwned,
{
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .with_context(|| format!("Unable to read the {kind} headers"))?
        .clone();
    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        // Header is line 1
        let line = i + 2;
        let row = result.map_err(anyhow::Error::from).and_then(|mut record| {
            while record.len() < headers.len() {
                record.push_field("");
            }
            let row: T = record.deserialize(Some(&headers))?;
            Ok(row)
        });
        match row {
            Ok(row) => rows.push((line, row)),
            Err(e) => warn!("Skipping unreadable {kind} on line {line}: {e}"),
        }
    }
    Ok(rows)
}

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to flush CSV data: {}", e.error()))
}

fn encode_transactions<T>(transactions: &[T]) -> Result<Vec<u8>>
where
    T: AsRef<Transaction>,
{
    let mut writer = writer();
    writer
        .write_record(TRANSACTION_HEADERS)
        .context("Unable to write transaction headers")?;
    for transaction in transactions {
        writer
            .serialize(transaction.as_ref())
            .context("Unable to encode transaction")?;
    }
    into_bytes(writer)
}

fn encode_budgets(budgets: &[Budget]) -> Result<Vec<u8>> {
    let mut writer = writer();
    writer
        .write_record(BUDGET_HEADERS)
        .context("Unable to write budget headers")?;
    for budget in budgets {
        writer.serialize(budget).context("Unable to encode budget")?;
    }
    into_bytes(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    fn txn(date: &str, amount: &str, description: &str) -> Transaction {
        Transaction::new(
            date,
            TransactionType::Expense,
            "Food",
            Amount::from_str(amount).unwrap(),
            description,
            "09:30:00",
        )
    }

    #[tokio::test]
    async fn test_append_then_load() {
        let env = TestEnv::new().await;
        let store = env.config().store();
        store
            .append_transaction(&txn("01/02/2024", "50000", "pho"))
            .await
            .unwrap();
        store
            .append_transaction(&txn("02/02/2024", "12.5", "tea, with milk"))
            .await
            .unwrap();

        let loaded = store.load_transactions().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].date(), "01/02/2024");
        assert_eq!(loaded[1].description(), "tea, with milk");
        assert_eq!(loaded[1].amount().value(), Decimal::new(125, 1));

        let content = utils::read(store.transactions_path()).await.unwrap();
        assert_eq!(
            content,
            "timestamp,date,type,category,amount,description\n\
             09:30:00,01/02/2024,expense,Food,50000,pho\n\
             09:30:00,02/02/2024,expense,Food,12.5,\"tea, with milk\"\n"
        );
    }

    #[tokio::test]
    async fn test_rewrite_transactions() {
        let env = TestEnv::new().await;
        let store = env.config().store();
        for d in ["01/01/2024", "02/01/2024", "03/01/2024"] {
            store.append_transaction(&txn(d, "1", "")).await.unwrap();
        }
        let mut loaded = store.load_transactions().await.unwrap();
        loaded.remove(1);
        store.rewrite_transactions(&loaded).await.unwrap();
        let reloaded = store.load_transactions().await.unwrap();
        assert_eq!(reloaded, loaded);
    }

    #[tokio::test]
    async fn test_load_tolerates_bad_rows() {
        let env = TestEnv::new().await;
        let store = env.config().store();
        let content = "timestamp,date,type,category,amount,description\n\
                       10:00:00,01/03/2024,Chi tiêu,Food,abc,bad amount\n\
                       10:00:01,02/03/2024,transfer,Food,10,unknown type\n\
                       10:00:02,03/03/2024,income,Salary,100.0\n";
        utils::write(store.transactions_path(), content)
            .await
            .unwrap();

        let loaded = store.load_transactions().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded[0].is_expense());
        assert!(loaded[0].amount().is_zero());
        assert!(loaded[1].is_income());
        assert_eq!(loaded[1].amount().value(), Decimal::new(100, 0));
        assert_eq!(loaded[1].description(), "");
    }

    #[tokio::test]
    async fn test_load_zeroes_amounts_over_limit() {
        let env = TestEnv::new().await;
        let store = env.config().store();
        let content = "timestamp,date,type,category,amount,description\n\
                       10:00:00,01/03/2024,expense,Food,50000000000000000000000000000,\n\
                       10:00:01,02/03/2024,expense,Food,50000000000000000000000000000,\n\
                       10:00:02,03/03/2024,expense,Food,1000000000,\n";
        utils::write(store.transactions_path(), content)
            .await
            .unwrap();
        utils::write(
            store.budget_path(),
            "category,amount,month_year\nFood,90000000000000000000,03/2024\nBills\n",
        )
        .await
        .unwrap();

        let loaded = store.load_transactions().await.unwrap();
        assert_eq!(loaded.len(), 3);
        assert!(loaded[0].amount().is_zero());
        assert!(loaded[1].amount().is_zero());
        assert_eq!(loaded[2].amount().value(), Decimal::new(1_000_000_000, 0));

        let budgets = store.load_budgets().await.unwrap();
        assert_eq!(budgets.len(), 2);
        assert!(budgets[0].amount().is_zero());
        assert_eq!(budgets[1].category(), "Bills");
        assert!(budgets[1].amount().is_zero());
    }

    #[tokio::test]
    async fn test_budget_upsert_and_delete() {
        let env = TestEnv::new().await;
        let store = env.config().store();
        let amount = |s: &str| Amount::from_str(s).unwrap();
        store
            .save_budget(&Budget::new("Food", amount("100"), "03/2024"))
            .await
            .unwrap();
        store
            .save_budget(&Budget::new("Bills", amount("50"), "03/2024"))
            .await
            .unwrap();
        store
            .save_budget(&Budget::new("Food", amount("150"), "03/2024"))
            .await
            .unwrap();

        let budgets = store.load_budgets().await.unwrap();
        assert_eq!(budgets.len(), 2);
        assert_eq!(budgets[0].amount().value(), Decimal::new(150, 0));

        assert!(store.delete_budget("Food", "03/2024").await.unwrap());
        assert!(!store.delete_budget("Food", "03/2024").await.unwrap());
        let budgets = store.load_budgets().await.unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].category(), "Bills");
    }

    #[tokio::test]
    async fn test_export_and_file_info() {
        let env = TestEnv::new().await;
        let config = env.config();
        let store = config.store();
        store
            .append_transaction(&txn("01/02/2024", "5", ""))
            .await
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let exported = store.export(&config.exports(), today).await.unwrap();
        assert!(exported
            .transactions
            .ends_with("exported_transactions_20240229.csv"));
        assert!(exported.budget.ends_with("exported_budget_20240229.csv"));
        assert_eq!(
            utils::read(&exported.transactions).await.unwrap(),
            utils::read(store.transactions_path()).await.unwrap()
        );

        let info = store.file_info().await.unwrap();
        assert_eq!(info.len(), 2);
        assert!(info.iter().all(|i| i.exists && i.modified.is_some()));
        assert!(info[0].size > info[1].size);
    }
}
