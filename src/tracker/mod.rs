//! The data manager that owns every loaded transaction and budget.
//!
//! A `Tracker` keeps the transactions twice: as a flat list in file order and as a
//! [`TransactionTree`] indexed by date. Computations that are asked for repeatedly go through its
//! [`TrackerCache`]. Every change to the data, whether to transactions or budgets, writes the CSV
//! files first, then updates memory, then discards the whole cache.

mod budget;

pub use budget::{
    BudgetState, BudgetStatus, BudgetSummary, BudgetSuggestion, BudgetTrendPoint, StatusCounts,
    SuggestionKind,
};

use crate::cache::TrackerCache;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, Budget, MonthYear, Transaction, TransactionType, TIMESTAMP_FORMAT};
use crate::reports::{
    self, CategoryAnalysis, ComparisonReport, MonthlyReport, MonthlySummary, Periods, YearlyReport,
};
use crate::store::Store;
use crate::tree::TransactionTree;
use crate::validate::{sanitize, Validator};
use crate::{Config, Result};
use anyhow::anyhow;
use chrono::Local;
use std::sync::Arc;
use tracing::{debug, info};

/// Narrows a transaction listing. Every field left as `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TransactionFilter {
    date_range: Option<(String, String)>,
    transaction_type: Option<TransactionType>,
    category: Option<String>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps transactions whose date string lies between `start` and `end` inclusive. The
    /// comparison is on the raw `DD/MM/YYYY` strings; see [`TransactionTree`].
    pub fn between(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.date_range = Some((start.into(), end.into()));
        self
    }

    pub fn of_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    fn apply(&self, tree: &TransactionTree, all: &[Arc<Transaction>]) -> Vec<Arc<Transaction>> {
        let candidates = match &self.date_range {
            Some((start, end)) => tree.find_range(start, end),
            None => all.to_vec(),
        };
        candidates
            .into_iter()
            .filter(|t| self.transaction_type.map_or(true, |tt| t.transaction_type() == tt))
            .filter(|t| self.category.as_deref().map_or(true, |c| t.category() == c))
            .collect()
    }
}

/// User input for a new transaction, not yet validated.
#[derive(Debug, Clone, Default)]
pub struct NewTransaction {
    pub date: String,
    pub transaction_type: String,
    pub category: String,
    pub amount: String,
    pub description: String,
}

pub struct Tracker {
    config: Config,
    store: Store,
    transactions: Vec<Arc<Transaction>>,
    tree: TransactionTree,
    budgets: Vec<Budget>,
    cache: TrackerCache,
}

impl Tracker {
    /// Reads both data files and builds the date index.
    pub async fn load(config: &Config) -> Result<Self> {
        let store = config.store();
        let transactions: Vec<Arc<Transaction>> = store
            .load_transactions()
            .await
            .pub_result(ErrorType::Storage)?
            .into_iter()
            .map(Arc::new)
            .collect();
        let budgets = store.load_budgets().await.pub_result(ErrorType::Storage)?;
        let tree = TransactionTree::from_transactions(transactions.iter().cloned());
        debug!(
            "Loaded {} transactions (index height {}) and {} budgets",
            transactions.len(),
            tree.height(),
            budgets.len()
        );
        Ok(Self {
            cache: TrackerCache::new(config.cache()),
            config: config.clone(),
            store,
            transactions,
            tree,
            budgets,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &TrackerCache {
        &self.cache
    }

    /// A validator for today's date and the configured limits.
    pub fn validator(&self) -> Validator {
        Validator::new(self.config.validation().clone(), Local::now().date_naive())
    }

    /// Validates, stores and indexes a new transaction stamped with the current time.
    pub async fn add_transaction(&mut self, new: NewTransaction) -> Result<Arc<Transaction>> {
        let validator = self.validator();
        let transaction = validate_new(&validator, &new).pub_result(ErrorType::Validation)?;
        let transaction = Arc::new(Transaction::new(
            transaction.date,
            transaction.transaction_type,
            transaction.category,
            transaction.amount,
            transaction.description,
            Local::now().format(TIMESTAMP_FORMAT).to_string(),
        ));

        self.store
            .append_transaction(&transaction)
            .await
            .pub_result(ErrorType::Storage)?;
        self.transactions.push(Arc::clone(&transaction));
        self.tree.insert(Arc::clone(&transaction));
        self.invalidate();
        info!(
            "Added {} of {} in {} on {}",
            transaction.transaction_type(),
            transaction.amount(),
            transaction.category(),
            transaction.date()
        );
        Ok(transaction)
    }

    /// Removes the first stored transaction that matches `target` on every field, with amounts
    /// compared to the cent. The file is rewritten and the index rebuilt.
    pub async fn delete_transaction(&mut self, target: &Transaction) -> Result<Arc<Transaction>> {
        let position = self
            .transactions
            .iter()
            .position(|t| t.same_record(target))
            .ok_or_else(|| anyhow!("No transaction matches the one to delete"))
            .pub_result(ErrorType::NotFound)?;

        let mut remaining = self.transactions.clone();
        let removed = remaining.remove(position);
        self.store
            .rewrite_transactions(&remaining)
            .await
            .pub_result(ErrorType::Storage)?;

        self.transactions = remaining;
        self.tree = TransactionTree::from_transactions(self.transactions.iter().cloned());
        self.invalidate();
        info!(
            "Deleted {} of {} in {} on {}",
            removed.transaction_type(),
            removed.amount(),
            removed.category(),
            removed.date()
        );
        Ok(removed)
    }

    /// Every transaction in the order it was stored.
    pub fn all_transactions(&self) -> &[Arc<Transaction>] {
        &self.transactions
    }

    /// Transactions matching `filter`, in date-string order when a date range is given and in
    /// stored order otherwise. Results are memoized per filter.
    pub fn transactions(&mut self, filter: &TransactionFilter) -> Vec<Arc<Transaction>> {
        let (tree, all) = (&self.tree, &self.transactions);
        self.cache.query(filter, || filter.apply(tree, all))
    }

    pub fn monthly_summary(&mut self, month: MonthYear) -> MonthlySummary {
        if let Some(summary) = self.cache.monthly_summary(&month) {
            return summary;
        }
        let summary = reports::monthly_summary(&self.transactions, month);
        self.cache.put_monthly_summary(summary.clone());
        summary
    }

    pub fn monthly_report(&self, month: MonthYear) -> MonthlyReport {
        reports::monthly_report(&self.transactions, month)
    }

    pub fn yearly_report(&self, year: i32) -> YearlyReport {
        reports::yearly_report(&self.transactions, year)
    }

    pub fn category_analysis(&mut self, transaction_type: TransactionType) -> Vec<CategoryAnalysis> {
        if let Some(analysis) = self.cache.category_analysis(transaction_type) {
            return analysis;
        }
        let analysis = reports::category_analysis(&self.transactions, transaction_type);
        self.cache
            .put_category_analysis(transaction_type, analysis.clone());
        analysis
    }

    pub fn compare(&self, periods: Periods) -> ComparisonReport {
        reports::compare(&self.transactions, periods)
    }

    fn invalidate(&mut self) {
        debug!("Discarding {} cached entries", self.cache.len());
        self.cache.clear();
    }
}

struct ValidTransaction {
    date: String,
    transaction_type: TransactionType,
    category: String,
    amount: Amount,
    description: String,
}

fn validate_new(validator: &Validator, new: &NewTransaction) -> Result<ValidTransaction> {
    let transaction_type = validator.transaction_type(&new.transaction_type)?;
    let date = sanitize(&new.date);
    validator.date(&date)?;
    let category = sanitize(&new.category);
    validator.category(&category, transaction_type)?;
    let amount = validator.amount(&new.amount)?;
    validator.description(&new.description)?;
    Ok(ValidTransaction {
        date,
        transaction_type,
        category,
        amount,
        description: sanitize(&new.description),
    })
}
