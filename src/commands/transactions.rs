//! Handlers for adding, deleting and listing transactions.

use crate::args::{AddArgs, DeleteArgs, ListArgs, MonthArgs};
use crate::commands::{month_or_current, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, Transaction, DATE_FORMAT};
use crate::reports::MonthlySummary;
use crate::tracker::{NewTransaction, TransactionFilter, Tracker};
use crate::{Config, Result};
use std::str::FromStr;
use std::sync::Arc;

/// Validates and records a new transaction. The date defaults to today.
pub async fn add(config: Config, args: AddArgs) -> Result<Out<Transaction>> {
    let mut tracker = Tracker::load(&config).await?;
    let date = match args.date {
        Some(date) => date,
        None => tracker.validator().today().format(DATE_FORMAT).to_string(),
    };
    let added = tracker
        .add_transaction(NewTransaction {
            date,
            transaction_type: args.transaction_type,
            category: args.category,
            amount: args.amount,
            description: args.description,
        })
        .await?;
    Ok(Out::new(
        format!(
            "Added {} of {} {} in {} on {}",
            added.transaction_type(),
            Amount::with_commas(added.amount().value()),
            config.currency(),
            added.category(),
            added.date()
        ),
        Transaction::clone(&added),
    ))
}

/// Deletes the stored transaction that matches every field of `args`.
pub async fn delete(config: Config, args: DeleteArgs) -> Result<Out<Transaction>> {
    let mut tracker = Tracker::load(&config).await?;
    let validator = tracker.validator();
    let transaction_type = validator
        .transaction_type(&args.transaction_type)
        .pub_result(ErrorType::Validation)?;
    let amount = Amount::from_str(&args.amount)
        .map_err(|_| anyhow::anyhow!("Amount is not a valid number"))
        .pub_result(ErrorType::Validation)?;
    let target = Transaction::new(
        args.date.trim(),
        transaction_type,
        args.category.trim(),
        amount,
        args.description.trim(),
        args.timestamp.trim(),
    );
    let removed = tracker.delete_transaction(&target).await?;
    Ok(Out::new(
        format!(
            "Deleted {} of {} in {} on {}",
            removed.transaction_type(),
            Amount::with_commas(removed.amount().value()),
            removed.category(),
            removed.date()
        ),
        Transaction::clone(&removed),
    ))
}

/// Lists transactions matching the given filters.
pub async fn list(config: Config, args: ListArgs) -> Result<Out<Vec<Arc<Transaction>>>> {
    let mut tracker = Tracker::load(&config).await?;
    let mut filter = TransactionFilter::new();
    if let (Some(from), Some(to)) = (&args.from, &args.to) {
        filter = filter.between(from.trim(), to.trim());
    }
    if let Some(transaction_type) = &args.transaction_type {
        let transaction_type = tracker
            .validator()
            .transaction_type(transaction_type)
            .pub_result(ErrorType::Validation)?;
        filter = filter.of_type(transaction_type);
    }
    if let Some(category) = &args.category {
        filter = filter.in_category(category.trim());
    }
    let found = tracker.transactions(&filter);
    Ok(Out::new(
        format!("Found {} transactions", found.len()),
        found,
    ))
}

/// Income, expense and balance of one month.
pub async fn summary(config: Config, args: MonthArgs) -> Result<Out<MonthlySummary>> {
    let mut tracker = Tracker::load(&config).await?;
    let month = month_or_current(&tracker, args.month.as_deref())?;
    let summary = tracker.monthly_summary(month);
    let currency = config.currency();
    Ok(Out::new(
        format!(
            "{}: income {} {currency}, expense {} {currency}, balance {} {currency}",
            month,
            Amount::with_commas(summary.income),
            Amount::with_commas(summary.expense),
            Amount::with_commas(summary.balance),
        ),
        summary,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use chrono::Local;

    fn add_args(category: &str, amount: &str) -> AddArgs {
        AddArgs {
            transaction_type: "expense".to_string(),
            category: category.to_string(),
            amount: amount.to_string(),
            date: None,
            description: "coffee".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_list_delete() {
        let env = TestEnv::new().await;
        let out = add(env.config(), add_args("Food", "30,000")).await.unwrap();
        assert!(out.message().contains("30,000.00"));
        let added = out.structure().unwrap().clone();
        assert_eq!(
            added.date(),
            Local::now().date_naive().format(DATE_FORMAT).to_string()
        );

        let listed = list(env.config(), ListArgs::default()).await.unwrap();
        assert_eq!(listed.structure().unwrap().len(), 1);

        let out = delete(
            env.config(),
            DeleteArgs {
                date: added.date().to_string(),
                transaction_type: "expense".to_string(),
                category: "Food".to_string(),
                amount: "30000".to_string(),
                description: "coffee".to_string(),
                timestamp: added.timestamp().to_string(),
            },
        )
        .await
        .unwrap();
        assert!(out.message().starts_with("Deleted"));
        let listed = list(env.config(), ListArgs::default()).await.unwrap();
        assert!(listed.structure().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_reports_validation_errors() {
        let env = TestEnv::new().await;
        let err = add(env.config(), add_args("Salary", "10")).await.unwrap_err();
        assert!(err.to_string().starts_with("validation:"));
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_type() {
        let env = TestEnv::new().await;
        let args = ListArgs {
            transaction_type: Some("gift".to_string()),
            ..ListArgs::default()
        };
        assert!(list(env.config(), args).await.is_err());
    }

    #[tokio::test]
    async fn test_summary_defaults_to_current_month() {
        let env = TestEnv::new().await;
        add(env.config(), add_args("Food", "1000")).await.unwrap();
        let out = summary(env.config(), MonthArgs::default()).await.unwrap();
        assert_eq!(out.structure().unwrap().transaction_count, 1);
        let err = summary(
            env.config(),
            MonthArgs {
                month: Some("13/2024".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("validation:"));
    }
}
