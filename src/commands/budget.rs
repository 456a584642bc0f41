//! Handlers for the `budget` subcommands.

use crate::args::{BudgetCategoryArgs, BudgetSetArgs, BudgetTrendArgs, MonthArgs};
use crate::commands::{month_or_current, Out};
use crate::model::{Amount, Budget, MonthYear};
use crate::tracker::{BudgetStatus, BudgetSuggestion, BudgetSummary, BudgetTrendPoint, Tracker};
use crate::{Config, Result};
use rust_decimal::Decimal;

pub async fn budget_set(config: Config, args: BudgetSetArgs) -> Result<Out<Budget>> {
    let mut tracker = Tracker::load(&config).await?;
    let month = month_or_current(&tracker, args.month.month.as_deref())?;
    let budget = tracker.set_budget(&args.category, &args.amount, month).await?;
    Ok(Out::new(
        format!(
            "Set the budget for '{}' in {month} to {} {}",
            budget.category(),
            Amount::with_commas(budget.amount().value()),
            config.currency()
        ),
        budget,
    ))
}

pub async fn budget_get(config: Config, args: BudgetCategoryArgs) -> Result<Out<Decimal>> {
    let tracker = Tracker::load(&config).await?;
    let month = month_or_current(&tracker, args.month.month.as_deref())?;
    let amount = tracker.budget(args.category.trim(), month);
    let message = if amount.is_zero() {
        format!("No budget is set for '{}' in {month}", args.category.trim())
    } else {
        format!(
            "The budget for '{}' in {month} is {} {}",
            args.category.trim(),
            Amount::with_commas(amount),
            config.currency()
        )
    };
    Ok(Out::new(message, amount))
}

pub async fn budget_delete(config: Config, args: BudgetCategoryArgs) -> Result<Out<Budget>> {
    let mut tracker = Tracker::load(&config).await?;
    let month = month_or_current(&tracker, args.month.month.as_deref())?;
    let removed = tracker.delete_budget(args.category.trim(), month).await?;
    Ok(Out::new(
        format!("Deleted the budget for '{}' in {month}", removed.category()),
        removed,
    ))
}

pub async fn budget_status(config: Config, args: MonthArgs) -> Result<Out<Vec<BudgetStatus>>> {
    let tracker = Tracker::load(&config).await?;
    let month = month_or_current(&tracker, args.month.as_deref())?;
    let statuses = tracker.all_budget_status(month);
    Ok(Out::new(
        format!("Budget status of {} categories in {month}", statuses.len()),
        statuses,
    ))
}

pub async fn budget_warnings(config: Config, args: MonthArgs) -> Result<Out<Vec<BudgetStatus>>> {
    let tracker = Tracker::load(&config).await?;
    let month = month_or_current(&tracker, args.month.as_deref())?;
    let warnings = tracker.budget_warnings(month);
    let message = if warnings.is_empty() {
        format!("All budgets in {month} are within limits")
    } else {
        let categories: Vec<String> = warnings
            .iter()
            .map(|w| format!("{} ({}, {}%)", w.category, w.status, w.percentage))
            .collect();
        format!("Budget warnings in {month}: {}", categories.join(", "))
    };
    Ok(Out::new(message, warnings))
}

pub async fn budget_summary(config: Config, args: MonthArgs) -> Result<Out<BudgetSummary>> {
    let tracker = Tracker::load(&config).await?;
    let month = month_or_current(&tracker, args.month.as_deref())?;
    let summary = tracker.budget_summary(month);
    Ok(Out::new(
        format!(
            "{month}: spent {} of {} {} ({}%)",
            Amount::with_commas(summary.total_spent),
            Amount::with_commas(summary.total_budget),
            config.currency(),
            summary.percentage_used
        ),
        summary,
    ))
}

pub async fn budget_suggest(
    config: Config,
    args: MonthArgs,
) -> Result<Out<Vec<BudgetSuggestion>>> {
    let tracker = Tracker::load(&config).await?;
    let month = month_or_current(&tracker, args.month.as_deref())?;
    let suggestions = tracker.suggest_budget_adjustments(month);
    Ok(Out::new(
        format!("{} budget suggestions for {month}", suggestions.len()),
        suggestions,
    ))
}

pub async fn budget_copy(config: Config, args: MonthArgs) -> Result<Out<usize>> {
    let mut tracker = Tracker::load(&config).await?;
    let month = month_or_current(&tracker, args.month.as_deref())?;
    let copied = tracker.copy_budgets_from_previous_month(month).await?;
    Ok(Out::new(
        format!("Copied {copied} budgets from {} to {month}", month.previous()),
        copied,
    ))
}

pub async fn budget_trend(
    config: Config,
    args: BudgetTrendArgs,
) -> Result<Out<Vec<BudgetTrendPoint>>> {
    let tracker = Tracker::load(&config).await?;
    let until = MonthYear::of(tracker.validator().today());
    let trend = tracker.budget_trend(args.category.trim(), args.months, until);
    Ok(Out::new(
        format!(
            "Budget trend of '{}' over {} months",
            args.category.trim(),
            trend.len()
        ),
        trend,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    fn month_args(month: Option<&str>) -> MonthArgs {
        MonthArgs {
            month: month.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let env = TestEnv::new().await;
        let out = budget_set(
            env.config(),
            BudgetSetArgs {
                category: "Food".to_string(),
                amount: "2,000,000".to_string(),
                month: month_args(None),
            },
        )
        .await
        .unwrap();
        assert!(out.message().contains("2,000,000.00 VNĐ"));

        let category = |month: Option<&str>| BudgetCategoryArgs {
            category: "Food".to_string(),
            month: month_args(month),
        };
        let out = budget_get(env.config(), category(None)).await.unwrap();
        assert_eq!(out.structure(), Some(&Decimal::new(2_000_000, 0)));

        budget_delete(env.config(), category(None)).await.unwrap();
        let out = budget_get(env.config(), category(None)).await.unwrap();
        assert!(out.message().starts_with("No budget"));
        let err = budget_delete(env.config(), category(None)).await.unwrap_err();
        assert!(err.to_string().starts_with("not_found:"));
    }

    #[tokio::test]
    async fn test_status_warnings_and_copy() {
        let env = TestEnv::new().await;
        let statuses = budget_status(env.config(), month_args(None)).await.unwrap();
        assert!(statuses
            .structure()
            .unwrap()
            .iter()
            .all(|s| s.budget.is_zero()));
        let warnings = budget_warnings(env.config(), month_args(None)).await.unwrap();
        assert!(warnings.structure().unwrap().is_empty());

        let err = budget_copy(env.config(), month_args(None)).await.unwrap_err();
        assert!(err.to_string().starts_with("not_found:"));
        assert!(budget_copy(env.config(), month_args(Some("2025-01")))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_trend_length() {
        let env = TestEnv::new().await;
        let out = budget_trend(
            env.config(),
            BudgetTrendArgs {
                category: "Food".to_string(),
                months: 4,
            },
        )
        .await
        .unwrap();
        assert_eq!(out.structure().unwrap().len(), 4);
    }
}
