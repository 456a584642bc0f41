//! Budget operations of the [`Tracker`].

use super::Tracker;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, Budget, MonthYear, TransactionType, EXPENSE_CATEGORIES};
use crate::reports::percent;
use crate::Result;
use anyhow::anyhow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Where spending stands relative to a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetState {
    /// Spending is at or below the warning threshold.
    Safe,
    /// Spending is above the warning threshold but not above the budget.
    Warning,
    Exceeded,
    /// No budget, or a budget of zero.
    NotSet,
}

serde_plain::derive_display_from_serialize!(BudgetState);
serde_plain::derive_fromstr_from_deserialize!(BudgetState);

impl BudgetState {
    fn of(budget: Decimal, spent: Decimal, threshold: Decimal) -> Self {
        if budget.is_zero() {
            BudgetState::NotSet
        } else if spent > budget {
            BudgetState::Exceeded
        } else if spent > budget * threshold {
            BudgetState::Warning
        } else {
            BudgetState::Safe
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub category: String,
    pub month_year: MonthYear,
    pub budget: Decimal,
    pub spent: Decimal,
    /// Negative once the budget is exceeded.
    pub remaining: Decimal,
    /// Spent as a percentage of the budget, zero when there is no budget.
    pub percentage: Decimal,
    pub status: BudgetState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub safe: usize,
    pub warning: usize,
    pub exceeded: usize,
    pub not_set: usize,
}

/// Budget totals across every expense category for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetSummary {
    pub month_year: MonthYear,
    pub total_budget: Decimal,
    /// Spending in every expense category, including those without a budget.
    pub total_spent: Decimal,
    pub total_remaining: Decimal,
    pub percentage_used: Decimal,
    pub status_counts: StatusCounts,
    pub categories_with_budget: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    NewBudget,
    IncreaseBudget,
}

serde_plain::derive_display_from_serialize!(SuggestionKind);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetSuggestion {
    pub category: String,
    pub kind: SuggestionKind,
    /// The budget in place, `None` when there is none.
    pub current_amount: Option<Decimal>,
    pub suggested_amount: Decimal,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetTrendPoint {
    pub month_year: MonthYear,
    pub budget: Decimal,
    pub spent: Decimal,
}

impl Tracker {
    /// Sets the budget for an expense category in `month`, replacing any existing one.
    pub async fn set_budget(
        &mut self,
        category: &str,
        amount: &str,
        month: MonthYear,
    ) -> Result<Budget> {
        let validator = self.validator();
        let category = category.trim();
        let amount = validator
            .category(category, TransactionType::Expense)
            .and_then(|_| validator.month_year(&month.to_string()))
            .and_then(|_| validator.budget_amount(amount))
            .pub_result(ErrorType::Validation)?;

        let budget = Budget::new(category, amount, month.to_string());
        self.store
            .save_budget(&budget)
            .await
            .pub_result(ErrorType::Storage)?;
        self.upsert_budget(budget.clone());
        self.invalidate();
        info!(
            "Set budget of {} for {} in {}",
            Amount::with_commas(amount.value()),
            category,
            month
        );
        Ok(budget)
    }

    /// The budget amount for `category` in `month`, zero when none is set.
    pub fn budget(&self, category: &str, month: MonthYear) -> Decimal {
        let key = month.to_string();
        self.budgets
            .iter()
            .find(|b| b.is_for(category, &key))
            .map_or(Decimal::ZERO, |b| b.amount().value())
    }

    /// Every budget set for `month`, in file order.
    pub fn budgets_for_month(&self, month: MonthYear) -> Vec<&Budget> {
        let key = month.to_string();
        self.budgets
            .iter()
            .filter(|b| b.month_year() == key)
            .collect()
    }

    pub async fn delete_budget(&mut self, category: &str, month: MonthYear) -> Result<Budget> {
        let key = month.to_string();
        let position = self
            .budgets
            .iter()
            .position(|b| b.is_for(category, &key))
            .ok_or_else(|| anyhow!("There is no budget for '{category}' in {month}"))
            .pub_result(ErrorType::NotFound)?;

        self.store
            .delete_budget(category, &key)
            .await
            .pub_result(ErrorType::Storage)?;
        let removed = self.budgets.remove(position);
        self.invalidate();
        info!("Deleted budget for {category} in {month}");
        Ok(removed)
    }

    /// Total expense recorded against `category` in `month`.
    pub fn spent(&self, category: &str, month: MonthYear) -> Decimal {
        let key = month.to_string();
        self.transactions
            .iter()
            .filter(|t| t.is_expense() && t.category() == category && t.month_year() == key)
            .map(|t| t.amount().value())
            .sum()
    }

    pub fn budget_status(&self, category: &str, month: MonthYear) -> BudgetStatus {
        let budget = self.budget(category, month);
        let spent = self.spent(category, month);
        BudgetStatus {
            category: category.to_string(),
            month_year: month,
            budget,
            spent,
            remaining: budget - spent,
            percentage: percent(spent, budget),
            status: BudgetState::of(budget, spent, self.config.budget_warning_threshold()),
        }
    }

    /// The status of every expense category in `month`, whether or not it has a budget.
    pub fn all_budget_status(&self, month: MonthYear) -> Vec<BudgetStatus> {
        EXPENSE_CATEGORIES
            .iter()
            .map(|category| self.budget_status(category, month))
            .collect()
    }

    /// Categories with a budget that are in the warning or exceeded state.
    pub fn budget_warnings(&self, month: MonthYear) -> Vec<BudgetStatus> {
        self.all_budget_status(month)
            .into_iter()
            .filter(|s| {
                matches!(s.status, BudgetState::Warning | BudgetState::Exceeded)
                    && s.budget > Decimal::ZERO
            })
            .collect()
    }

    pub fn budget_summary(&self, month: MonthYear) -> BudgetSummary {
        let statuses = self.all_budget_status(month);
        let mut counts = StatusCounts::default();
        for s in &statuses {
            match s.status {
                BudgetState::Safe => counts.safe += 1,
                BudgetState::Warning => counts.warning += 1,
                BudgetState::Exceeded => counts.exceeded += 1,
                BudgetState::NotSet => counts.not_set += 1,
            }
        }
        let with_budget = statuses.iter().filter(|s| s.budget > Decimal::ZERO);
        let total_budget: Decimal = with_budget.clone().map(|s| s.budget).sum();
        let total_spent: Decimal = statuses.iter().map(|s| s.spent).sum();
        BudgetSummary {
            month_year: month,
            total_budget,
            total_spent,
            total_remaining: total_budget - total_spent,
            percentage_used: percent(total_spent, total_budget),
            status_counts: counts,
            categories_with_budget: with_budget.count(),
        }
    }

    /// Suggests a budget of 120% of spending for categories that have spending but no budget,
    /// and a raise to 110% of spending for categories over budget.
    pub fn suggest_budget_adjustments(&self, month: MonthYear) -> Vec<BudgetSuggestion> {
        let currency = self.config.currency();
        self.all_budget_status(month)
            .into_iter()
            .filter_map(|s| {
                if s.budget.is_zero() && s.spent > Decimal::ZERO {
                    Some(BudgetSuggestion {
                        reason: format!(
                            "Spent {} {currency} without a budget",
                            Amount::with_commas(s.spent)
                        ),
                        category: s.category,
                        kind: SuggestionKind::NewBudget,
                        current_amount: None,
                        suggested_amount: (s.spent * Decimal::new(12, 1)).round_dp(2),
                    })
                } else if s.status == BudgetState::Exceeded {
                    Some(BudgetSuggestion {
                        reason: format!(
                            "Over budget by {} {currency}",
                            Amount::with_commas(s.spent - s.budget)
                        ),
                        category: s.category,
                        kind: SuggestionKind::IncreaseBudget,
                        current_amount: Some(s.budget),
                        suggested_amount: (s.spent * Decimal::new(11, 1)).round_dp(2),
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Copies every budget of the month before `month` into `month`, overwriting budgets that
    /// `month` already has for the same categories. Returns the number copied.
    pub async fn copy_budgets_from_previous_month(&mut self, month: MonthYear) -> Result<usize> {
        let previous = month.previous();
        let target = month.to_string();
        let copies: Vec<Budget> = self
            .budgets_for_month(previous)
            .into_iter()
            .map(|b| Budget::new(b.category(), b.amount(), target.as_str()))
            .collect();
        if copies.is_empty() {
            return Err(anyhow!("There are no budgets in {previous} to copy"))
                .pub_result(ErrorType::NotFound);
        }

        let before = self.budgets.clone();
        for copy in &copies {
            self.upsert_budget(copy.clone());
        }
        if let Err(e) = self.store.save_all_budgets(&self.budgets).await {
            self.budgets = before;
            return Err(e).pub_result(ErrorType::Storage);
        }
        self.invalidate();
        info!(
            "Copied {} budgets from {previous} to {month}",
            copies.len()
        );
        Ok(copies.len())
    }

    /// Budget and spending of `category` over the `months` months ending with `until`, oldest
    /// first.
    pub fn budget_trend(
        &self,
        category: &str,
        months: usize,
        until: MonthYear,
    ) -> Vec<BudgetTrendPoint> {
        until
            .trailing(months)
            .into_iter()
            .map(|month| BudgetTrendPoint {
                month_year: month,
                budget: self.budget(category, month),
                spent: self.spent(category, month),
            })
            .collect()
    }

    fn upsert_budget(&mut self, budget: Budget) {
        match self
            .budgets
            .iter_mut()
            .find(|b| b.is_for(budget.category(), budget.month_year()))
        {
            Some(existing) => existing.set_amount(budget.amount()),
            None => self.budgets.push(budget),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{expense, income, TestEnv};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    async fn tracker_with_spending(env: &TestEnv, month: MonthYear) -> Tracker {
        let date = |day: u32| format!("{day:02}/{month}");
        env.seed_transactions(&[
            expense(&date(1), "Food", "500000"),
            expense(&date(2), "Food", "350000"),
            expense(&date(3), "Transport", "200000"),
            expense(&date(4), "Bills", "900000"),
            expense(&date(5), "Health", "100000"),
            income(&date(6), "Salary", "10000000"),
        ])
        .await;
        env.tracker().await
    }

    #[test]
    fn test_state_thresholds() {
        let threshold = dec("0.8");
        let state = |budget: &str, spent: &str| BudgetState::of(dec(budget), dec(spent), threshold);
        assert_eq!(state("0", "100"), BudgetState::NotSet);
        assert_eq!(state("100", "80"), BudgetState::Safe);
        assert_eq!(state("100", "80.01"), BudgetState::Warning);
        assert_eq!(state("100", "100"), BudgetState::Warning);
        assert_eq!(state("100", "100.01"), BudgetState::Exceeded);
        assert_eq!(BudgetState::NotSet.to_string(), "not_set");
    }

    #[tokio::test]
    async fn test_set_get_and_overwrite() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker().await;
        let month = MonthYear::current();

        tracker.set_budget("Food", "1,000,000", month).await.unwrap();
        assert_eq!(tracker.budget("Food", month), dec("1000000"));
        tracker.set_budget(" Food ", "800000", month).await.unwrap();
        assert_eq!(tracker.budget("Food", month), dec("800000"));
        assert_eq!(tracker.budgets_for_month(month).len(), 1);
        assert!(tracker.budget("Food", month.previous()).is_zero());

        let reloaded = env.tracker().await;
        assert_eq!(reloaded.budget("Food", month), dec("800000"));
    }

    #[tokio::test]
    async fn test_set_budget_rejects_invalid_input() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker().await;
        let month = MonthYear::current();

        let err = tracker.set_budget("Salary", "100", month).await.unwrap_err();
        assert!(err.to_string().starts_with("validation:"));
        let err = tracker.set_budget("Food", "0", month).await.unwrap_err();
        assert!(err.to_string().contains("Budget must be greater than 0"));
        let far = MonthYear::new(1, month.year() + 2).unwrap();
        assert!(tracker.set_budget("Food", "100", far).await.is_err());
        assert!(tracker.budgets_for_month(month).is_empty());
    }

    #[tokio::test]
    async fn test_delete_budget() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker().await;
        let month = MonthYear::current();
        tracker.set_budget("Food", "100", month).await.unwrap();
        tracker.set_budget("Bills", "200", month).await.unwrap();

        let removed = tracker.delete_budget("Food", month).await.unwrap();
        assert_eq!(removed.category(), "Food");
        assert!(tracker.budget("Food", month).is_zero());
        let err = tracker.delete_budget("Food", month).await.unwrap_err();
        assert!(err.to_string().starts_with("not_found:"));

        let reloaded = env.tracker().await;
        assert_eq!(reloaded.budgets_for_month(month).len(), 1);
        assert!(reloaded.budget("Food", month).is_zero());
    }

    #[tokio::test]
    async fn test_status_and_warnings() {
        let env = TestEnv::new().await;
        let month = MonthYear::current();
        let mut tracker = tracker_with_spending(&env, month).await;
        tracker.set_budget("Food", "1000000", month).await.unwrap();
        tracker.set_budget("Transport", "500000", month).await.unwrap();
        tracker.set_budget("Bills", "800000", month).await.unwrap();

        let food = tracker.budget_status("Food", month);
        assert_eq!(food.spent, dec("850000"));
        assert_eq!(food.remaining, dec("150000"));
        assert_eq!(food.percentage, dec("85"));
        assert_eq!(food.status, BudgetState::Warning);
        assert_eq!(tracker.budget_status("Transport", month).status, BudgetState::Safe);
        let bills = tracker.budget_status("Bills", month);
        assert_eq!(bills.status, BudgetState::Exceeded);
        assert_eq!(bills.remaining, dec("-100000"));
        let health = tracker.budget_status("Health", month);
        assert_eq!(health.status, BudgetState::NotSet);
        assert!(health.percentage.is_zero());

        let all = tracker.all_budget_status(month);
        assert_eq!(all.len(), EXPENSE_CATEGORIES.len());
        let warnings = tracker.budget_warnings(month);
        let warned: Vec<&str> = warnings.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(warned, vec!["Food", "Bills"]);
    }

    #[tokio::test]
    async fn test_summary() {
        let env = TestEnv::new().await;
        let month = MonthYear::current();
        let mut tracker = tracker_with_spending(&env, month).await;
        tracker.set_budget("Food", "1000000", month).await.unwrap();
        tracker.set_budget("Bills", "1000000", month).await.unwrap();

        let summary = tracker.budget_summary(month);
        assert_eq!(summary.total_budget, dec("2000000"));
        assert_eq!(summary.total_spent, dec("2050000"));
        assert_eq!(summary.total_remaining, dec("-50000"));
        assert_eq!(summary.percentage_used, dec("102.5"));
        assert_eq!(summary.categories_with_budget, 2);
        assert_eq!(summary.status_counts.warning, 2);
        assert_eq!(summary.status_counts.not_set, EXPENSE_CATEGORIES.len() - 2);
    }

    #[tokio::test]
    async fn test_suggestions() {
        let env = TestEnv::new().await;
        let month = MonthYear::current();
        let mut tracker = tracker_with_spending(&env, month).await;
        tracker.set_budget("Bills", "800000", month).await.unwrap();
        tracker.set_budget("Food", "2000000", month).await.unwrap();

        let suggestions = tracker.suggest_budget_adjustments(month);
        let by_category = |name: &str| suggestions.iter().find(|s| s.category == name).unwrap();
        assert_eq!(suggestions.len(), 3);

        let transport = by_category("Transport");
        assert_eq!(transport.kind, SuggestionKind::NewBudget);
        assert_eq!(transport.current_amount, None);
        assert_eq!(transport.suggested_amount, dec("240000"));

        let bills = by_category("Bills");
        assert_eq!(bills.kind, SuggestionKind::IncreaseBudget);
        assert_eq!(bills.current_amount, Some(dec("800000")));
        assert_eq!(bills.suggested_amount, dec("990000"));
        assert_eq!(bills.reason, "Over budget by 100,000.00 VNĐ");

        assert_eq!(by_category("Health").suggested_amount, dec("120000"));
        assert!(suggestions.iter().all(|s| s.category != "Food"));
    }

    #[tokio::test]
    async fn test_copy_from_previous_month() {
        let env = TestEnv::new().await;
        let mut tracker = env.tracker().await;
        let month = MonthYear::current();
        let previous = month.previous();

        let err = tracker
            .copy_budgets_from_previous_month(month)
            .await
            .unwrap_err();
        assert!(err.to_string().contains(&previous.to_string()));

        tracker.set_budget("Food", "100", previous).await.unwrap();
        tracker.set_budget("Bills", "200", previous).await.unwrap();
        tracker.set_budget("Food", "999", month).await.unwrap();

        assert_eq!(tracker.copy_budgets_from_previous_month(month).await.unwrap(), 2);
        assert_eq!(tracker.budget("Food", month), dec("100"));
        assert_eq!(tracker.budget("Bills", month), dec("200"));
        assert_eq!(tracker.budgets_for_month(month).len(), 2);

        let reloaded = env.tracker().await;
        assert_eq!(reloaded.budgets_for_month(month).len(), 2);
        assert_eq!(reloaded.budgets_for_month(previous).len(), 2);
    }

    #[tokio::test]
    async fn test_trend() {
        let env = TestEnv::new().await;
        let month = MonthYear::current();
        let mut tracker = tracker_with_spending(&env, month).await;
        tracker.set_budget("Food", "900000", month).await.unwrap();
        tracker
            .set_budget("Food", "700000", month.previous())
            .await
            .unwrap();

        let trend = tracker.budget_trend("Food", 3, month);
        let months: Vec<MonthYear> = trend.iter().map(|p| p.month_year).collect();
        assert_eq!(months, month.trailing(3));
        assert!(trend[0].budget.is_zero());
        assert_eq!(trend[1].budget, dec("700000"));
        assert_eq!(trend[2].budget, dec("900000"));
        assert_eq!(trend[2].spent, dec("850000"));
    }
}
