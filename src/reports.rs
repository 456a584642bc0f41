//! Report computations over a slice of transactions.
//!
//! Everything here is a pure function of its input. Percentages are rounded to two decimal
//! places and are zero whenever their base is zero.

use crate::model::{MonthYear, Transaction, TransactionType, DATE_FORMAT};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

/// Income and expense totals for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub month_year: MonthYear,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: usize,
}

/// Headline figures of a [`MonthlyReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyStats {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: usize,
    /// Mean amount over all of the month's transactions, income and expense alike.
    pub avg_transaction: Decimal,
    pub max_single_income: Decimal,
    pub max_single_expense: Decimal,
    pub savings_rate: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeekTotals {
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub month_year: MonthYear,
    pub summary: MonthlyStats,
    pub income_by_category: BTreeMap<String, Decimal>,
    pub expense_by_category: BTreeMap<String, Decimal>,
    /// Totals keyed by ISO week number.
    pub weekly: BTreeMap<u32, WeekTotals>,
    pub largest_income: Option<Arc<Transaction>>,
    pub largest_expense: Option<Arc<Transaction>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: usize,
}

/// The difference between one month and the month before it in a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub month: MonthYear,
    pub change: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrendAnalysis {
    pub income: Vec<Change>,
    pub expense: Vec<Change>,
    pub balance: Vec<Change>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearlyStats {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub total_balance: Decimal,
    pub transaction_count: usize,
    /// The three monthly averages always divide by twelve, even for a year still in progress
    /// or one with months that have no transactions.
    pub avg_monthly_income: Decimal,
    pub avg_monthly_expense: Decimal,
    pub avg_monthly_balance: Decimal,
    pub savings_rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearlyReport {
    pub year: i32,
    pub summary: YearlyStats,
    /// Only months with at least one transaction appear.
    pub monthly_breakdown: BTreeMap<MonthYear, MonthTotals>,
    pub trend: TrendAnalysis,
}

/// Statistics for one category of one transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryAnalysis {
    pub category: String,
    pub total_amount: Decimal,
    pub transaction_count: usize,
    /// Share of the total across all categories.
    pub percentage: Decimal,
    pub avg_amount: Decimal,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub monthly_totals: BTreeMap<MonthYear, Decimal>,
    pub monthly_trend: Vec<Change>,
}

/// The two periods to compare. Both are always of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Periods {
    Months(MonthYear, MonthYear),
    Years(i32, i32),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryChange {
    pub category: String,
    pub value1: Decimal,
    pub value2: Decimal,
    pub change: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub period1: String,
    pub period2: String,
    pub period1_totals: Totals,
    pub period2_totals: Totals,
    /// `period2 - period1` for each total.
    pub changes: Totals,
    /// Each change relative to the absolute `period1` value.
    pub percentages: Totals,
    pub income_categories: Vec<CategoryChange>,
    pub expense_categories: Vec<CategoryChange>,
}

pub fn monthly_summary(transactions: &[Arc<Transaction>], month: MonthYear) -> MonthlySummary {
    let key = month.to_string();
    let mut totals = MonthTotals::default();
    for t in transactions.iter().filter(|t| t.month_year() == key) {
        totals.add(t);
    }
    MonthlySummary {
        month_year: month,
        income: totals.income,
        expense: totals.expense,
        balance: totals.balance,
        transaction_count: totals.transaction_count,
    }
}

pub fn monthly_report(transactions: &[Arc<Transaction>], month: MonthYear) -> MonthlyReport {
    let key = month.to_string();
    let monthly: Vec<&Arc<Transaction>> =
        transactions.iter().filter(|t| t.month_year() == key).collect();

    let mut totals = MonthTotals::default();
    let mut income_by_category = BTreeMap::new();
    let mut expense_by_category = BTreeMap::new();
    let mut weekly: BTreeMap<u32, WeekTotals> = BTreeMap::new();
    let mut largest_income: Option<&Arc<Transaction>> = None;
    let mut largest_expense: Option<&Arc<Transaction>> = None;

    for &t in &monthly {
        totals.add(t);
        let amount = t.amount().value();
        let week = NaiveDate::parse_from_str(t.date(), DATE_FORMAT)
            .ok()
            .map(|d| weekly.entry(d.iso_week().week()).or_default());
        let (by_category, largest) = match t.transaction_type() {
            TransactionType::Income => {
                if let Some(week) = week {
                    week.income += amount;
                }
                (&mut income_by_category, &mut largest_income)
            }
            TransactionType::Expense => {
                if let Some(week) = week {
                    week.expense += amount;
                }
                (&mut expense_by_category, &mut largest_expense)
            }
        };
        *by_category.entry(t.category().to_string()).or_default() += amount;
        if largest.map_or(true, |l| amount > l.amount().value()) {
            *largest = Some(t);
        }
    }

    let total_amount: Decimal = monthly.iter().map(|t| t.amount().value()).sum();
    let avg_transaction = if monthly.is_empty() {
        Decimal::ZERO
    } else {
        total_amount / Decimal::from(monthly.len())
    };

    MonthlyReport {
        month_year: month,
        summary: MonthlyStats {
            income: totals.income,
            expense: totals.expense,
            balance: totals.balance,
            transaction_count: totals.transaction_count,
            avg_transaction,
            max_single_income: largest_income.map_or(Decimal::ZERO, |t| t.amount().value()),
            max_single_expense: largest_expense.map_or(Decimal::ZERO, |t| t.amount().value()),
            savings_rate: percent(totals.balance, totals.income),
        },
        income_by_category,
        expense_by_category,
        weekly,
        largest_income: largest_income.cloned(),
        largest_expense: largest_expense.cloned(),
    }
}

pub fn yearly_report(transactions: &[Arc<Transaction>], year: i32) -> YearlyReport {
    let key = year.to_string();
    let mut totals = MonthTotals::default();
    let mut monthly_breakdown: BTreeMap<MonthYear, MonthTotals> = BTreeMap::new();

    for t in transactions.iter().filter(|t| t.year() == key) {
        totals.add(t);
        if let Ok(month) = MonthYear::from_str(&t.month_year()) {
            monthly_breakdown.entry(month).or_default().add(t);
        }
    }

    let months: Vec<(&MonthYear, &MonthTotals)> = monthly_breakdown.iter().collect();
    let mut trend = TrendAnalysis::default();
    for pair in months.windows(2) {
        let ((_, prev), (&month, curr)) = (pair[0], pair[1]);
        trend
            .income
            .push(change(month, prev.income, curr.income, false));
        trend
            .expense
            .push(change(month, prev.expense, curr.expense, false));
        trend
            .balance
            .push(change(month, prev.balance, curr.balance, true));
    }

    let twelve = Decimal::from(12);
    YearlyReport {
        year,
        summary: YearlyStats {
            total_income: totals.income,
            total_expense: totals.expense,
            total_balance: totals.balance,
            transaction_count: totals.transaction_count,
            avg_monthly_income: totals.income / twelve,
            avg_monthly_expense: totals.expense / twelve,
            avg_monthly_balance: totals.balance / twelve,
            savings_rate: percent(totals.balance, totals.income),
        },
        monthly_breakdown,
        trend,
    }
}

/// Per-category statistics for every transaction of `transaction_type`, largest total first.
pub fn category_analysis(
    transactions: &[Arc<Transaction>],
    transaction_type: TransactionType,
) -> Vec<CategoryAnalysis> {
    let mut by_category: BTreeMap<&str, Vec<&Arc<Transaction>>> = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.transaction_type() == transaction_type)
    {
        by_category.entry(t.category()).or_default().push(t);
    }
    let grand_total: Decimal = by_category
        .values()
        .flatten()
        .map(|t| t.amount().value())
        .sum();

    let mut result: Vec<CategoryAnalysis> = by_category
        .into_iter()
        .map(|(category, items)| {
            let amounts: Vec<Decimal> = items.iter().map(|t| t.amount().value()).collect();
            let total: Decimal = amounts.iter().sum();
            let mut monthly_totals: BTreeMap<MonthYear, Decimal> = BTreeMap::new();
            for t in &items {
                if let Ok(month) = MonthYear::from_str(&t.month_year()) {
                    *monthly_totals.entry(month).or_default() += t.amount().value();
                }
            }
            let months: Vec<(&MonthYear, &Decimal)> = monthly_totals.iter().collect();
            let monthly_trend = months
                .windows(2)
                .map(|pair| change(*pair[1].0, *pair[0].1, *pair[1].1, false))
                .collect();
            CategoryAnalysis {
                category: category.to_string(),
                total_amount: total,
                transaction_count: items.len(),
                percentage: percent(total, grand_total),
                avg_amount: total / Decimal::from(items.len()),
                min_amount: amounts.iter().copied().min().unwrap_or_default(),
                max_amount: amounts.iter().copied().max().unwrap_or_default(),
                monthly_totals,
                monthly_trend,
            }
        })
        .collect();

    result.sort_by(|a, b| {
        b.total_amount
            .cmp(&a.total_amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    result
}

/// Compares income, expense, balance and per-category totals between two months or two years.
pub fn compare(transactions: &[Arc<Transaction>], periods: Periods) -> ComparisonReport {
    let (label1, label2, first, second) = match periods {
        Periods::Months(a, b) => {
            let (ka, kb) = (a.to_string(), b.to_string());
            let first = period_breakdown(transactions, |t| t.month_year() == ka);
            let second = period_breakdown(transactions, |t| t.month_year() == kb);
            (ka, kb, first, second)
        }
        Periods::Years(a, b) => {
            let (ka, kb) = (a.to_string(), b.to_string());
            let first = period_breakdown(transactions, |t| t.year() == ka);
            let second = period_breakdown(transactions, |t| t.year() == kb);
            (ka, kb, first, second)
        }
    };

    let changes = Totals {
        income: second.totals.income - first.totals.income,
        expense: second.totals.expense - first.totals.expense,
        balance: second.totals.balance - first.totals.balance,
    };
    let percentages = Totals {
        income: percent(changes.income, first.totals.income.abs()),
        expense: percent(changes.expense, first.totals.expense.abs()),
        balance: percent(changes.balance, first.totals.balance.abs()),
    };

    ComparisonReport {
        period1: label1,
        period2: label2,
        income_categories: compare_categories(&first.income, &second.income),
        expense_categories: compare_categories(&first.expense, &second.expense),
        period1_totals: first.totals,
        period2_totals: second.totals,
        changes,
        percentages,
    }
}

struct PeriodBreakdown {
    totals: Totals,
    income: BTreeMap<String, Decimal>,
    expense: BTreeMap<String, Decimal>,
}

fn period_breakdown<F>(transactions: &[Arc<Transaction>], in_period: F) -> PeriodBreakdown
where
    F: Fn(&Transaction) -> bool,
{
    let mut breakdown = PeriodBreakdown {
        totals: Totals::default(),
        income: BTreeMap::new(),
        expense: BTreeMap::new(),
    };
    for t in transactions.iter().filter(|t| in_period(t)) {
        let amount = t.amount().value();
        let by_category = match t.transaction_type() {
            TransactionType::Income => {
                breakdown.totals.income += amount;
                &mut breakdown.income
            }
            TransactionType::Expense => {
                breakdown.totals.expense += amount;
                &mut breakdown.expense
            }
        };
        *by_category.entry(t.category().to_string()).or_default() += amount;
    }
    breakdown.totals.balance = breakdown.totals.income - breakdown.totals.expense;
    breakdown
}

/// Categories present in either period, largest absolute change first.
fn compare_categories(
    first: &BTreeMap<String, Decimal>,
    second: &BTreeMap<String, Decimal>,
) -> Vec<CategoryChange> {
    let mut categories: Vec<&String> = first.keys().chain(second.keys()).collect();
    categories.sort();
    categories.dedup();
    let mut result: Vec<CategoryChange> = categories
        .into_iter()
        .map(|category| {
            let value1 = first.get(category).copied().unwrap_or_default();
            let value2 = second.get(category).copied().unwrap_or_default();
            let change = value2 - value1;
            CategoryChange {
                category: category.clone(),
                value1,
                value2,
                change,
                percentage: percent(change, value1.abs()),
            }
        })
        .collect();
    result.sort_by(|a, b| match b.change.abs().cmp(&a.change.abs()) {
        Ordering::Equal => a.category.cmp(&b.category),
        other => other,
    });
    result
}

impl MonthTotals {
    fn add(&mut self, t: &Transaction) {
        let amount = t.amount().value();
        match t.transaction_type() {
            TransactionType::Income => self.income += amount,
            TransactionType::Expense => self.expense += amount,
        }
        self.balance = self.income - self.expense;
        self.transaction_count += 1;
    }
}

/// `prev -> curr` as an absolute and relative change. Balances may be negative, so their
/// percentage is taken against the absolute previous value; other series only count a positive
/// previous value as a base.
fn change(month: MonthYear, prev: Decimal, curr: Decimal, signed: bool) -> Change {
    let delta = curr - prev;
    let base = if signed { prev.abs() } else { prev.max(Decimal::ZERO) };
    Change {
        month,
        change: delta,
        percentage: percent(delta, base),
    }
}

/// `part / whole * 100` to two places, or zero when `whole` is not positive.
pub(crate) fn percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::ONE_HUNDRED).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{expense, income};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn month(s: &str) -> MonthYear {
        MonthYear::from_str(s).unwrap()
    }

    fn sample() -> Vec<Arc<Transaction>> {
        vec![
            income("01/03/2024", "Salary", "10000000"),
            expense("02/03/2024", "Food", "150000"),
            expense("15/03/2024", "Food", "250000"),
            expense("20/03/2024", "Bills", "1200000"),
            income("25/03/2024", "Bonus", "500000"),
            income("05/04/2024", "Salary", "10000000"),
            expense("06/04/2024", "Food", "300000"),
            expense("10/01/2025", "Food", "100000"),
        ]
        .into_iter()
        .map(Arc::new)
        .collect()
    }

    #[test]
    fn test_monthly_summary() {
        let s = monthly_summary(&sample(), month("03/2024"));
        assert_eq!(s.income, dec("10500000"));
        assert_eq!(s.expense, dec("1600000"));
        assert_eq!(s.balance, dec("8900000"));
        assert_eq!(s.transaction_count, 5);
    }

    #[test]
    fn test_monthly_summary_empty_month() {
        let s = monthly_summary(&sample(), month("07/2024"));
        assert_eq!(s.transaction_count, 0);
        assert!(s.balance.is_zero());
    }

    #[test]
    fn test_monthly_report() {
        let r = monthly_report(&sample(), month("03/2024"));
        assert_eq!(r.summary.max_single_income, dec("10000000"));
        assert_eq!(r.summary.max_single_expense, dec("1200000"));
        assert_eq!(r.summary.avg_transaction, dec("2420000"));
        // 8,900,000 / 10,500,000
        assert_eq!(r.summary.savings_rate, dec("84.76"));
        assert_eq!(r.expense_by_category["Food"], dec("400000"));
        assert_eq!(r.income_by_category["Bonus"], dec("500000"));
        assert_eq!(r.largest_expense.unwrap().category(), "Bills");
        assert_eq!(r.largest_income.unwrap().category(), "Salary");
        // 01/03 and 02/03/2024 fall in ISO week 9, 15/03 in week 11
        assert_eq!(r.weekly[&9].income, dec("10000000"));
        assert_eq!(r.weekly[&9].expense, dec("150000"));
        assert_eq!(r.weekly[&11].expense, dec("250000"));
    }

    #[test]
    fn test_monthly_report_without_income() {
        let r = monthly_report(&sample(), month("01/2025"));
        assert!(r.largest_income.is_none());
        assert!(r.summary.savings_rate.is_zero());
        assert_eq!(r.summary.max_single_expense, dec("100000"));
    }

    #[test]
    fn test_yearly_report() {
        let r = yearly_report(&sample(), 2024);
        assert_eq!(r.summary.transaction_count, 7);
        assert_eq!(r.summary.total_income, dec("20500000"));
        assert_eq!(r.summary.total_expense, dec("1900000"));
        assert_eq!(r.summary.avg_monthly_expense, dec("1900000") / dec("12"));
        assert_eq!(r.monthly_breakdown.len(), 2);
        assert_eq!(r.trend.expense.len(), 1);
        let expense_change = &r.trend.expense[0];
        assert_eq!(expense_change.month, month("04/2024"));
        assert_eq!(expense_change.change, dec("-1300000"));
        assert_eq!(expense_change.percentage, dec("-81.25"));
    }

    #[test]
    fn test_category_analysis() {
        let analysis = category_analysis(&sample(), TransactionType::Expense);
        let names: Vec<&str> = analysis.iter().map(|a| a.category.as_str()).collect();
        assert_eq!(names, vec!["Bills", "Food"]);
        let food = &analysis[1];
        assert_eq!(food.total_amount, dec("800000"));
        assert_eq!(food.transaction_count, 4);
        assert_eq!(food.avg_amount, dec("200000"));
        assert_eq!(food.min_amount, dec("100000"));
        assert_eq!(food.max_amount, dec("300000"));
        assert_eq!(food.percentage, dec("40"));
        // Chronological across the year boundary
        let months: Vec<MonthYear> = food.monthly_totals.keys().copied().collect();
        assert_eq!(months, vec![month("03/2024"), month("04/2024"), month("01/2025")]);
        assert_eq!(food.monthly_trend.len(), 2);
        assert_eq!(food.monthly_trend[0].percentage, dec("-25"));
    }

    #[test]
    fn test_compare_months() {
        let r = compare(&sample(), Periods::Months(month("03/2024"), month("04/2024")));
        assert_eq!(r.changes.income, dec("-500000"));
        assert_eq!(r.changes.expense, dec("-1300000"));
        assert_eq!(r.percentages.expense, dec("-81.25"));
        let categories: Vec<&str> = r
            .expense_categories
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(categories, vec!["Bills", "Food"]);
        assert_eq!(r.expense_categories[0].value2, Decimal::ZERO);
        assert_eq!(r.income_categories[0].category, "Bonus");
    }

    #[test]
    fn test_compare_years() {
        let r = compare(&sample(), Periods::Years(2024, 2025));
        assert_eq!(r.period1, "2024");
        assert_eq!(r.period2_totals.expense, dec("100000"));
        assert_eq!(r.changes.income, dec("-20500000"));
        assert_eq!(r.percentages.income, dec("-100"));
        assert_eq!(r.expense_categories[0].category, "Bills");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(dec("1"), dec("3")), dec("33.33"));
        assert_eq!(percent(dec("5"), Decimal::ZERO), Decimal::ZERO);
    }
}
