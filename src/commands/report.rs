//! Handlers for the `report` subcommands.

use crate::args::{CategoriesArgs, CompareArgs, MonthArgs, PeriodKind, YearArgs};
use crate::commands::{month_or_current, Out};
use crate::error::{ErrorType, IntoResult};
use crate::reports::{CategoryAnalysis, ComparisonReport, MonthlyReport, Periods, YearlyReport};
use crate::tracker::Tracker;
use crate::{Config, Result};
use anyhow::{anyhow, ensure};
use chrono::Datelike;

pub async fn report_monthly(config: Config, args: MonthArgs) -> Result<Out<MonthlyReport>> {
    let tracker = Tracker::load(&config).await?;
    let month = month_or_current(&tracker, args.month.as_deref())?;
    let report = tracker.monthly_report(month);
    Ok(Out::new(
        format!(
            "Monthly report for {month}: {} transactions, savings rate {}%",
            report.summary.transaction_count, report.summary.savings_rate
        ),
        report,
    ))
}

pub async fn report_yearly(config: Config, args: YearArgs) -> Result<Out<YearlyReport>> {
    let tracker = Tracker::load(&config).await?;
    let year = args
        .year
        .unwrap_or_else(|| tracker.validator().today().year());
    let report = tracker.yearly_report(year);
    Ok(Out::new(
        format!(
            "Yearly report for {year}: {} transactions over {} months",
            report.summary.transaction_count,
            report.monthly_breakdown.len()
        ),
        report,
    ))
}

pub async fn report_categories(
    config: Config,
    args: CategoriesArgs,
) -> Result<Out<Vec<CategoryAnalysis>>> {
    let mut tracker = Tracker::load(&config).await?;
    let transaction_type = tracker
        .validator()
        .transaction_type(&args.transaction_type)
        .pub_result(ErrorType::Validation)?;
    let analysis = tracker.category_analysis(transaction_type);
    Ok(Out::new(
        format!("{} {transaction_type} categories", analysis.len()),
        analysis,
    ))
}

pub async fn report_compare(config: Config, args: CompareArgs) -> Result<Out<ComparisonReport>> {
    let tracker = Tracker::load(&config).await?;
    let periods = match args.by {
        PeriodKind::Month => {
            let validator = tracker.validator();
            let first = validator
                .month_year(args.first.trim())
                .pub_result(ErrorType::Validation)?;
            let second = validator
                .month_year(args.second.trim())
                .pub_result(ErrorType::Validation)?;
            Periods::Months(first, second)
        }
        PeriodKind::Year => Periods::Years(
            parse_year(&args.first).pub_result(ErrorType::Validation)?,
            parse_year(&args.second).pub_result(ErrorType::Validation)?,
        ),
    };
    let report = tracker.compare(periods);
    Ok(Out::new(
        format!(
            "Compared {} with {}: expense changed by {}%",
            report.period1, report.period2, report.percentages.expense
        ),
        report,
    ))
}

fn parse_year(s: &str) -> Result<i32> {
    let s = s.trim();
    ensure!(
        s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()),
        "Year must be formatted as YYYY"
    );
    s.parse().map_err(|_| anyhow!("'{s}' is not a valid year"))
}
