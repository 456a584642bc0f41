//! Checks applied to user input before it reaches the data files.
//!
//! Every check fails with a message that can be shown to the user as-is. Checks that parse
//! their input hand back the parsed value.

use crate::config::ValidationSettings;
use crate::model::{is_valid_category, Amount, MonthYear, TransactionType, DATE_FORMAT};
use crate::Result;
use anyhow::{anyhow, bail, ensure};
use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid regex"));

static MONTH_YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{4}$").expect("valid regex"));

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>"']"#).expect("valid regex"));

/// Validates input against the configured limits, relative to a fixed "today".
#[derive(Debug, Clone)]
pub struct Validator {
    settings: ValidationSettings,
    today: NaiveDate,
}

impl Validator {
    pub fn new(settings: ValidationSettings, today: NaiveDate) -> Self {
        Self { settings, today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// A `DD/MM/YYYY` calendar date no more than `date_range_years` years (of 365 days) before
    /// today and no more than 365 days after it.
    pub fn date(&self, s: &str) -> Result<NaiveDate> {
        ensure!(!s.is_empty(), "Date must not be empty");
        ensure!(
            DATE_PATTERN.is_match(s),
            "Date must be formatted as DD/MM/YYYY"
        );
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|_| anyhow!("'{s}' is not a valid date"))?;

        let years = self.settings.date_range_years();
        let earliest = Duration::try_days(365 * i64::from(years))
            .and_then(|span| self.today.checked_sub_signed(span));
        if let Some(earliest) = earliest {
            ensure!(
                date >= earliest,
                "Date must not be more than {years} years in the past"
            );
        }
        let latest = self.today + Duration::days(365);
        ensure!(date <= latest, "Date must not be more than 1 year in the future");
        Ok(date)
    }

    /// A positive money amount within the configured limits. Commas and spaces are ignored.
    pub fn amount(&self, s: &str) -> Result<Amount> {
        self.money("Amount", s)
    }

    /// Same rules as [`Validator::amount`], reported as a budget.
    pub fn budget_amount(&self, s: &str) -> Result<Amount> {
        self.money("Budget", s)
    }

    pub fn transaction_type(&self, s: &str) -> Result<TransactionType> {
        let s = s.trim();
        ensure!(!s.is_empty(), "Transaction type must not be empty");
        TransactionType::from_str(s)
            .map_err(|_| anyhow!("Transaction type must be one of: income, expense"))
    }

    /// A category from the fixed set belonging to `transaction_type`.
    pub fn category(&self, s: &str, transaction_type: TransactionType) -> Result<()> {
        let s = s.trim();
        ensure!(!s.is_empty(), "Category must not be empty");
        ensure!(
            is_valid_category(s, transaction_type),
            "Category '{s}' is not valid for {transaction_type}"
        );
        Ok(())
    }

    pub fn description(&self, s: &str) -> Result<()> {
        let max = self.settings.max_description_length();
        ensure!(
            s.trim().chars().count() <= max,
            "Description must not be longer than {max} characters"
        );
        Ok(())
    }

    /// A `MM/YYYY` month in a year from ten years ago up to next year.
    pub fn month_year(&self, s: &str) -> Result<MonthYear> {
        ensure!(!s.is_empty(), "Month/year must not be empty");
        ensure!(
            MONTH_YEAR_PATTERN.is_match(s),
            "Month/year must be formatted as MM/YYYY"
        );
        let month_year = MonthYear::from_str(s)?;
        let current = self.today.year();
        if month_year.year() < current - 10 || month_year.year() > current + 1 {
            bail!(
                "Year must be between {} and {}",
                current - 10,
                current + 1
            );
        }
        Ok(month_year)
    }

    fn money(&self, label: &str, s: &str) -> Result<Amount> {
        ensure!(!s.trim().is_empty(), "{label} must not be empty");
        let value = Amount::from_str(s)
            .map_err(|_| anyhow!("{label} is not a valid number"))?
            .value();
        ensure!(value.is_sign_positive() && !value.is_zero(), "{label} must be greater than 0");
        let min = self.settings.min_amount();
        let max = self.settings.max_amount();
        ensure!(
            value >= min,
            "{label} must be at least {}",
            Amount::with_commas(min)
        );
        ensure!(
            value <= max,
            "{label} must not exceed {}",
            Amount::with_commas(max)
        );
        Ok(Amount::new(value))
    }
}

/// Trims `s` and removes the characters `<`, `>`, `"` and `'`.
pub fn sanitize(s: &str) -> String {
    UNSAFE_CHARS.replace_all(s.trim(), "").into_owned()
}
