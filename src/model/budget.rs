use crate::model::Amount;
use anyhow::bail;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Header row of the budget CSV file, in column order.
pub const BUDGET_HEADERS: [&str; 3] = ["category", "amount", "month_year"];

/// A monthly spending limit for one expense category.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Budget {
    category: String,
    amount: Amount,
    month_year: String,
}

impl Budget {
    pub fn new(category: impl Into<String>, amount: Amount, month_year: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            amount,
            month_year: month_year.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub(crate) fn set_amount(&mut self, amount: Amount) {
        self.amount = amount;
    }

    pub fn month_year(&self) -> &str {
        &self.month_year
    }

    /// True when this budget is the one identified by `category` and `month_year`.
    pub fn is_for(&self, category: &str, month_year: &str) -> bool {
        self.category == category && self.month_year == month_year
    }
}

/// A calendar month, written as `MM/YYYY`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MonthYear {
    // Field order gives chronological `Ord`
    year: i32,
    month: u32,
}

impl MonthYear {
    pub fn new(month: u32, year: i32) -> crate::Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("Month must be between 01 and 12");
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current local month.
    pub fn current() -> Self {
        Self::of(Local::now().date_naive())
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The `count` months ending with (and including) `self`, oldest first.
    pub fn trailing(&self, count: usize) -> Vec<MonthYear> {
        let mut months = Vec::with_capacity(count);
        let mut current = *self;
        for _ in 0..count {
            months.push(current);
            current = current.previous();
        }
        months.reverse();
        months
    }
}

impl Display for MonthYear {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

impl FromStr for MonthYear {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((month, year)) = s.split_once('/') else {
            bail!("Month/year must be formatted as MM/YYYY, got '{s}'");
        };
        if month.len() != 2
            || year.len() != 4
            || !month.bytes().all(|b| b.is_ascii_digit())
            || !year.bytes().all(|b| b.is_ascii_digit())
        {
            bail!("Month/year must be formatted as MM/YYYY, got '{s}'");
        }
        MonthYear::new(month.parse()?, year.parse()?)
    }
}

impl Serialize for MonthYear {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MonthYear::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let my = MonthYear::from_str("03/2024").unwrap();
        assert_eq!(my.month(), 3);
        assert_eq!(my.year(), 2024);
        assert_eq!(my.to_string(), "03/2024");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(MonthYear::from_str("3/2024").is_err());
        assert!(MonthYear::from_str("13/2024").is_err());
        assert!(MonthYear::from_str("00/2024").is_err());
        assert!(MonthYear::from_str("2024-03").is_err());
    }

    #[test]
    fn test_previous_and_next_wrap_years() {
        let jan = MonthYear::new(1, 2025).unwrap();
        assert_eq!(jan.previous().to_string(), "12/2024");
        assert_eq!(jan.previous().next(), jan);
    }

    #[test]
    fn test_trailing_is_oldest_first() {
        let feb = MonthYear::new(2, 2025).unwrap();
        let months: Vec<String> = feb.trailing(3).iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["12/2024", "01/2025", "02/2025"]);
    }

    #[test]
    fn test_ordering_is_chronological() {
        let dec = MonthYear::new(12, 2024).unwrap();
        let jan = MonthYear::new(1, 2025).unwrap();
        assert!(dec < jan);
    }
}
