use crate::model::Amount;
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

/// Header row of the transactions CSV file, in column order.
pub const TRANSACTION_HEADERS: [&str; 6] = [
    TIMESTAMP_STR,
    DATE_STR,
    TYPE_STR,
    CATEGORY_STR,
    AMOUNT_STR,
    DESCRIPTION_STR,
];

pub(crate) const TIMESTAMP_STR: &str = "timestamp";
pub(crate) const DATE_STR: &str = "date";
pub(crate) const TYPE_STR: &str = "type";
pub(crate) const CATEGORY_STR: &str = "category";
pub(crate) const AMOUNT_STR: &str = "amount";
pub(crate) const DESCRIPTION_STR: &str = "description";

/// The date format used for the `date` column.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// The time format used for the `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[serde(alias = "Income", alias = "Thu nhập")]
    Income,
    #[serde(alias = "Expense", alias = "Chi tiêu")]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// A single row of the transactions file.
///
/// Transactions are immutable once created. Editing or deleting one means replacing the stored
/// rows wholesale.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    timestamp: String,
    date: String,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    category: String,
    amount: Amount,
    #[serde(default)]
    description: String,
}

impl Transaction {
    pub fn new(
        date: impl Into<String>,
        transaction_type: TransactionType,
        category: impl Into<String>,
        amount: Amount,
        description: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            date: date.into(),
            transaction_type,
            category: category.into(),
            amount,
            description: description.into(),
        }
    }

    /// The raw `DD/MM/YYYY` date string. This is also the key of the date index.
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Returns `MM/YYYY` for the transaction date. Falls back to the current month when the date
    /// does not have three `/` separated parts.
    pub fn month_year(&self) -> String {
        match self.date_parts() {
            Some((_, month, year)) => format!("{month:0>2}/{year}"),
            None => Local::now().format("%m/%Y").to_string(),
        }
    }

    /// Returns `YYYY` for the transaction date, falling back to the current year.
    pub fn year(&self) -> String {
        match self.date_parts() {
            Some((_, _, year)) => year.to_string(),
            None => Local::now().year().to_string(),
        }
    }

    /// True when `other` describes the same stored row. Amounts are compared at cent precision.
    pub fn same_record(&self, other: &Transaction) -> bool {
        self.date == other.date
            && self.transaction_type == other.transaction_type
            && self.category == other.category
            && self.amount.cents() == other.amount.cents()
            && self.description == other.description
            && self.timestamp == other.timestamp
    }

    fn date_parts(&self) -> Option<(&str, &str, &str)> {
        let mut parts = self.date.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(d), Some(m), Some(y), None) => Some((d, m, y)),
            _ => None,
        }
    }
}

impl AsRef<Transaction> for Transaction {
    fn as_ref(&self) -> &Transaction {
        self
    }
}
