//! Types that represent the core data model, such as `Transaction` and `Budget`.
mod amount;
mod budget;
mod category;
mod transaction;

pub use amount::{Amount, AmountError, AmountFormat};
pub use budget::{Budget, MonthYear, BUDGET_HEADERS};
pub use category::{categories_for, is_valid_category, EXPENSE_CATEGORIES, INCOME_CATEGORIES};
pub use transaction::{
    Transaction, TransactionType, DATE_FORMAT, TIMESTAMP_FORMAT, TRANSACTION_HEADERS,
};
