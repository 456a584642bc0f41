//! The fixed category sets offered for each transaction type.

use crate::model::TransactionType;

/// Categories available for expenses, in display order.
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Education",
    "Entertainment",
    "Shopping",
    "Health",
    "Bills",
    "Other",
];

/// Categories available for income, in display order.
pub const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Bonus",
    "Side Job",
    "Scholarship",
    "Investment",
    "Other",
];

/// Returns the allowed categories for `transaction_type`.
pub fn categories_for(transaction_type: TransactionType) -> &'static [&'static str] {
    match transaction_type {
        TransactionType::Income => INCOME_CATEGORIES,
        TransactionType::Expense => EXPENSE_CATEGORIES,
    }
}

/// True when `category` is one of the allowed categories for `transaction_type`.
pub fn is_valid_category(category: &str, transaction_type: TransactionType) -> bool {
    categories_for(transaction_type).contains(&category)
}
