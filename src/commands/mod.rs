//! Command handlers for the expense CLI.
//!
//! This module contains implementations for all CLI subcommands. Each handler loads what it needs
//! from the `Config`, and tags any error with an `ErrorType` before returning it.

mod budget;
mod files;
mod init;
mod report;
mod transactions;

use crate::error::{ErrorType, IntoResult};
use crate::model::MonthYear;
use crate::tracker::Tracker;
use crate::Result;
use serde::Serialize;
use std::fmt::Debug;
use tracing::info;

pub use budget::{
    budget_copy, budget_delete, budget_get, budget_set, budget_status, budget_suggest,
    budget_summary, budget_trend, budget_warnings,
};
pub use files::{export, info};
pub use init::{init, load_config};
pub use report::{report_categories, report_compare, report_monthly, report_yearly};
pub use transactions::{add, delete, list, summary};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to stdout.
    pub fn print(&self) -> Result<()> {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            println!("{}", serde_json::to_string_pretty(structure)?);
        }
        Ok(())
    }
}

/// Parses `month` with the tracker's validator, or returns the current month when it is `None`.
fn month_or_current(tracker: &Tracker, month: Option<&str>) -> Result<MonthYear> {
    match month {
        Some(s) => tracker
            .validator()
            .month_year(s.trim())
            .pub_result(ErrorType::Validation),
        None => Ok(MonthYear::of(tracker.validator().today())),
    }
}
