//! These structs provide the CLI interface for the expense CLI.

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// expense: A command-line tool for tracking personal income, expenses and budgets.
///
/// Transactions and monthly budgets are kept in two CSV files inside the expense home directory.
/// Run `expense init` once to create it, then add transactions, set budgets and ask for reports.
///
/// Structured results are printed to stdout as JSON. Log messages go to stderr.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the expense home directory with a default config.json and empty data files.
    ///
    /// Pass --expense-home (or set EXPENSE_HOME) to put it somewhere other than $HOME/expense.
    Init,
    /// Record a new income or expense transaction.
    Add(AddArgs),
    /// Delete a transaction. Every field must match the stored transaction.
    Delete(DeleteArgs),
    /// List transactions, optionally filtered by date range, type and category.
    List(ListArgs),
    /// Show income, expense and balance for one month.
    Summary(MonthArgs),
    /// Manage monthly budgets per expense category.
    Budget(BudgetArgs),
    /// Monthly, yearly, per-category and comparison reports.
    Report(ReportArgs),
    /// Copy both data files into the exports directory.
    Export(ExportArgs),
    /// Show the location, size and modification time of the data files.
    Info,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where expense data and configuration is held. Defaults to ~/expense
    #[arg(long, env = "EXPENSE_HOME", default_value_t = default_expense_home())]
    expense_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, expense_home: PathBuf) -> Self {
        Self {
            log_level,
            expense_home: expense_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn expense_home(&self) -> &DisplayPath {
        &self.expense_home
    }
}

/// Args for the `expense add` command.
#[derive(Debug, ClapArgs, Clone)]
pub struct AddArgs {
    /// "income" or "expense"
    #[arg(long = "type")]
    pub transaction_type: String,

    /// One of the categories available for the transaction type, e.g. Food or Salary.
    #[arg(long)]
    pub category: String,

    /// The amount. Thousands separators are allowed, e.g. 150,000
    #[arg(long)]
    pub amount: String,

    /// The date as DD/MM/YYYY. Defaults to today.
    #[arg(long)]
    pub date: Option<String>,

    #[arg(long, default_value = "")]
    pub description: String,
}

/// Args for the `expense delete` command.
#[derive(Debug, ClapArgs, Clone)]
pub struct DeleteArgs {
    /// The date as DD/MM/YYYY.
    #[arg(long)]
    pub date: String,

    /// "income" or "expense"
    #[arg(long = "type")]
    pub transaction_type: String,

    #[arg(long)]
    pub category: String,

    #[arg(long)]
    pub amount: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// The time the transaction was recorded, as HH:MM:SS.
    #[arg(long)]
    pub timestamp: String,
}

/// Args for the `expense list` command.
#[derive(Debug, ClapArgs, Clone, Default)]
pub struct ListArgs {
    /// First date to include, as DD/MM/YYYY. Only applied together with --to.
    ///
    /// Dates are compared as text, so a range only follows the calendar within a single month.
    #[arg(long)]
    pub from: Option<String>,

    /// Last date to include, as DD/MM/YYYY. Only applied together with --from.
    #[arg(long)]
    pub to: Option<String>,

    /// "income" or "expense"
    #[arg(long = "type")]
    pub transaction_type: Option<String>,

    #[arg(long)]
    pub category: Option<String>,
}

/// A month argument shared by several commands.
#[derive(Debug, ClapArgs, Clone, Default)]
pub struct MonthArgs {
    /// The month as MM/YYYY. Defaults to the current month.
    #[arg(long)]
    pub month: Option<String>,
}

/// Args for the `expense budget` command.
#[derive(Debug, ClapArgs, Clone)]
pub struct BudgetArgs {
    #[command(subcommand)]
    command: BudgetCommand,
}

impl BudgetArgs {
    pub fn new(command: BudgetCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &BudgetCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum BudgetCommand {
    /// Set (or replace) the budget of an expense category for a month.
    Set(BudgetSetArgs),
    /// Show the budget of an expense category for a month.
    Get(BudgetCategoryArgs),
    /// Remove the budget of an expense category for a month.
    Delete(BudgetCategoryArgs),
    /// Show budget, spending and status of every expense category.
    Status(MonthArgs),
    /// Show the categories that are close to or over their budget.
    Warnings(MonthArgs),
    /// Show budget and spending totals across all categories.
    Summary(MonthArgs),
    /// Suggest new budgets and budget increases based on spending.
    Suggest(MonthArgs),
    /// Copy the previous month's budgets into the month.
    Copy(MonthArgs),
    /// Show the budget and spending of a category over recent months.
    Trend(BudgetTrendArgs),
}

#[derive(Debug, ClapArgs, Clone)]
pub struct BudgetSetArgs {
    #[arg(long)]
    pub category: String,

    #[arg(long)]
    pub amount: String,

    #[clap(flatten)]
    pub month: MonthArgs,
}

#[derive(Debug, ClapArgs, Clone)]
pub struct BudgetCategoryArgs {
    #[arg(long)]
    pub category: String,

    #[clap(flatten)]
    pub month: MonthArgs,
}

#[derive(Debug, ClapArgs, Clone)]
pub struct BudgetTrendArgs {
    #[arg(long)]
    pub category: String,

    /// How many months to show, ending with the current month.
    #[arg(long, default_value_t = 6)]
    pub months: usize,
}

/// Args for the `expense report` command.
#[derive(Debug, ClapArgs, Clone)]
pub struct ReportArgs {
    #[command(subcommand)]
    command: ReportCommand,
}

impl ReportArgs {
    pub fn new(command: ReportCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &ReportCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReportCommand {
    /// Totals, category breakdown, weekly breakdown and largest transactions of a month.
    Monthly(MonthArgs),
    /// Totals, monthly breakdown and month-over-month trend of a year.
    Yearly(YearArgs),
    /// Per-category statistics over all transactions of one type.
    Categories(CategoriesArgs),
    /// Compare two months, or two years with --by year.
    Compare(CompareArgs),
}

#[derive(Debug, ClapArgs, Clone, Default)]
pub struct YearArgs {
    /// Defaults to the current year.
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Debug, ClapArgs, Clone)]
pub struct CategoriesArgs {
    /// "income" or "expense"
    #[arg(long = "type", default_value = "expense")]
    pub transaction_type: String,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    #[default]
    Month,
    Year,
}

serde_plain::derive_display_from_serialize!(PeriodKind);
serde_plain::derive_fromstr_from_deserialize!(PeriodKind);

#[derive(Debug, ClapArgs, Clone)]
pub struct CompareArgs {
    /// The earlier period, MM/YYYY for months or YYYY for years.
    pub first: String,

    /// The later period, in the same form as the first.
    pub second: String,

    /// "month" or "year"
    #[arg(long, default_value_t = PeriodKind::Month)]
    pub by: PeriodKind,
}

/// Args for the `expense export` command.
#[derive(Debug, ClapArgs, Clone, Default)]
pub struct ExportArgs {
    /// Where to write the exported files. Defaults to $EXPENSE_HOME/exports
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

fn default_expense_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expense"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --expense-home or EXPENSE_HOME instead of relying on the \
                default expense home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("expense")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
