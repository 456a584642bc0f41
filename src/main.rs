use clap::Parser;
use expense_tracker::args::{Args, BudgetCommand, Command, ReportCommand};
use expense_tracker::{commands, Config, Result};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().expense_home().path();

    match args.command().clone() {
        Command::Init => commands::init(home).await?.print(),
        Command::Add(a) => commands::add(load(home).await?, a).await?.print(),
        Command::Delete(a) => commands::delete(load(home).await?, a).await?.print(),
        Command::List(a) => commands::list(load(home).await?, a).await?.print(),
        Command::Summary(a) => commands::summary(load(home).await?, a).await?.print(),
        Command::Budget(budget) => {
            let config = load(home).await?;
            match budget.command().clone() {
                BudgetCommand::Set(a) => commands::budget_set(config, a).await?.print(),
                BudgetCommand::Get(a) => commands::budget_get(config, a).await?.print(),
                BudgetCommand::Delete(a) => commands::budget_delete(config, a).await?.print(),
                BudgetCommand::Status(a) => commands::budget_status(config, a).await?.print(),
                BudgetCommand::Warnings(a) => commands::budget_warnings(config, a).await?.print(),
                BudgetCommand::Summary(a) => commands::budget_summary(config, a).await?.print(),
                BudgetCommand::Suggest(a) => commands::budget_suggest(config, a).await?.print(),
                BudgetCommand::Copy(a) => commands::budget_copy(config, a).await?.print(),
                BudgetCommand::Trend(a) => commands::budget_trend(config, a).await?.print(),
            }
        }
        Command::Report(report) => {
            let config = load(home).await?;
            match report.command().clone() {
                ReportCommand::Monthly(a) => commands::report_monthly(config, a).await?.print(),
                ReportCommand::Yearly(a) => commands::report_yearly(config, a).await?.print(),
                ReportCommand::Categories(a) => {
                    commands::report_categories(config, a).await?.print()
                }
                ReportCommand::Compare(a) => commands::report_compare(config, a).await?.print(),
            }
        }
        Command::Export(a) => commands::export(load(home).await?, a).await?.print(),
        Command::Info => commands::info(load(home).await?).await?.print(),
    }
}

async fn load(home: &Path) -> Result<Config> {
    commands::load_config(home).await
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "expense_tracker={},{}={}",
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
