//! A personal expense tracker: transactions and monthly budgets kept in two CSV files, indexed
//! by date in a balanced tree, with cached summaries and reports.

pub mod args;
pub mod cache;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod reports;
mod store;
pub mod tracker;
pub mod tree;
mod utils;
pub mod validate;


pub use config::{CacheSettings, Config, ValidationSettings};
pub use error::{Error, ErrorType, Result};
pub use store::{ExportedFiles, FileInfo, Store};
pub use tracker::{NewTransaction, Tracker, TransactionFilter};
