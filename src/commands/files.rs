//! Handlers that work on the data files themselves.

use crate::args::ExportArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::store::{ExportedFiles, FileInfo};
use crate::{Config, Result};
use chrono::Local;

/// Copies both data files into `args.dir`, or into `$EXPENSE_HOME/exports` by default.
pub async fn export(config: Config, args: ExportArgs) -> Result<Out<ExportedFiles>> {
    let dir = args.dir.unwrap_or_else(|| config.exports());
    let exported = config
        .store()
        .export(&dir, Local::now().date_naive())
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Out::new(
        format!(
            "Exported {} and {}",
            exported.transactions.display(),
            exported.budget.display()
        ),
        exported,
    ))
}

pub async fn info(config: Config) -> Result<Out<Vec<FileInfo>>> {
    let files = config
        .store()
        .file_info()
        .await
        .pub_result(ErrorType::Storage)?;
    let lines: Vec<String> = files
        .iter()
        .map(|f| format!("{} ({} bytes)", f.path.display(), f.size))
        .collect();
    Ok(Out::new(
        format!(
            "Expense home {}: {}",
            config.root().display(),
            lines.join(", ")
        ),
        files,
    ))
}
